//! PDF decoding capability

use thiserror::Error;

/// Leading bytes of every PDF file
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Returns true if `data` starts with the PDF magic header
pub fn is_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(String),

    #[error("PDF decoder panicked")]
    DecoderPanicked,

    #[error("PDF nesting exceeds {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("PDF refused: {0}")]
    Refused(String),
}

/// Turns PDF bytes into per-page text.
///
/// Implementations return one entry per decoded page, in page order. A page
/// whose text cannot be decoded is an empty string, not an error; `Err` is
/// reserved for documents that cannot be opened at all.
pub trait PdfDecoder: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    fn decode_pages(&self, data: &[u8]) -> Result<Vec<String>, PdfError>;
}

/// Decoder used when no PDF backend is configured. Yields no pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPdfDecoder;

impl PdfDecoder for NoopPdfDecoder {
    fn name(&self) -> &'static str {
        "none"
    }

    fn decode_pages(&self, _data: &[u8]) -> Result<Vec<String>, PdfError> {
        Ok(Vec::new())
    }
}
