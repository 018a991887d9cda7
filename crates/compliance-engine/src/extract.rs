//! Text extraction from uploaded bytes
//!
//! Dispatches on the leading bytes: PDFs go through the configured
//! [`PdfDecoder`], everything else is decoded as UTF-8 with invalid byte
//! sequences dropped. Nothing here fails; a document that cannot be read
//! yields empty text.

use std::sync::Arc;

use shared_pdf::{is_pdf, NoopPdfDecoder, PdfDecoder};
use tracing::{debug, warn};

/// Bytes of the raw document used when extraction produces no text
pub const PREVIEW_BYTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    pub fn detect(data: &[u8]) -> Self {
        if is_pdf(data) {
            DocumentFormat::Pdf
        } else {
            DocumentFormat::Text
        }
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    pdf: Arc<dyn PdfDecoder>,
}

impl TextExtractor {
    pub fn new(pdf: Arc<dyn PdfDecoder>) -> Self {
        Self { pdf }
    }

    pub fn pdf_backend(&self) -> &'static str {
        self.pdf.name()
    }

    /// Extract plain text. May be empty; never fails.
    pub fn extract(&self, data: &[u8]) -> String {
        match DocumentFormat::detect(data) {
            DocumentFormat::Pdf => self.extract_pdf(data),
            DocumentFormat::Text => decode_utf8(data),
        }
    }

    fn extract_pdf(&self, data: &[u8]) -> String {
        match self.pdf.decode_pages(data) {
            Ok(pages) => {
                debug!("Decoded {} PDF pages with {}", pages.len(), self.pdf.name());
                pages.join("\n")
            }
            Err(e) => {
                warn!("PDF extraction degraded ({}): {}", self.pdf.name(), e);
                String::new()
            }
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(Arc::new(NoopPdfDecoder))
    }
}

/// Decode of the first [`PREVIEW_BYTES`] bytes
pub fn preview(data: &[u8]) -> String {
    let end = data.len().min(PREVIEW_BYTES);
    decode_utf8(&data[..end])
}

/// UTF-8 decode that drops invalid byte sequences
fn decode_utf8(data: &[u8]) -> String {
    data.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_pdf::fixtures::{nested_array_pdf, text_pdf};
    use shared_pdf::{LopdfDecoder, PdfError};

    struct FailingDecoder;

    impl PdfDecoder for FailingDecoder {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn decode_pages(&self, _data: &[u8]) -> Result<Vec<String>, PdfError> {
            Err(PdfError::Parse("trailer not found".to_string()))
        }
    }

    struct PagedDecoder(Vec<&'static str>);

    impl PdfDecoder for PagedDecoder {
        fn name(&self) -> &'static str {
            "paged"
        }

        fn decode_pages(&self, _data: &[u8]) -> Result<Vec<String>, PdfError> {
            Ok(self.0.iter().map(|p| p.to_string()).collect())
        }
    }

    #[test]
    fn test_detects_format() {
        assert_eq!(DocumentFormat::detect(b"%PDF-1.4"), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect(b"hello"), DocumentFormat::Text);
    }

    #[test]
    fn test_text_path_drops_invalid_utf8() {
        let extractor = TextExtractor::default();
        assert_eq!(extractor.extract("fraud café".as_bytes()), "fraud café");
        assert_eq!(extractor.extract(b"ok \xff\xfe bytes"), "ok  bytes");
        assert_eq!(extractor.extract(b"fr\xffaud"), "fraud");
        assert_eq!(extractor.extract(b"\xff\xfe"), "");
    }

    #[test]
    fn test_preview_drops_a_split_character() {
        let mut data = vec![b'a'; PREVIEW_BYTES - 1];
        data.extend_from_slice("é".as_bytes());
        let text = preview(&data);
        assert_eq!(text.len(), PREVIEW_BYTES - 1);
        assert!(!text.contains('\u{FFFD}'));
    }

    #[test]
    fn test_deeply_nested_pdf_degrades_to_empty() {
        let extractor = TextExtractor::new(Arc::new(LopdfDecoder::default()));
        assert_eq!(extractor.extract(&nested_array_pdf(10_000)), "");
    }

    #[test]
    fn test_pages_joined_with_newlines() {
        let extractor = TextExtractor::new(Arc::new(PagedDecoder(vec!["one", "", "three"])));
        assert_eq!(extractor.extract(b"%PDF-1.4"), "one\n\nthree");
    }

    #[test]
    fn test_decoder_failure_degrades_to_empty() {
        let extractor = TextExtractor::new(Arc::new(FailingDecoder));
        assert_eq!(extractor.extract(b"%PDF-1.4 broken"), "");
    }

    #[test]
    fn test_missing_decoder_degrades_to_empty() {
        assert_eq!(TextExtractor::default().extract(b"%PDF-1.4 anything"), "");
    }

    #[test]
    fn test_real_pdf_through_lopdf() {
        let extractor = TextExtractor::new(Arc::new(LopdfDecoder::default()));
        let text = extractor.extract(&text_pdf(&["Sanctions exposure noted", "Page two"]));
        assert!(text.contains("Sanctions"));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_preview_is_bounded() {
        let data = vec![b'x'; 2000];
        assert_eq!(preview(&data).len(), PREVIEW_BYTES);
        assert_eq!(preview(b"short"), "short");
    }

    proptest! {
        /// Property: 1 KB of garbage behind a forged PDF header never panics
        #[test]
        fn forged_pdf_never_panics(body in prop::collection::vec(any::<u8>(), 1020)) {
            let mut data = b"%PDF".to_vec();
            data.extend(body);
            let extractor = TextExtractor::new(Arc::new(LopdfDecoder::default()));
            let _ = extractor.extract(&data);
        }
    }
}
