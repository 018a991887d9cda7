//! lopdf-backed text decoding
//!
//! Each page is decoded on its own so a broken content stream only blanks
//! that page. Work is bounded by [`ExtractionLimits`]. Nesting is checked
//! by [`crate::guard`] before lopdf parses anything, and a panic inside
//! lopdf is caught and reported as [`PdfError::DecoderPanicked`].

use std::panic::{self, AssertUnwindSafe};

use lopdf::{Document, ObjectId};
use tracing::debug;

use crate::decoder::{PdfDecoder, PdfError};
use crate::guard;

/// Default cap on pages decoded per document
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Default cap on array and dictionary nesting
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Pages beyond this count are not decoded
    pub max_pages: usize,
    /// Documents nesting arrays or dictionaries deeper than this are refused
    pub max_nesting_depth: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// PDF decoder built on lopdf's per-page text extraction
#[derive(Debug, Default, Clone)]
pub struct LopdfDecoder {
    limits: ExtractionLimits,
}

impl LopdfDecoder {
    pub fn new(limits: ExtractionLimits) -> Self {
        Self { limits }
    }
}

impl PdfDecoder for LopdfDecoder {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn decode_pages(&self, data: &[u8]) -> Result<Vec<String>, PdfError> {
        let limits = self.limits;
        panic::catch_unwind(AssertUnwindSafe(|| decode_with_lopdf(data, limits)))
            .map_err(|_| PdfError::DecoderPanicked)?
    }
}

fn decode_with_lopdf(data: &[u8], limits: ExtractionLimits) -> Result<Vec<String>, PdfError> {
    guard::check_document(data, limits.max_nesting_depth)?;

    let doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;
    let pages = doc.get_pages();

    if pages.len() > limits.max_pages {
        debug!(
            "PDF has {} pages, decoding the first {}",
            pages.len(),
            limits.max_pages
        );
    }

    let texts = pages
        .into_iter()
        .take(limits.max_pages)
        .map(|(page_number, page_id)| {
            decode_page(&doc, page_number, page_id, limits.max_nesting_depth)
        })
        .collect();

    Ok(texts)
}

fn decode_page(doc: &Document, page_number: u32, page_id: ObjectId, max_depth: usize) -> String {
    let text = guard::check_page(doc, page_id, max_depth).and_then(|()| {
        doc.extract_text(&[page_number])
            .map_err(|e| PdfError::Parse(e.to_string()))
    });

    match text {
        Ok(text) => text,
        Err(e) => {
            debug!("Page {} could not be decoded: {}", page_number, e);
            String::new()
        }
    }
}
