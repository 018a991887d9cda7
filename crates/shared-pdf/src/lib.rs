//! Shared PDF handling utilities
//!
//! This crate provides the PDF text decoding capability used by the
//! compliance engine. Decoding sits behind the [`PdfDecoder`] trait so the
//! engine can run with a real lopdf-backed decoder or with none at all.

pub mod decoder;
#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;
pub mod guard;
pub mod parser;

pub use decoder::{is_pdf, NoopPdfDecoder, PdfDecoder, PdfError, PDF_MAGIC};
pub use parser::{ExtractionLimits, LopdfDecoder, DEFAULT_MAX_NESTING_DEPTH, DEFAULT_MAX_PAGES};
