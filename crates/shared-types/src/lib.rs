pub mod types;

pub use types::{AssessmentResult, Document, DocumentId};
