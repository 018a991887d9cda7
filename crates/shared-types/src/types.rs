use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier issued by the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An uploaded document. Never mutated after it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Output of one analysis run for a document.
///
/// Only the latest result per document is retained by the host; a new run
/// replaces the previous record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub document_id: DocumentId,
    pub summary: String,
    /// Normalized severity in `[0.0, 1.0]`
    pub risk_score: f64,
    /// Matched lexicon terms, in lexicon order, each at most once
    pub flagged_terms: Vec<String>,
    /// Context snippets around matches
    pub flagged_sections: Vec<String>,
    pub recommendation: String,
}
