//! Document and assessment storage
//!
//! Handlers only see the [`DocumentStore`] and [`ResultStore`] traits. The
//! in-memory implementations keep everything for the life of the process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use shared_types::{AssessmentResult, Document, DocumentId};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(DocumentId),
}

pub trait DocumentStore: Send + Sync {
    /// Store bytes under a fresh, never reused identifier
    fn put(&self, bytes: Vec<u8>, filename: Option<String>) -> DocumentId;

    fn get(&self, id: &DocumentId) -> Result<Arc<Document>, StoreError>;
}

pub trait ResultStore: Send + Sync {
    /// Last write wins
    fn put(&self, id: DocumentId, result: AssessmentResult);

    fn get(&self, id: &DocumentId) -> Result<AssessmentResult, StoreError>;
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    issued: AtomicU64,
    documents: RwLock<HashMap<DocumentId, Arc<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn put(&self, bytes: Vec<u8>, filename: Option<String>) -> DocumentId {
        let sequence = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        let id = DocumentId::new(format!("file_{}", sequence));
        let document = Arc::new(Document {
            id: id.clone(),
            filename,
            bytes,
        });

        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), document);
        id
    }

    fn get(&self, id: &DocumentId) -> Result<Arc<Document>, StoreError> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DocumentNotFound(id.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryResultStore {
    results: RwLock<HashMap<DocumentId, AssessmentResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for InMemoryResultStore {
    fn put(&self, id: DocumentId, result: AssessmentResult) {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, result);
    }

    fn get(&self, id: &DocumentId) -> Result<AssessmentResult, StoreError> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::AnalysisNotFound(id.clone()))
    }
}
