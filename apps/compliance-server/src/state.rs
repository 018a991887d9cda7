//! Shared application state

use std::sync::Arc;

use compliance_engine::ComplianceEngine;

use crate::store::{DocumentStore, InMemoryDocumentStore, InMemoryResultStore, ResultStore};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    pub documents: Arc<dyn DocumentStore>,
    pub results: Arc<dyn ResultStore>,
}

impl AppState {
    pub fn new(
        engine: ComplianceEngine,
        documents: Arc<dyn DocumentStore>,
        results: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            documents,
            results,
        }
    }

    /// State backed by process-lifetime in-memory stores
    pub fn in_memory(engine: ComplianceEngine) -> Self {
        Self::new(
            engine,
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryResultStore::new()),
        )
    }
}
