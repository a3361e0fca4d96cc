use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tabula_api::DatabaseError;

use crate::sync::ReplicatedDoc;

/// Document key of a row sub-document.
pub fn row_document_key(parent_doc_id: &str, row_id: &str) -> String {
    format!("{}_rows_{}", parent_doc_id, row_id)
}

/// Source of row sub-documents, keyed by [`row_document_key`].
///
/// Implementations may hit the network or disk; the migration engine awaits
/// one load at a time.
#[async_trait]
pub trait RowDocumentLoader: Send + Sync {
    async fn load_row_document(&self, key: &str) -> Result<Arc<ReplicatedDoc>, DatabaseError>;
}

/// Loader over documents held in memory.
///
/// Unknown keys get a fresh empty document, matching a store that lazily
/// creates sub-documents on first open. Every requested key is recorded.
#[derive(Default)]
pub struct InMemoryRowDocumentLoader {
    docs: Mutex<HashMap<String, Arc<ReplicatedDoc>>>,
    requested: Mutex<Vec<String>>,
}

impl InMemoryRowDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `doc` under its own document id.
    pub fn insert(&self, doc: Arc<ReplicatedDoc>) {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.insert(doc.doc_id().to_string(), doc);
    }

    pub fn get(&self, key: &str) -> Option<Arc<ReplicatedDoc>> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        docs.get(key).cloned()
    }

    /// Keys passed to [`RowDocumentLoader::load_row_document`], in call order.
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RowDocumentLoader for InMemoryRowDocumentLoader {
    async fn load_row_document(&self, key: &str) -> Result<Arc<ReplicatedDoc>, DatabaseError> {
        self.requested
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());

        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let doc = docs
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(ReplicatedDoc::new(key)));
        Ok(doc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_document_key() {
        assert_eq!(row_document_key("db-1", "r1"), "db-1_rows_r1");
    }

    #[tokio::test]
    async fn test_in_memory_loader_reuses_documents() -> anyhow::Result<()> {
        let loader = InMemoryRowDocumentLoader::new();
        let existing = Arc::new(ReplicatedDoc::new("db_rows_r1"));
        loader.insert(existing.clone());

        let loaded = loader.load_row_document("db_rows_r1").await?;
        assert!(Arc::ptr_eq(&loaded, &existing));

        let created = loader.load_row_document("db_rows_r2").await?;
        assert_eq!(created.doc_id(), "db_rows_r2");
        assert!(loader.get("db_rows_r2").is_some());

        assert_eq!(loader.requested_keys(), vec!["db_rows_r1", "db_rows_r2"]);
        Ok(())
    }
}
