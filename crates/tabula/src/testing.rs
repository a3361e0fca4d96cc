//! Fixtures for tests of code built on databases and row documents.
//!
//! - `create_legacy_database`: a database without a schema version, the way
//!   clients predating the version counter wrote them
//! - `FailingRowLoader`: an in-memory loader that fails for chosen keys
//! - `init_test_tracing`: route `tracing` output to the test harness

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tabula_api::{CellWrite, DatabaseError, FieldType};

use crate::database::{DatabaseHandle, RowDocument};
use crate::migration::{InMemoryRowDocumentLoader, RowDocumentLoader, row_document_key};
use crate::sync::ReplicatedDoc;

/// Install a `fmt` subscriber writing through the test harness. Safe to
/// call from every test; only the first call installs it.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A database document with no `schema_version`.
pub async fn create_legacy_database(doc_id: &str) -> Result<DatabaseHandle, DatabaseError> {
    let doc = Arc::new(ReplicatedDoc::new(doc_id));
    DatabaseHandle::create_with_schema_version(doc, doc_id, None).await
}

/// Create a row document for `row_id` in `loader` and write the given cells.
///
/// Each cell is `(field_id, field_type, source_field_type)`; the data is a
/// placeholder string.
pub async fn seed_row(
    loader: &InMemoryRowDocumentLoader,
    database: &DatabaseHandle,
    row_id: &str,
    cells: &[(&str, FieldType, Option<FieldType>)],
) -> Result<RowDocument, DatabaseError> {
    let parent = database.doc().doc_id();
    let doc = Arc::new(ReplicatedDoc::new(row_document_key(parent, row_id)));
    let database_id = database.database_id().await?.unwrap_or_default();
    let row = RowDocument::create(doc.clone(), row_id, &database_id).await?;
    for (field_id, field_type, source) in cells {
        let mut write = CellWrite::new(*field_type, format!("{}:{}", row_id, field_id));
        if let Some(source) = source {
            write = write.with_source(*source);
        }
        row.write_cell(field_id, &write).await?;
    }
    loader.insert(doc);
    Ok(row)
}

/// In-memory loader that returns [`DatabaseError::LoaderFailed`] for keys
/// marked with [`fail_on`](Self::fail_on).
#[derive(Default)]
pub struct FailingRowLoader {
    inner: InMemoryRowDocumentLoader,
    failing: Mutex<HashSet<String>>,
}

impl FailingRowLoader {
    pub fn new(inner: InMemoryRowDocumentLoader) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, key: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into());
    }

    pub fn clear_failures(&self) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn inner(&self) -> &InMemoryRowDocumentLoader {
        &self.inner
    }
}

#[async_trait]
impl RowDocumentLoader for FailingRowLoader {
    async fn load_row_document(&self, key: &str) -> Result<Arc<ReplicatedDoc>, DatabaseError> {
        let fails = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key);
        if fails {
            return Err(DatabaseError::LoaderFailed {
                key: key.to_string(),
                message: "injected failure".to_string(),
            });
        }
        self.inner.load_row_document(key).await
    }
}
