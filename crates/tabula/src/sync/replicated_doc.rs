use anyhow::Result;
use loro::{LoroDoc, PeerID, Subscription};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A Loro document addressed by a string id.
///
/// The database document and every row sub-document are each one
/// `ReplicatedDoc`. Merging with other replicas happens through
/// [`export_updates`](Self::export_updates) and [`apply_update`](Self::apply_update);
/// transport is someone else's job.
pub struct ReplicatedDoc {
    doc: Arc<RwLock<LoroDoc>>,
    doc_id: String,
}

impl ReplicatedDoc {
    /// Create an empty document. Loro picks a random peer id.
    pub fn new(doc_id: impl Into<String>) -> Self {
        let doc_id = doc_id.into();
        debug!("Created replicated doc '{}'", doc_id);
        Self {
            doc: Arc::new(RwLock::new(LoroDoc::new())),
            doc_id,
        }
    }

    /// Create an empty document with a fixed peer id.
    ///
    /// Tests use this to get deterministic merge results between replicas.
    pub fn with_peer_id(doc_id: impl Into<String>, peer_id: PeerID) -> Result<Self> {
        let doc_id = doc_id.into();
        let doc = LoroDoc::new();
        doc.set_peer_id(peer_id)?;

        info!(
            "Created replicated doc '{}' with peer_id: {}",
            doc_id, peer_id
        );

        Ok(Self {
            doc: Arc::new(RwLock::new(doc)),
            doc_id,
        })
    }

    /// Rebuild a document from a snapshot or update blob.
    pub fn from_bytes(doc_id: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let doc = LoroDoc::new();
        doc.import(bytes)?;
        Ok(Self {
            doc: Arc::new(RwLock::new(doc)),
            doc_id: doc_id.into(),
        })
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub async fn apply_update(&self, update: &[u8]) -> Result<()> {
        let doc = self.doc.write().await;
        doc.import(update)?;
        debug!(
            "Applied update of {} bytes to '{}'",
            update.len(),
            self.doc_id
        );
        Ok(())
    }

    pub async fn export_updates(&self) -> Result<Vec<u8>> {
        let doc = self.doc.read().await;
        Ok(doc.export(loro::ExportMode::updates_owned(Default::default()))?)
    }

    pub async fn export_snapshot(&self) -> Result<Vec<u8>> {
        let doc = self.doc.read().await;
        Ok(doc.export(loro::ExportMode::Snapshot)?)
    }

    /// Execute a read-only operation on the document.
    pub async fn with_read<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&LoroDoc) -> Result<R>,
    {
        let doc = self.doc.read().await;
        f(&doc)
    }

    /// Execute a mutation batch.
    ///
    /// Everything `f` writes is committed as one Loro transaction, so
    /// subscribers observe it as a single change. Loro has no abort: writes
    /// made before `f` returns an error are committed as well.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example(doc: &tabula::sync::ReplicatedDoc) -> anyhow::Result<()> {
    /// doc.with_write(|doc| {
    ///     let map = doc.get_map("my_map");
    ///     map.insert("key", "value")?;
    ///     Ok(())
    /// })
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn with_write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&LoroDoc) -> Result<R>,
    {
        let doc = self.doc.write().await;
        let result = f(&doc);
        doc.commit();
        result
    }

    /// Register a callback fired once per committed batch (local or imported).
    ///
    /// The subscription stays active until the returned handle is dropped.
    pub async fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(loro::event::DiffEvent) + Send + Sync + 'static,
    {
        let doc = self.doc.read().await;
        doc.subscribe_root(Arc::new(callback))
    }

    /// Access the underlying LoroDoc directly.
    ///
    /// Prefer using `with_read()` or `with_write()`.
    pub fn doc(&self) -> Arc<RwLock<LoroDoc>> {
        self.doc.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LoroMapExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_write_batch_is_one_change() -> Result<()> {
        let doc = ReplicatedDoc::new("batch-doc");
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let _sub = doc
            .subscribe(move |_event| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        doc.with_write(|doc| {
            doc.get_map("a").insert("k1", "v1")?;
            doc.get_map("b").insert("k2", "v2")?;
            Ok(())
        })
        .await?;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_export_and_apply() -> Result<()> {
        let doc1 = ReplicatedDoc::with_peer_id("shared", 1)?;
        let doc2 = ReplicatedDoc::with_peer_id("shared", 2)?;

        doc1.with_write(|doc| {
            doc.get_map("fields").insert("f1", "Name")?;
            Ok(())
        })
        .await?;

        let update = doc1.export_updates().await?;
        doc2.apply_update(&update).await?;

        let name = doc2
            .with_read(|doc| Ok(doc.get_map("fields").get_string("f1")))
            .await?;
        assert_eq!(name.as_deref(), Some("Name"));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_writes_merge() -> Result<()> {
        let doc1 = ReplicatedDoc::with_peer_id("shared", 1)?;
        let doc2 = ReplicatedDoc::with_peer_id("shared", 2)?;

        doc1.with_write(|doc| {
            doc.get_map("cells").insert("a", 1i64)?;
            Ok(())
        })
        .await?;
        doc2.with_write(|doc| {
            doc.get_map("cells").insert("b", 2i64)?;
            Ok(())
        })
        .await?;

        let u1 = doc1.export_updates().await?;
        let u2 = doc2.export_updates().await?;
        doc1.apply_update(&u2).await?;
        doc2.apply_update(&u1).await?;

        let len1 = doc1.with_read(|doc| Ok(doc.get_map("cells").len())).await?;
        let len2 = doc2.with_read(|doc| Ok(doc.get_map("cells").len())).await?;
        assert_eq!(len1, 2);
        assert_eq!(len2, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() -> Result<()> {
        let doc = ReplicatedDoc::new("snap");
        doc.with_write(|doc| {
            doc.get_map("metas").insert("schema_version", 2i64)?;
            Ok(())
        })
        .await?;

        let snapshot = doc.export_snapshot().await?;
        let restored = ReplicatedDoc::from_bytes("snap", &snapshot)?;
        let version = restored
            .with_read(|doc| Ok(doc.get_map("metas").get_i64("schema_version")))
            .await?;
        assert_eq!(version, Some(2));
        Ok(())
    }
}
