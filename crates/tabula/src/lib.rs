//! Data layer for collaborative, offline-first tabular databases.
//!
//! A database is a replicated document holding field definitions and views;
//! every row lives in its own replicated sub-document. This crate reads and
//! writes that layout, decodes stored cells, and migrates documents written
//! by older clients.

pub mod cache;
pub mod collector;
pub mod config;
pub mod database;
pub mod migration;
pub mod parsers;
pub mod readiness;
pub mod resolver;
pub mod schema;
pub mod sync;
pub mod testing;

pub use tabula_api;

pub use cache::WorkspaceCache;
pub use collector::{collect_row_ids, collect_row_ids_from_doc};
pub use config::{MigrationOptions, ReadinessConfig};
pub use database::{DatabaseHandle, RowDocument};
pub use migration::{
    InMemoryRowDocumentLoader, MigrationReport, RowDocumentLoader, migrate, migrate_with_report,
    row_document_key,
};
pub use readiness::{EntryProbe, wait_for_cell, wait_for_entry};
pub use sync::ReplicatedDoc;
