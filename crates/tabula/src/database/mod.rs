//! Read and write surface over a database document.
//!
//! All writes go through [`ReplicatedDoc::with_write`], so each public method
//! is one mutation batch. Reads return detached snapshots.

mod fields;
mod rows;
mod views;

pub use rows::RowDocument;

pub(crate) use fields::read_fields;
pub(crate) use rows::cells_map;
pub(crate) use views::decode_row_order;

use loro::{LoroDoc, LoroMap};
use std::sync::Arc;
use tabula_api::{
    DatabaseError, Field, FieldType, FieldVisibility, NewField, TARGET_SCHEMA_VERSION,
    TypeOptionData, View, ViewLayout,
};
use tracing::debug;

use crate::schema::{DATABASE, FIELDS, ID, LoroMapExt, METAS, SCHEMA_VERSION, VIEWS};
use crate::sync::ReplicatedDoc;

/// Map an internal error to the public error type, keeping structured
/// `DatabaseError`s raised inside write closures.
pub(crate) fn into_database_error(e: anyhow::Error) -> DatabaseError {
    match e.downcast::<DatabaseError>() {
        Ok(err) => err,
        Err(other) => DatabaseError::InternalError {
            message: other.to_string(),
        },
    }
}

/// The database container of a document, or `None` when the document is not
/// (yet) a database. Loro root maps always exist, so "absent" means empty.
pub(crate) fn database_map(doc: &LoroDoc) -> Option<LoroMap> {
    let database = doc.get_map(DATABASE);
    (!database.is_empty()).then_some(database)
}

pub(crate) fn read_schema_version(database: &LoroMap) -> i64 {
    database
        .child_map(METAS)
        .and_then(|metas| metas.get_i64(SCHEMA_VERSION))
        .unwrap_or(0)
}

fn require_database(doc: &LoroDoc) -> anyhow::Result<LoroMap> {
    database_map(doc).ok_or_else(|| {
        anyhow::anyhow!(DatabaseError::InvalidOperation {
            message: "Document does not contain a database".to_string(),
        })
    })
}

/// Typed access to the database container of a [`ReplicatedDoc`].
#[derive(Clone)]
pub struct DatabaseHandle {
    doc: Arc<ReplicatedDoc>,
}

impl DatabaseHandle {
    /// Wrap an existing document. Nothing is validated; reads on a document
    /// that is not a database return empty results.
    pub fn open(doc: Arc<ReplicatedDoc>) -> Self {
        Self { doc }
    }

    /// Initialise a new database in `doc`.
    ///
    /// New databases are written with correct type tags, so they start at the
    /// current schema version and never need migrating.
    pub async fn create(doc: Arc<ReplicatedDoc>, database_id: &str) -> Result<Self, DatabaseError> {
        Self::create_with_schema_version(doc, database_id, Some(TARGET_SCHEMA_VERSION)).await
    }

    /// Initialise a database with an explicit schema version, or with none at
    /// all, the way clients predating the version counter did.
    pub async fn create_with_schema_version(
        doc: Arc<ReplicatedDoc>,
        database_id: &str,
        schema_version: Option<i64>,
    ) -> Result<Self, DatabaseError> {
        doc.with_write(|d| {
            let database = d.get_map(DATABASE);
            database.insert(ID, database_id)?;
            database.ensure_child_map(FIELDS)?;
            database.ensure_child_map(VIEWS)?;
            let metas = database.ensure_child_map(METAS)?;
            if let Some(version) = schema_version {
                metas.insert(SCHEMA_VERSION, version)?;
            }
            Ok(())
        })
        .await
        .map_err(into_database_error)?;
        debug!("Created database '{}' in '{}'", database_id, doc.doc_id());
        Ok(Self { doc })
    }

    pub fn doc(&self) -> &Arc<ReplicatedDoc> {
        &self.doc
    }

    async fn read<F, R>(&self, f: F) -> Result<R, DatabaseError>
    where
        F: FnOnce(&LoroMap) -> anyhow::Result<R>,
    {
        self.doc
            .with_read(|d| f(&require_database(d)?))
            .await
            .map_err(into_database_error)
    }

    async fn write<F, R>(&self, f: F) -> Result<R, DatabaseError>
    where
        F: FnOnce(&LoroMap) -> anyhow::Result<R>,
    {
        self.doc
            .with_write(|d| f(&require_database(d)?))
            .await
            .map_err(into_database_error)
    }

    pub async fn exists(&self) -> Result<bool, DatabaseError> {
        self.doc
            .with_read(|d| Ok(database_map(d).is_some()))
            .await
            .map_err(into_database_error)
    }

    pub async fn database_id(&self) -> Result<Option<String>, DatabaseError> {
        self.read(|db| Ok(db.get_string(ID))).await
    }

    /// Stored schema version; 0 when never written.
    pub async fn schema_version(&self) -> Result<i64, DatabaseError> {
        self.doc
            .with_read(|d| Ok(database_map(d).map(|db| read_schema_version(&db)).unwrap_or(0)))
            .await
            .map_err(into_database_error)
    }

    /// All fields, primary field first, then by id.
    pub async fn fields(&self) -> Result<Vec<Field>, DatabaseError> {
        self.read(|db| Ok(read_fields(db))).await
    }

    pub async fn field(&self, id: &str) -> Result<Field, DatabaseError> {
        self.read(|db| {
            let map = fields::field_map(db, id)?;
            fields::read_field(&map).ok_or_else(|| {
                anyhow::anyhow!(DatabaseError::FieldNotFound { id: id.to_string() })
            })
        })
        .await
    }

    /// Create a field and return its id.
    pub async fn create_field(&self, new_field: NewField) -> Result<String, DatabaseError> {
        self.write(|db| fields::create_field(db, &new_field)).await
    }

    pub async fn rename_field(&self, id: &str, name: &str) -> Result<(), DatabaseError> {
        self.write(|db| fields::rename_field(db, id, name)).await
    }

    pub async fn set_field_visibility(
        &self,
        id: &str,
        visibility: FieldVisibility,
    ) -> Result<(), DatabaseError> {
        self.write(|db| fields::set_field_visibility(db, id, visibility))
            .await
    }

    pub async fn update_type_option(
        &self,
        id: &str,
        field_type: FieldType,
        data: TypeOptionData,
    ) -> Result<(), DatabaseError> {
        self.write(|db| fields::update_type_option(db, id, field_type, &data))
            .await
    }

    pub async fn switch_field_type(
        &self,
        id: &str,
        field_type: FieldType,
    ) -> Result<(), DatabaseError> {
        self.write(|db| fields::switch_field_type(db, id, field_type))
            .await
    }

    pub async fn create_view(
        &self,
        view_id: &str,
        name: &str,
        layout: ViewLayout,
    ) -> Result<(), DatabaseError> {
        self.write(|db| views::create_view(db, view_id, name, layout))
            .await
    }

    pub async fn views(&self) -> Result<Vec<View>, DatabaseError> {
        self.read(|db| Ok(views::read_views(db))).await
    }

    /// Returns `false` when the row was already in the view.
    pub async fn append_row_order(
        &self,
        view_id: &str,
        row_id: &str,
    ) -> Result<bool, DatabaseError> {
        self.write(|db| views::append_row_order(db, view_id, row_id))
            .await
    }

    pub async fn remove_row_order(
        &self,
        view_id: &str,
        row_id: &str,
    ) -> Result<bool, DatabaseError> {
        self.write(|db| views::remove_row_order(db, view_id, row_id))
            .await
    }

    pub async fn move_row(
        &self,
        view_id: &str,
        row_id: &str,
        after: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.write(|db| views::move_row(db, view_id, row_id, after))
            .await
    }

    /// Ids of every row referenced by at least one view.
    pub async fn row_ids(&self) -> Result<Vec<String>, DatabaseError> {
        self.doc
            .with_read(|d| Ok(crate::collector::collect_row_ids_from_doc(d)))
            .await
            .map_err(into_database_error)
    }
}
