//! Row sub-documents.
//!
//! Each row's cells live in their own replicated document so that rows can
//! be loaded and synced independently of the field and view definitions.

use loro::{LoroDoc, LoroMap};
use std::sync::Arc;
use tabula_api::{Cell, CellWrite, DatabaseError};

use super::into_database_error;
use crate::schema::{
    CELL_FIELD_TYPE, CELL_SOURCE_FIELD_TYPE, CELLS, CREATED_AT, DATA, DATABASE_ID, ID,
    LAST_MODIFIED, LoroMapExt, ROW, as_map, insert_json,
};
use crate::sync::ReplicatedDoc;

fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Cells map of a row document, if the row has been written yet.
pub(crate) fn cells_map(doc: &LoroDoc) -> Option<LoroMap> {
    doc.get_map(ROW).child_map(CELLS)
}

pub(crate) fn read_cell(field_id: String, cell_map: &LoroMap) -> Cell {
    Cell {
        field_id,
        field_type: cell_map.get_i64(CELL_FIELD_TYPE),
        source_field_type: cell_map.get_i64(CELL_SOURCE_FIELD_TYPE),
        data: cell_map.get_json(DATA),
    }
}

/// Handle over one row document.
#[derive(Clone)]
pub struct RowDocument {
    doc: Arc<ReplicatedDoc>,
}

impl RowDocument {
    pub fn open(doc: Arc<ReplicatedDoc>) -> Self {
        Self { doc }
    }

    /// Initialise the row's metadata and an empty cells map.
    pub async fn create(
        doc: Arc<ReplicatedDoc>,
        row_id: &str,
        database_id: &str,
    ) -> Result<Self, DatabaseError> {
        doc.with_write(|d| {
            let row = d.get_map(ROW);
            let now = now_seconds();
            row.insert(ID, row_id)?;
            row.insert(DATABASE_ID, database_id)?;
            row.insert(CREATED_AT, now)?;
            row.insert(LAST_MODIFIED, now)?;
            row.ensure_child_map(CELLS)?;
            Ok(())
        })
        .await
        .map_err(into_database_error)?;
        Ok(Self { doc })
    }

    pub fn doc(&self) -> &Arc<ReplicatedDoc> {
        &self.doc
    }

    pub async fn row_id(&self) -> Result<Option<String>, DatabaseError> {
        self.doc
            .with_read(|d| Ok(d.get_map(ROW).get_string(ID)))
            .await
            .map_err(into_database_error)
    }

    /// Write one cell. Stamps the field type in effect at write time; a cell
    /// written without a source type loses any previous one.
    pub async fn write_cell(&self, field_id: &str, cell: &CellWrite) -> Result<(), DatabaseError> {
        self.doc
            .with_write(|d| {
                let row = d.get_map(ROW);
                let cells = row.ensure_child_map(CELLS)?;
                let now = now_seconds();
                let cell_map = match cells.child_map(field_id) {
                    Some(existing) => existing,
                    None => {
                        let created = cells.insert_container(field_id, LoroMap::new())?;
                        created.insert(CREATED_AT, now)?;
                        created
                    }
                };
                cell_map.insert(CELL_FIELD_TYPE, cell.field_type)?;
                match cell.source_field_type {
                    Some(source) => cell_map.insert(CELL_SOURCE_FIELD_TYPE, source)?,
                    None => cell_map.delete(CELL_SOURCE_FIELD_TYPE)?,
                }
                insert_json(&cell_map, DATA, &cell.data)?;
                cell_map.insert(LAST_MODIFIED, now)?;
                row.insert(LAST_MODIFIED, now)?;
                Ok(())
            })
            .await
            .map_err(into_database_error)
    }

    pub async fn cell(&self, field_id: &str) -> Result<Option<Cell>, DatabaseError> {
        self.doc
            .with_read(|d| {
                Ok(cells_map(d)
                    .and_then(|cells| cells.child_map(field_id))
                    .map(|m| read_cell(field_id.to_string(), &m)))
            })
            .await
            .map_err(into_database_error)
    }

    /// Every cell of the row, ordered by field id.
    pub async fn cells(&self) -> Result<Vec<Cell>, DatabaseError> {
        self.doc
            .with_read(|d| {
                let Some(cells) = cells_map(d) else {
                    return Ok(Vec::new());
                };
                let mut result: Vec<Cell> = cells
                    .entries()
                    .into_iter()
                    .filter_map(|(field_id, v)| as_map(&v).map(|m| read_cell(field_id, &m)))
                    .collect();
                result.sort_by(|a, b| a.field_id.cmp(&b.field_id));
                Ok(result)
            })
            .await
            .map_err(into_database_error)
    }
}
