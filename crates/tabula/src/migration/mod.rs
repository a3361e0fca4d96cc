//! Schema migration for databases written before the Time field type existed.
//!
//! Older clients stored Time fields with the Rollup tag. Such a field is
//! recognised by its Rollup-keyed type option carrying none of the keys a
//! real Rollup option has. The migration retags the field, moves its option
//! blob under the Time key, then walks every referenced row and retags cells
//! stamped with the stale type.
//!
//! Each step is its own mutation batch: the field pass, one batch per row,
//! and the version bump. A run that fails part way leaves earlier batches in
//! place; every correction is idempotent, so running again is always safe.

mod loader;

pub use loader::{InMemoryRowDocumentLoader, RowDocumentLoader, row_document_key};

use loro::{LoroMap, LoroValue, ValueOrContainer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabula_api::{DatabaseError, FieldType, TARGET_SCHEMA_VERSION};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::collector::collect_row_ids;
use crate::config::MigrationOptions;
use crate::database::{cells_map, database_map, into_database_error, read_schema_version};
use crate::parsers::has_canonical_rollup_keys;
use crate::resolver::type_option_key;
use crate::schema::{
    CELL_FIELD_TYPE, CELL_SOURCE_FIELD_TYPE, FIELD_TYPE, FIELDS, ID, LoroMapExt, METAS,
    SCHEMA_VERSION, TYPE_OPTION, as_map, insert_json, value_or_container_to_json,
};
use crate::sync::ReplicatedDoc;

const ROLLUP: i64 = FieldType::Rollup.tag();
const TIME: i64 = FieldType::Time.tag();

/// Work done by one migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Fields retagged from Rollup to Time.
    pub fields_corrected: usize,
    /// Row documents loaded and scanned.
    pub rows_visited: usize,
    /// Cells with at least one stamp rewritten.
    pub cells_corrected: usize,
    /// Whether the target schema version was written.
    pub version_committed: bool,
}

enum FieldPass {
    Skipped(&'static str),
    Done {
        field_types: HashMap<String, i64>,
        fields_corrected: usize,
        row_ids: Vec<String>,
    },
}

/// Migrate `doc` to the current schema version.
///
/// Returns `Ok(true)` when migration work was performed and `Ok(false)` when
/// the document is not a database, has no fields, or is already current.
/// Without a loader only field definitions are corrected.
///
/// Loader failures propagate. Fields and rows fixed before the failure stay
/// fixed and the schema version is not bumped, so the next run retries.
pub async fn migrate(
    doc: &ReplicatedDoc,
    loader: Option<&dyn RowDocumentLoader>,
    options: MigrationOptions,
) -> Result<bool, DatabaseError> {
    Ok(migrate_with_report(doc, loader, options).await?.is_some())
}

/// [`migrate`], returning what was done. `None` means nothing to do.
pub async fn migrate_with_report(
    doc: &ReplicatedDoc,
    loader: Option<&dyn RowDocumentLoader>,
    options: MigrationOptions,
) -> Result<Option<MigrationReport>, DatabaseError> {
    let span = info_span!("database.migrate", doc_id = %doc.doc_id());
    run(doc, loader, options).instrument(span).await
}

async fn run(
    doc: &ReplicatedDoc,
    loader: Option<&dyn RowDocumentLoader>,
    options: MigrationOptions,
) -> Result<Option<MigrationReport>, DatabaseError> {
    let MigrationOptions {
        row_ids: requested_rows,
        commit_version,
    } = options;

    let pass = doc
        .with_write(|d| correct_fields(d, requested_rows))
        .await
        .map_err(into_database_error)?;

    let (field_types, fields_corrected, row_ids) = match pass {
        FieldPass::Skipped(reason) => {
            debug!("Skipping migration of '{}': {}", doc.doc_id(), reason);
            return Ok(None);
        }
        FieldPass::Done {
            field_types,
            fields_corrected,
            row_ids,
        } => (field_types, fields_corrected, row_ids),
    };

    info!(
        "Migrating '{}': {} field(s) corrected, {} row(s) to scan",
        doc.doc_id(),
        fields_corrected,
        row_ids.len()
    );

    let mut report = MigrationReport {
        fields_corrected,
        ..Default::default()
    };

    if let Some(loader) = loader {
        for row_id in &row_ids {
            let key = row_document_key(doc.doc_id(), row_id);
            let row_doc = loader.load_row_document(&key).await.inspect_err(|e| {
                warn!("Migration of '{}' stopped at row '{}': {}", doc.doc_id(), row_id, e);
            })?;
            let corrected = row_doc
                .with_write(|d| {
                    let Some(cells) = cells_map(d) else {
                        return Ok(0);
                    };
                    correct_cells(&cells, &field_types)
                })
                .await
                .map_err(into_database_error)?;
            debug!("Row '{}': {} cell(s) corrected", row_id, corrected);
            report.rows_visited += 1;
            report.cells_corrected += corrected;
        }
    }

    if commit_version {
        report.version_committed = doc
            .with_write(|d| {
                let Some(database) = database_map(d) else {
                    return Ok(false);
                };
                let metas = database.ensure_child_map(METAS)?;
                if read_schema_version(&database) < TARGET_SCHEMA_VERSION {
                    metas.insert(SCHEMA_VERSION, TARGET_SCHEMA_VERSION)?;
                }
                Ok(true)
            })
            .await
            .map_err(into_database_error)?;
    }

    info!(
        "Migrated '{}': {} field(s), {} row(s) visited, {} cell(s) corrected, version committed: {}",
        doc.doc_id(),
        report.fields_corrected,
        report.rows_visited,
        report.cells_corrected,
        report.version_committed
    );
    Ok(Some(report))
}

/// The field pass. Runs inside a single mutation batch.
fn correct_fields(
    doc: &loro::LoroDoc,
    requested_rows: Option<Vec<String>>,
) -> anyhow::Result<FieldPass> {
    let Some(database) = database_map(doc) else {
        return Ok(FieldPass::Skipped("no database"));
    };
    database.ensure_child_map(METAS)?;
    let version = read_schema_version(&database);
    if version >= TARGET_SCHEMA_VERSION {
        return Ok(FieldPass::Skipped("already at target version"));
    }
    let Some(fields) = database.child_map(FIELDS) else {
        return Ok(FieldPass::Skipped("no fields"));
    };

    let mut field_types = HashMap::new();
    let mut fields_corrected = 0;
    for (key, value) in fields.entries() {
        let Some(field) = as_map(&value) else {
            continue;
        };
        let Some(field_id) = field.get_string(ID).filter(|id| !id.is_empty()) else {
            debug!("Skipping field entry '{}' without an id", key);
            continue;
        };
        let mut field_type = field
            .get_i64(FIELD_TYPE)
            .unwrap_or(FieldType::RichText.tag());
        if field_type == ROLLUP && retag_as_time(&field)? {
            info!("Field '{}' retagged from Rollup to Time", field_id);
            field_type = TIME;
            fields_corrected += 1;
        }
        field_types.insert(field_id, field_type);
    }

    let row_ids = requested_rows.unwrap_or_else(|| collect_row_ids(&database));
    Ok(FieldPass::Done {
        field_types,
        fields_corrected,
        row_ids,
    })
}

/// Retag a Rollup field whose option carries no Rollup keys. Returns whether
/// the field was changed.
///
/// A field with no Rollup-keyed option at all counts as misclassified; it is
/// retagged and nothing is moved.
fn retag_as_time(field: &LoroMap) -> anyhow::Result<bool> {
    let type_options = field.child_map(TYPE_OPTION);
    let rollup_key = type_option_key(ROLLUP);
    let blob = type_options.as_ref().and_then(|t| t.get_json(&rollup_key));

    if let Some(serde_json::Value::Object(option)) = &blob
        && has_canonical_rollup_keys(option)
    {
        return Ok(false);
    }

    if let (Some(type_options), Some(blob)) = (type_options, blob) {
        insert_json(&type_options, &type_option_key(TIME), &blob)?;
        type_options.delete(&rollup_key)?;
    }
    field.insert(FIELD_TYPE, TIME)?;
    Ok(true)
}

/// Stamp value after correction, if it needs one.
fn corrected_stamp(stamp: Option<i64>, expected: i64) -> Option<i64> {
    (stamp == Some(ROLLUP) && expected == TIME).then_some(TIME)
}

/// Correct the stamps of every cell in one row. Returns the number of cells
/// changed.
fn correct_cells(cells: &LoroMap, field_types: &HashMap<String, i64>) -> anyhow::Result<usize> {
    let mut corrected = 0;
    for (field_id, value) in cells.entries() {
        let Some(&expected) = field_types.get(&field_id) else {
            continue;
        };
        match value {
            ValueOrContainer::Container(_) => {
                let Some(cell) = as_map(&value) else {
                    continue;
                };
                let mut changed = false;
                for key in [CELL_FIELD_TYPE, CELL_SOURCE_FIELD_TYPE] {
                    if let Some(tag) = corrected_stamp(cell.get_i64(key), expected) {
                        cell.insert(key, tag)?;
                        changed = true;
                    }
                }
                corrected += usize::from(changed);
            }
            ValueOrContainer::Value(LoroValue::Map(_)) => {
                let mut json = value_or_container_to_json(value);
                let Some(cell) = json.as_object_mut() else {
                    continue;
                };
                let mut changed = false;
                for key in [CELL_FIELD_TYPE, CELL_SOURCE_FIELD_TYPE] {
                    let stamp = cell.get(key).and_then(serde_json::Value::as_i64);
                    if let Some(tag) = corrected_stamp(stamp, expected) {
                        cell.insert(key.to_string(), tag.into());
                        changed = true;
                    }
                }
                if changed {
                    insert_json(cells, &field_id, &json)?;
                    corrected += 1;
                }
            }
            ValueOrContainer::Value(_) => {}
        }
    }
    Ok(corrected)
}
