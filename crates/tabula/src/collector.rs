//! Row-reference collection across all views of a database.

use loro::{LoroDoc, LoroMap};
use std::collections::HashSet;

use crate::database::{database_map, decode_row_order};
use crate::schema::{LoroListExt, LoroMapExt, ROW_ORDERS, VIEWS, as_map};

/// Ids of every row referenced by at least one view, deduplicated.
///
/// The order is unspecified. Entries whose id cannot be decoded are skipped.
pub fn collect_row_ids(database: &LoroMap) -> Vec<String> {
    let Some(views) = database.child_map(VIEWS) else {
        return Vec::new();
    };

    let mut row_ids = HashSet::new();
    for (_, view) in views.entries() {
        let Some(row_orders) = as_map(&view).and_then(|v| v.child_list(ROW_ORDERS)) else {
            continue;
        };
        row_ids.extend(row_orders.collect_map(|entry| decode_row_order(entry).map(|o| o.id)));
    }
    row_ids.into_iter().collect()
}

/// [`collect_row_ids`] for a whole document; empty when it holds no database.
pub fn collect_row_ids_from_doc(doc: &LoroDoc) -> Vec<String> {
    database_map(doc)
        .map(|database| collect_row_ids(&database))
        .unwrap_or_default()
}
