//! Per-type decoders from stored values to typed structures.
//!
//! Every decoder is total: absent or malformed input yields the type's
//! empty default, never an error or a panic. They run on every cell read,
//! so they do no I/O and keep no state.
//!
//! Cell payloads reach the decoders as JSON. Clients have stored the same
//! payload both as a JSON-encoded string and as nested containers, so each
//! decoder first normalises through [`decode_payload`].

mod checklist;
mod date;
mod file_media;
mod number;
mod person;
mod relation;
mod rollup;
mod select;

pub use checklist::parse_checklist_cell;
pub use date::{format_date_cell, parse_date_cell};
pub use file_media::parse_file_media_cell;
pub use number::{
    MAX_NUMBER_SCALE, format_number_cell, parse_number_cell, parse_number_cell_with_format,
    parse_number_type_option,
};
pub use person::{parse_person_cell, parse_person_type_option};
pub use relation::{parse_relation_cell, parse_relation_type_option};
pub use rollup::{has_canonical_rollup_keys, parse_rollup_type_option};
pub use select::{parse_select_cell, parse_select_type_option};

use serde::de::DeserializeOwned;

/// Normalise a stored payload: strings holding JSON are parsed, other
/// values are used as they are. Empty strings and `null` count as absent.
pub fn decode_payload(value: Option<&serde_json::Value>) -> Option<serde_json::Value> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => serde_json::from_str(s).ok(),
        other => Some(other.clone()),
    }
}

/// Deserialize a payload into `T`, falling back to `T::default()`.
pub(crate) fn decode_or_default<T>(value: Option<&serde_json::Value>) -> T
where
    T: DeserializeOwned + Default,
{
    decode_payload(value)
        .and_then(|json| serde_json::from_value(json).ok())
        .unwrap_or_default()
}

/// Strings out of a JSON array; non-string items are dropped.
pub(crate) fn string_items(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
