use tabula_api::{RelationCellData, RelationTypeOption, TypeOptionData};

use super::{decode_payload, string_items};

/// Decode a Relation cell: the ids of the related rows.
pub fn parse_relation_cell(data: Option<&serde_json::Value>) -> RelationCellData {
    let row_ids = match decode_payload(data) {
        Some(value @ serde_json::Value::Array(_)) => string_items(&value),
        Some(serde_json::Value::Object(obj)) => {
            obj.get("row_ids").map(string_items).unwrap_or_default()
        }
        _ => Vec::new(),
    };
    RelationCellData { row_ids }
}

pub fn parse_relation_type_option(type_option: Option<&TypeOptionData>) -> RelationTypeOption {
    RelationTypeOption {
        database_id: type_option
            .and_then(|t| t.get("database_id"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}
