use tabula_api::{PersonCellData, PersonTypeOption, TypeOptionData};

use super::{decode_payload, string_items};

/// Decode a Person cell: a list of user ids, either bare or under `persons`.
pub fn parse_person_cell(data: Option<&serde_json::Value>) -> PersonCellData {
    let persons = match decode_payload(data) {
        Some(serde_json::Value::Array(items)) => string_items(&serde_json::Value::Array(items)),
        Some(serde_json::Value::Object(obj)) => {
            obj.get("persons").map(string_items).unwrap_or_default()
        }
        _ => Vec::new(),
    };
    PersonCellData { persons }
}

pub fn parse_person_type_option(type_option: Option<&TypeOptionData>) -> PersonTypeOption {
    let flag = |key: &str| {
        type_option
            .and_then(|t| t.get(key))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    };
    PersonTypeOption {
        is_single: flag("is_single"),
        fill_with_creator: flag("fill_with_creator"),
    }
}
