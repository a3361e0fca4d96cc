use tabula_api::{ChecklistCellData, SelectOption};

use super::{decode_payload, string_items};

/// Decode a Checklist cell. Options that do not decode are dropped; the
/// rest of the cell is kept.
pub fn parse_checklist_cell(data: Option<&serde_json::Value>) -> ChecklistCellData {
    let Some(serde_json::Value::Object(obj)) = decode_payload(data) else {
        return ChecklistCellData::default();
    };
    let options = obj
        .get("options")
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<SelectOption>(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    ChecklistCellData {
        options,
        selected_option_ids: obj
            .get("selected_option_ids")
            .map(string_items)
            .unwrap_or_default(),
    }
}
