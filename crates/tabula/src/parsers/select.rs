use tabula_api::{SelectCellData, SelectOption, SelectTypeOption, TypeOptionData};

use super::{decode_payload, string_items};

fn decode_options(value: Option<&serde_json::Value>) -> Vec<SelectOption> {
    value
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a select field's options.
///
/// The options usually live in a JSON string under `content`; older blobs
/// keep them directly at the top level.
pub fn parse_select_type_option(type_option: Option<&TypeOptionData>) -> SelectTypeOption {
    let Some(option) = type_option else {
        return SelectTypeOption::default();
    };
    let content = decode_payload(option.get("content"))
        .filter(serde_json::Value::is_object)
        .unwrap_or_else(|| serde_json::Value::Object(option.clone()));

    SelectTypeOption {
        options: decode_options(content.get("options")),
        disable_color: content
            .get("disable_color")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
    }
}

/// Decode a select cell: a list of ids, either as JSON or as
/// comma-separated text.
pub fn parse_select_cell(data: Option<&serde_json::Value>) -> SelectCellData {
    let option_ids = match data {
        Some(serde_json::Value::String(s)) => match decode_payload(data) {
            Some(list @ serde_json::Value::Array(_)) => string_items(&list),
            _ => s
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        },
        Some(list @ serde_json::Value::Array(_)) => string_items(list),
        _ => Vec::new(),
    };
    SelectCellData { option_ids }
}
