use tabula_api::{ROLLUP_TYPE_OPTION_KEYS, RollupTypeOption, TypeOptionData};

/// Whether a blob carries at least one key a Rollup type option defines.
pub fn has_canonical_rollup_keys(type_option: &TypeOptionData) -> bool {
    ROLLUP_TYPE_OPTION_KEYS
        .iter()
        .any(|key| type_option.contains_key(*key))
}

fn text(type_option: &TypeOptionData, key: &str) -> String {
    match type_option.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn code(type_option: &TypeOptionData, key: &str) -> i64 {
    match type_option.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

pub fn parse_rollup_type_option(type_option: Option<&TypeOptionData>) -> RollupTypeOption {
    let Some(option) = type_option else {
        return RollupTypeOption::default();
    };
    RollupTypeOption {
        relation_field_id: text(option, "relation_field_id"),
        target_field_id: text(option, "target_field_id"),
        calculation_type: code(option, "calculation_type"),
        show_as: code(option, "show_as"),
        condition_value: text(option, "condition_value"),
    }
}
