//! Typed type-option configurations.
//!
//! Each struct's `Default` is the value a parser returns when the stored blob
//! is missing or unreadable.

use serde::{Deserialize, Serialize};

use crate::cell::SelectOption;
use crate::field_type::{DateFormat, NumberFormat, TimeFormat};

/// Raw type-option blob as read from the document.
pub type TypeOptionData = serde_json::Map<String, serde_json::Value>;

/// Keys a well-formed Rollup type option carries. A Rollup-tagged field whose
/// blob has none of them was written by a client that meant Time.
pub const ROLLUP_TYPE_OPTION_KEYS: [&str; 5] = [
    "relation_field_id",
    "target_field_id",
    "calculation_type",
    "show_as",
    "condition_value",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RollupTypeOption {
    pub relation_field_id: String,
    pub target_field_id: String,
    pub calculation_type: i64,
    pub show_as: i64,
    pub condition_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateTimeFormats {
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateTypeOption {
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
    pub include_time: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberTypeOption {
    pub format: NumberFormat,
    pub scale: u32,
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonTypeOption {
    pub is_single: bool,
    pub fill_with_creator: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationTypeOption {
    pub database_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectTypeOption {
    pub options: Vec<SelectOption>,
    pub disable_color: bool,
}

impl SelectTypeOption {
    pub fn option(&self, id: &str) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.id == id)
    }
}
