//! Typed cell values produced by the cell parsers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonCellData {
    pub persons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationCellData {
    pub row_ids: Vec<String>,
}

/// A date cell. Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateCellData {
    pub timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub include_time: bool,
    pub is_range: bool,
    pub reminder_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectCellData {
    pub option_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChecklistCellData {
    pub options: Vec<SelectOption>,
    pub selected_option_ids: Vec<String>,
}

impl ChecklistCellData {
    /// Share of options that are checked, in `0.0..=1.0`. Selected ids that no
    /// longer name an option are ignored.
    pub fn percentage(&self) -> f64 {
        if self.options.is_empty() {
            return 0.0;
        }
        let checked = self
            .options
            .iter()
            .filter(|o| self.selected_option_ids.contains(&o.id))
            .count();
        checked as f64 / self.options.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMediaItem {
    pub id: String,
    pub file_name: String,
    pub url: String,
    #[serde(default)]
    pub file_type: i64,
    #[serde(default)]
    pub upload_type: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileMediaCellData {
    pub files: Vec<FileMediaItem>,
}
