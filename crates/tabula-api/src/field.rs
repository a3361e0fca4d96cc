//! Snapshot types read out of a database document.
//!
//! These are plain values detached from the CRDT: reading a field or a cell
//! copies its current state, so they can be sent across threads and compared
//! in tests without holding the document lock.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::field_type::{FieldType, FieldVisibility, ViewLayout};
use crate::type_option::TypeOptionData;

/// A field's `type_option` map: sparse, keyed by the stringified type tag.
///
/// Only the entry matching the field's current tag is live. The other entries
/// are blobs left behind by earlier types and are kept so that switching back
/// restores the previous configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeOptions(BTreeMap<String, TypeOptionData>);

impl TypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_type: FieldType) -> Option<&TypeOptionData> {
        self.get_tag(field_type.tag())
    }

    pub fn get_tag(&self, tag: i64) -> Option<&TypeOptionData> {
        self.0.get(&tag.to_string())
    }

    pub fn get_key(&self, key: &str) -> Option<&TypeOptionData> {
        self.0.get(key)
    }

    pub fn insert(&mut self, field_type: FieldType, data: TypeOptionData) {
        self.0.insert(field_type.type_option_key(), data);
    }

    /// The live blob for a field currently of type `field_type`.
    pub fn active(&self, field_type: FieldType) -> Option<&TypeOptionData> {
        self.get(field_type)
    }

    /// Blobs that are not live for a field currently of type `field_type`.
    pub fn historical(
        &self,
        field_type: FieldType,
    ) -> impl Iterator<Item = (&str, &TypeOptionData)> {
        let active_key = field_type.type_option_key();
        self.0
            .iter()
            .filter(move |(key, _)| **key != active_key)
            .map(|(key, data)| (key.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, TypeOptionData)> for TypeOptions {
    fn from_iter<I: IntoIterator<Item = (String, TypeOptionData)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Field definition as stored in the database's `fields` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    /// Raw persisted tag. Kept raw so tags written by newer clients survive.
    pub type_tag: i64,
    pub is_primary: bool,
    pub visibility: FieldVisibility,
    pub type_options: TypeOptions,
}

impl Field {
    pub fn field_type(&self) -> Option<FieldType> {
        FieldType::from_tag(self.type_tag)
    }
}

/// Input for creating a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewField {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub field_type: FieldType,
    pub is_primary: bool,
    pub type_option: Option<TypeOptionData>,
}

impl NewField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: None,
            name: name.into(),
            field_type,
            is_primary: false,
            type_option: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn with_type_option(mut self, type_option: TypeOptionData) -> Self {
        self.type_option = Some(type_option);
        self
    }
}

/// Reference to a row inside a view's `row_orders` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOrder {
    pub id: String,
    pub height: i64,
}

impl RowOrder {
    pub const DEFAULT_HEIGHT: i64 = 36;

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,
    pub layout: ViewLayout,
    pub row_orders: Vec<RowOrder>,
}

/// A cell read out of a row document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub field_id: String,
    /// Type tag in effect when the cell was last written.
    pub field_type: Option<i64>,
    /// For derived types, the tag of the field the value was computed from.
    pub source_field_type: Option<i64>,
    pub data: Option<serde_json::Value>,
}

/// Input for writing a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellWrite {
    pub field_type: i64,
    pub source_field_type: Option<i64>,
    pub data: serde_json::Value,
}

impl CellWrite {
    pub fn new(field_type: FieldType, data: impl Into<serde_json::Value>) -> Self {
        Self {
            field_type: field_type.tag(),
            source_field_type: None,
            data: data.into(),
        }
    }

    pub fn with_source(mut self, source: FieldType) -> Self {
        self.source_field_type = Some(source.tag());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blob(value: serde_json::Value) -> TypeOptionData {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_type_options_keyed_by_tag() {
        let mut options = TypeOptions::new();
        options.insert(FieldType::Rollup, blob(json!({"show_as": 1})));
        options.insert(FieldType::Time, blob(json!({"time_format": 1})));

        assert!(options.get(FieldType::Rollup).is_some());
        assert!(options.get_key("13").is_some());
        assert!(options.get(FieldType::Number).is_none());

        assert_eq!(
            options.active(FieldType::Time),
            Some(&blob(json!({"time_format": 1})))
        );
        assert!(options.active(FieldType::DateTime).is_none());

        let historical: Vec<&str> = options
            .historical(FieldType::Time)
            .map(|(k, _)| k)
            .collect();
        assert_eq!(historical, vec!["16"]);
    }

    #[test]
    fn test_unknown_tag_is_not_a_field_type() {
        let field = Field {
            id: "f".to_string(),
            name: "Future".to_string(),
            type_tag: 42,
            is_primary: false,
            visibility: FieldVisibility::AlwaysShown,
            type_options: TypeOptions::new(),
        };
        assert_eq!(field.field_type(), None);
    }
}
