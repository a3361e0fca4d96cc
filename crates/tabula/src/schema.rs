//! Container layout of database and row documents, plus Loro access helpers.
//!
//! # Database document
//!
//! ```text
//! database (root map)
//! ├── id
//! ├── fields: { <field_id>: { id, name, type, is_primary, visibility,
//! │                           type_option: { "<tag>": { ... } } } }
//! ├── views:  { <view_id>: { id, name, layout, row_orders: [ { id, height } ] } }
//! └── metas:  { schema_version }
//! ```
//!
//! # Row document
//!
//! ```text
//! row (root map)
//! ├── id, database_id, created_at, last_modified
//! └── cells: { <field_id>: { field_type, source_field_type?, data, created_at, last_modified } }
//! ```

use loro::{Container, LoroList, LoroMap, LoroValue, ValueOrContainer};

// Database document
pub const DATABASE: &str = "database";
pub const FIELDS: &str = "fields";
pub const VIEWS: &str = "views";
pub const METAS: &str = "metas";
pub const SCHEMA_VERSION: &str = "schema_version";

// Shared keys
pub const ID: &str = "id";
pub const NAME: &str = "name";

// Field map
pub const FIELD_TYPE: &str = "type";
pub const IS_PRIMARY: &str = "is_primary";
pub const VISIBILITY: &str = "visibility";
pub const TYPE_OPTION: &str = "type_option";

// View map
pub const LAYOUT: &str = "layout";
pub const ROW_ORDERS: &str = "row_orders";
pub const HEIGHT: &str = "height";

// Row document
pub const ROW: &str = "row";
pub const DATABASE_ID: &str = "database_id";
pub const CELLS: &str = "cells";
pub const CELL_FIELD_TYPE: &str = "field_type";
pub const CELL_SOURCE_FIELD_TYPE: &str = "source_field_type";
pub const DATA: &str = "data";
pub const CREATED_AT: &str = "created_at";
pub const LAST_MODIFIED: &str = "last_modified";

/// Helper trait for extracting typed values from Loro maps
pub(crate) trait LoroMapExt {
    /// Get a value from the map and apply a function to the LoroValue
    /// Automatically unwraps the ValueOrContainer::Value variant
    fn get_typed<T, F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&LoroValue) -> Option<T>;

    fn get_string(&self, key: &str) -> Option<String> {
        self.get_typed(key, |val| val.as_string().map(|s| s.to_string()))
    }

    /// Integers written by other clients sometimes arrive as doubles.
    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_typed(key, |val| match val {
            LoroValue::I64(i) => Some(*i),
            LoroValue::Double(d) if d.is_finite() && d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        })
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_typed(key, |val| val.as_bool().copied())
    }

    /// Child map container stored under `key`.
    fn child_map(&self, key: &str) -> Option<LoroMap>;

    /// Child list container stored under `key`.
    fn child_list(&self, key: &str) -> Option<LoroList>;

    /// Child map under `key`, created when missing.
    fn ensure_child_map(&self, key: &str) -> anyhow::Result<LoroMap>;

    /// Value under `key` converted to JSON, following containers deeply.
    fn get_json(&self, key: &str) -> Option<serde_json::Value>;

    /// Snapshot of every entry. Taken before mutating entries, since writes
    /// must not happen from inside `for_each`.
    fn entries(&self) -> Vec<(String, ValueOrContainer)>;
}

impl LoroMapExt for LoroMap {
    fn get_typed<T, F>(&self, key: &str, f: F) -> Option<T>
    where
        F: FnOnce(&LoroValue) -> Option<T>,
    {
        self.get(key).and_then(|v| match v {
            ValueOrContainer::Value(val) => f(&val),
            _ => None,
        })
    }

    fn child_map(&self, key: &str) -> Option<LoroMap> {
        match self.get(key) {
            Some(ValueOrContainer::Container(Container::Map(m))) => Some(m),
            _ => None,
        }
    }

    fn child_list(&self, key: &str) -> Option<LoroList> {
        match self.get(key) {
            Some(ValueOrContainer::Container(Container::List(l))) => Some(l),
            _ => None,
        }
    }

    fn ensure_child_map(&self, key: &str) -> anyhow::Result<LoroMap> {
        match self.get(key) {
            Some(ValueOrContainer::Container(Container::Map(m))) => Ok(m),
            Some(_) => Err(anyhow::anyhow!("Entry '{}' is not a map", key)),
            None => Ok(self.insert_container(key, LoroMap::new())?),
        }
    }

    fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        self.get(key).map(value_or_container_to_json)
    }

    fn entries(&self) -> Vec<(String, ValueOrContainer)> {
        let mut entries = Vec::new();
        self.for_each(|k, v| entries.push((k.to_string(), v)));
        entries
    }
}

/// Helper trait for collecting and searching values in Loro lists
pub(crate) trait LoroListExt {
    /// Collect values by applying a function to each element, keeping only Some results
    fn collect_map<T, F>(&self, f: F) -> Vec<T>
    where
        F: FnMut(ValueOrContainer) -> Option<T>;

    /// Find the index of the first element where the function returns Some(true)
    fn find_index<F>(&self, f: F) -> Option<usize>
    where
        F: FnMut(ValueOrContainer) -> Option<bool>;
}

impl LoroListExt for LoroList {
    fn collect_map<T, F>(&self, mut f: F) -> Vec<T>
    where
        F: FnMut(ValueOrContainer) -> Option<T>,
    {
        let mut result = Vec::new();
        self.for_each(|v| {
            if let Some(value) = f(v) {
                result.push(value);
            }
        });
        result
    }

    fn find_index<F>(&self, mut f: F) -> Option<usize>
    where
        F: FnMut(ValueOrContainer) -> Option<bool>,
    {
        let mut index = 0;
        let mut found = None;
        self.for_each(|v| {
            if found.is_none()
                && let Some(true) = f(v)
            {
                found = Some(index);
            }
            index += 1;
        });
        found
    }
}

/// Map container stored directly as a value-or-container, if it is one.
pub(crate) fn as_map(v: &ValueOrContainer) -> Option<LoroMap> {
    match v {
        ValueOrContainer::Container(Container::Map(m)) => Some(m.clone()),
        _ => None,
    }
}

pub(crate) fn value_or_container_to_json(v: ValueOrContainer) -> serde_json::Value {
    match v {
        ValueOrContainer::Value(val) => loro_to_json(&val),
        ValueOrContainer::Container(container) => match container {
            Container::Map(m) => loro_to_json(&m.get_deep_value()),
            Container::List(l) => loro_to_json(&l.get_deep_value()),
            Container::MovableList(l) => loro_to_json(&l.get_deep_value()),
            Container::Text(t) => serde_json::Value::String(t.to_string()),
            _ => serde_json::Value::Null,
        },
    }
}

/// Convert a Loro value to JSON. Binary blobs and dangling container ids have
/// no JSON form and become `null`; so do non-finite doubles.
pub(crate) fn loro_to_json(value: &LoroValue) -> serde_json::Value {
    match value {
        LoroValue::Null => serde_json::Value::Null,
        LoroValue::Bool(b) => serde_json::Value::Bool(*b),
        LoroValue::I64(i) => serde_json::Value::from(*i),
        LoroValue::Double(d) => serde_json::Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        LoroValue::String(s) => serde_json::Value::String(s.to_string()),
        LoroValue::List(items) => {
            serde_json::Value::Array(items.iter().map(loro_to_json).collect())
        }
        LoroValue::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), loro_to_json(v)))
                .collect(),
        ),
        LoroValue::Binary(_) | LoroValue::Container(_) => serde_json::Value::Null,
    }
}

fn json_scalar_to_loro(value: &serde_json::Value) -> LoroValue {
    match value {
        serde_json::Value::Bool(b) => LoroValue::from(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => LoroValue::from(i),
            None => LoroValue::from(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => LoroValue::from(s.as_str()),
        _ => LoroValue::Null,
    }
}

/// Write a JSON value under `key`. Objects and arrays become nested map and
/// list containers so collaborators can merge edits to individual entries.
pub(crate) fn insert_json(map: &LoroMap, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            let child = map.insert_container(key, LoroMap::new())?;
            for (k, v) in obj {
                insert_json(&child, k, v)?;
            }
        }
        serde_json::Value::Array(items) => {
            let list = map.insert_container(key, LoroList::new())?;
            for item in items {
                push_json(&list, item)?;
            }
        }
        scalar => map.insert(key, json_scalar_to_loro(scalar))?,
    }
    Ok(())
}

fn push_json(list: &LoroList, value: &serde_json::Value) -> anyhow::Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            let child = list.insert_container(list.len(), LoroMap::new())?;
            for (k, v) in obj {
                insert_json(&child, k, v)?;
            }
        }
        serde_json::Value::Array(items) => {
            let nested = list.insert_container(list.len(), LoroList::new())?;
            for item in items {
                push_json(&nested, item)?;
            }
        }
        scalar => list.push(json_scalar_to_loro(scalar))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loro::LoroDoc;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_through_containers() -> anyhow::Result<()> {
        let doc = LoroDoc::new();
        let root = doc.get_map("root");
        let value = json!({
            "relation_field_id": "f2",
            "calculation_type": 3,
            "ratio": 0.5,
            "tags": ["a", {"nested": true}],
        });
        insert_json(&root, "blob", &value)?;
        doc.commit();

        assert!(root.child_map("blob").is_some());
        assert_eq!(root.get_json("blob"), Some(value));
        Ok(())
    }

    #[test]
    fn test_get_i64_accepts_integral_doubles() -> anyhow::Result<()> {
        let doc = LoroDoc::new();
        let map = doc.get_map("m");
        map.insert("int", 16i64)?;
        map.insert("double", 13.0f64)?;
        map.insert("fraction", 1.5f64)?;
        map.insert("text", "16")?;

        assert_eq!(map.get_i64("int"), Some(16));
        assert_eq!(map.get_i64("double"), Some(13));
        assert_eq!(map.get_i64("fraction"), None);
        assert_eq!(map.get_i64("text"), None);
        assert_eq!(map.get_i64("missing"), None);
        Ok(())
    }

    #[test]
    fn test_ensure_child_map_reuses_existing() -> anyhow::Result<()> {
        let doc = LoroDoc::new();
        let root = doc.get_map("root");
        let first = root.ensure_child_map("metas")?;
        first.insert("schema_version", 1i64)?;
        let second = root.ensure_child_map("metas")?;
        assert_eq!(second.get_i64("schema_version"), Some(1));

        root.insert("scalar", 1i64)?;
        assert!(root.ensure_child_map("scalar").is_err());
        Ok(())
    }

    #[test]
    fn test_find_index_and_collect() -> anyhow::Result<()> {
        let doc = LoroDoc::new();
        let list = doc.get_list("l");
        for id in ["a", "b", "c"] {
            list.push(id)?;
        }
        let as_str = |v: ValueOrContainer| match v {
            ValueOrContainer::Value(val) => val.as_string().map(|s| s.to_string()),
            _ => None,
        };
        assert_eq!(list.collect_map(as_str), vec!["a", "b", "c"]);
        assert_eq!(
            list.find_index(|v| as_str(v).map(|s| s == "b")),
            Some(1)
        );
        Ok(())
    }
}
