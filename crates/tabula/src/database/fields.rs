//! Field definitions inside the database's `fields` map.

use loro::LoroMap;
use tabula_api::{
    DatabaseError, Field, FieldType, FieldVisibility, NewField, TypeOptionData, TypeOptions,
};
use uuid::Uuid;

use crate::schema::{
    FIELD_TYPE, FIELDS, ID, IS_PRIMARY, LoroMapExt, NAME, TYPE_OPTION, VISIBILITY, insert_json,
    value_or_container_to_json,
};

/// Read every type-option blob of a field. Entries that are not objects
/// cannot be a type option and are left out.
pub(crate) fn read_type_options(field_map: &LoroMap) -> TypeOptions {
    let Some(type_option) = field_map.child_map(TYPE_OPTION) else {
        return TypeOptions::new();
    };
    type_option
        .entries()
        .into_iter()
        .filter_map(|(key, v)| match value_or_container_to_json(v) {
            serde_json::Value::Object(data) => Some((key, data)),
            _ => None,
        })
        .collect()
}

/// Snapshot one field map. Fields without an id are not addressable and are
/// skipped; a missing type tag reads as RichText.
pub(crate) fn read_field(field_map: &LoroMap) -> Option<Field> {
    let id = field_map.get_string(ID)?;
    Some(Field {
        id,
        name: field_map.get_string(NAME).unwrap_or_default(),
        type_tag: field_map
            .get_i64(FIELD_TYPE)
            .unwrap_or(FieldType::RichText.tag()),
        is_primary: field_map.get_bool(IS_PRIMARY).unwrap_or(false),
        visibility: FieldVisibility::from_code(field_map.get_i64(VISIBILITY).unwrap_or(0)),
        type_options: read_type_options(field_map),
    })
}

pub(crate) fn read_fields(database: &LoroMap) -> Vec<Field> {
    let Some(fields) = database.child_map(FIELDS) else {
        return Vec::new();
    };
    let mut result: Vec<Field> = fields
        .entries()
        .iter()
        .filter_map(|(_, v)| crate::schema::as_map(v))
        .filter_map(|m| read_field(&m))
        .collect();
    result.sort_by(|a, b| b.is_primary.cmp(&a.is_primary).then(a.id.cmp(&b.id)));
    result
}

pub(crate) fn field_map(database: &LoroMap, id: &str) -> anyhow::Result<LoroMap> {
    database
        .child_map(FIELDS)
        .and_then(|fields| fields.child_map(id))
        .ok_or_else(|| anyhow::anyhow!(DatabaseError::FieldNotFound { id: id.to_string() }))
}

pub(crate) fn create_field(database: &LoroMap, new_field: &NewField) -> anyhow::Result<String> {
    let id = new_field
        .id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let fields = database.ensure_child_map(FIELDS)?;
    if fields.get(&id).is_some() {
        return Err(anyhow::anyhow!(DatabaseError::InvalidOperation {
            message: format!("Field {} already exists", id),
        }));
    }

    let field_map = fields.insert_container(&id, LoroMap::new())?;
    field_map.insert(ID, id.as_str())?;
    field_map.insert(NAME, new_field.name.as_str())?;
    field_map.insert(FIELD_TYPE, new_field.field_type.tag())?;
    field_map.insert(IS_PRIMARY, new_field.is_primary)?;
    field_map.insert(VISIBILITY, FieldVisibility::AlwaysShown.code())?;

    let type_option = field_map.insert_container(TYPE_OPTION, LoroMap::new())?;
    if let Some(data) = &new_field.type_option {
        insert_json(
            &type_option,
            &new_field.field_type.type_option_key(),
            &serde_json::Value::Object(data.clone()),
        )?;
    }
    Ok(id)
}

pub(crate) fn rename_field(database: &LoroMap, id: &str, name: &str) -> anyhow::Result<()> {
    field_map(database, id)?.insert(NAME, name)?;
    Ok(())
}

pub(crate) fn set_field_visibility(
    database: &LoroMap,
    id: &str,
    visibility: FieldVisibility,
) -> anyhow::Result<()> {
    field_map(database, id)?.insert(VISIBILITY, visibility.code())?;
    Ok(())
}

/// Replace the blob stored for `field_type`. The field's current type is not
/// touched, so this can also prepare a blob ahead of a type switch.
pub(crate) fn update_type_option(
    database: &LoroMap,
    id: &str,
    field_type: FieldType,
    data: &TypeOptionData,
) -> anyhow::Result<()> {
    let type_option = field_map(database, id)?.ensure_child_map(TYPE_OPTION)?;
    insert_json(
        &type_option,
        &field_type.type_option_key(),
        &serde_json::Value::Object(data.clone()),
    )
}

/// Change a field's type. Blobs of earlier types stay in place; a blob for
/// the new type is created empty when there is none yet.
pub(crate) fn switch_field_type(
    database: &LoroMap,
    id: &str,
    field_type: FieldType,
) -> anyhow::Result<()> {
    let field = field_map(database, id)?;
    let type_option = field.ensure_child_map(TYPE_OPTION)?;
    let key = field_type.type_option_key();
    if type_option.get(&key).is_none() {
        type_option.insert_container(&key, LoroMap::new())?;
    }
    field.insert(FIELD_TYPE, field_type.tag())?;
    Ok(())
}
