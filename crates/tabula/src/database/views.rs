//! Views and their ordered `row_orders` lists.

use loro::{LoroList, LoroMap, ValueOrContainer};
use tabula_api::{DatabaseError, RowOrder, View, ViewLayout};

use crate::schema::{
    HEIGHT, ID, LAYOUT, LoroListExt, LoroMapExt, NAME, ROW_ORDERS, VIEWS, as_map, loro_to_json,
};

/// Decode one `row_orders` entry.
///
/// Clients have written entries as map containers, as plain map values and
/// as JSON strings; all three are accepted. Anything else, or an entry
/// without a non-empty id, decodes to `None`.
pub(crate) fn decode_row_order(entry: ValueOrContainer) -> Option<RowOrder> {
    let json = match entry {
        ValueOrContainer::Container(loro::Container::Map(m)) => {
            let id = m.get_string(ID)?;
            let height = m.get_i64(HEIGHT).unwrap_or(RowOrder::DEFAULT_HEIGHT);
            return (!id.is_empty()).then_some(RowOrder { id, height });
        }
        ValueOrContainer::Value(loro::LoroValue::String(s)) => {
            serde_json::from_str::<serde_json::Value>(s.as_ref()).ok()?
        }
        ValueOrContainer::Value(value) => loro_to_json(&value),
        _ => return None,
    };

    let id = json.get(ID)?.as_str()?.to_string();
    if id.is_empty() {
        return None;
    }
    let height = json
        .get(HEIGHT)
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(RowOrder::DEFAULT_HEIGHT);
    Some(RowOrder { id, height })
}

pub(crate) fn read_row_orders(view_map: &LoroMap) -> Vec<RowOrder> {
    view_map
        .child_list(ROW_ORDERS)
        .map(|list| list.collect_map(decode_row_order))
        .unwrap_or_default()
}

pub(crate) fn read_views(database: &LoroMap) -> Vec<View> {
    let Some(views) = database.child_map(VIEWS) else {
        return Vec::new();
    };
    let mut result: Vec<View> = views
        .entries()
        .into_iter()
        .filter_map(|(key, v)| {
            let view_map = as_map(&v)?;
            Some(View {
                id: view_map.get_string(ID).unwrap_or(key),
                name: view_map.get_string(NAME).unwrap_or_default(),
                layout: ViewLayout::from_code(view_map.get_i64(LAYOUT).unwrap_or(0)),
                row_orders: read_row_orders(&view_map),
            })
        })
        .collect();
    result.sort_by(|a, b| a.id.cmp(&b.id));
    result
}

fn view_map(database: &LoroMap, view_id: &str) -> anyhow::Result<LoroMap> {
    database
        .child_map(VIEWS)
        .and_then(|views| views.child_map(view_id))
        .ok_or_else(|| {
            anyhow::anyhow!(DatabaseError::ViewNotFound {
                id: view_id.to_string()
            })
        })
}

fn row_orders_list(view: &LoroMap) -> anyhow::Result<LoroList> {
    match view.get(ROW_ORDERS) {
        Some(ValueOrContainer::Container(loro::Container::List(list))) => Ok(list),
        Some(_) => Err(anyhow::anyhow!("row_orders is not a list")),
        None => Ok(view.insert_container(ROW_ORDERS, LoroList::new())?),
    }
}

fn position_of(list: &LoroList, row_id: &str) -> Option<usize> {
    list.find_index(|v| decode_row_order(v).map(|order| order.id == row_id))
}

fn insert_row_order(list: &LoroList, index: usize, order: &RowOrder) -> anyhow::Result<()> {
    let entry = list.insert_container(index, LoroMap::new())?;
    entry.insert(ID, order.id.as_str())?;
    entry.insert(HEIGHT, order.height)?;
    Ok(())
}

pub(crate) fn create_view(
    database: &LoroMap,
    view_id: &str,
    name: &str,
    layout: ViewLayout,
) -> anyhow::Result<()> {
    let views = database.ensure_child_map(VIEWS)?;
    if views.get(view_id).is_some() {
        return Err(anyhow::anyhow!(DatabaseError::InvalidOperation {
            message: format!("View {} already exists", view_id),
        }));
    }
    let view = views.insert_container(view_id, LoroMap::new())?;
    view.insert(ID, view_id)?;
    view.insert(NAME, name)?;
    view.insert(LAYOUT, layout.code())?;
    view.insert_container(ROW_ORDERS, LoroList::new())?;
    Ok(())
}

/// Append a row reference. A row already present in the view is left where it is.
pub(crate) fn append_row_order(
    database: &LoroMap,
    view_id: &str,
    row_id: &str,
) -> anyhow::Result<bool> {
    let list = row_orders_list(&view_map(database, view_id)?)?;
    if position_of(&list, row_id).is_some() {
        return Ok(false);
    }
    insert_row_order(&list, list.len(), &RowOrder::new(row_id))?;
    Ok(true)
}

pub(crate) fn remove_row_order(
    database: &LoroMap,
    view_id: &str,
    row_id: &str,
) -> anyhow::Result<bool> {
    let list = row_orders_list(&view_map(database, view_id)?)?;
    match position_of(&list, row_id) {
        Some(index) => {
            list.delete(index, 1)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Move a row directly after `after`, or to the top when `after` is `None`.
/// An `after` row that is not in the view moves the row to the end.
pub(crate) fn move_row(
    database: &LoroMap,
    view_id: &str,
    row_id: &str,
    after: Option<&str>,
) -> anyhow::Result<()> {
    let list = row_orders_list(&view_map(database, view_id)?)?;
    let index = position_of(&list, row_id).ok_or_else(|| {
        anyhow::anyhow!(DatabaseError::RowNotFound {
            id: row_id.to_string()
        })
    })?;

    let order = list
        .get(index)
        .and_then(decode_row_order)
        .unwrap_or_else(|| RowOrder::new(row_id));
    list.delete(index, 1)?;

    let target = match after {
        None => 0,
        Some(after_id) => position_of(&list, after_id)
            .map(|i| i + 1)
            .unwrap_or(list.len()),
    };
    insert_row_order(&list, target, &order)
}
