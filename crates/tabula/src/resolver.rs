//! Field and type-option resolution with layered fallback.
//!
//! Nothing here fails: stored data that cannot be read falls through to the
//! next source, and the last source is always a fixed default.

use tabula_api::{
    DateFormat, DateTimeFormats, DateTypeOption, Field, TimeFormat, TypeOptionData,
    UserDateTimePreference,
};

use crate::cache::WorkspaceCache;

const DATE_FORMAT: &str = "date_format";
const TIME_FORMAT: &str = "time_format";
const INCLUDE_TIME: &str = "include_time";

/// Key of the blob for `tag` in a field's `type_option` map.
pub fn type_option_key(tag: i64) -> String {
    tag.to_string()
}

/// The live type-option blob of a field: the one keyed by its current tag.
///
/// `None` when the field never stored one for its current type.
pub fn resolve_type_option(field: &Field) -> Option<&TypeOptionData> {
    field.type_options.get_key(&type_option_key(field.type_tag))
}

/// Integer code stored under `key`.
///
/// Accepts integers, integral doubles and numeric strings, since clients
/// have persisted codes in all three forms. `NaN`, fractions and anything
/// else read as absent.
fn format_code(type_option: &TypeOptionData, key: &str) -> Option<i64> {
    match type_option.get(key)? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}

/// Resolve date and time formats.
///
/// Each component independently prefers, in order: a valid code in the
/// type option, the user's stored preference, the default
/// (`DateFormat::Local`, `TimeFormat::TwelveHour`).
pub fn resolve_date_time_formats(
    type_option: Option<&TypeOptionData>,
    user: Option<&UserDateTimePreference>,
) -> DateTimeFormats {
    let date_format = type_option
        .and_then(|t| format_code(t, DATE_FORMAT))
        .and_then(DateFormat::from_code)
        .or_else(|| user.and_then(|u| u.date_format))
        .unwrap_or_default();

    let time_format = type_option
        .and_then(|t| format_code(t, TIME_FORMAT))
        .and_then(TimeFormat::from_code)
        .or_else(|| user.and_then(|u| u.time_format))
        .unwrap_or_default();

    DateTimeFormats {
        date_format,
        time_format,
    }
}

/// Full date configuration of a Date or Time field.
pub fn resolve_date_type_option(
    type_option: Option<&TypeOptionData>,
    user: Option<&UserDateTimePreference>,
) -> DateTypeOption {
    let formats = resolve_date_time_formats(type_option, user);
    DateTypeOption {
        date_format: formats.date_format,
        time_format: formats.time_format,
        include_time: type_option
            .and_then(|t| t.get(INCLUDE_TIME))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false),
    }
}

/// Resolve a field's date/time formats, reading the user preference through
/// a workspace-scoped cache. `load` runs only on a cache miss.
pub fn resolve_field_date_time_formats<F>(
    field: &Field,
    workspace_id: &str,
    cache: &WorkspaceCache<Option<UserDateTimePreference>>,
    load: F,
) -> DateTimeFormats
where
    F: FnOnce() -> Option<UserDateTimePreference>,
{
    let user = cache.get_or_insert_with(workspace_id, load);
    resolve_date_time_formats(resolve_type_option(field), user.as_ref())
}
