use serde::{Deserialize, Serialize};

use crate::field_type::{DateFormat, TimeFormat};

/// Date/time formats the signed-in user picked in their settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserDateTimePreference {
    pub date_format: Option<DateFormat>,
    pub time_format: Option<TimeFormat>,
}

impl UserDateTimePreference {
    pub fn new(date_format: Option<DateFormat>, time_format: Option<TimeFormat>) -> Self {
        Self {
            date_format,
            time_format,
        }
    }

    /// Read the preference out of the user's stored metadata object.
    ///
    /// Unknown codes and non-numeric values are dropped rather than rejected.
    pub fn from_metadata(metadata: &serde_json::Value) -> Self {
        let code = |key: &str| metadata.get(key).and_then(serde_json::Value::as_i64);
        Self {
            date_format: code("date_format").and_then(DateFormat::from_code),
            time_format: code("time_format").and_then(TimeFormat::from_code),
        }
    }
}
