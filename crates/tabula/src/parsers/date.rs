use chrono::DateTime;
use tabula_api::{DateCellData, DateTypeOption};

use super::decode_payload;

fn timestamp(value: Option<&serde_json::Value>) -> Option<i64> {
    match value? {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> bool {
    obj.get(key)
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Decode a Date or Time cell.
///
/// Accepts either the whole cell (`data` holding the start timestamp next to
/// `end_timestamp`, `include_time`, `is_range` and `reminder_id`) or just a
/// bare timestamp in seconds.
pub fn parse_date_cell(data: Option<&serde_json::Value>) -> DateCellData {
    match decode_payload(data) {
        Some(serde_json::Value::Object(obj)) => DateCellData {
            timestamp: timestamp(obj.get("data").or_else(|| obj.get("timestamp"))),
            end_timestamp: timestamp(obj.get("end_timestamp")),
            include_time: flag(&obj, "include_time"),
            is_range: flag(&obj, "is_range"),
            reminder_id: obj
                .get("reminder_id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        Some(value) => DateCellData {
            timestamp: timestamp(Some(&value)),
            ..Default::default()
        },
        None => DateCellData::default(),
    }
}

/// Render a date cell in UTC with the resolved formats.
///
/// `None` when the cell holds no start timestamp or it is out of range. A
/// range renders as `start → end`.
pub fn format_date_cell(cell: &DateCellData, type_option: &DateTypeOption) -> Option<String> {
    let include_time = cell.include_time || type_option.include_time;
    let render = |ts: i64| {
        DateTime::from_timestamp(ts, 0).map(|dt| {
            let date = dt.format(type_option.date_format.pattern()).to_string();
            if include_time {
                format!("{} {}", date, dt.format(type_option.time_format.pattern()))
            } else {
                date
            }
        })
    };

    let start = render(cell.timestamp?)?;
    match cell.end_timestamp.filter(|_| cell.is_range).and_then(render) {
        Some(end) => Some(format!("{} → {}", start, end)),
        None => Some(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_api::{DateFormat, TimeFormat};

    const TS: i64 = 1_700_000_000;

    #[test]
    fn test_parse_date_cell_shapes() {
        assert_eq!(parse_date_cell(Some(&json!(TS))).timestamp, Some(TS));
        assert_eq!(parse_date_cell(Some(&json!("1700000000"))).timestamp, Some(TS));

        let cell = parse_date_cell(Some(&json!({
            "data": "1700000000",
            "end_timestamp": 1_700_003_600,
            "include_time": true,
            "is_range": true,
            "reminder_id": "rem",
        })));
        assert_eq!(cell.timestamp, Some(TS));
        assert_eq!(cell.end_timestamp, Some(1_700_003_600));
        assert!(cell.include_time && cell.is_range);
        assert_eq!(cell.reminder_id, "rem");

        assert_eq!(parse_date_cell(Some(&json!("tomorrow"))), DateCellData::default());
        assert_eq!(parse_date_cell(Some(&json!({"data": 1.5}))).timestamp, None);
    }

    #[test]
    fn test_format_date_cell() {
        let iso = DateTypeOption {
            date_format: DateFormat::ISO,
            time_format: TimeFormat::TwentyFourHour,
            include_time: false,
        };
        let cell = DateCellData {
            timestamp: Some(TS),
            ..Default::default()
        };
        assert_eq!(format_date_cell(&cell, &iso).as_deref(), Some("2023-11-14"));

        let with_time = DateTypeOption {
            include_time: true,
            ..iso
        };
        assert_eq!(
            format_date_cell(&cell, &with_time).as_deref(),
            Some("2023-11-14 22:13")
        );

        let twelve = DateTypeOption {
            time_format: TimeFormat::TwelveHour,
            ..with_time
        };
        assert_eq!(
            format_date_cell(&cell, &twelve).as_deref(),
            Some("2023-11-14 10:13 PM")
        );
    }

    #[test]
    fn test_format_range_and_empty() {
        let option = DateTypeOption {
            date_format: DateFormat::ISO,
            ..Default::default()
        };
        let range = DateCellData {
            timestamp: Some(TS),
            end_timestamp: Some(TS + 86_400),
            is_range: true,
            ..Default::default()
        };
        assert_eq!(
            format_date_cell(&range, &option).as_deref(),
            Some("2023-11-14 → 2023-11-15")
        );
        assert_eq!(format_date_cell(&DateCellData::default(), &option), None);
    }
}
