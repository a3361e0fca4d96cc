use tabula_api::{FileMediaCellData, FileMediaItem};

use super::{decode_or_default, decode_payload};

/// Decode a FileMedia cell: a list of items, each either an object or a
/// JSON-encoded string. Items that do not decode are skipped.
pub fn parse_file_media_cell(data: Option<&serde_json::Value>) -> FileMediaCellData {
    let items = match decode_payload(data) {
        Some(serde_json::Value::Array(items)) => items,
        Some(serde_json::Value::Object(mut obj)) => match obj.remove("files") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    FileMediaCellData {
        files: items
            .iter()
            .filter_map(|item| decode_or_default::<Option<FileMediaItem>>(Some(item)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mixed_item_encodings() {
        let data = json!([
            {"id": "1", "file_name": "a.png", "url": "https://x/a.png", "file_type": 1},
            r#"{"id":"2","file_name":"b.pdf","url":"https://x/b.pdf","upload_type":2}"#,
            "garbage",
            {"id": "3"},
        ]);
        let cell = parse_file_media_cell(Some(&data));
        assert_eq!(cell.files.len(), 2);
        assert_eq!(cell.files[0].file_type, 1);
        assert_eq!(cell.files[1].file_name, "b.pdf");
        assert_eq!(cell.files[1].upload_type, 2);
    }

    #[test]
    fn test_wrapped_and_empty() {
        let wrapped = json!({"files": [{"id": "9", "file_name": "c", "url": "u"}]});
        assert_eq!(parse_file_media_cell(Some(&wrapped)).files[0].id, "9");
        assert!(parse_file_media_cell(None).files.is_empty());
        assert!(parse_file_media_cell(Some(&json!(3))).files.is_empty());
    }
}
