//! Decoding helpers for backend documents.
//!
//! The backend is loose about timestamps: depending on which path wrote
//! a record, a date field arrives as a `{seconds, nanoseconds}` map, an
//! ISO-8601 string, or a plain epoch-milliseconds number. Everything is
//! normalized to epoch milliseconds here, at the decode boundary, so no
//! other layer ever inspects timestamp shapes.

use chrono::DateTime;
use serde_json::Value;

use super::source::Document;

/// Normalize any of the backend's timestamp shapes to epoch millis.
pub fn epoch_millis(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
    Value::String(s) => DateTime::parse_from_rfc3339(s)
      .ok()
      .map(|dt| dt.timestamp_millis()),
    Value::Object(map) => {
      let seconds = map.get("seconds").and_then(Value::as_i64)?;
      let nanos = map.get("nanoseconds").and_then(Value::as_i64).unwrap_or(0);
      Some(seconds * 1_000 + nanos / 1_000_000)
    }
    _ => None,
  }
}

pub fn string_field(doc: &Document, name: &str) -> Option<String> {
  doc.field(name).and_then(Value::as_str).map(str::to_owned)
}

pub fn u64_field(doc: &Document, name: &str) -> Option<u64> {
  doc.field(name).and_then(Value::as_u64)
}

/// A timestamp field in any wire shape, as epoch millis.
pub fn millis_field(doc: &Document, name: &str) -> Option<i64> {
  doc.field(name).and_then(epoch_millis)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_epoch_millis_from_number() {
    assert_eq!(epoch_millis(&json!(1700000000000i64)), Some(1700000000000));
    assert_eq!(epoch_millis(&json!(1700000000000.0)), Some(1700000000000));
  }

  #[test]
  fn test_epoch_millis_from_iso_string() {
    assert_eq!(
      epoch_millis(&json!("2023-11-14T22:13:20Z")),
      Some(1700000000000)
    );
    assert_eq!(
      epoch_millis(&json!("2023-11-14T23:13:20+01:00")),
      Some(1700000000000)
    );
  }

  #[test]
  fn test_epoch_millis_from_seconds_map() {
    assert_eq!(
      epoch_millis(&json!({"seconds": 1700000000, "nanoseconds": 500000000})),
      Some(1700000000500)
    );
    // Missing nanoseconds defaults to zero.
    assert_eq!(
      epoch_millis(&json!({"seconds": 1700000000})),
      Some(1700000000000)
    );
  }

  #[test]
  fn test_epoch_millis_rejects_junk() {
    assert_eq!(epoch_millis(&json!("tomorrow")), None);
    assert_eq!(epoch_millis(&json!(null)), None);
    assert_eq!(epoch_millis(&json!({"sec": 12})), None);
    assert_eq!(epoch_millis(&json!([1700000000])), None);
  }

  #[test]
  fn test_document_field_helpers() {
    let doc: Document = serde_json::from_value(json!({
      "id": "a1",
      "title": "Ohm's law revisited",
      "views": 42,
      "createdAt": "2023-11-14T22:13:20Z",
    }))
    .unwrap();

    assert_eq!(string_field(&doc, "title").as_deref(), Some("Ohm's law revisited"));
    assert_eq!(u64_field(&doc, "views"), Some(42));
    assert_eq!(millis_field(&doc, "createdAt"), Some(1700000000000));
    assert_eq!(string_field(&doc, "missing"), None);
  }
}
