//! Normalization of raw listing and stat shapes.
//!
//! Each primitive result is passed through one of these functions immediately
//! after the call, so downstream code only ever sees names and [`RemoteStat`].

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Values above this are nanoseconds since the epoch rather than seconds.
const NANOS_THRESHOLD: i64 = 100_000_000_000_000;

/// Normalized metadata for a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteStat {
    /// File size in bytes.
    pub size: u64,
    /// Last modification time, if reported.
    pub modified: Option<DateTime<Utc>>,
    /// Creation time, if reported.
    pub created: Option<DateTime<Utc>>,
}

/// Returns true for names that never denote a real entry.
#[must_use]
pub fn is_pseudo_entry(name: &str) -> bool {
    matches!(name, "" | "." | "..")
}

/// Extracts the entry name from a single raw listing item.
///
/// Accepts plain strings, records carrying a `name` or `filename` field, and
/// scalars. Anything else yields `None`.
#[must_use]
pub fn normalize_entry(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("filename"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(_) | Value::Null | Value::Array(_) => None,
    }
}

/// Normalizes a raw directory listing into entry names.
///
/// Accepts a bare array or an object wrapping an `entries` array. Returns
/// `None` for any other shape. Self, parent, and empty names are dropped.
#[must_use]
pub fn normalize_listing(raw: &Value) -> Option<Vec<String>> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(map) => map.get("entries")?.as_array()?,
        _ => return None,
    };
    Some(
        items
            .iter()
            .filter_map(normalize_entry)
            .filter(|name| !is_pseudo_entry(name))
            .collect(),
    )
}

/// Normalizes a raw stat record.
///
/// Reads `st_size`, `st_mtime` and `st_birthtime`. Missing size is 0 and
/// missing times are `None`. Returns `None` if the record is not an object.
#[must_use]
pub fn normalize_stat(raw: &Value) -> Option<RemoteStat> {
    let map = raw.as_object()?;
    let size = map.get("st_size").and_then(parse_size).unwrap_or(0);
    Some(RemoteStat {
        size,
        modified: map.get("st_mtime").and_then(parse_timestamp),
        created: map.get("st_birthtime").and_then(parse_timestamp),
    })
}

fn parse_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn from_epoch_integer(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    if raw >= NANOS_THRESHOLD {
        return Some(DateTime::from_timestamp_nanos(raw));
    }
    DateTime::from_timestamp(raw, 0)
}

#[allow(clippy::cast_possible_truncation)]
fn from_epoch_float(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Parses a timestamp in seconds, nanoseconds, or RFC 3339 form.
///
/// Zero and negative values mean "not reported".
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map_or_else(|| n.as_f64().and_then(from_epoch_float), from_epoch_integer),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().map_or_else(
                |_| {
                    DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                },
                from_epoch_integer,
            )
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_listing() {
        let raw = json!(["IMG_0001.JPG", ".", "..", "", "100APPLE"]);
        assert_eq!(
            normalize_listing(&raw),
            Some(vec!["IMG_0001.JPG".to_string(), "100APPLE".to_string()])
        );
    }

    #[test]
    fn wrapped_record_listing() {
        let raw = json!({"entries": [{"name": "a.jpg"}, {"filename": "b.mov"}, {"size": 3}]});
        assert_eq!(
            normalize_listing(&raw),
            Some(vec!["a.jpg".to_string(), "b.mov".to_string()])
        );
    }

    #[test]
    fn record_named_dot_is_filtered() {
        let raw = json!([{"name": "."}, {"filename": ".."}, {"name": "x"}]);
        assert_eq!(normalize_listing(&raw), Some(vec!["x".to_string()]));
    }

    #[test]
    fn name_takes_precedence_over_filename() {
        assert_eq!(
            normalize_entry(&json!({"name": "a", "filename": "b"})),
            Some("a".to_string())
        );
    }

    #[test]
    fn unknown_shapes_are_none() {
        assert_eq!(normalize_listing(&json!("DCIM")), None);
        assert_eq!(normalize_listing(&json!({"items": []})), None);
        assert_eq!(normalize_listing(&Value::Null), None);
    }

    #[test]
    fn empty_listing_is_some() {
        assert_eq!(normalize_listing(&json!([])), Some(vec![]));
    }

    #[test]
    fn stat_with_all_fields() {
        let raw = json!({"st_size": 2048, "st_mtime": 1_700_000_000, "st_birthtime": "1600000000"});
        let stat = normalize_stat(&raw).unwrap();
        assert_eq!(stat.size, 2048);
        assert_eq!(stat.modified.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(stat.created.unwrap().timestamp(), 1_600_000_000);
    }

    #[test]
    fn stat_defaults() {
        let stat = normalize_stat(&json!({})).unwrap();
        assert_eq!(stat, RemoteStat::default());
        assert_eq!(normalize_stat(&json!([1, 2])), None);
    }

    #[test]
    fn timestamp_forms() {
        let secs = 1_700_000_000_i64;
        let nanos = secs * 1_000_000_000;
        assert_eq!(parse_timestamp(&json!(nanos)).unwrap().timestamp(), secs);
        assert_eq!(parse_timestamp(&json!(1_700_000_000.5)).unwrap().timestamp(), secs);
        assert_eq!(
            parse_timestamp(&json!("2023-11-14T22:13:20Z")).unwrap().timestamp(),
            secs
        );
        assert_eq!(parse_timestamp(&json!(0)), None);
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn raw_entry() -> impl Strategy<Value = Value> {
            prop_oneof![
                "[a-zA-Z0-9._]{0,12}".prop_map(Value::String),
                Just(json!(".")),
                Just(json!("..")),
                Just(json!("")),
                "[a-zA-Z0-9._]{0,12}".prop_map(|s| json!({ "name": s })),
                "[a-zA-Z0-9._]{0,12}".prop_map(|s| json!({ "filename": s })),
                any::<u32>().prop_map(|n| json!(n)),
            ]
        }

        proptest! {
            #[test]
            fn listing_never_contains_pseudo_entries(
                items in proptest::collection::vec(raw_entry(), 0..40),
                wrapped in any::<bool>(),
            ) {
                let raw = if wrapped {
                    json!({ "entries": items })
                } else {
                    Value::Array(items)
                };
                let names = normalize_listing(&raw).unwrap();
                prop_assert!(names.iter().all(|n| !is_pseudo_entry(n)));
            }
        }
    }
}
