//! Record addressing and value coercion
//!
//! Records are opaque JSON objects. Fields are addressed with dot-paths such as
//! `work.department`; arrays are valid leaf values. The coercion helpers here define how a
//! leaf is read as text, as a number, or as a date, and are shared by the query engine and
//! the edit controller so both sides agree on the same rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// A single row of the collection
pub type Record = Value;

/// Resolve a dot-path. Missing segments and explicit `null` both resolve to `None`.
pub fn get_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::Null => None,
        value => Some(value),
    }
}

/// Write a value at a dot-path, creating intermediate objects as needed.
///
/// Non-object intermediates are replaced by objects.
pub fn set_path(record: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = record;
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Render a value the way a JavaScript `String(v)` would
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(format_number).unwrap_or_default()
            }
        }
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Whole floats render without a fractional part
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Primary key of a record rendered as a string, if present
pub fn record_id(record: &Value, id_key: &str) -> Option<String> {
    get_path(record, id_key).map(value_to_text)
}

/// Numeric reading of a value. Empty strings, booleans and non-finite values are not numbers.
pub fn value_to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Millisecond timestamp of a date-like string.
///
/// Date-like means the text contains `-` and parses as a date or date-time. Naive values are
/// read as UTC.
pub fn parse_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if !s.contains('-') {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    const DATETIME_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ndt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().timestamp_millis())
}

/// Date reading of a value. Only strings can be date-like.
pub fn value_to_date(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_date(s),
        _ => None,
    }
}

/// Numeric key used by ordered comparisons: a timestamp for date-like values, else the number
pub fn comparable(value: &Value) -> Option<f64> {
    value_to_date(value)
        .map(|ts| ts as f64)
        .or_else(|| value_to_number(value))
}

/// Same, for a raw operand string
pub fn comparable_str(s: &str) -> Option<f64> {
    parse_date(s).map(|ts| ts as f64).or_else(|| parse_number(s))
}

/// Flatten a leaf into lowercase text tokens. Arrays contribute one token per non-null item.
pub fn leaf_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .flat_map(leaf_tokens)
            .collect(),
        other => vec![value_to_text(other).to_lowercase()],
    }
}

/// Structural equality where numbers compare by value (`1` equals `1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// All leaf values of a record, depth first. Used by the local search path.
pub fn collect_leaves<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_leaves(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_leaves(v, out)),
        Value::Null => {}
        leaf => out.push(leaf),
    }
}
