//! Distinct value extraction for facet lists

use std::collections::HashSet;

use serde_json::Value;
use ztable_core::{SortDirection, get_path};

use crate::compare_values;

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Distinct values of `field` across the collection, ascending.
///
/// Array leaves are flattened and blank values (null, false, zero, empty string) are dropped.
pub fn distinct_values(records: &[Value], field: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();

    let mut push = |value: &Value| {
        if is_blank(value) {
            return;
        }
        if seen.insert(value.to_string()) {
            values.push(value.clone());
        }
    };

    for record in records {
        match get_path(record, field) {
            Some(Value::Array(items)) => items.iter().for_each(&mut push),
            Some(value) => push(value),
            None => {}
        }
    }

    values.sort_by(|a, b| compare_values(Some(a), Some(b), SortDirection::Asc));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_distinct_sorted_and_flattened() {
        let records = vec![
            json!({"work": {"department": "Sales", "skills": ["Rust", "Go"]}}),
            json!({"work": {"department": "Engineering", "skills": ["Go"]}}),
            json!({"work": {"department": "Sales", "skills": []}}),
            json!({"work": {"department": ""}}),
            json!({}),
        ];
        assert_eq!(
            distinct_values(&records, "work.department"),
            vec![json!("Engineering"), json!("Sales")]
        );
        assert_eq!(distinct_values(&records, "work.skills"), vec![json!("Go"), json!("Rust")]);
    }

    #[test]
    fn test_numbers_sort_numerically() {
        let records = vec![json!({"n": 100}), json!({"n": 9}), json!({"n": 0})];
        assert_eq!(distinct_values(&records, "n"), vec![json!(9), json!(100)]);
    }
}
