//! Typed, stable, single-key sorting

use std::cmp::Ordering;

use serde_json::Value;
use unicase::UniCase;
use ztable_core::{SortConfig, SortDirection, get_path, value_to_date, value_to_number, value_to_text};

/// How a non-null value takes part in ordering
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Date(i64),
    Number(f64),
    Text(String),
}

impl SortValue {
    fn classify(value: &Value) -> Self {
        if let Some(ts) = value_to_date(value) {
            return SortValue::Date(ts);
        }
        match value {
            Value::Number(_) | Value::String(_) => match value_to_number(value) {
                Some(n) => SortValue::Number(n),
                None => SortValue::Text(value_to_text(value)),
            },
            other => SortValue::Text(value_to_text(other)),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortValue::Date(_) => 0,
            SortValue::Number(_) => 1,
            SortValue::Text(_) => 2,
        }
    }
}

fn compare_classified(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
        (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
        (SortValue::Text(a), SortValue::Text(b)) => UniCase::new(a.as_str())
            .cmp(&UniCase::new(b.as_str()))
            .then_with(|| a.cmp(b)),
        (a, b) => a.rank().cmp(&b.rank()),
    }
}

/// Compare two optional values for `direction`.
///
/// Missing values sort after present ones in both directions. Date-like pairs compare by
/// timestamp, numeric pairs numerically, everything else as case-insensitive text.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_classified(&SortValue::classify(a), &SortValue::classify(b));
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Sort records in place by `config`. Unsorted configs leave the order untouched.
pub fn sort_records(records: &mut [Value], config: &SortConfig) {
    let Some(key) = config.key.as_deref() else {
        return;
    };
    records.sort_by(|a, b| compare_values(get_path(a, key), get_path(b, key), config.direction));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(records: &[Value]) -> Vec<i64> {
        records.iter().map(|r| r["id"].as_i64().unwrap_or(-1)).collect()
    }

    #[test]
    fn test_nulls_last_both_directions() {
        let mut records = vec![
            json!({"id": 1, "age": null}),
            json!({"id": 2, "age": 30}),
            json!({"id": 3}),
            json!({"id": 4, "age": 20}),
        ];
        sort_records(&mut records, &SortConfig::new("age", SortDirection::Asc));
        assert_eq!(ids(&records), vec![4, 2, 1, 3]);
        sort_records(&mut records, &SortConfig::new("age", SortDirection::Desc));
        assert_eq!(ids(&records), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let mut records = vec![json!({"id": 1, "n": 100}), json!({"id": 2, "n": 9}), json!({"id": 3, "n": "20"})];
        sort_records(&mut records, &SortConfig::new("n", SortDirection::Asc));
        assert_eq!(ids(&records), vec![2, 3, 1]);
    }

    #[test]
    fn test_dates_compare_by_timestamp() {
        let mut records = vec![
            json!({"id": 1, "d": "2023-01-10T00:00:00Z"}),
            json!({"id": 2, "d": "2022-12-31"}),
            json!({"id": 3, "d": "2023-01-02"}),
        ];
        sort_records(&mut records, &SortConfig::new("d", SortDirection::Asc));
        assert_eq!(ids(&records), vec![2, 3, 1]);
    }

    #[test]
    fn test_text_is_case_insensitive_and_stable() {
        let mut records = vec![
            json!({"id": 1, "name": "bob"}),
            json!({"id": 2, "name": "Alice"}),
            json!({"id": 3, "name": "alice"}),
            json!({"id": 4, "name": "Alice"}),
        ];
        sort_records(&mut records, &SortConfig::new("name", SortDirection::Asc));
        assert_eq!(ids(&records), vec![2, 4, 3, 1]);
        let once = records.clone();
        sort_records(&mut records, &SortConfig::new("name", SortDirection::Asc));
        assert_eq!(records, once);
    }

    #[test]
    fn test_unsorted_config_keeps_order() {
        let mut records = vec![json!({"id": 2}), json!({"id": 1})];
        sort_records(&mut records, &SortConfig::default());
        assert_eq!(ids(&records), vec![2, 1]);
    }
}
