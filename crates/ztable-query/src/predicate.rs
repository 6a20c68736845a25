//! Filter predicate evaluation

use serde_json::Value;
use ztable_core::{
    FieldType, Filter, FilterOperator, comparable, comparable_str, get_path, parse_date,
    parse_number, value_to_number, value_to_text,
};

/// Leaf texts of the resolved values, arrays flattened, original case kept
fn leaf_texts(values: &[&Value]) -> Vec<String> {
    fn push(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .for_each(|item| push(item, out)),
            other => out.push(value_to_text(other)),
        }
    }
    let mut out = Vec::new();
    values.iter().for_each(|v| push(v, &mut out));
    out
}

/// Numeric leaves of the resolved values, arrays flattened
fn leaf_numbers(values: &[&Value]) -> Vec<f64> {
    fn push(value: &Value, out: &mut Vec<f64>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| push(item, out)),
            other => out.extend(value_to_number(other)),
        }
    }
    let mut out = Vec::new();
    values.iter().for_each(|v| push(v, &mut out));
    out
}

/// Case-insensitive equality, or equal instants when both sides are date-like
fn token_equals(token: &str, target: &str) -> bool {
    if token.to_lowercase() == target.to_lowercase() {
        return true;
    }
    match (parse_date(token), parse_date(target)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Evaluate one filter against a record.
///
/// The filter's fields are OR'd: the predicate holds if any resolved value satisfies it. A
/// record with no resolvable value for any of the fields never matches. Ordered comparisons
/// read the first resolved value; operands that are neither numbers nor dates fail.
pub fn matches_filter(record: &Value, filter: &Filter) -> bool {
    let resolved: Vec<&Value> = filter
        .fields()
        .filter_map(|field| get_path(record, field))
        .collect();
    let Some(first) = resolved.first() else {
        return false;
    };

    let raw_target = filter.value.trim();
    let target = raw_target.to_lowercase();
    let texts = leaf_texts(&resolved);

    match filter.operator {
        FilterOperator::Contains => texts
            .iter()
            .map(|t| t.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
            .contains(&target),
        FilterOperator::Is | FilterOperator::Neq
            if filter.field_type == Some(FieldType::Number) =>
        {
            let Some(operand) = parse_number(raw_target) else {
                return false;
            };
            let any = leaf_numbers(&resolved).iter().any(|n| *n == operand);
            if filter.operator == FilterOperator::Is {
                any
            } else {
                !any
            }
        }
        FilterOperator::Is => texts.iter().any(|t| token_equals(t, raw_target)),
        FilterOperator::Neq => !texts.iter().any(|t| token_equals(t, raw_target)),
        FilterOperator::Starts => texts.iter().any(|t| t.to_lowercase().starts_with(&target)),
        FilterOperator::Ends => texts.iter().any(|t| t.to_lowercase().ends_with(&target)),
        FilterOperator::Gt | FilterOperator::Lt => {
            let (Some(actual), Some(operand)) = (comparable(first), comparable_str(&filter.value))
            else {
                return false;
            };
            if filter.operator == FilterOperator::Gt {
                actual > operand
            } else {
                actual < operand
            }
        }
        FilterOperator::Between => {
            let Some((start, end)) = filter.between_bounds() else {
                return false;
            };
            match (comparable(first), comparable_str(start), comparable_str(end)) {
                (Some(actual), Some(start), Some(end)) => actual >= start && actual <= end,
                _ => false,
            }
        }
    }
}

/// A record passes a filter set when it passes every filter
pub fn matches_all(record: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| matches_filter(record, filter))
}
