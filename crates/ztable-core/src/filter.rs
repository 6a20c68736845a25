//! Filter predicates and the per-type operator catalog

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, ZtableError};

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    /// Operators offered for this field type, in display order
    pub fn operators(&self) -> &'static [FilterOperator] {
        use FilterOperator::*;
        match self {
            FieldType::Text => &[Contains, Is, Neq, Starts, Ends],
            FieldType::Number => &[Is, Neq, Gt, Lt, Between],
            FieldType::Date => &[Between, Gt, Lt, Is, Neq],
            FieldType::Boolean => &[Is, Neq],
        }
    }

    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.operators().contains(&operator)
    }

    /// Operator pre-selected when a filter of this type is first built
    pub fn default_operator(&self) -> FilterOperator {
        self.operators()[0]
    }

    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::Text,
            FieldType::Number,
            FieldType::Date,
            FieldType::Boolean,
        ]
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Filter operator as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Contains,
    Is,
    Neq,
    Starts,
    Ends,
    Gt,
    Lt,
    Between,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::Is => "is",
            FilterOperator::Neq => "neq",
            FilterOperator::Starts => "starts",
            FilterOperator::Ends => "ends",
            FilterOperator::Gt => "gt",
            FilterOperator::Lt => "lt",
            FilterOperator::Between => "between",
        }
    }

    /// Parse a wire name. Unknown names are rejected.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "contains" => FilterOperator::Contains,
            "is" => FilterOperator::Is,
            "neq" => FilterOperator::Neq,
            "starts" => FilterOperator::Starts,
            "ends" => FilterOperator::Ends,
            "gt" => FilterOperator::Gt,
            "lt" => FilterOperator::Lt,
            "between" => FilterOperator::Between,
            _ => return None,
        };
        Some(op)
    }

    /// Display label of this operator in the context of a field type
    pub fn label(&self, field_type: FieldType) -> &'static str {
        use FilterOperator::*;
        match (field_type, self) {
            (FieldType::Text, Contains) => "contains",
            (FieldType::Text, Is) => "is exactly",
            (FieldType::Text, Neq) => "is not",
            (FieldType::Text, Starts) => "starts with",
            (FieldType::Text, Ends) => "ends with",
            (FieldType::Number, Is) => "equals",
            (FieldType::Number, Neq) => "not equals",
            (FieldType::Number, Gt) => "greater than (>)",
            (FieldType::Number, Lt) => "less than (<)",
            (FieldType::Number, Between) => "between (range)",
            (FieldType::Date, Between) => "between",
            (FieldType::Date, Gt) => "after",
            (FieldType::Date, Lt) => "before",
            (FieldType::Date, Is) => "on date",
            (FieldType::Date, Neq) => "not on",
            (FieldType::Boolean, Is) => "is",
            (FieldType::Boolean, Neq) => "is not",
            (_, op) => op.as_str(),
        }
    }

    pub fn requires_two_values(&self) -> bool {
        matches!(self, FilterOperator::Between)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single filter predicate.
///
/// `field` may name several dot-paths joined by `,`; they are OR'd at evaluation time.
/// When `field_type` is present the operator has been checked against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter")]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

impl Filter {
    /// Create an untyped filter. The operator alone drives evaluation.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        let field = field.into();
        Self {
            label: field.clone(),
            field,
            operator,
            value: value.into(),
            field_type: None,
        }
    }

    /// Create a filter for a declared field type, rejecting operators the type does not offer
    pub fn typed(
        field_type: FieldType,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Result<Self> {
        if !field_type.supports(operator) {
            return Err(ZtableError::InvalidOperator {
                operator,
                field_type,
            });
        }
        let mut filter = Self::new(field, operator, value);
        filter.field_type = Some(field_type);
        Ok(filter)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The dot-paths this filter reads, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.field.split(',').map(str::trim).filter(|f| !f.is_empty())
    }

    /// `(start, end)` of a `between` value, or `None` if it is not a comma pair
    pub fn between_bounds(&self) -> Option<(&str, &str)> {
        let (start, end) = self.value.split_once(',')?;
        Some((start.trim(), end.trim()))
    }

    /// Checks a filter assembled by a filter builder before it is applied.
    ///
    /// `between` needs both bounds, every other non-boolean filter needs a value.
    pub fn validate(&self) -> Result<()> {
        if self.fields().next().is_none() {
            return Err(ZtableError::InvalidFilter("filter has no field".to_string()));
        }
        if self.operator.requires_two_values() {
            let complete = self
                .between_bounds()
                .is_some_and(|(start, end)| !start.is_empty() && !end.is_empty());
            if !complete {
                return Err(ZtableError::InvalidFilter(format!(
                    "'{}' needs both a start and an end value",
                    self.label
                )));
            }
            return Ok(());
        }
        if self.field_type != Some(FieldType::Boolean) && self.value.trim().is_empty() {
            return Err(ZtableError::InvalidFilter(format!(
                "'{}' needs a value",
                self.label
            )));
        }
        Ok(())
    }
}

/// Wire form of a filter before operator/type validation
#[derive(Deserialize)]
struct RawFilter {
    field: String,
    operator: FilterOperator,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type", default)]
    field_type: Option<FieldType>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = ZtableError;

    fn try_from(raw: RawFilter) -> Result<Self> {
        let value = match &raw.value {
            serde_json::Value::Null => String::new(),
            other => crate::value_to_text(other),
        };
        let mut filter = match raw.field_type {
            Some(field_type) => Filter::typed(field_type, raw.field, raw.operator, value)?,
            None => Filter::new(raw.field, raw.operator, value),
        };
        if let Some(label) = raw.label {
            filter.label = label;
        }
        Ok(filter)
    }
}

/// Parse a JSON array of filters as carried in the `filters` request parameter
pub fn parse_filters(json: &str) -> Result<Vec<Filter>> {
    Ok(serde_json::from_str(json)?)
}

/// Serialize filters for the `filters` request parameter. Empty sets serialize to `None`.
pub fn serialize_filters(filters: &[Filter]) -> Result<Option<String>> {
    if filters.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(filters)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_catalog() {
        assert_eq!(FieldType::Text.operators().len(), 5);
        assert!(FieldType::Number.supports(FilterOperator::Between));
        assert!(!FieldType::Text.supports(FilterOperator::Gt));
        assert!(!FieldType::Boolean.supports(FilterOperator::Contains));
        assert_eq!(FieldType::Date.default_operator(), FilterOperator::Between);
    }

    #[test]
    fn test_operator_labels_depend_on_type() {
        assert_eq!(FilterOperator::Is.label(FieldType::Text), "is exactly");
        assert_eq!(FilterOperator::Is.label(FieldType::Number), "equals");
        assert_eq!(FilterOperator::Is.label(FieldType::Date), "on date");
        assert_eq!(FilterOperator::Gt.label(FieldType::Date), "after");
    }

    #[test]
    fn test_typed_rejects_ill_typed_operator() {
        let err = Filter::typed(FieldType::Boolean, "active", FilterOperator::Gt, "true")
            .expect_err("gt is not a boolean operator");
        assert!(matches!(err, ZtableError::InvalidOperator { .. }));
    }

    #[test]
    fn test_deserialize_untyped_and_typed() {
        let filters = parse_filters(
            r#"[{"field":"work.title","operator":"contains","value":"eng","label":"Title"},
                {"field":"finance.salary","operator":"between","value":"1,2","type":"number"}]"#,
        )
        .unwrap();
        assert_eq!(filters[0].field_type, None);
        assert_eq!(filters[0].label, "Title");
        assert_eq!(filters[1].field_type, Some(FieldType::Number));

        let bad = parse_filters(r#"[{"field":"a","operator":"contains","value":"x","type":"number"}]"#);
        assert!(bad.is_err());

        let unknown = parse_filters(r#"[{"field":"a","operator":"like","value":"x"}]"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_numeric_value_is_stringified() {
        let filters = parse_filters(r#"[{"field":"age","operator":"gt","value":30}]"#).unwrap();
        assert_eq!(filters[0].value, "30");
    }

    #[test]
    fn test_multi_field_split() {
        let filter = Filter::new("profile.firstName, profile.lastName", FilterOperator::Contains, "a");
        let fields: Vec<_> = filter.fields().collect();
        assert_eq!(fields, vec!["profile.firstName", "profile.lastName"]);
    }

    #[test]
    fn test_validate_builder_rules() {
        let between = Filter::typed(FieldType::Number, "age", FilterOperator::Between, "10,")
            .unwrap();
        assert!(between.validate().is_err());

        let between = Filter::typed(FieldType::Number, "age", FilterOperator::Between, "10,20")
            .unwrap();
        assert!(between.validate().is_ok());

        let empty = Filter::typed(FieldType::Text, "name", FilterOperator::Contains, " ").unwrap();
        assert!(empty.validate().is_err());

        let boolean = Filter::typed(FieldType::Boolean, "active", FilterOperator::Is, "").unwrap();
        assert!(boolean.validate().is_ok());
    }

    #[test]
    fn test_serialize_filters_empty_is_none() {
        assert_eq!(serialize_filters(&[]).unwrap(), None);
        let json = serialize_filters(&[Filter::new("a", FilterOperator::Is, "b")])
            .unwrap()
            .unwrap();
        assert_eq!(json, r#"[{"field":"a","operator":"is","value":"b","label":"a"}]"#);
    }
}
