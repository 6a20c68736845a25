//! Column metadata and enumerated choices

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldType, value_to_text};

/// One enumerated choice for a filter or editor dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetOption {
    pub label: String,
    pub value: Value,
}

impl FacetOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Normalize a raw choice. Objects are kept as `{label, value}`, scalars become their own
    /// label.
    pub fn normalize(raw: &Value) -> Self {
        match raw {
            Value::Object(map) => {
                let value = map.get("value").cloned().unwrap_or(Value::Null);
                let label = map
                    .get("label")
                    .map(value_to_text)
                    .unwrap_or_else(|| value_to_text(&value));
                Self { label, value }
            }
            scalar => Self {
                label: value_to_text(scalar),
                value: scalar.clone(),
            },
        }
    }

    pub fn normalize_all(raw: &[Value]) -> Vec<Self> {
        raw.iter().map(Self::normalize).collect()
    }
}

/// Column definition as the state engine sees it.
///
/// Rendering concerns are left to the caller; only the fields that drive filtering, editing
/// and facet lookup are carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Dot-path of the value shown in this column
    pub key: String,
    #[serde(default)]
    pub label: String,
    /// Dot-path(s) filtered when this column is used in a filter, defaults to `key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_key: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub sortable: bool,
    /// Static choices, used before any facet lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    /// Explicit facet endpoint for this column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_url: Option<String>,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            filter_key: None,
            field_type,
            editable: false,
            sortable: true,
            options: None,
            facet_url: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn with_filter_key(mut self, filter_key: impl Into<String>) -> Self {
        self.filter_key = Some(filter_key.into());
        self
    }

    pub fn with_options(mut self, options: Vec<Value>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_facet_url(mut self, url: impl Into<String>) -> Self {
        self.facet_url = Some(url.into());
        self
    }

    pub fn filter_field(&self) -> &str {
        self.filter_key.as_deref().unwrap_or(&self.key)
    }
}

/// Find a column by key
pub fn find_column<'a>(columns: &'a [ColumnDef], key: &str) -> Option<&'a ColumnDef> {
    columns.iter().find(|c| c.key == key)
}
