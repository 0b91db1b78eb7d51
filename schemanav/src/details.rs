//! Descriptive fields of a selection, merged group-wide.

use serde::Serialize;
use serde_json::Value;

use crate::{
    error::Result,
    group::SchemaGroup,
    query::get_field_value_from_schema_group,
    util::{any_true, common_values, list_values, maximum_value, minimum_value},
};

/// Descriptive and validation fields of one selected item.
///
/// Lower bounds keep the strictest (largest) value, upper bounds the smallest
/// one, `enum` the values allowed everywhere. Other fields collect every
/// distinct value found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDetails {
    /// Titles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    /// Descriptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    /// Declared `type`s.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    /// `const` values.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    /// Values allowed by every `enum`.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Value>,
    /// Default values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Examples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,
    /// Regular expressions the value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Value>,
    /// Format names, e.g. `uri`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    /// Largest inclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Value>,
    /// Largest exclusive lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Value>,
    /// Smallest inclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Value>,
    /// Smallest exclusive upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Value>,
    /// Largest minimum string length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Value>,
    /// Smallest maximum string length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Value>,
    /// Largest minimum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<Value>,
    /// Smallest maximum array length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<Value>,
    /// Whether any schema requires unique array items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<Value>,
}

impl SchemaDetails {
    /// Extracts the details of `group`, narrowed to an option path if given.
    pub fn from_group(group: &SchemaGroup, option_index_path: Option<&[usize]>) -> Result<Self> {
        let field = |name: &str, merge: fn(Option<Value>, Value) -> Option<Value>| {
            get_field_value_from_schema_group(group, name, merge, None, None, option_index_path)
        };
        Ok(Self {
            title: field("title", list_values)?,
            description: field("description", list_values)?,
            kind: field("type", list_values)?,
            constant: field("const", list_values)?,
            enumeration: field("enum", common_values)?,
            default: field("default", list_values)?,
            examples: field("examples", list_values)?,
            pattern: field("pattern", list_values)?,
            format: field("format", list_values)?,
            minimum: field("minimum", maximum_value)?,
            exclusive_minimum: field("exclusiveMinimum", maximum_value)?,
            maximum: field("maximum", minimum_value)?,
            exclusive_maximum: field("exclusiveMaximum", minimum_value)?,
            min_length: field("minLength", maximum_value)?,
            max_length: field("maxLength", minimum_value)?,
            min_items: field("minItems", maximum_value)?,
            max_items: field("maxItems", minimum_value)?,
            unique_items: field("uniqueItems", any_true)?,
        })
    }

    /// `true` when no field has been found.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
