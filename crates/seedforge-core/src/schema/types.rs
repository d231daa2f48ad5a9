use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::schema::annotation::GeneratorAnnotation;

/// Caller-supplied schema for one table: a field map plus an optional
/// record-count hint. Read-only input to the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Field name → field schema. Absent in the input degenerates to an
    /// empty record per item.
    #[serde(default)]
    pub properties: IndexMap<String, FieldSchema>,

    /// Forwarded to the synthesizer, never enforced by the core.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// How many records to synthesize for this table. Stripped before the
    /// schema reaches the synthesizer.
    #[serde(
        rename = "seedRecords",
        alias = "fakeRecords",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub seed_records: Option<usize>,

    /// Everything else the caller wrote; forwarded untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Declared value type of a single field.
///
/// `Id` is a legacy alias that never survives normalization — it is rewritten
/// to `String` before any record is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclaredType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    #[serde(rename = "ID")]
    Id,
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::String => write!(f, "string"),
            DeclaredType::Integer => write!(f, "integer"),
            DeclaredType::Number => write!(f, "number"),
            DeclaredType::Boolean => write!(f, "boolean"),
            DeclaredType::Object => write!(f, "object"),
            DeclaredType::Array => write!(f, "array"),
            DeclaredType::Id => write!(f, "ID"),
        }
    }
}

/// Caller-supplied schema for a single field, possibly nested.
///
/// The generator annotation is not a struct field here: it lives in `extra`
/// under the configured annotation key and is parsed into a tagged
/// [`GeneratorAnnotation`] exactly once, during normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<DeclaredType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(
        rename = "minLength",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub min_length: Option<usize>,

    #[serde(
        rename = "maxLength",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub max_length: Option<usize>,

    /// Nested object fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, FieldSchema>>,

    /// Nested array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,

    /// Unrecognized keys, including the annotation carrier; forwarded.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One table schema after normalization: the bounded array-of-records shape
/// handed to the record synthesizer.
#[derive(Debug, Clone)]
pub struct NormalizedTableSchema {
    /// Records to synthesize for this table.
    pub max_items: usize,
    pub items: RecordSchema,
}

/// The per-record field list of a normalized table.
#[derive(Debug, Clone, Default)]
pub struct RecordSchema {
    pub properties: IndexMap<String, NormalizedField>,
    /// Forwarded verbatim from the caller's schema.
    pub required: Vec<String>,
}

/// A field schema after normalization: declared type coerced, annotation
/// parsed into its tagged form, nesting preserved.
#[derive(Debug, Clone)]
pub struct NormalizedField {
    pub declared_type: DeclaredType,
    pub annotation: Option<GeneratorAnnotation>,
    pub unique: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Nested object fields (empty unless `declared_type` is `Object`).
    pub properties: IndexMap<String, NormalizedField>,
    /// Nested array item schema.
    pub items: Option<Box<NormalizedField>>,
    /// Unrecognized caller keys minus the annotation carrier; forwarded.
    pub extra: serde_json::Map<String, Value>,
}

impl NormalizedField {
    /// A bare field of the given type, no annotation, no constraints.
    pub fn of_type(declared_type: DeclaredType) -> Self {
        Self {
            declared_type,
            annotation: None,
            unique: false,
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            properties: IndexMap::new(),
            items: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: GeneratorAnnotation) -> Self {
        self.annotation = Some(annotation);
        self
    }
}

/// One generated record: field name → JSON value, in emission order.
pub type Record = serde_json::Map<String, Value>;

/// The synthesized (and, after resolution, final) dataset: table name →
/// ordered records.
pub type Dataset = IndexMap<String, Vec<Record>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_schema_deserializes_hint_and_passthrough() {
        let raw = serde_json::json!({
            "seedRecords": 3,
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"],
            "x-vendor": "kept"
        });

        let schema: TableSchema = serde_json::from_value(raw).unwrap();
        assert_eq!(schema.seed_records, Some(3));
        assert_eq!(schema.required, vec!["name"]);
        assert!(schema.properties.contains_key("name"));
        assert_eq!(schema.extra["x-vendor"], "kept");
    }

    #[test]
    fn test_table_schema_accepts_legacy_hint_name() {
        let raw = serde_json::json!({ "fakeRecords": 7, "properties": {} });
        let schema: TableSchema = serde_json::from_value(raw).unwrap();
        assert_eq!(schema.seed_records, Some(7));
    }

    #[test]
    fn test_declared_type_parses_legacy_id() {
        let t: DeclaredType = serde_json::from_value(serde_json::json!("ID")).unwrap();
        assert_eq!(t, DeclaredType::Id);

        let t: DeclaredType = serde_json::from_value(serde_json::json!("integer")).unwrap();
        assert_eq!(t, DeclaredType::Integer);
    }

    #[test]
    fn test_field_schema_nested_properties() {
        let raw = serde_json::json!({
            "type": "object",
            "properties": {
                "street": { "type": "string", "maxLength": 40 }
            }
        });

        let field: FieldSchema = serde_json::from_value(raw).unwrap();
        assert_eq!(field.declared_type, Some(DeclaredType::Object));
        let street = &field.properties.as_ref().unwrap()["street"];
        assert_eq!(street.max_length, Some(40));
    }

    #[test]
    fn test_field_schema_keeps_annotation_carrier_in_extra() {
        let raw = serde_json::json!({
            "type": "string",
            "generator": "internet.url"
        });

        let field: FieldSchema = serde_json::from_value(raw).unwrap();
        assert_eq!(field.extra["generator"], "internet.url");
    }
}
