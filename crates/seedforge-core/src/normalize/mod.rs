//! # Schema Normalizer
//!
//! Rewrites one table's field schema for generation: injects the active
//! adapter's primary-key field, parses generator annotations into their
//! tagged form, coerces declared types that conflict with deferred
//! annotations, and wraps the result into the bounded array-of-records shape
//! the synthesizer consumes. The caller's schema is never mutated.
//!
//! Normalization also produces the [`ResolutionPlan`]: the list of fk/exp
//! fields (with their pre-coercion types) the cross-table resolver rewires
//! after generation.

use indexmap::IndexMap;
use tracing::debug;

use crate::adapter::{AdapterSpec, KNOWN_KEY_FIELDS};
use crate::config::SeederConfig;
use crate::error::Result;
use crate::schema::annotation::GeneratorAnnotation;
use crate::schema::types::{
    DeclaredType, FieldSchema, NormalizedField, NormalizedTableSchema, RecordSchema, TableSchema,
};

/// Record count when neither the table hint nor the configuration provides one.
pub const FALLBACK_RECORD_COUNT: usize = 5;

/// One step into a (possibly nested) field inside a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named field of an object.
    Field(String),
    /// Every element of an array.
    Items,
}

pub type FieldPath = Vec<PathSegment>;

/// Render a field path for error messages: `address.tags[].ref`.
pub fn display_path(path: &FieldPath) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Items => out.push_str("[]"),
        }
    }
    out
}

/// One fk/exp field awaiting post-generation resolution.
#[derive(Debug, Clone)]
pub struct DeferredField {
    /// Table the field lives in.
    pub table: String,
    /// Path from the record root to the field.
    pub path: FieldPath,
    pub annotation: GeneratorAnnotation,
    /// The field's declared type before the coercion to `string`; the
    /// resolver restores it when substituting the real value.
    pub original_type: DeclaredType,
}

/// Everything the cross-table resolver needs: the deferred fields of every
/// table plus each table's injected key field name.
#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    pub deferred: Vec<DeferredField>,
    pub key_fields: IndexMap<String, String>,
}

/// Normalize one table schema against the adapter's key convention.
///
/// Appends this table's deferred fields and key field to `plan`.
pub fn normalize_table(
    table: &str,
    raw: &TableSchema,
    adapter: &AdapterSpec,
    config: &SeederConfig,
    plan: &mut ResolutionPlan,
) -> Result<NormalizedTableSchema> {
    debug!(table, adapter = adapter.name, "normalizing table schema");

    let mut deferred = Vec::new();
    let mut properties = IndexMap::new();
    for (name, field) in &raw.properties {
        let path = vec![PathSegment::Field(name.clone())];
        let normalized = convert_field(table, name, field, &path, config, &mut deferred)?;
        properties.insert(name.clone(), normalized);
    }

    if !config.disable_key_injection {
        // Drop leftover key fields from the other adapter family.
        for other in KNOWN_KEY_FIELDS {
            if *other != adapter.key_field && properties.shift_remove(*other).is_some() {
                drop_deferred_rooted_at(&mut deferred, other);
            }
        }

        let key_field = NormalizedField::of_type(adapter.key_type).with_annotation(
            GeneratorAnnotation::Key {
                kind: adapter.key_kind,
                table: table.to_string(),
            },
        );

        // Replacing in place keeps the field's original relative position;
        // a key field the caller never declared is appended.
        if let Some(slot) = properties.get_mut(adapter.key_field) {
            drop_deferred_rooted_at(&mut deferred, adapter.key_field);
            *slot = key_field;
        } else {
            properties.insert(adapter.key_field.to_string(), key_field);
        }

        plan.key_fields
            .insert(table.to_string(), adapter.key_field.to_string());
    }

    plan.deferred.extend(deferred);

    let max_items = raw.seed_records.unwrap_or(config.default_record_count);

    Ok(NormalizedTableSchema {
        max_items,
        items: RecordSchema {
            properties,
            required: raw.required.clone(),
        },
    })
}

/// Convert one field schema, recursing through nested objects and arrays.
///
/// Applies, at every level: the legacy `"ID"` → `string` rewrite, annotation
/// parsing into the tagged variant, and the coercion of fk/exp fields to
/// declared type `string`.
fn convert_field(
    table: &str,
    field: &str,
    raw: &FieldSchema,
    path: &FieldPath,
    config: &SeederConfig,
    deferred: &mut Vec<DeferredField>,
) -> Result<NormalizedField> {
    let annotation = match raw.extra.get(&config.annotation_key) {
        Some(value) => Some(GeneratorAnnotation::parse(value, table, field)?),
        None => None,
    };

    // Absent types are inferred from shape so nesting still traverses.
    let mut declared_type = raw.declared_type.unwrap_or(match (&raw.properties, &raw.items) {
        (Some(_), _) => DeclaredType::Object,
        (None, Some(_)) => DeclaredType::Array,
        (None, None) => DeclaredType::String,
    });

    if declared_type == DeclaredType::Id {
        declared_type = DeclaredType::String;
    }

    // Deferred fields hold a marker string until resolution; the resolver
    // needs their pre-coercion type back to restore semantic typing.
    if let Some(annotation) = annotation.as_ref().filter(|a| a.is_deferred()) {
        deferred.push(DeferredField {
            table: table.to_string(),
            path: path.clone(),
            annotation: annotation.clone(),
            original_type: declared_type,
        });
        declared_type = DeclaredType::String;
    }

    let mut properties = IndexMap::new();
    if let Some(nested) = &raw.properties {
        for (name, child) in nested {
            let mut child_path = path.clone();
            child_path.push(PathSegment::Field(name.clone()));
            let normalized =
                convert_field(table, name, child, &child_path, config, deferred)?;
            properties.insert(name.clone(), normalized);
        }
    }

    let items = match &raw.items {
        Some(item) => {
            let mut item_path = path.clone();
            item_path.push(PathSegment::Items);
            Some(Box::new(convert_field(
                table, field, item, &item_path, config, deferred,
            )?))
        }
        None => None,
    };

    let mut extra = raw.extra.clone();
    extra.remove(&config.annotation_key);

    Ok(NormalizedField {
        declared_type,
        annotation,
        unique: raw.unique.unwrap_or(false),
        minimum: raw.minimum,
        maximum: raw.maximum,
        min_length: raw.min_length,
        max_length: raw.max_length,
        properties,
        items,
        extra,
    })
}

/// Forget deferred entries rooted at a top-level field key injection removed
/// or replaced.
fn drop_deferred_rooted_at(deferred: &mut Vec<DeferredField>, field: &str) {
    deferred.retain(|d| !matches!(d.path.first(), Some(PathSegment::Field(name)) if name == field));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter;
    use crate::schema::annotation::{FkSelector, KeyKind};
    use serde_json::json;

    fn table_schema(raw: serde_json::Value) -> TableSchema {
        serde_json::from_value(raw).unwrap()
    }

    fn normalize(
        raw: serde_json::Value,
        adapter_name: &str,
        config: &SeederConfig,
    ) -> (NormalizedTableSchema, ResolutionPlan) {
        let mut plan = ResolutionPlan::default();
        let normalized = normalize_table(
            "posts",
            &table_schema(raw),
            adapter::resolve(adapter_name),
            config,
            &mut plan,
        )
        .unwrap();
        (normalized, plan)
    }

    #[test]
    fn test_key_injected_for_sequential_adapter() {
        let config = SeederConfig::default();
        let (normalized, plan) = normalize(
            json!({ "properties": { "title": { "type": "string" } } }),
            "knex",
            &config,
        );

        let fields: Vec<&String> = normalized.items.properties.keys().collect();
        assert_eq!(fields, ["title", "id"]);

        let key = &normalized.items.properties["id"];
        assert_eq!(key.declared_type, DeclaredType::Integer);
        assert!(matches!(
            key.annotation,
            Some(GeneratorAnnotation::Key {
                kind: KeyKind::Sequence,
                ..
            })
        ));
        assert_eq!(plan.key_fields["posts"], "id");
    }

    #[test]
    fn test_existing_key_field_keeps_position() {
        let config = SeederConfig::default();
        let (normalized, _) = normalize(
            json!({
                "properties": {
                    "id": { "type": "integer", "unique": true },
                    "title": { "type": "string" }
                }
            }),
            "knex",
            &config,
        );

        let fields: Vec<&String> = normalized.items.properties.keys().collect();
        assert_eq!(fields, ["id", "title"], "id keeps its declared position");
        assert!(matches!(
            normalized.items.properties["id"].annotation,
            Some(GeneratorAnnotation::Key { .. })
        ));
    }

    #[test]
    fn test_other_family_key_removed() {
        let config = SeederConfig::default();
        let (normalized, _) = normalize(
            json!({
                "properties": {
                    "id": { "type": "integer" },
                    "title": { "type": "string" }
                }
            }),
            "mongodb",
            &config,
        );

        let fields: Vec<&String> = normalized.items.properties.keys().collect();
        assert_eq!(fields, ["title", "_id"], "leftover id is dropped");
    }

    #[test]
    fn test_key_injection_disabled_passes_fields_through() {
        let config = SeederConfig {
            disable_key_injection: true,
            ..SeederConfig::default()
        };
        let (normalized, plan) = normalize(
            json!({
                "properties": {
                    "id": { "type": "integer" },
                    "title": { "type": "string" }
                }
            }),
            "mongodb",
            &config,
        );

        let fields: Vec<&String> = normalized.items.properties.keys().collect();
        assert_eq!(fields, ["id", "title"]);
        assert!(plan.key_fields.is_empty());
    }

    #[test]
    fn test_legacy_id_type_rewritten_at_every_level() {
        let config = SeederConfig::default();
        let (normalized, _) = normalize(
            json!({
                "properties": {
                    "userId": { "type": "ID" },
                    "meta": {
                        "type": "object",
                        "properties": {
                            "ownerId": { "type": "ID" }
                        }
                    }
                }
            }),
            "knex",
            &config,
        );

        assert_eq!(
            normalized.items.properties["userId"].declared_type,
            DeclaredType::String
        );
        assert_eq!(
            normalized.items.properties["meta"].properties["ownerId"].declared_type,
            DeclaredType::String
        );
    }

    #[test]
    fn test_fk_field_coerced_to_string_and_recorded() {
        let config = SeederConfig::default();
        let (normalized, plan) = normalize(
            json!({
                "properties": {
                    "userId": {
                        "type": "integer",
                        "generator": { "fk": "users:random" }
                    }
                }
            }),
            "knex",
            &config,
        );

        let field = &normalized.items.properties["userId"];
        assert_eq!(field.declared_type, DeclaredType::String);

        assert_eq!(plan.deferred.len(), 1);
        let entry = &plan.deferred[0];
        assert_eq!(entry.original_type, DeclaredType::Integer);
        assert_eq!(entry.path, vec![PathSegment::Field("userId".to_string())]);
        assert!(matches!(
            entry.annotation,
            GeneratorAnnotation::ForeignKey {
                selector: FkSelector::Random,
                ..
            }
        ));
    }

    #[test]
    fn test_exp_field_nested_in_array_items() {
        let config = SeederConfig::default();
        let (_, plan) = normalize(
            json!({
                "properties": {
                    "revisions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "at": { "type": "integer", "generator": { "exp": "now()" } }
                            }
                        }
                    }
                }
            }),
            "knex",
            &config,
        );

        assert_eq!(plan.deferred.len(), 1);
        let entry = &plan.deferred[0];
        assert_eq!(
            entry.path,
            vec![
                PathSegment::Field("revisions".to_string()),
                PathSegment::Items,
                PathSegment::Field("at".to_string()),
            ]
        );
        assert_eq!(entry.original_type, DeclaredType::Integer);
    }

    #[test]
    fn test_deferred_entry_dropped_when_injection_replaces_field() {
        // An id field annotated as a foreign key is replaced wholesale by key
        // injection; the resolver must not see a stale entry for it.
        let config = SeederConfig::default();
        let (_, plan) = normalize(
            json!({
                "properties": {
                    "id": { "type": "string", "generator": { "fk": "users:random" } }
                }
            }),
            "knex",
            &config,
        );
        assert!(plan.deferred.is_empty());
    }

    #[test]
    fn test_missing_properties_degenerates_to_key_only() {
        let config = SeederConfig::default();
        let (normalized, _) = normalize(json!({}), "knex", &config);
        let fields: Vec<&String> = normalized.items.properties.keys().collect();
        assert_eq!(fields, ["id"]);
    }

    #[test]
    fn test_record_count_hint_else_config_else_fallback() {
        let config = SeederConfig::default();
        let (normalized, _) = normalize(json!({ "seedRecords": 3, "properties": {} }), "knex", &config);
        assert_eq!(normalized.max_items, 3);

        let (normalized, _) = normalize(json!({ "properties": {} }), "knex", &config);
        assert_eq!(normalized.max_items, FALLBACK_RECORD_COUNT);

        let config = SeederConfig {
            default_record_count: 11,
            ..SeederConfig::default()
        };
        let (normalized, _) = normalize(json!({ "properties": {} }), "knex", &config);
        assert_eq!(normalized.max_items, 11);
    }

    #[test]
    fn test_caller_schema_not_mutated() {
        let raw = table_schema(json!({
            "properties": { "id": { "type": "integer" } }
        }));
        let before = serde_json::to_value(&raw).unwrap();

        let mut plan = ResolutionPlan::default();
        let config = SeederConfig::default();
        normalize_table("posts", &raw, adapter::resolve("mongodb"), &config, &mut plan).unwrap();

        assert_eq!(serde_json::to_value(&raw).unwrap(), before);
    }

    #[test]
    fn test_display_path() {
        let path = vec![
            PathSegment::Field("revisions".to_string()),
            PathSegment::Items,
            PathSegment::Field("at".to_string()),
        ];
        assert_eq!(display_path(&path), "revisions[].at");
    }
}
