//! # Cross-Table Resolver
//!
//! Post-processes the synthesized dataset: every field the normalizer
//! recorded as deferred has its placeholder replaced with a concrete value —
//! foreign keys draw from the referenced table's generated key values,
//! expressions evaluate against the whole dataset. Resolution runs strictly
//! after all tables are synthesized, so a foreign key may reference any
//! table of the invocation regardless of declaration order.
//!
//! Cyclic foreign keys between tables resolve against the synthesized (not
//! yet resolved) dataset: a fk targeting another table's fk field would read
//! that field's placeholder. Such cycles are unsupported; reference key
//! fields instead.

pub mod expr;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::adapter::KNOWN_KEY_FIELDS;
use crate::error::{Result, SeedForgeError};
use crate::normalize::{display_path, DeferredField, PathSegment, ResolutionPlan};
use crate::schema::annotation::{FkSelector, GeneratorAnnotation};
use crate::schema::types::{Dataset, DeclaredType};

/// Per-invocation options, handed through to the resolver boundary. The
/// pipeline itself only reads `now`; `extra` is opaque passthrough for
/// custom synthesizers and callers layered on top.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the time reference expressions evaluate against.
    pub now: Option<DateTime<Utc>>,
    pub extra: serde_json::Map<String, Value>,
}

/// Rewire every deferred field in the dataset. Mutates records in place.
pub fn resolve_dataset(
    dataset: &mut Dataset,
    plan: &ResolutionPlan,
    options: &RunOptions,
    seed: Option<u64>,
) -> Result<()> {
    if plan.deferred.is_empty() {
        return Ok(());
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let now = options.now.unwrap_or_else(Utc::now);

    for entry in &plan.deferred {
        match &entry.annotation {
            GeneratorAnnotation::ForeignKey { table: referenced, selector } => {
                let keys = referenced_keys(dataset, plan, entry, referenced)?;
                substitute(dataset, entry, |rng| {
                    let picked = match selector {
                        FkSelector::Random => keys[rng.random_range(0..keys.len())].clone(),
                        FkSelector::First => keys[0].clone(),
                        FkSelector::Last => keys[keys.len() - 1].clone(),
                    };
                    restore_type(picked, entry.original_type)
                }, &mut rng);
            }
            GeneratorAnnotation::Expression(text) => {
                // One evaluation per entry: every record of the table gets
                // the same instant/count, matching single-pass semantics.
                let ctx = expr::ExpressionContext { dataset, now };
                let value = expr::evaluate(
                    text,
                    &ctx,
                    &entry.table,
                    &display_path(&entry.path),
                )?;
                let value = restore_type(value, entry.original_type);
                substitute(dataset, entry, |_| value.clone(), &mut rng);
            }
            // The normalizer only records deferred annotations.
            _ => {}
        }
    }

    Ok(())
}

/// Collect the generated key values of the referenced table.
fn referenced_keys(
    dataset: &Dataset,
    plan: &ResolutionPlan,
    entry: &DeferredField,
    referenced: &str,
) -> Result<Vec<Value>> {
    let rows = dataset.get(referenced).ok_or_else(|| {
        SeedForgeError::UnresolvedReference {
            table: entry.table.clone(),
            field: display_path(&entry.path),
            referenced: referenced.to_string(),
        }
    })?;

    // With key injection disabled there is no recorded key field; probe the
    // conventional names against the generated records instead.
    let key_field = plan
        .key_fields
        .get(referenced)
        .cloned()
        .or_else(|| {
            rows.first().and_then(|row| {
                KNOWN_KEY_FIELDS
                    .iter()
                    .find(|name| row.contains_key(**name))
                    .map(|name| name.to_string())
            })
        });

    let keys: Vec<Value> = match key_field {
        Some(field) => rows.iter().filter_map(|row| row.get(&field)).cloned().collect(),
        None => Vec::new(),
    };

    if keys.is_empty() {
        return Err(SeedForgeError::generator(
            &entry.table,
            &display_path(&entry.path),
            format!("referenced table '{}' has no generated key values", referenced),
        ));
    }

    Ok(keys)
}

/// Apply `make_value` at the entry's path in every record of its table.
fn substitute(
    dataset: &mut Dataset,
    entry: &DeferredField,
    mut make_value: impl FnMut(&mut StdRng) -> Value,
    rng: &mut StdRng,
) {
    let Some((PathSegment::Field(root), rest)) = entry.path.split_first() else {
        return;
    };
    let Some(rows) = dataset.get_mut(&entry.table) else {
        return;
    };

    for row in rows.iter_mut() {
        if let Some(slot) = row.get_mut(root) {
            apply_at_path(slot, rest, &mut |leaf| *leaf = make_value(rng));
        }
    }
}

fn apply_at_path(slot: &mut Value, path: &[PathSegment], apply: &mut impl FnMut(&mut Value)) {
    match path.split_first() {
        None => apply(slot),
        Some((PathSegment::Field(name), rest)) => {
            if let Value::Object(map) = slot {
                if let Some(child) = map.get_mut(name) {
                    apply_at_path(child, rest, apply);
                }
            }
        }
        Some((PathSegment::Items, rest)) => {
            if let Value::Array(items) = slot {
                for child in items {
                    apply_at_path(child, rest, apply);
                }
            }
        }
    }
}

/// Coerce a substituted value back to the field's pre-coercion declared
/// type. Best effort: a value that cannot represent the target type (a hex
/// object id in an integer field) is kept as generated.
fn restore_type(value: Value, target: DeclaredType) -> Value {
    match (target, value) {
        (DeclaredType::Integer, Value::String(s)) => match s.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s),
        },
        (DeclaredType::Number, Value::String(s)) => match s.parse::<f64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s),
        },
        (DeclaredType::String, Value::Number(n)) => Value::String(n.to_string()),
        (DeclaredType::String, Value::Bool(b)) => Value::String(b.to_string()),
        (DeclaredType::Boolean, Value::String(s)) => match s.parse::<bool>() {
            Ok(b) => Value::Bool(b),
            Err(_) => Value::String(s),
        },
        (_, value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FieldPath;
    use crate::schema::types::Record;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn fk_entry(table: &str, field: &str, referenced: &str, selector: FkSelector) -> DeferredField {
        DeferredField {
            table: table.to_string(),
            path: vec![PathSegment::Field(field.to_string())],
            annotation: GeneratorAnnotation::ForeignKey {
                table: referenced.to_string(),
                selector,
            },
            original_type: DeclaredType::Integer,
        }
    }

    fn users_posts_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(
            "users".to_string(),
            vec![
                record(&[("id", json!(1)), ("name", json!("a"))]),
                record(&[("id", json!(2)), ("name", json!("b"))]),
                record(&[("id", json!(3)), ("name", json!("c"))]),
            ],
        );
        dataset.insert(
            "posts".to_string(),
            vec![
                record(&[("id", json!(1)), ("userId", json!("->users:random"))]),
                record(&[("id", json!(2)), ("userId", json!("->users:random"))]),
            ],
        );
        dataset
    }

    fn plan_with(entries: Vec<DeferredField>) -> ResolutionPlan {
        let mut plan = ResolutionPlan {
            deferred: entries,
            key_fields: indexmap::IndexMap::new(),
        };
        plan.key_fields.insert("users".to_string(), "id".to_string());
        plan.key_fields.insert("posts".to_string(), "id".to_string());
        plan
    }

    #[test]
    fn test_fk_membership_and_type_restoration() {
        let mut dataset = users_posts_dataset();
        let plan = plan_with(vec![fk_entry("posts", "userId", "users", FkSelector::Random)]);

        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();

        for row in &dataset["posts"] {
            let user_id = row["userId"].as_i64().unwrap();
            assert!((1..=3).contains(&user_id));
        }
    }

    #[test]
    fn test_fk_first_and_last_selectors() {
        let mut dataset = users_posts_dataset();
        let plan = plan_with(vec![fk_entry("posts", "userId", "users", FkSelector::First)]);
        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();
        for row in &dataset["posts"] {
            assert_eq!(row["userId"], json!(1));
        }

        let mut dataset = users_posts_dataset();
        let plan = plan_with(vec![fk_entry("posts", "userId", "users", FkSelector::Last)]);
        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();
        for row in &dataset["posts"] {
            assert_eq!(row["userId"], json!(3));
        }
    }

    #[test]
    fn test_fk_to_missing_table_is_unresolved_reference() {
        let mut dataset = users_posts_dataset();
        let plan = plan_with(vec![fk_entry("posts", "userId", "ghosts", FkSelector::Random)]);

        let err =
            resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap_err();
        assert!(matches!(err, SeedForgeError::UnresolvedReference { .. }));
        assert!(format!("{}", err).contains("ghosts"));
    }

    #[test]
    fn test_fk_to_empty_table_fails() {
        let mut dataset = users_posts_dataset();
        dataset.insert("empty".to_string(), Vec::new());
        let plan = plan_with(vec![fk_entry("posts", "userId", "empty", FkSelector::Random)]);

        let err =
            resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap_err();
        assert!(matches!(err, SeedForgeError::GeneratorProvider { .. }));
    }

    #[test]
    fn test_expression_with_now_override() {
        let mut dataset = Dataset::new();
        dataset.insert(
            "posts".to_string(),
            vec![record(&[("createdAt", json!("=>now()"))])],
        );
        let plan = ResolutionPlan {
            deferred: vec![DeferredField {
                table: "posts".to_string(),
                path: vec![PathSegment::Field("createdAt".to_string())],
                annotation: GeneratorAnnotation::Expression("now()".to_string()),
                original_type: DeclaredType::Integer,
            }],
            key_fields: indexmap::IndexMap::new(),
        };

        let pinned = Utc::now();
        let options = RunOptions {
            now: Some(pinned),
            ..RunOptions::default()
        };
        resolve_dataset(&mut dataset, &plan, &options, Some(42)).unwrap();

        assert_eq!(
            dataset["posts"][0]["createdAt"].as_i64(),
            Some(pinned.timestamp_millis())
        );
    }

    #[test]
    fn test_expression_string_restoration() {
        let mut dataset = Dataset::new();
        dataset.insert(
            "posts".to_string(),
            vec![record(&[("total", json!("=>count('posts')"))])],
        );
        let plan = ResolutionPlan {
            deferred: vec![DeferredField {
                table: "posts".to_string(),
                path: vec![PathSegment::Field("total".to_string())],
                annotation: GeneratorAnnotation::Expression("count('posts')".to_string()),
                original_type: DeclaredType::String,
            }],
            key_fields: indexmap::IndexMap::new(),
        };

        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();
        assert_eq!(dataset["posts"][0]["total"], json!("1"));
    }

    #[test]
    fn test_nested_path_substitution() {
        let mut dataset = Dataset::new();
        dataset.insert(
            "users".to_string(),
            vec![record(&[("id", json!(9))])],
        );
        dataset.insert(
            "posts".to_string(),
            vec![record(&[(
                "meta",
                json!({ "refs": [{ "userId": "->users:random" }, { "userId": "->users:random" }] }),
            )])],
        );

        let mut plan = ResolutionPlan::default();
        plan.key_fields.insert("users".to_string(), "id".to_string());
        let path: FieldPath = vec![
            PathSegment::Field("meta".to_string()),
            PathSegment::Field("refs".to_string()),
            PathSegment::Items,
            PathSegment::Field("userId".to_string()),
        ];
        plan.deferred.push(DeferredField {
            table: "posts".to_string(),
            path,
            annotation: GeneratorAnnotation::ForeignKey {
                table: "users".to_string(),
                selector: FkSelector::Random,
            },
            original_type: DeclaredType::Integer,
        });

        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();

        let refs = dataset["posts"][0]["meta"]["refs"].as_array().unwrap();
        for r in refs {
            assert_eq!(r["userId"], json!(9));
        }
    }

    #[test]
    fn test_key_field_probed_when_injection_disabled() {
        // No key_fields recorded: the resolver probes id/_id on the records.
        let mut dataset = Dataset::new();
        dataset.insert(
            "users".to_string(),
            vec![record(&[("_id", json!("000001")), ("name", json!("x"))])],
        );
        dataset.insert(
            "posts".to_string(),
            vec![record(&[("userId", json!("->users:random"))])],
        );

        let plan = ResolutionPlan {
            deferred: vec![DeferredField {
                table: "posts".to_string(),
                path: vec![PathSegment::Field("userId".to_string())],
                annotation: GeneratorAnnotation::ForeignKey {
                    table: "users".to_string(),
                    selector: FkSelector::Random,
                },
                original_type: DeclaredType::String,
            }],
            key_fields: indexmap::IndexMap::new(),
        };

        resolve_dataset(&mut dataset, &plan, &RunOptions::default(), Some(42)).unwrap();
        assert_eq!(dataset["posts"][0]["userId"], json!("000001"));
    }

    #[test]
    fn test_restore_type_keeps_unparseable_values() {
        let hex = Value::String("5f3a".repeat(6));
        let restored = restore_type(hex.clone(), DeclaredType::Integer);
        assert_eq!(restored, hex, "hex ids survive integer restoration");
    }
}
