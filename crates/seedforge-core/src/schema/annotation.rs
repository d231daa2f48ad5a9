//! # Generator Annotations
//!
//! The annotation a caller attaches to a field (under the configured carrier
//! key) directs how that field's value is produced. Callers write untyped
//! JSON shapes; the normalizer parses them here into one tagged variant so
//! downstream components branch on the tag instead of re-sniffing shape.

use serde_json::Value;
use std::fmt;

use crate::error::{Result, SeedForgeError};

/// Which key-generation scheme an adapter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Globally-unique hex identifier string.
    ObjectId,
    /// Monotonic per-table integer, starting at 1.
    Sequence,
    /// The same counter, emitted as a zero-padded 6-digit string.
    PaddedSequence,
}

/// How a foreign key picks among the referenced table's generated keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FkSelector {
    Random,
    First,
    Last,
}

impl fmt::Display for FkSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FkSelector::Random => write!(f, "random"),
            FkSelector::First => write!(f, "first"),
            FkSelector::Last => write!(f, "last"),
        }
    }
}

/// The tagged form of a field's generator annotation, decided once during
/// normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorAnnotation {
    /// Plain reference to a named generator, e.g. `"internet.url"`.
    NamedReference(String),
    /// A named generator with explicit arguments, e.g.
    /// `{ "lorem.words": [3] }`.
    InlineCall { path: String, args: Vec<Value> },
    /// A `{{path}}` template expanded through the generator registry, e.g.
    /// `{ "fake": "{{name.lastName}}, {{name.firstName}}" }`.
    Template(String),
    /// Deferred cross-table reference, e.g. `{ "fk": "users:random" }`.
    ForeignKey { table: String, selector: FkSelector },
    /// Deferred expression evaluated at resolution time, e.g.
    /// `{ "exp": "now()" }`.
    Expression(String),
    /// Primary-key generator injected by the normalizer; never written by
    /// callers.
    Key { kind: KeyKind, table: String },
}

impl GeneratorAnnotation {
    /// Parse the raw JSON shape a caller wrote under the annotation key.
    ///
    /// `table` and `field` are for error context only.
    pub fn parse(raw: &Value, table: &str, field: &str) -> Result<Self> {
        match raw {
            Value::String(path) => Ok(GeneratorAnnotation::NamedReference(path.clone())),
            Value::Object(map) => {
                if let Some(fk) = map.get("fk") {
                    let spec = fk.as_str().ok_or_else(|| {
                        SeedForgeError::usage(
                            table,
                            format!("field '{}': fk annotation must be a string", field),
                        )
                    })?;
                    let (ref_table, selector) = parse_fk_spec(spec, table, field)?;
                    return Ok(GeneratorAnnotation::ForeignKey {
                        table: ref_table,
                        selector,
                    });
                }
                if let Some(exp) = map.get("exp") {
                    let text = exp.as_str().ok_or_else(|| {
                        SeedForgeError::usage(
                            table,
                            format!("field '{}': exp annotation must be a string", field),
                        )
                    })?;
                    return Ok(GeneratorAnnotation::Expression(text.to_string()));
                }
                if let Some(template) = map.get("fake") {
                    let text = template.as_str().ok_or_else(|| {
                        SeedForgeError::usage(
                            table,
                            format!("field '{}': fake template must be a string", field),
                        )
                    })?;
                    return Ok(GeneratorAnnotation::Template(text.to_string()));
                }
                if map.len() == 1 {
                    // Single-entry mapping: generator path with arguments
                    let (path, raw_args) = map.iter().next().expect("len checked");
                    let args = match raw_args {
                        Value::Array(items) => items.clone(),
                        other => vec![other.clone()],
                    };
                    return Ok(GeneratorAnnotation::InlineCall {
                        path: path.clone(),
                        args,
                    });
                }
                Err(SeedForgeError::usage(
                    table,
                    format!(
                        "field '{}': unrecognized annotation shape with keys [{}]",
                        field,
                        map.keys().cloned().collect::<Vec<_>>().join(", ")
                    ),
                ))
            }
            other => Err(SeedForgeError::usage(
                table,
                format!(
                    "field '{}': annotation must be a string or mapping, got {}",
                    field, other
                ),
            )),
        }
    }

    /// True for annotations resolved after generation (fk / exp), whose
    /// generation-time value is an opaque placeholder string.
    pub fn is_deferred(&self) -> bool {
        matches!(
            self,
            GeneratorAnnotation::ForeignKey { .. } | GeneratorAnnotation::Expression(_)
        )
    }
}

/// Parse `"<table>:<selector>"`. A missing selector defaults to `random`.
fn parse_fk_spec(spec: &str, table: &str, field: &str) -> Result<(String, FkSelector)> {
    let (ref_table, selector) = match spec.split_once(':') {
        Some((t, s)) => (t, Some(s)),
        None => (spec, None),
    };

    if ref_table.is_empty() {
        return Err(SeedForgeError::usage(
            table,
            format!("field '{}': fk annotation '{}' names no table", field, spec),
        ));
    }

    let selector = match selector {
        None | Some("random") => FkSelector::Random,
        Some("first") => FkSelector::First,
        Some("last") => FkSelector::Last,
        Some(other) => {
            return Err(SeedForgeError::usage(
                table,
                format!(
                    "field '{}': unknown fk selector '{}' (expected random, first or last)",
                    field, other
                ),
            ))
        }
    };

    Ok((ref_table.to_string(), selector))
}
