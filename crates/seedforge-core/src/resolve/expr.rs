//! # Deferred Expressions
//!
//! The small closed expression language evaluated at resolution time.
//! Expressions run against the fully-synthesized dataset and a time
//! reference captured once per resolve pass, so every expression in one
//! invocation sees the same instant.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::{Result, SeedForgeError};
use crate::schema::types::Dataset;

/// What an expression may observe while evaluating.
pub struct ExpressionContext<'a> {
    pub dataset: &'a Dataset,
    pub now: DateTime<Utc>,
}

fn count_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^count\(\s*'([^']+)'\s*\)$").expect("count regex is valid"))
}

/// Evaluate one deferred expression. `table` and `field` are error context.
pub fn evaluate(text: &str, ctx: &ExpressionContext<'_>, table: &str, field: &str) -> Result<Value> {
    let trimmed = text.trim();

    match trimmed {
        // Date.now() is the legacy spelling older schemas carry
        "now()" | "Date.now()" => return Ok(Value::from(ctx.now.timestamp_millis())),
        "isoNow()" => {
            return Ok(Value::String(
                ctx.now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ))
        }
        _ => {}
    }

    if let Some(caps) = count_re().captures(trimmed) {
        let counted = &caps[1];
        return match ctx.dataset.get(counted) {
            Some(rows) => Ok(Value::from(rows.len() as u64)),
            None => Err(SeedForgeError::generator(
                table,
                field,
                format!("expression counts unknown table '{}'", counted),
            )),
        };
    }

    Err(SeedForgeError::generator(
        table,
        field,
        format!("unsupported expression '{}'", trimmed),
    ))
}
