//! # Record Synthesizer
//!
//! Expands the normalized multi-table schema into concrete records. The core
//! only depends on the [`RecordSynthesizer`] contract: every table present in
//! the input, record counts matching `max_items`, field sets matching the
//! normalized field list exactly, values conformant to the post-coercion
//! declared types. [`FakeSynthesizer`] is the shipped implementation, built
//! on the `fake` crate; callers with their own value sources swap it out at
//! the trait seam.

pub mod providers;
pub mod unique;

use std::sync::Arc;

use fake::faker::lorem::en::Words;
use fake::Fake;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::Value;

use crate::config::SeederConfig;
use crate::counter::KeyCounterStore;
use crate::error::{Result, SeedForgeError};
use crate::schema::annotation::{GeneratorAnnotation, KeyKind};
use crate::schema::types::{Dataset, DeclaredType, NormalizedField, NormalizedTableSchema, Record, RecordSchema};
use crate::synth::unique::UniqueTracker;

/// A caller-registered named generator.
pub type CustomGenerator = Arc<dyn Fn(&mut StdRng, &[Value]) -> Value + Send + Sync>;

/// The contract between the pipeline and whatever produces record values.
///
/// All tables of one invocation arrive in a single call, so an
/// implementation can configure its value providers once per call rather
/// than per table.
pub trait RecordSynthesizer {
    fn synthesize(
        &mut self,
        schemas: &IndexMap<String, NormalizedTableSchema>,
        counters: &mut KeyCounterStore,
    ) -> Result<Dataset>;
}

/// Default synthesizer: named generators backed by the `fake` crate plus
/// caller-registered custom generators, with type-driven fallbacks for
/// un-annotated fields.
pub struct FakeSynthesizer {
    rng: StdRng,
    custom: IndexMap<String, CustomGenerator>,
    unique: UniqueTracker,
    template_re: Regex,
}

impl FakeSynthesizer {
    pub fn new(seed: Option<u64>, custom: IndexMap<String, CustomGenerator>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            custom,
            unique: UniqueTracker::new(),
            template_re: Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}")
                .expect("template regex is valid"),
        }
    }

    pub fn from_config(config: &SeederConfig) -> Self {
        Self::new(config.seed, config.custom.clone())
    }

    fn record(
        &mut self,
        table: &str,
        schema: &RecordSchema,
        counters: &mut KeyCounterStore,
    ) -> Result<Record> {
        let mut record = Record::new();
        for (name, field) in &schema.properties {
            let value = self.field_value(table, name, field, counters)?;
            record.insert(name.clone(), value);
        }
        Ok(record)
    }

    fn field_value(
        &mut self,
        table: &str,
        field: &str,
        schema: &NormalizedField,
        counters: &mut KeyCounterStore,
    ) -> Result<Value> {
        // Keys are unique by construction; deferred fields hold placeholder
        // markers that only become meaningful values after resolution.
        let skip_unique = matches!(
            &schema.annotation,
            Some(a) if a.is_deferred() || matches!(a, GeneratorAnnotation::Key { .. })
        );

        if !schema.unique || skip_unique {
            return self.produce(table, field, schema, counters);
        }

        for _ in 0..self.unique.max_retries {
            let value = self.produce(table, field, schema, counters)?;
            if self.unique.try_insert(table, field, &value) {
                return Ok(value);
            }
        }

        Err(SeedForgeError::generator(
            table,
            field,
            format!(
                "could not produce a unique value after {} attempts",
                self.unique.max_retries
            ),
        ))
    }

    fn produce(
        &mut self,
        table: &str,
        field: &str,
        schema: &NormalizedField,
        counters: &mut KeyCounterStore,
    ) -> Result<Value> {
        match &schema.annotation {
            Some(GeneratorAnnotation::Key { kind, table: key_table }) => Ok(match kind {
                KeyKind::ObjectId => Value::String(providers::random_hex_id(&mut self.rng)),
                KeyKind::Sequence => Value::from(counters.next(key_table)),
                KeyKind::PaddedSequence => Value::String(counters.next_padded(key_table)),
            }),
            Some(GeneratorAnnotation::ForeignKey { table: ref_table, selector }) => {
                Ok(Value::String(format!("->{}:{}", ref_table, selector)))
            }
            Some(GeneratorAnnotation::Expression(text)) => {
                Ok(Value::String(format!("=>{}", text)))
            }
            Some(GeneratorAnnotation::NamedReference(path)) => {
                self.generator_value(table, field, path, &[])
            }
            Some(GeneratorAnnotation::InlineCall { path, args }) => {
                self.generator_value(table, field, path, args)
            }
            Some(GeneratorAnnotation::Template(text)) => {
                self.expand_template(table, field, text)
            }
            None => self.default_value(table, field, schema, counters),
        }
    }

    /// Dispatch a named generator: custom registrations shadow built-ins.
    fn generator_value(
        &mut self,
        table: &str,
        field: &str,
        path: &str,
        args: &[Value],
    ) -> Result<Value> {
        if let Some(custom) = self.custom.get(path).cloned() {
            return Ok(custom(&mut self.rng, args));
        }
        providers::builtin_value(path, args, &mut self.rng).ok_or_else(|| {
            SeedForgeError::generator(table, field, format!("unknown generator path '{}'", path))
        })
    }

    /// Expand every `{{path}}` segment through the generator registry.
    fn expand_template(&mut self, table: &str, field: &str, text: &str) -> Result<Value> {
        let re = self.template_re.clone();
        let mut out = String::new();
        let mut last = 0;

        for caps in re.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);

            let path = &caps[1];
            let value = self.generator_value(table, field, path, &[])?;
            out.push_str(&scalar_to_string(&value));

            last = whole.end();
        }
        out.push_str(&text[last..]);

        Ok(Value::String(out))
    }

    /// Type-driven fallback for fields with no annotation.
    fn default_value(
        &mut self,
        table: &str,
        field: &str,
        schema: &NormalizedField,
        counters: &mut KeyCounterStore,
    ) -> Result<Value> {
        Ok(match schema.declared_type {
            DeclaredType::String | DeclaredType::Id => {
                let words: Vec<String> = Words(2..5).fake_with_rng(&mut self.rng);
                let mut text = words.join(" ");
                if let Some(max) = schema.max_length {
                    text.truncate(max);
                }
                Value::String(text)
            }
            DeclaredType::Integer => {
                let min = schema.minimum.map(|m| m.ceil() as i64).unwrap_or(0);
                let max = schema
                    .maximum
                    .map(|m| m.floor() as i64)
                    .unwrap_or(10_000)
                    .max(min);
                Value::from(self.rng.random_range(min..=max))
            }
            DeclaredType::Number => {
                let min = schema.minimum.unwrap_or(0.0);
                let max = schema.maximum.unwrap_or(10_000.0).max(min);
                Value::from(self.rng.random_range(min..=max))
            }
            DeclaredType::Boolean => Value::Bool(self.rng.random()),
            DeclaredType::Object => {
                let mut map = serde_json::Map::new();
                for (name, child) in &schema.properties {
                    map.insert(name.clone(), self.field_value(table, name, child, counters)?);
                }
                Value::Object(map)
            }
            DeclaredType::Array => match &schema.items {
                Some(item) => {
                    let len = self.rng.random_range(1..=3);
                    let mut values = Vec::with_capacity(len);
                    for _ in 0..len {
                        values.push(self.field_value(table, field, item, counters)?);
                    }
                    Value::Array(values)
                }
                None => Value::Array(Vec::new()),
            },
        })
    }
}

impl RecordSynthesizer for FakeSynthesizer {
    fn synthesize(
        &mut self,
        schemas: &IndexMap<String, NormalizedTableSchema>,
        counters: &mut KeyCounterStore,
    ) -> Result<Dataset> {
        let mut dataset = Dataset::new();
        for (table, schema) in schemas {
            let mut rows = Vec::with_capacity(schema.max_items);
            for _ in 0..schema.max_items {
                rows.push(self.record(table, &schema.items, counters)?);
            }
            dataset.insert(table.clone(), rows);
        }
        Ok(dataset)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
