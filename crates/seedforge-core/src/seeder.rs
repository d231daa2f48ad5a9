//! # Seeder Facade
//!
//! One invocation: normalize every table schema against its adapter,
//! synthesize all tables in a single pass, then resolve cross-table
//! references — fully sequential, nothing outstanding after return. The
//! facade is stateless between invocations except for the configuration it
//! was constructed with; each call builds its own key counter store, so a
//! failed call never leaks counter state into the next one. Concurrent
//! callers construct independent `Seeder`s.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::adapter::AdapterSelection;
use crate::config::SeederConfig;
use crate::counter::KeyCounterStore;
use crate::error::{Result, SeedForgeError};
use crate::normalize::{normalize_table, ResolutionPlan};
use crate::resolve::{resolve_dataset, RunOptions};
use crate::schema::types::{Dataset, NormalizedTableSchema, TableSchema};
use crate::synth::{FakeSynthesizer, RecordSynthesizer};

/// The configured seeding pipeline.
pub struct Seeder {
    config: SeederConfig,
    /// Caller-supplied synthesizer; `None` means a fresh [`FakeSynthesizer`]
    /// per invocation.
    synthesizer: Option<Box<dyn RecordSynthesizer>>,
}

impl Seeder {
    pub fn new(config: SeederConfig) -> Self {
        Self {
            config,
            synthesizer: None,
        }
    }

    /// Replace the shipped synthesizer at the trait seam.
    pub fn with_synthesizer(
        config: SeederConfig,
        synthesizer: Box<dyn RecordSynthesizer>,
    ) -> Self {
        Self {
            config,
            synthesizer: Some(synthesizer),
        }
    }

    pub fn config(&self) -> &SeederConfig {
        &self.config
    }

    /// Run one seeding invocation over typed table schemas.
    pub fn seed(
        &mut self,
        schemas: &IndexMap<String, TableSchema>,
        adapters: &AdapterSelection,
        options: &RunOptions,
    ) -> Result<Dataset> {
        if schemas.is_empty() {
            return Ok(Dataset::new());
        }

        // Fresh counter state per invocation, created before any table is
        // normalized; key sequences restart at 1 every call.
        let mut counters = KeyCounterStore::new();

        let mut plan = ResolutionPlan::default();
        let mut normalized: IndexMap<String, NormalizedTableSchema> = IndexMap::new();
        for (name, schema) in schemas {
            let adapter = adapters.for_table(name);
            let table = normalize_table(name, schema, adapter, &self.config, &mut plan)?;
            normalized.insert(name.clone(), table);
        }

        debug!(
            tables = normalized.len(),
            deferred = plan.deferred.len(),
            "schemas normalized, synthesizing"
        );

        let mut dataset = match &mut self.synthesizer {
            Some(synthesizer) => synthesizer.synthesize(&normalized, &mut counters)?,
            None => {
                FakeSynthesizer::from_config(&self.config).synthesize(&normalized, &mut counters)?
            }
        };

        resolve_dataset(&mut dataset, &plan, options, self.config.seed)?;

        Ok(dataset)
    }

    /// Run one seeding invocation over raw JSON table schemas, as read from
    /// a schema file. Each table value must be a JSON object.
    pub fn seed_value(
        &mut self,
        raw: &Value,
        adapters: &AdapterSelection,
        options: &RunOptions,
    ) -> Result<Dataset> {
        let Value::Object(tables) = raw else {
            return Err(SeedForgeError::usage(
                "<root>",
                "table schemas must be a JSON object mapping table names to schemas",
            ));
        };

        let mut schemas = IndexMap::new();
        for (name, table) in tables {
            if !table.is_object() {
                return Err(SeedForgeError::usage(
                    name,
                    "table schema must be a JSON object",
                ));
            }
            let schema: TableSchema =
                serde_json::from_value(table.clone()).map_err(|e| {
                    SeedForgeError::usage(name, format!("failed to parse table schema: {}", e))
                })?;
            schemas.insert(name.clone(), schema);
        }

        self.seed(&schemas, adapters, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::KeyCounterStore;
    use serde_json::json;

    fn schemas_from(raw: Value) -> IndexMap<String, TableSchema> {
        let Value::Object(tables) = raw else { panic!("fixture is an object") };
        tables
            .into_iter()
            .map(|(name, table)| (name, serde_json::from_value(table).unwrap()))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_empty_dataset() {
        let mut seeder = Seeder::new(SeederConfig::default());
        let dataset = seeder
            .seed(
                &IndexMap::new(),
                &AdapterSelection::Default,
                &RunOptions::default(),
            )
            .unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_seed_value_rejects_non_object_root() {
        let mut seeder = Seeder::new(SeederConfig::default());
        let err = seeder
            .seed_value(
                &json!([1, 2]),
                &AdapterSelection::Default,
                &RunOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SeedForgeError::Usage { .. }));
    }

    #[test]
    fn test_seed_value_rejects_non_object_table() {
        let mut seeder = Seeder::new(SeederConfig::default());
        let err = seeder
            .seed_value(
                &json!({ "users": 5 }),
                &AdapterSelection::Default,
                &RunOptions::default(),
            )
            .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("users"), "error names the table: {}", msg);
    }

    #[test]
    fn test_custom_synthesizer_is_used() {
        struct CannedSynthesizer;
        impl RecordSynthesizer for CannedSynthesizer {
            fn synthesize(
                &mut self,
                schemas: &IndexMap<String, NormalizedTableSchema>,
                _counters: &mut KeyCounterStore,
            ) -> Result<Dataset> {
                let mut dataset = Dataset::new();
                for (table, schema) in schemas {
                    let rows = (0..schema.max_items)
                        .map(|i| {
                            let mut row = crate::schema::types::Record::new();
                            row.insert("canned".to_string(), json!(i));
                            row
                        })
                        .collect();
                    dataset.insert(table.clone(), rows);
                }
                Ok(dataset)
            }
        }

        let mut seeder =
            Seeder::with_synthesizer(SeederConfig::default(), Box::new(CannedSynthesizer));
        let schemas = schemas_from(json!({
            "things": { "seedRecords": 2, "properties": {} }
        }));
        let dataset = seeder
            .seed(&schemas, &AdapterSelection::Default, &RunOptions::default())
            .unwrap();

        assert_eq!(dataset["things"].len(), 2);
        assert_eq!(dataset["things"][1]["canned"], json!(1));
    }

    #[test]
    fn test_generator_errors_abort_without_partial_result() {
        let mut seeder = Seeder::new(SeederConfig::default());
        let schemas = schemas_from(json!({
            "a": { "properties": { "x": { "type": "string", "generator": "no.such" } } },
            "b": { "properties": {} }
        }));

        let result = seeder.seed(&schemas, &AdapterSelection::Default, &RunOptions::default());
        assert!(result.is_err(), "whole invocation fails, nothing returned");
    }
}
