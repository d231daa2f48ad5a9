//! # Configuration
//!
//! Two layers: [`SeederConfig`], the factory-construction surface every
//! pipeline piece reads, and `seedforge.toml`, the optional file the CLI
//! merges on top of it. Supports:
//!
//! - `[generate]` — default record count, seed, adapter for all tables
//! - `[seeder]` — key-injection switch, annotation carrier key
//! - `[adapters]` — per-table adapter names
//!
//! Example `seedforge.toml`:
//!
//! ```toml
//! [generate]
//! records = 10
//! seed = 42
//! adapter = "knex"
//!
//! [seeder]
//! annotation_key = "faker"
//!
//! [adapters]
//! users = "knex"
//! sessions = "nedb"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::adapter::AdapterSelection;
use crate::error::{Result, SeedForgeError};
use crate::normalize::FALLBACK_RECORD_COUNT;
use crate::synth::CustomGenerator;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "seedforge.toml";

/// Annotation carrier key used when none is configured.
pub const DEFAULT_ANNOTATION_KEY: &str = "generator";

/// Factory-construction surface of the seeding pipeline. Static for the
/// lifetime of a [`crate::Seeder`]; every invocation reads it, none mutate it.
#[derive(Clone)]
pub struct SeederConfig {
    /// Skip primary-key injection entirely (diagnostic/testing scenarios).
    pub disable_key_injection: bool,
    /// Records per table when the table schema gives no hint.
    pub default_record_count: usize,
    /// Fixed seed for deterministic value generation. Key sequences are
    /// deterministic regardless.
    pub seed: Option<u64>,
    /// Field-schema key the generator annotation is read from.
    pub annotation_key: String,
    /// Caller-registered named generators, looked up before built-ins.
    pub custom: IndexMap<String, CustomGenerator>,
    /// Opaque provider configuration, forwarded unchanged to the record
    /// synthesizer. The pipeline never interprets its contents; the shipped
    /// synthesizer ignores it, custom ones read what they need.
    pub provider_options: serde_json::Map<String, serde_json::Value>,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            disable_key_injection: false,
            default_record_count: FALLBACK_RECORD_COUNT,
            seed: None,
            annotation_key: DEFAULT_ANNOTATION_KEY.to_string(),
            custom: IndexMap::new(),
            provider_options: serde_json::Map::new(),
        }
    }
}

impl SeederConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_default_record_count(mut self, count: usize) -> Self {
        self.default_record_count = count;
        self
    }

    pub fn with_annotation_key(mut self, key: impl Into<String>) -> Self {
        self.annotation_key = key.into();
        self
    }

    /// Register a custom named generator, e.g. `custom.tags`.
    pub fn with_custom(mut self, name: impl Into<String>, generator: CustomGenerator) -> Self {
        self.custom.insert(name.into(), generator);
        self
    }

    pub fn without_key_injection(mut self) -> Self {
        self.disable_key_injection = true;
        self
    }
}

impl fmt::Debug for SeederConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeederConfig")
            .field("disable_key_injection", &self.disable_key_injection)
            .field("default_record_count", &self.default_record_count)
            .field("seed", &self.seed)
            .field("annotation_key", &self.annotation_key)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .field(
                "provider_options",
                &self.provider_options.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Top-level seedforge.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedForgeConfig {
    /// Default generation settings.
    pub generate: GenerateConfig,
    /// Pipeline behavior settings.
    pub seeder: SeederFileConfig,
    /// Per-table adapter names, keyed by table name.
    pub adapters: BTreeMap<String, String>,
}

/// `[generate]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Default number of records per table.
    pub records: Option<usize>,
    /// Fixed random seed for deterministic generation.
    pub seed: Option<u64>,
    /// Adapter applied to every table without a `[adapters]` entry.
    pub adapter: Option<String>,
}

/// `[seeder]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeederFileConfig {
    pub disable_key_injection: Option<bool>,
    pub annotation_key: Option<String>,
}

/// Read and parse a seedforge.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed.
pub fn read_config(dir: &Path) -> Result<Option<SeedForgeConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| SeedForgeError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let config: SeedForgeConfig =
        toml::from_str(&content).map_err(|e| SeedForgeError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    config.validate()?;

    Ok(Some(config))
}

impl SeedForgeConfig {
    /// Fold the file settings into a [`SeederConfig`]. File values win over
    /// whatever the target already holds; absent sections leave it untouched.
    pub fn apply(&self, config: &mut SeederConfig) {
        if let Some(records) = self.generate.records {
            config.default_record_count = records;
        }
        if let Some(seed) = self.generate.seed {
            config.seed = Some(seed);
        }
        if let Some(disable) = self.seeder.disable_key_injection {
            config.disable_key_injection = disable;
        }
        if let Some(key) = &self.seeder.annotation_key {
            config.annotation_key = key.clone();
        }
    }

    /// Build the adapter selection the file describes. A non-empty
    /// `[adapters]` table wins over `generate.adapter`; tables absent from it
    /// fall back to the registry default.
    pub fn adapter_selection(&self) -> AdapterSelection {
        if !self.adapters.is_empty() {
            if self.generate.adapter.is_some() {
                tracing::warn!(
                    "seedforge.toml sets both generate.adapter and [adapters]; \
                     the per-table [adapters] mapping wins"
                );
            }
            let map: IndexMap<String, String> = self
                .adapters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return AdapterSelection::PerTable(map);
        }
        match &self.generate.adapter {
            Some(name) => AdapterSelection::Single(name.clone()),
            None => AdapterSelection::Default,
        }
    }

    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.generate.records == Some(0) {
            return Err(SeedForgeError::Config {
                message: "generate.records must be at least 1".to_string(),
            });
        }

        // Unknown adapter names fall back to the default at seed time; warn
        // here so typos are visible before a run silently changes key shape.
        for name in self
            .adapters
            .values()
            .chain(self.generate.adapter.iter())
        {
            if crate::adapter::resolve(name).name != name.as_str() {
                tracing::warn!(
                    "seedforge.toml names unknown adapter '{}'; \
                     the default adapter will be used",
                    name
                );
            }
        }

        Ok(())
    }
}
