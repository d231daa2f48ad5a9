use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table as ComfyTable;
use indexmap::IndexMap;

use seedforge_core::config::read_config;
use seedforge_core::normalize::{normalize_table, ResolutionPlan};
use seedforge_core::schema::types::TableSchema;
use seedforge_core::{AdapterSelection, SeederConfig};

use crate::args::CheckArgs;

pub fn run(args: &CheckArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema file {}", args.schema.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse schema file {}", args.schema.display()))?;

    let serde_json::Value::Object(tables) = raw else {
        anyhow::bail!("schema file must be a JSON object mapping table names to schemas");
    };

    let mut config = SeederConfig::default();
    let mut selection = AdapterSelection::Default;
    if let Some(file_config) = read_config(Path::new("."))? {
        file_config.apply(&mut config);
        selection = file_config.adapter_selection();
    }
    if let Some(adapter) = &args.adapter {
        selection = AdapterSelection::Single(adapter.clone());
    }

    let mut schemas: IndexMap<String, TableSchema> = IndexMap::new();
    for (name, table) in tables {
        let schema: TableSchema = serde_json::from_value(table)
            .with_context(|| format!("Failed to parse schema for table '{}'", name))?;
        schemas.insert(name, schema);
    }

    let mut plan = ResolutionPlan::default();
    let mut summary = ComfyTable::new();
    summary.set_header(["Table", "Records", "Adapter", "Key field", "Fields", "Deferred"]);

    for (name, schema) in &schemas {
        let adapter = selection.for_table(name);
        let normalized = normalize_table(name, schema, adapter, &config, &mut plan)?;

        let deferred = plan.deferred.iter().filter(|d| &d.table == name).count();
        let key_field = if config.disable_key_injection {
            "-"
        } else {
            adapter.key_field
        };

        summary.add_row([
            name.clone(),
            normalized.max_items.to_string(),
            adapter.name.to_string(),
            key_field.to_string(),
            normalized.items.properties.len().to_string(),
            deferred.to_string(),
        ]);
    }

    println!("{}", summary);
    println!(
        "\n{} tables, {} deferred fields",
        schemas.len(),
        plan.deferred.len()
    );

    Ok(())
}
