use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use seedforge_core::config::read_config;
use seedforge_core::output::json::write_json;
use seedforge_core::{AdapterSelection, RunOptions, Seeder, SeederConfig};

use crate::args::GenerateArgs;

pub fn run(args: &GenerateArgs) -> Result<()> {
    let raw = load_schemas(&args.schema)?;

    // Configuration layering: defaults, then seedforge.toml, then CLI flags.
    let mut config = SeederConfig::default();
    let mut selection = AdapterSelection::Default;
    if let Some(file_config) = read_config(Path::new("."))? {
        file_config.apply(&mut config);
        selection = file_config.adapter_selection();
    }
    if let Some(records) = args.records {
        config.default_record_count = records;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.no_keys {
        config.disable_key_injection = true;
    }
    if let Some(adapter) = &args.adapter {
        selection = AdapterSelection::Single(adapter.clone());
    }

    let mut seeder = Seeder::new(config);
    let dataset = seeder.seed_value(&raw, &selection, &RunOptions::default())?;

    let record_count: usize = dataset.values().map(|rows| rows.len()).sum();

    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_json(&mut file, &dataset)?;
            file.flush()?;
            eprintln!(
                "Wrote {} records across {} tables to {}",
                record_count,
                dataset.len(),
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            write_json(&mut stdout.lock(), &dataset)?;
        }
    }

    Ok(())
}

fn load_schemas(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse schema file {}", path.display()))
}
