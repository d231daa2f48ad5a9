use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "seedforge",
    about = "Synthesize realistic, cross-referenced seed datasets from declarative table schemas",
    version,
    after_help = "Examples:\n  seedforge generate --schema tables.json --records 100 --output seed.json\n  seedforge generate --schema tables.json --adapter knex --seed 42\n  seedforge check --schema tables.json --adapter mongodb"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize a dataset from a schema file
    Generate(GenerateArgs),

    /// Normalize a schema file and show what a run would produce
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Path to the table-schema JSON file
    #[arg(long)]
    pub schema: PathBuf,

    /// Records per table, for tables without their own hint
    #[arg(long)]
    pub records: Option<usize>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Adapter for all tables (per-table overrides come from seedforge.toml)
    #[arg(long)]
    pub adapter: Option<String>,

    /// Output file path; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip primary-key injection
    #[arg(long)]
    pub no_keys: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the table-schema JSON file
    #[arg(long)]
    pub schema: PathBuf,

    /// Adapter for all tables (per-table overrides come from seedforge.toml)
    #[arg(long)]
    pub adapter: Option<String>,
}
