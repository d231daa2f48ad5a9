pub mod adapter;
pub mod config;
pub mod counter;
pub mod error;
pub mod normalize;
pub mod output;
pub mod resolve;
pub mod schema;
pub mod seeder;
pub mod synth;

// Re-export key types for convenience
pub use adapter::AdapterSelection;
pub use config::SeederConfig;
pub use error::{Result, SeedForgeError};
pub use resolve::RunOptions;
pub use schema::types::{Dataset, Record, TableSchema};
pub use seeder::Seeder;
