//! # Error Types
//!
//! Defines `SeedForgeError`, the unified error enum for every failure mode in
//! the seedforge pipeline. Every variant carries enough context (table name,
//! field name, offending input) to debug immediately without re-running with
//! extra logging.

use thiserror::Error;

/// All errors that can occur in seedforge operations.
#[derive(Error, Debug)]
pub enum SeedForgeError {
    #[error("Invalid table schema for '{table}': {message}")]
    Usage { table: String, message: String },

    #[error("Foreign key on {table}.{field} references table '{referenced}', which is not part of this invocation's table set")]
    UnresolvedReference {
        table: String,
        field: String,
        referenced: String,
    },

    #[error("Generator failure on {table}.{field}: {message}")]
    GeneratorProvider {
        table: String,
        field: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Output error: {message}: {source}")]
    Output {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl SeedForgeError {
    /// Shorthand for a usage error scoped to one table.
    pub fn usage(table: &str, message: impl Into<String>) -> Self {
        SeedForgeError::Usage {
            table: table.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a generator error scoped to one field.
    pub fn generator(table: &str, field: &str, message: impl Into<String>) -> Self {
        SeedForgeError::GeneratorProvider {
            table: table.to_string(),
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeedForgeError>;
