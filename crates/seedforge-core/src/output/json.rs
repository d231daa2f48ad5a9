use std::io::Write;

use crate::error::{Result, SeedForgeError};
use crate::schema::types::Dataset;

/// Write a resolved dataset as JSON using streaming serialization.
///
/// Writes table-by-table and record-by-record instead of building one big
/// serde tree, so large datasets stream straight to the writer. Field order
/// inside records is emission order, which keeps output deterministic.
pub fn write_json<W: Write>(writer: &mut W, dataset: &Dataset) -> Result<()> {
    let table_count = dataset.len();

    write_str(writer, "{\n")?;

    for (table_idx, (table_name, rows)) in dataset.iter().enumerate() {
        let safe_table_key = json_string(table_name)?;
        write_str(writer, &format!("  {}: [\n", safe_table_key))?;

        for (row_idx, row) in rows.iter().enumerate() {
            let row_json = serde_json::to_string(row).map_err(|e| SeedForgeError::Config {
                message: format!("JSON serialization error: {}", e),
            })?;
            write_str(writer, &format!("    {}", row_json))?;
            if row_idx < rows.len() - 1 {
                write_str(writer, ",")?;
            }
            write_str(writer, "\n")?;
        }

        write_str(writer, "  ]")?;
        if table_idx < table_count - 1 {
            write_str(writer, ",")?;
        }
        write_str(writer, "\n")?;
    }

    write_str(writer, "}\n")?;

    Ok(())
}

fn write_str<W: Write>(writer: &mut W, s: &str) -> Result<()> {
    writer
        .write_all(s.as_bytes())
        .map_err(|e| SeedForgeError::Output {
            message: "writing JSON".to_string(),
            source: e,
        })
}

/// Serialize a string as an RFC 8259-compliant JSON string, escaping what
/// Rust's `{:?}` Debug format would not.
fn json_string(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| SeedForgeError::Config {
        message: format!("JSON key error: {}", e),
    })
}
