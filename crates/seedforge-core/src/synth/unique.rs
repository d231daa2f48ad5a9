use std::collections::{HashMap, HashSet};

use serde_json::Value;

/// Tracks generated values for `unique: true` fields.
pub struct UniqueTracker {
    /// Map from `table.field` to the set of seen value keys.
    seen: HashMap<String, HashSet<String>>,
    /// Maximum regeneration attempts before giving up.
    pub max_retries: usize,
}

impl UniqueTracker {
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
            max_retries: 1000,
        }
    }

    /// Record a value if unseen and return true; false on a duplicate.
    pub fn try_insert(&mut self, table: &str, field: &str, value: &Value) -> bool {
        self.seen
            .entry(format!("{}.{}", table, field))
            .or_default()
            .insert(value_key(value))
    }

    /// Number of distinct values tracked for a field.
    pub fn count(&self, table: &str, field: &str) -> usize {
        self.seen
            .get(&format!("{}.{}", table, field))
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl Default for UniqueTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical string form of a value for duplicate detection. JSON encoding
/// keeps the string "1" and the number 1 distinct.
fn value_key(value: &Value) -> String {
    value.to_string()
}
