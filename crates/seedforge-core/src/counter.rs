//! # Key Counter Store
//!
//! Per-run, per-table monotonic counters backing the sequential key
//! generators. A fresh store is constructed for every top-level seeding
//! invocation, so key sequences are deterministic per invocation and never
//! leak across calls.

use indexmap::IndexMap;

/// Width of keys emitted by [`KeyCounterStore::next_padded`].
const PADDED_KEY_WIDTH: usize = 6;

/// Mutable per-table counter state, scoped to one seeding invocation.
#[derive(Debug, Default)]
pub struct KeyCounterStore {
    counters: IndexMap<String, u64>,
}

impl KeyCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next integer key for a table: 1 on first call, then +1 per call.
    pub fn next(&mut self, table: &str) -> u64 {
        let counter = self.counters.entry(table.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Same counter, as a fixed-width zero-padded decimal string.
    pub fn next_padded(&mut self, table: &str) -> String {
        format!("{:0width$}", self.next(table), width = PADDED_KEY_WIDTH)
    }

    /// Clear all counters. Fresh invocations normally construct a new store
    /// instead; this exists for callers that hold one across retries.
    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// Last issued key for a table, if any was issued.
    pub fn last_issued(&self, table: &str) -> Option<u64> {
        self.counters.get(table).copied()
    }
}
