//! # Adapter Registry
//!
//! Static mapping from storage-adapter name to its primary-key convention:
//! key field name, declared type, and key-generation scheme. Pure lookup, no
//! side effects. Several adapter names share one convention on purpose — the
//! grouping is by key field name and type, not by storage engine.

use indexmap::IndexMap;

use crate::schema::annotation::KeyKind;
use crate::schema::types::DeclaredType;

/// Primary-key convention for one storage adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSpec {
    pub name: &'static str,
    pub key_field: &'static str,
    pub key_type: DeclaredType,
    pub key_kind: KeyKind,
}

/// Adapter used when the caller names none, or an unrecognized one.
pub const DEFAULT_ADAPTER: &str = "mongodb";

/// Key field names any adapter family may claim. Key injection removes a
/// pre-existing field with the *other* family's name so a leftover `id`
/// never survives next to an injected `_id`, and vice versa.
pub const KNOWN_KEY_FIELDS: &[&str] = &["id", "_id"];

const ADAPTERS: &[AdapterSpec] = &[
    AdapterSpec {
        name: "mongodb",
        key_field: "_id",
        key_type: DeclaredType::String,
        key_kind: KeyKind::ObjectId,
    },
    AdapterSpec {
        name: "mongoose",
        key_field: "_id",
        key_type: DeclaredType::String,
        key_kind: KeyKind::ObjectId,
    },
    AdapterSpec {
        name: "nedb",
        key_field: "_id",
        key_type: DeclaredType::String,
        key_kind: KeyKind::PaddedSequence,
    },
    AdapterSpec {
        name: "sequelize",
        key_field: "id",
        key_type: DeclaredType::Integer,
        key_kind: KeyKind::Sequence,
    },
    AdapterSpec {
        name: "knex",
        key_field: "id",
        key_type: DeclaredType::Integer,
        key_kind: KeyKind::Sequence,
    },
    AdapterSpec {
        name: "rethinkdb",
        key_field: "id",
        key_type: DeclaredType::Integer,
        key_kind: KeyKind::Sequence,
    },
    AdapterSpec {
        name: "memory",
        key_field: "id",
        key_type: DeclaredType::Integer,
        key_kind: KeyKind::Sequence,
    },
];

/// Look up an adapter by name, falling back to the default adapter for
/// unrecognized names.
pub fn resolve(name: &str) -> &'static AdapterSpec {
    ADAPTERS
        .iter()
        .find(|a| a.name == name)
        .unwrap_or_else(|| {
            ADAPTERS
                .iter()
                .find(|a| a.name == DEFAULT_ADAPTER)
                .expect("default adapter is registered")
        })
}

/// Which adapter applies to which table in one invocation: one name for all
/// tables, or a per-table mapping with the default as fallback.
#[derive(Debug, Clone, Default)]
pub enum AdapterSelection {
    #[default]
    Default,
    Single(String),
    PerTable(IndexMap<String, String>),
}

impl AdapterSelection {
    pub fn for_table(&self, table: &str) -> &'static AdapterSpec {
        match self {
            AdapterSelection::Default => resolve(DEFAULT_ADAPTER),
            AdapterSelection::Single(name) => resolve(name),
            AdapterSelection::PerTable(map) => match map.get(table) {
                Some(name) => resolve(name),
                None => resolve(DEFAULT_ADAPTER),
            },
        }
    }
}

impl From<&str> for AdapterSelection {
    fn from(name: &str) -> Self {
        AdapterSelection::Single(name.to_string())
    }
}

impl From<IndexMap<String, String>> for AdapterSelection {
    fn from(map: IndexMap<String, String>) -> Self {
        AdapterSelection::PerTable(map)
    }
}
