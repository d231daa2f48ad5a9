use indexmap::IndexMap;
use seedforge_core::schema::types::TableSchema;
use serde_json::json;

/// Parse a JSON object of table schemas into the typed fixture map.
pub fn schemas_from(raw: serde_json::Value) -> IndexMap<String, TableSchema> {
    let serde_json::Value::Object(tables) = raw else {
        panic!("fixture root must be a JSON object");
    };
    tables
        .into_iter()
        .map(|(name, table)| {
            let schema =
                serde_json::from_value(table).expect("fixture table schema parses");
            (name, schema)
        })
        .collect()
}

/// A blog-shaped two-table fixture: 3 users referenced by 4 posts through a
/// random foreign key, with a deferred creation timestamp.
pub fn users_posts_schemas() -> IndexMap<String, TableSchema> {
    schemas_from(json!({
        "users": {
            "seedRecords": 3,
            "properties": {
                "name": {
                    "type": "string",
                    "generator": { "fake": "{{name.lastName}}, {{name.firstName}}" }
                }
            }
        },
        "posts": {
            "seedRecords": 4,
            "properties": {
                "title": {
                    "type": "string",
                    "generator": "lorem.sentence"
                },
                "userId": {
                    "type": "integer",
                    "generator": { "fk": "users:random" }
                },
                "createdAt": {
                    "type": "integer",
                    "generator": { "exp": "now()" }
                }
            }
        }
    }))
}

/// A single table with no record-count hint and a legacy `"ID"` field.
pub fn bookmarks_schemas() -> IndexMap<String, TableSchema> {
    schemas_from(json!({
        "bookmarks": {
            "properties": {
                "url": {
                    "type": "string",
                    "generator": "internet.url"
                },
                "title": { "type": "string" },
                "tags": { "type": "string" },
                "userId": { "type": "ID" },
                "createdAt": { "type": "integer" }
            },
            "required": ["url", "title"]
        }
    }))
}

/// Nested-structure fixture: an address object and an array of revision
/// entries carrying a deferred timestamp each.
pub fn profiles_schemas() -> IndexMap<String, TableSchema> {
    schemas_from(json!({
        "profiles": {
            "seedRecords": 2,
            "properties": {
                "owner": {
                    "type": "object",
                    "properties": {
                        "city": { "type": "string", "generator": "address.city" },
                        "legacyId": { "type": "ID" }
                    }
                },
                "revisions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "at": { "type": "integer", "generator": { "exp": "now()" } }
                        }
                    }
                }
            }
        }
    }))
}
