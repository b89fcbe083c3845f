//! Storage behind the metadata repository.
//!
//! The repository only needs table scans, so the storage engine is reduced
//! to the [`MetadataStore`] trait. [`JsonStore`] is the default engine: one
//! JSON document whose keys are table names and whose values are arrays of
//! row objects.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// A raw table row.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Read-only table access.
pub trait MetadataStore: fmt::Debug + Send + Sync {
    /// Names of the tables present in the store.
    fn table_names(&self) -> Vec<String>;

    /// All rows of `table`. An absent table has no rows.
    fn rows(&self, table: &str) -> Result<&[Row]>;
}

/// In-memory store loaded from JSON documents.
#[derive(Debug, Default, Clone)]
pub struct JsonStore {
    tables: BTreeMap<String, Vec<Row>>,
}

impl JsonStore {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let serde_json::Value::Object(document) = value else {
            return Err(Error::repository(
                "Metadata document must be a JSON object keyed by table name",
            ));
        };
        let mut tables = BTreeMap::new();
        for (table, rows) in document {
            let serde_json::Value::Array(rows) = rows else {
                return Err(Error::repository(format!(
                    "Table '{}' must be an array of rows",
                    table
                )));
            };
            let mut decoded = Vec::with_capacity(rows.len());
            for (i, row) in rows.into_iter().enumerate() {
                match row {
                    serde_json::Value::Object(mut map) => {
                        normalize_codes(&mut map);
                        decoded.push(map)
                    }
                    _ => {
                        return Err(Error::repository(format!(
                            "Row {} of table '{}' is not an object",
                            i, table
                        )))
                    }
                }
            }
            tables.insert(table, decoded);
        }
        Ok(Self { tables })
    }

    /// Load the document at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::repository(format!("Cannot open {}: {}", path.display(), e))
        })?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Json(inner) => {
                Error::repository(format!("Invalid JSON in {}: {}", path.display(), inner))
            }
            other => other,
        })
    }

    /// Append the rows of `other` that this store does not already define.
    ///
    /// Object rows are keyed by `(auth_name, code)`; rows without that key
    /// (aliases, grid alternatives, usages) are always appended. The
    /// `metadata` table of `other` is not merged.
    pub fn merge(&mut self, other: JsonStore) {
        for (table, rows) in other.tables {
            if table == "metadata" {
                continue;
            }
            let existing = self.tables.entry(table).or_default();
            let known: HashSet<(String, String)> = existing.iter().filter_map(object_key).collect();
            for row in rows {
                match object_key(&row) {
                    Some(key) if known.contains(&key) => {
                        log::debug!("Skipping duplicate auxiliary row {}:{}", key.0, key.1);
                    }
                    _ => existing.push(row),
                }
            }
        }
    }
}

fn object_key(row: &Row) -> Option<(String, String)> {
    let auth = row.get("auth_name")?.as_str()?;
    let code = row.get("code")?.as_str()?;
    Some((auth.to_string(), code.to_string()))
}

/// Codes are text everywhere. Rewrite numbers found in `code` and `*_code`
/// columns, including those of nested rows such as operation steps.
fn normalize_codes(row: &mut Row) {
    for (column, value) in row.iter_mut() {
        match value {
            serde_json::Value::Number(n) if column == "code" || column.ends_with("_code") => {
                *value = serde_json::Value::String(n.to_string());
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    if let serde_json::Value::Object(nested) = item {
                        normalize_codes(nested);
                    }
                }
            }
            _ => {}
        }
    }
}

impl MetadataStore for JsonStore {
    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn rows(&self, table: &str) -> Result<&[Row]> {
        Ok(self.tables.get(table).map(Vec::as_slice).unwrap_or(&[]))
    }
}
