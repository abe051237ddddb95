//! Schema metadata sources.
//!
//! A [`MetadataSource`] hands over the flat table, index and foreign-key
//! lists the graph builder consumes. [`MetadataSnapshot`] is an in-memory
//! source that can be loaded from a JSON or TOML file.
//!
//! ```json
//! {
//!   "tables": [{"name": "Singers"}, {"name": "Albums", "parent": "Singers"}],
//!   "indexes": [{"table": "Albums", "name": "AlbumsByTitle"}],
//!   "constraints": [{"name": "FK_Fav", "table": "Albums", "referenced_table": "Singers"}]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RatchetError, RatchetResult};
use crate::schema::{ConstraintRecord, IndexRecord, TableRecord};

/// Supplies one consistent snapshot of schema metadata.
pub trait MetadataSource {
    /// All tables with their interleaving parent (empty for top level).
    fn tables(&self) -> RatchetResult<Vec<TableRecord>>;

    /// All secondary indexes, primary keys excluded.
    fn indexes(&self) -> RatchetResult<Vec<IndexRecord>>;

    /// All foreign-key constraints.
    fn constraints(&self) -> RatchetResult<Vec<ConstraintRecord>>;
}

/// Schema metadata held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub tables: Vec<TableRecord>,
    #[serde(default)]
    pub indexes: Vec<IndexRecord>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
}

impl MetadataSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: impl Into<String>, parent: impl Into<String>) -> Self {
        self.tables.push(TableRecord::new(name, parent));
        self
    }

    pub fn index(mut self, table: impl Into<String>, name: impl Into<String>) -> Self {
        self.indexes.push(IndexRecord::new(table, name));
        self
    }

    pub fn constraint(
        mut self,
        name: impl Into<String>,
        table: impl Into<String>,
        referenced_table: impl Into<String>,
    ) -> Self {
        self.constraints
            .push(ConstraintRecord::new(name, table, referenced_table));
        self
    }

    /// Decode a snapshot from JSON.
    pub fn from_json(content: &str) -> RatchetResult<Self> {
        serde_json::from_str(content).map_err(|e| RatchetError::Snapshot(e.to_string()))
    }

    /// Decode a snapshot from TOML.
    pub fn from_toml(content: &str) -> RatchetResult<Self> {
        toml::from_str(content).map_err(|e| RatchetError::Snapshot(e.to_string()))
    }

    /// Load a snapshot file. `.toml` files are read as TOML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> RatchetResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RatchetError::Snapshot(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
    }
}

impl MetadataSource for MetadataSnapshot {
    fn tables(&self) -> RatchetResult<Vec<TableRecord>> {
        Ok(self.tables.clone())
    }

    fn indexes(&self) -> RatchetResult<Vec<IndexRecord>> {
        Ok(self.indexes.clone())
    }

    fn constraints(&self) -> RatchetResult<Vec<ConstraintRecord>> {
        Ok(self.constraints.clone())
    }
}
