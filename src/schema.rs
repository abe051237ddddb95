//! Schema metadata records and the arena types of the table forest.
//!
//! Records are the flat rows a metadata source hands over. [`Table`] and
//! [`ForeignKey`] are their linked counterparts, owned by a
//! [`SchemaGraph`](crate::graph::SchemaGraph) and addressed by handle.

use serde::{Deserialize, Serialize};

/// A table row: its name and the name of its interleaving parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub name: String,
    /// Empty for top-level tables.
    #[serde(default)]
    pub parent: String,
}

impl TableRecord {
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
        }
    }

    /// A table with no interleaving parent.
    pub fn top_level(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }
}

/// A secondary index row. The primary-key index is never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub table: String,
    pub name: String,
}

impl IndexRecord {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }
}

/// A foreign-key row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub name: String,
    /// The table declaring the constraint.
    pub table: String,
    pub referenced_table: String,
}

impl ConstraintRecord {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        referenced_table: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            referenced_table: referenced_table.into(),
        }
    }
}

/// Handle of a table inside a schema graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) usize);

impl TableId {
    /// The synthetic root every top-level table hangs off.
    pub const ROOT: TableId = TableId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// Handle of a foreign key inside a schema graph.
///
/// Both endpoint tables hold the same handle, so the handle is the
/// constraint's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub(crate) usize);

/// A table linked into the forest.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    /// Interleaved child tables, in input order.
    pub children: Vec<TableId>,
    /// Secondary indexes, in input order.
    pub indexes: Vec<String>,
    /// Foreign keys this table declares.
    pub outgoing: Vec<ConstraintId>,
    /// Foreign keys that reference this table.
    pub incoming: Vec<ConstraintId>,
}

impl Table {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A foreign key, stored once and shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    pub table: String,
    pub referenced_table: String,
}

impl From<ConstraintRecord> for ForeignKey {
    fn from(record: ConstraintRecord) -> Self {
        Self {
            name: record.name,
            table: record.table,
            referenced_table: record.referenced_table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_record_parent_defaults_to_empty() {
        let record: TableRecord = serde_json::from_str(r#"{"name": "Singers"}"#).unwrap();
        assert_eq!(record, TableRecord::top_level("Singers"));
    }

    #[test]
    fn test_foreign_key_from_record() {
        let fk = ForeignKey::from(ConstraintRecord::new("FK_Manager", "Employees", "Managers"));
        assert_eq!(fk.table, "Employees");
        assert_eq!(fk.referenced_table, "Managers");
    }
}
