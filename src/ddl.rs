//! Typed DDL statements emitted by the teardown planner.

use std::fmt;

/// Trait for converting statements to SQL.
pub trait ToSql {
    /// Convert this node to a SQL string.
    fn to_sql(&self) -> String;
}

/// One statement of a teardown plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DdlStatement {
    /// `ALTER TABLE <table> DROP CONSTRAINT <name>`
    DropConstraint { table: String, name: String },
    /// `DROP INDEX <name>`
    DropIndex { name: String },
    /// `DROP TABLE <name>`
    DropTable { name: String },
}

impl DdlStatement {
    pub fn drop_constraint(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DropConstraint {
            table: table.into(),
            name: name.into(),
        }
    }

    pub fn drop_index(name: impl Into<String>) -> Self {
        Self::DropIndex { name: name.into() }
    }

    pub fn drop_table(name: impl Into<String>) -> Self {
        Self::DropTable { name: name.into() }
    }
}

impl ToSql for DdlStatement {
    fn to_sql(&self) -> String {
        match self {
            Self::DropConstraint { table, name } => {
                format!("ALTER TABLE {} DROP CONSTRAINT {}", table, name)
            }
            Self::DropIndex { name } => format!("DROP INDEX {}", name),
            Self::DropTable { name } => format!("DROP TABLE {}", name),
        }
    }
}

impl fmt::Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
