//! Error types for ratchet.

use std::fmt;

use thiserror::Error;

/// Which end of a foreign key named a table that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSide {
    Owning,
    Referenced,
}

impl fmt::Display for ConstraintSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintSide::Owning => write!(f, "owning"),
            ConstraintSide::Referenced => write!(f, "referenced"),
        }
    }
}

/// The main error type for ratchet operations.
#[derive(Debug, Error)]
pub enum RatchetError {
    /// A table names an interleaving parent that is not in the table list.
    #[error("Table '{table}' is interleaved in unknown parent '{parent}'")]
    UnknownParent { table: String, parent: String },

    /// An index is owned by a table that is not in the table list.
    #[error("Index '{index}' belongs to unknown table '{table}'")]
    UnknownIndexTable { index: String, table: String },

    /// A foreign key names a table that is not in the table list.
    #[error("Constraint '{constraint}' has unknown {side} table '{table}'")]
    UnknownConstraintTable {
        constraint: String,
        side: ConstraintSide,
        table: String,
    },

    /// The same table name appears twice in the table list.
    #[error("Duplicate table: '{0}'")]
    DuplicateTable(String),

    /// The empty name is reserved for the forest root.
    #[error("Invalid table name: '{0}'")]
    InvalidTableName(String),

    /// A table never reaches the root through its parent chain.
    #[error("Table '{table}' is part of a parent cycle")]
    ParentCycle { table: String },

    /// The DDL sink rejected a statement.
    #[error("Sink failed on '{statement}' after {applied} applied statement(s): {message}")]
    Sink {
        applied: usize,
        statement: String,
        message: String,
    },

    /// Failed to classify a SQL statement.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A statement that had to be DDL was something else.
    #[error("All SQL should be DDL for load [{0}]")]
    NotDdl(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metadata snapshot could not be read or decoded.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RatchetError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a sink error for the statement at `applied`.
    pub fn sink(applied: usize, statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Sink {
            applied,
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by inconsistent schema metadata.
    pub fn is_input_consistency(&self) -> bool {
        matches!(
            self,
            Self::UnknownParent { .. }
                | Self::UnknownIndexTable { .. }
                | Self::UnknownConstraintTable { .. }
                | Self::DuplicateTable(_)
                | Self::InvalidTableName(_)
                | Self::ParentCycle { .. }
        )
    }
}

/// Result type alias for ratchet operations.
pub type RatchetResult<T> = Result<T, RatchetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RatchetError::UnknownConstraintTable {
            constraint: "FK_Albums".to_string(),
            side: ConstraintSide::Referenced,
            table: "Singers".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Constraint 'FK_Albums' has unknown referenced table 'Singers'"
        );
    }

    #[test]
    fn test_sink_error_display() {
        let err = RatchetError::sink(3, "DROP TABLE Albums", "table in use");
        assert_eq!(
            err.to_string(),
            "Sink failed on 'DROP TABLE Albums' after 3 applied statement(s): table in use"
        );
        assert!(!err.is_input_consistency());
    }

    #[test]
    fn test_input_consistency() {
        let err = RatchetError::UnknownParent {
            table: "Albums".to_string(),
            parent: "Singers".to_string(),
        };
        assert!(err.is_input_consistency());
    }
}
