//! # ratchet
//!
//! > **Drop a whole interleaved schema, in an order the database accepts.**
//!
//! ratchet reads flat schema metadata (tables with their interleaving
//! parent, secondary indexes, foreign keys), links it into a table forest,
//! and plans the DDL that tears the schema down.
//!
//! ## Quick Example
//!
//! ```
//! use ratchet::prelude::*;
//!
//! let snapshot = MetadataSnapshot::new()
//!     .table("Singers", "")
//!     .table("Albums", "Singers")
//!     .constraint("FK_Fav", "Albums", "Singers");
//!
//! let plan = ratchet::plan_drop_all(&snapshot).unwrap();
//! assert_eq!(
//!     plan.to_sql(),
//!     vec![
//!         "ALTER TABLE Albums DROP CONSTRAINT FK_Fav",
//!         "DROP TABLE Albums",
//!         "DROP TABLE Singers",
//!     ]
//! );
//! ```
//!
//! ## Ordering
//!
//! | Rule                  | Guarantee                                          |
//! |-----------------------|----------------------------------------------------|
//! | Interleaving          | children are dropped before their parent           |
//! | Foreign keys          | dropped once, before either endpoint table         |
//! | Indexes               | dropped before their table                         |

pub mod config;
pub mod ddl;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod parser;
pub mod planner;
pub mod schema;
pub mod sink;

pub mod prelude {
    pub use crate::config::{Config, DatabaseSection, DatabaseTarget};
    pub use crate::ddl::{DdlStatement, ToSql};
    pub use crate::error::*;
    pub use crate::graph::SchemaGraph;
    pub use crate::metadata::{MetadataSnapshot, MetadataSource};
    pub use crate::parser::{StatementKind, classify, ensure_ddl, split_statements};
    pub use crate::planner::{PlanSummary, TeardownPlan, plan_teardown};
    pub use crate::schema::{ConstraintRecord, IndexRecord, TableRecord};
    pub use crate::sink::{
        ApplyMode, ApplyReport, DdlSink, ScriptSink, apply_plan, apply_statements,
    };
}

/// Read one snapshot from `source`, build the table forest and plan its
/// teardown.
///
/// Fails only if the metadata is inconsistent or the source fails; no
/// partial plan is returned.
pub fn plan_drop_all<S: metadata::MetadataSource + ?Sized>(
    source: &S,
) -> Result<planner::TeardownPlan, error::RatchetError> {
    let tables = source.tables()?;
    let indexes = source.indexes()?;
    let constraints = source.constraints()?;
    let graph = graph::SchemaGraph::build(tables, indexes, constraints)?;
    Ok(planner::plan_teardown(&graph))
}
