//! Teardown planner.
//!
//! Walks the table forest depth-first, post-order, and emits the statements
//! that drop the whole schema:
//!
//! ```text
//! for each child:        visit first
//! then, unless root:     drop own + referencing constraints (once each)
//!                        drop indexes
//!                        drop table
//! ```
//!
//! Children are always dropped before their parent, and a foreign key is
//! dropped by whichever endpoint is visited first, so it precedes both
//! `DROP TABLE` statements.

use std::collections::HashSet;

use crate::ddl::{DdlStatement, ToSql};
use crate::graph::SchemaGraph;
use crate::schema::{ConstraintId, TableId};

/// The ordered statement sequence produced by a planning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownPlan {
    statements: Vec<DdlStatement>,
}

/// Statement counts of a plan, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub constraints: usize,
    pub indexes: usize,
    pub tables: usize,
}

impl TeardownPlan {
    pub fn statements(&self) -> &[DdlStatement] {
        &self.statements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DdlStatement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Render every statement, in order.
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.iter().map(ToSql::to_sql).collect()
    }

    pub fn summary(&self) -> PlanSummary {
        self.statements
            .iter()
            .fold(PlanSummary::default(), |mut acc, stmt| {
                match stmt {
                    DdlStatement::DropConstraint { .. } => acc.constraints += 1,
                    DdlStatement::DropIndex { .. } => acc.indexes += 1,
                    DdlStatement::DropTable { .. } => acc.tables += 1,
                }
                acc
            })
    }
}

impl IntoIterator for TeardownPlan {
    type Item = DdlStatement;
    type IntoIter = std::vec::IntoIter<DdlStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a TeardownPlan {
    type Item = &'a DdlStatement;
    type IntoIter = std::slice::Iter<'a, DdlStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

/// Per-run walk state.
struct Walk<'g> {
    graph: &'g SchemaGraph,
    dropped: HashSet<ConstraintId>,
    statements: Vec<DdlStatement>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g SchemaGraph) -> Self {
        Self {
            graph,
            dropped: HashSet::with_capacity(graph.constraint_count()),
            statements: Vec::new(),
        }
    }

    fn emit(&mut self, stmt: DdlStatement) {
        tracing::debug!("plan: {}", stmt);
        self.statements.push(stmt);
    }

    /// Post-order walk from `start` with an explicit stack of
    /// `(table, next child)` frames.
    fn visit(&mut self, start: TableId) {
        let graph = self.graph;
        let mut stack = vec![(start, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (id, next) = *frame;
            let children = &graph.table(id).children;
            if let Some(&child) = children.get(next) {
                frame.1 += 1;
                stack.push((child, 0));
                continue;
            }
            stack.pop();
            if !id.is_root() {
                self.drop_table(id);
            }
        }
    }

    fn drop_table(&mut self, id: TableId) {
        let graph = self.graph;
        let table = graph.table(id);
        self.drop_constraints(&table.outgoing);
        self.drop_constraints(&table.incoming);
        for index in &table.indexes {
            self.emit(DdlStatement::drop_index(index.as_str()));
        }
        self.emit(DdlStatement::drop_table(table.name.as_str()));
    }

    fn drop_constraints(&mut self, constraints: &[ConstraintId]) {
        let graph = self.graph;
        for &cid in constraints {
            if self.dropped.insert(cid) {
                let fk = graph.constraint(cid);
                self.emit(DdlStatement::drop_constraint(fk.table.as_str(), fk.name.as_str()));
            }
        }
    }
}

/// Compute the statements that drop every table, index and foreign key in
/// `graph`, in an order that is safe to apply front to back.
pub fn plan_teardown(graph: &SchemaGraph) -> TeardownPlan {
    let mut walk = Walk::new(graph);
    walk.visit(graph.root());
    let plan = TeardownPlan {
        statements: walk.statements,
    };

    let summary = plan.summary();
    tracing::info!(
        "Planned teardown: {} constraint(s), {} index(es), {} table(s)",
        summary.constraints,
        summary.indexes,
        summary.tables
    );
    plan
}
