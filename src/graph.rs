//! Schema graph builder.
//!
//! Turns the flat table, index and constraint lists into a forest rooted at
//! a synthetic, unnamed table. Every reference in the input must resolve;
//! a dangling name aborts the build.

use std::collections::HashMap;

use crate::error::{ConstraintSide, RatchetError, RatchetResult};
use crate::schema::{
    ConstraintId, ConstraintRecord, ForeignKey, IndexRecord, Table, TableId, TableRecord,
};

/// Arena-backed forest of tables and the foreign keys between them.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    tables: Vec<Table>,
    constraints: Vec<ForeignKey>,
    by_name: HashMap<String, TableId>,
}

impl SchemaGraph {
    /// Build the forest from one metadata snapshot.
    pub fn build(
        tables: Vec<TableRecord>,
        indexes: Vec<IndexRecord>,
        constraints: Vec<ConstraintRecord>,
    ) -> RatchetResult<Self> {
        let mut graph = Self {
            tables: vec![Table::new("")],
            constraints: Vec::with_capacity(constraints.len()),
            by_name: HashMap::from([(String::new(), TableId::ROOT)]),
        };

        let mut parents = Vec::with_capacity(tables.len());
        for record in tables {
            let id = graph.insert_table(&record.name)?;
            parents.push((id, record.parent));
        }

        for index in indexes {
            let id = graph
                .lookup(&index.table)
                .filter(|id| !id.is_root())
                .ok_or_else(|| RatchetError::UnknownIndexTable {
                    index: index.name.clone(),
                    table: index.table.clone(),
                })?;
            graph.tables[id.0].indexes.push(index.name);
        }

        for record in constraints {
            let owning = graph.resolve_endpoint(&record, ConstraintSide::Owning)?;
            let referenced = graph.resolve_endpoint(&record, ConstraintSide::Referenced)?;
            let cid = ConstraintId(graph.constraints.len());
            graph.constraints.push(record.into());
            graph.tables[owning.0].outgoing.push(cid);
            graph.tables[referenced.0].incoming.push(cid);
        }

        for (id, parent) in parents {
            let parent_id = graph
                .lookup(&parent)
                .ok_or_else(|| RatchetError::UnknownParent {
                    table: graph.tables[id.0].name.clone(),
                    parent: parent.clone(),
                })?;
            graph.tables[parent_id.0].children.push(id);
        }

        graph.check_reachable()?;

        tracing::debug!(
            "Built schema graph: {} table(s), {} index(es), {} constraint(s)",
            graph.table_count(),
            graph.index_count(),
            graph.constraint_count()
        );
        Ok(graph)
    }

    fn insert_table(&mut self, name: &str) -> RatchetResult<TableId> {
        if name.is_empty() {
            return Err(RatchetError::InvalidTableName(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(RatchetError::DuplicateTable(name.to_string()));
        }
        let id = TableId(self.tables.len());
        self.tables.push(Table::new(name));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    fn resolve_endpoint(
        &self,
        record: &ConstraintRecord,
        side: ConstraintSide,
    ) -> RatchetResult<TableId> {
        let name = match side {
            ConstraintSide::Owning => &record.table,
            ConstraintSide::Referenced => &record.referenced_table,
        };
        // The root's empty name is not a real table.
        self.lookup(name)
            .filter(|id| !id.is_root())
            .ok_or_else(|| RatchetError::UnknownConstraintTable {
                constraint: record.name.clone(),
                side,
                table: name.clone(),
            })
    }

    /// Every table must hang off the root, otherwise it sits on a parent cycle.
    fn check_reachable(&self) -> RatchetResult<()> {
        let mut seen = vec![false; self.tables.len()];
        let mut stack = vec![TableId::ROOT];
        while let Some(id) = stack.pop() {
            seen[id.0] = true;
            stack.extend(self.tables[id.0].children.iter().copied());
        }
        match seen.iter().position(|reached| !reached) {
            Some(idx) => Err(RatchetError::ParentCycle {
                table: self.tables[idx].name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn root(&self) -> TableId {
        TableId::ROOT
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }

    pub fn constraint(&self, id: ConstraintId) -> &ForeignKey {
        &self.constraints[id.0]
    }

    /// Find a table by name. The empty name resolves to the root.
    pub fn lookup(&self, name: &str) -> Option<TableId> {
        self.by_name.get(name).copied()
    }

    /// Number of real tables, root excluded.
    pub fn table_count(&self) -> usize {
        self.tables.len() - 1
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn index_count(&self) -> usize {
        self.tables.iter().map(|t| t.indexes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(graph: &SchemaGraph, ids: &[TableId]) -> Vec<String> {
        ids.iter().map(|id| graph.table(*id).name.clone()).collect()
    }

    #[test]
    fn test_builds_forest() {
        let graph = SchemaGraph::build(
            vec![
                TableRecord::top_level("Singers"),
                TableRecord::new("Albums", "Singers"),
                TableRecord::new("Songs", "Albums"),
                TableRecord::top_level("Venues"),
            ],
            vec![],
            vec![],
        )
        .unwrap();

        assert_eq!(graph.table_count(), 4);
        let root = graph.table(graph.root());
        assert_eq!(names(&graph, &root.children), vec!["Singers", "Venues"]);

        let singers = graph.lookup("Singers").unwrap();
        assert_eq!(names(&graph, &graph.table(singers).children), vec!["Albums"]);
        let albums = graph.lookup("Albums").unwrap();
        assert_eq!(names(&graph, &graph.table(albums).children), vec!["Songs"]);
    }

    #[test]
    fn test_child_listed_before_parent() {
        let graph = SchemaGraph::build(
            vec![
                TableRecord::new("Albums", "Singers"),
                TableRecord::top_level("Singers"),
            ],
            vec![],
            vec![],
        )
        .unwrap();
        let singers = graph.lookup("Singers").unwrap();
        assert_eq!(names(&graph, &graph.table(singers).children), vec!["Albums"]);
    }

    #[test]
    fn test_indexes_attached_in_order() {
        let graph = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![IndexRecord::new("A", "idx1"), IndexRecord::new("A", "idx2")],
            vec![],
        )
        .unwrap();
        let a = graph.lookup("A").unwrap();
        assert_eq!(graph.table(a).indexes, vec!["idx1", "idx2"]);
        assert_eq!(graph.index_count(), 2);
    }

    #[test]
    fn test_constraint_shared_by_both_tables() {
        let graph = SchemaGraph::build(
            vec![TableRecord::top_level("A"), TableRecord::top_level("B")],
            vec![],
            vec![ConstraintRecord::new("FK1", "A", "B")],
        )
        .unwrap();
        let a = graph.table(graph.lookup("A").unwrap());
        let b = graph.table(graph.lookup("B").unwrap());
        assert_eq!(a.outgoing.len(), 1);
        assert!(a.incoming.is_empty());
        assert_eq!(b.incoming, a.outgoing);
        assert_eq!(graph.constraint(a.outgoing[0]).name, "FK1");
    }

    #[test]
    fn test_self_reference_lands_in_both_collections() {
        let graph = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![],
            vec![ConstraintRecord::new("FK_Self", "A", "A")],
        )
        .unwrap();
        let a = graph.table(graph.lookup("A").unwrap());
        assert_eq!(a.outgoing, a.incoming);
        assert_eq!(graph.constraint_count(), 1);
    }

    #[test]
    fn test_unknown_parent() {
        let err = SchemaGraph::build(vec![TableRecord::new("Albums", "Singers")], vec![], vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownParent { ref table, ref parent }
                if table == "Albums" && parent == "Singers"
        ));
    }

    #[test]
    fn test_unknown_index_table() {
        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![IndexRecord::new("Missing", "idx")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownIndexTable { ref index, ref table }
                if index == "idx" && table == "Missing"
        ));
    }

    #[test]
    fn test_index_on_root_name_is_unknown() {
        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![IndexRecord::new("", "idx_orphan")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownIndexTable { ref index, ref table }
                if index == "idx_orphan" && table.is_empty()
        ));
    }

    #[test]
    fn test_unknown_constraint_tables() {
        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![],
            vec![ConstraintRecord::new("FK1", "A", "Missing")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownConstraintTable {
                side: ConstraintSide::Referenced,
                ref table,
                ..
            } if table == "Missing"
        ));

        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![],
            vec![ConstraintRecord::new("FK1", "", "A")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownConstraintTable { side: ConstraintSide::Owning, .. }
        ));

        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A")],
            vec![],
            vec![ConstraintRecord::new("FK1", "A", "")],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RatchetError::UnknownConstraintTable {
                side: ConstraintSide::Referenced,
                ref table,
                ..
            } if table.is_empty()
        ));
    }

    #[test]
    fn test_rejects_duplicate_and_empty_names() {
        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A"), TableRecord::top_level("A")],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RatchetError::DuplicateTable(ref name) if name == "A"));

        let err = SchemaGraph::build(vec![TableRecord::top_level("")], vec![], vec![]).unwrap_err();
        assert!(matches!(err, RatchetError::InvalidTableName(_)));
    }

    #[test]
    fn test_parent_cycle() {
        let err = SchemaGraph::build(
            vec![TableRecord::new("A", "B"), TableRecord::new("B", "A")],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RatchetError::ParentCycle { .. }));
    }

    #[test]
    fn test_table_interleaved_in_itself() {
        let err = SchemaGraph::build(
            vec![TableRecord::top_level("A"), TableRecord::new("B", "B")],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RatchetError::ParentCycle { ref table } if table == "B"));
    }

    #[test]
    fn test_empty_input() {
        let graph = SchemaGraph::build(vec![], vec![], vec![]).unwrap();
        assert_eq!(graph.table_count(), 0);
        assert!(graph.table(graph.root()).children.is_empty());
    }
}
