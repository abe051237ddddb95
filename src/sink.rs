//! DDL sinks.
//!
//! A sink applies the statements of a plan, one at a time or as a single
//! batch. Statements must be applied in plan order.

use std::io::Write;

use serde::Deserialize;

use crate::error::{RatchetError, RatchetResult};
use crate::planner::TeardownPlan;

/// How a plan is handed to a sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// One `apply` call per statement.
    Sequential,
    /// A single `apply_batch` call with the whole plan.
    #[default]
    Batch,
}

/// Receives DDL statements.
pub trait DdlSink {
    /// Apply one statement.
    fn apply(&mut self, statement: &str) -> RatchetResult<()>;

    /// Apply all statements as one operation.
    fn apply_batch(&mut self, statements: &[String]) -> RatchetResult<()> {
        for statement in statements {
            self.apply(statement)?;
        }
        Ok(())
    }
}

impl DdlSink for Vec<String> {
    fn apply(&mut self, statement: &str) -> RatchetResult<()> {
        self.push(statement.to_string());
        Ok(())
    }
}

/// Apply `plan` to `sink`, returning the number of statements applied.
///
/// In sequential mode a failure reports how many statements already went
/// through. There is no resume: a retry must re-read metadata and re-plan.
pub fn apply_plan<S: DdlSink + ?Sized>(
    sink: &mut S,
    plan: &TeardownPlan,
    mode: ApplyMode,
) -> RatchetResult<usize> {
    let report = apply_statements(sink, &plan.to_sql(), mode, false)?;
    Ok(report.applied)
}

/// Outcome of [`apply_statements`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: usize,
    /// Failed statements, only collected when forcing.
    pub failures: Vec<RatchetError>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply `statements` to `sink` in order.
///
/// With `force`, a sequential apply keeps going past failed statements and
/// collects them in the report. A batch is a single operation, so its failure
/// is always returned.
pub fn apply_statements<S: DdlSink + ?Sized>(
    sink: &mut S,
    statements: &[String],
    mode: ApplyMode,
    force: bool,
) -> RatchetResult<ApplyReport> {
    let mut report = ApplyReport::default();
    if statements.is_empty() {
        return Ok(report);
    }

    match mode {
        ApplyMode::Batch => {
            sink.apply_batch(statements).map_err(|e| {
                tracing::warn!("Batch of {} statement(s) failed: {}", statements.len(), e);
                e
            })?;
            report.applied = statements.len();
        }
        ApplyMode::Sequential => {
            for (i, statement) in statements.iter().enumerate() {
                if let Err(e) = sink.apply(statement) {
                    tracing::warn!("Statement {} failed: {}", i + 1, e);
                    let err =
                        RatchetError::sink(report.applied, statement.as_str(), e.to_string());
                    if !force {
                        return Err(err);
                    }
                    report.failures.push(err);
                    continue;
                }
                report.applied += 1;
            }
        }
    }
    Ok(report)
}

/// Writes statements as a `;`-terminated DDL script.
pub struct ScriptSink<W: Write> {
    writer: W,
    header: Option<String>,
    written: usize,
}

impl<W: Write> ScriptSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header: None,
            written: 0,
        }
    }

    /// Emit `-- <header>` before the first statement.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Statements written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn header_line(&mut self) -> Option<String> {
        self.header.take().map(|h| format!("-- {}\n", h))
    }
}

impl<W: Write> DdlSink for ScriptSink<W> {
    fn apply(&mut self, statement: &str) -> RatchetResult<()> {
        if let Some(header) = self.header_line() {
            self.writer.write_all(header.as_bytes())?;
        }
        writeln!(self.writer, "{};", statement)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn apply_batch(&mut self, statements: &[String]) -> RatchetResult<()> {
        let mut script = self.header_line().unwrap_or_default();
        for statement in statements {
            script.push_str(statement);
            script.push_str(";\n");
        }
        self.writer.write_all(script.as_bytes())?;
        self.writer.flush()?;
        self.written += statements.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SchemaGraph;
    use crate::planner::plan_teardown;
    use crate::schema::{ConstraintRecord, IndexRecord, TableRecord};
    use pretty_assertions::assert_eq;

    fn sample_plan() -> TeardownPlan {
        let graph = SchemaGraph::build(
            vec![TableRecord::top_level("A"), TableRecord::new("B", "A")],
            vec![IndexRecord::new("A", "idx")],
            vec![ConstraintRecord::new("FK1", "B", "A")],
        )
        .unwrap();
        plan_teardown(&graph)
    }

    /// Fails on the `fail_at`-th call to `apply`.
    struct FailingSink {
        applied: Vec<String>,
        calls: usize,
        fail_at: usize,
    }

    impl FailingSink {
        fn at(fail_at: usize) -> Self {
            Self {
                applied: Vec::new(),
                calls: 0,
                fail_at,
            }
        }
    }

    impl DdlSink for FailingSink {
        fn apply(&mut self, statement: &str) -> RatchetResult<()> {
            let call = self.calls;
            self.calls += 1;
            if call == self.fail_at {
                return Err(std::io::Error::other("permission denied").into());
            }
            self.applied.push(statement.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_apply_to_vec() {
        let plan = sample_plan();
        let mut sink: Vec<String> = Vec::new();
        let applied = apply_plan(&mut sink, &plan, ApplyMode::Sequential).unwrap();
        assert_eq!(applied, 4);
        assert_eq!(
            sink,
            vec![
                "ALTER TABLE B DROP CONSTRAINT FK1",
                "DROP TABLE B",
                "DROP INDEX idx",
                "DROP TABLE A",
            ]
        );
    }

    #[test]
    fn test_sequential_failure_reports_progress() {
        let plan = sample_plan();
        let mut sink = FailingSink::at(2);
        let err = apply_plan(&mut sink, &plan, ApplyMode::Sequential).unwrap_err();
        match err {
            RatchetError::Sink {
                applied, statement, ..
            } => {
                assert_eq!(applied, 2);
                assert_eq!(statement, "DROP INDEX idx");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(sink.applied.len(), 2);
    }

    #[test]
    fn test_force_continues_past_failures() {
        let statements = vec![
            "CREATE TABLE A (Id INT64) PRIMARY KEY (Id)".to_string(),
            "CREATE INDEX idx ON A (Id)".to_string(),
            "DROP TABLE B".to_string(),
        ];
        let mut sink = FailingSink::at(1);
        let report =
            apply_statements(&mut sink, &statements, ApplyMode::Sequential, true).unwrap();
        assert_eq!(report.applied, 2);
        assert!(!report.is_clean());
        assert_eq!(
            sink.applied,
            vec!["CREATE TABLE A (Id INT64) PRIMARY KEY (Id)", "DROP TABLE B"]
        );
        match &report.failures[..] {
            [RatchetError::Sink { applied, statement, .. }] => {
                assert_eq!(*applied, 1);
                assert_eq!(statement, "CREATE INDEX idx ON A (Id)");
            }
            other => panic!("unexpected failures: {:?}", other),
        }
    }

    #[test]
    fn test_statements_without_force_stop_at_failure() {
        let statements = vec!["DROP INDEX a".to_string(), "DROP INDEX b".to_string()];
        let mut sink = FailingSink::at(0);
        let err =
            apply_statements(&mut sink, &statements, ApplyMode::Sequential, false).unwrap_err();
        assert!(matches!(err, RatchetError::Sink { applied: 0, .. }));
        assert!(sink.applied.is_empty());
    }

    #[test]
    fn test_script_sink_batch() {
        let plan = sample_plan();
        let mut sink =
            ScriptSink::new(Vec::new()).with_header("db: projects/p/instances/i/databases/d");
        apply_plan(&mut sink, &plan, ApplyMode::Batch).unwrap();
        assert_eq!(sink.written(), 4);
        let script = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            script,
            "-- db: projects/p/instances/i/databases/d\n\
             ALTER TABLE B DROP CONSTRAINT FK1;\n\
             DROP TABLE B;\n\
             DROP INDEX idx;\n\
             DROP TABLE A;\n"
        );
    }

    #[test]
    fn test_load_statements_as_batch_script() {
        let statements = crate::parser::split_statements(
            "CREATE TABLE A (Id INT64) PRIMARY KEY (Id);\nCREATE INDEX idx ON A (Id);",
        );
        crate::parser::ensure_ddl(&statements).unwrap();

        let mut sink = ScriptSink::new(Vec::new());
        let report = apply_statements(&mut sink, &statements, ApplyMode::Batch, true).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.applied, 2);
        assert_eq!(sink.written(), 2);
        assert_eq!(
            String::from_utf8(sink.into_inner()).unwrap(),
            "CREATE TABLE A (Id INT64) PRIMARY KEY (Id);\nCREATE INDEX idx ON A (Id);\n"
        );
    }

    #[test]
    fn test_script_sink_sequential_matches_batch() {
        let plan = sample_plan();
        let mut batch = ScriptSink::new(Vec::new()).with_header("h");
        let mut seq = ScriptSink::new(Vec::new()).with_header("h");
        apply_plan(&mut batch, &plan, ApplyMode::Batch).unwrap();
        apply_plan(&mut seq, &plan, ApplyMode::Sequential).unwrap();
        assert_eq!(batch.into_inner(), seq.into_inner());
    }

    #[test]
    fn test_empty_plan_touches_nothing() {
        let mut sink = ScriptSink::new(Vec::new()).with_header("h");
        let applied = apply_plan(&mut sink, &TeardownPlan::default(), ApplyMode::Batch).unwrap();
        assert_eq!(applied, 0);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_apply_mode_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ApplyMode,
        }
        let w: Wrapper = toml::from_str("mode = \"sequential\"").unwrap();
        assert_eq!(w.mode, ApplyMode::Sequential);
    }
}
