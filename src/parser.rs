//! SQL statement splitting and leading-keyword classification.
//!
//! Only the first word of a statement is inspected:
//!
//! ```text
//! SELECT ...                  -> Query
//! INSERT / UPDATE / DELETE    -> Dml
//! CREATE / ALTER / DROP       -> Ddl
//! ```

use std::fmt;

use nom::{IResult, bytes::complete::take_while1, character::complete::multispace0};

use crate::error::{RatchetError, RatchetResult};

/// Execution path a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Dml,
    Ddl,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Query => write!(f, "QUERY"),
            StatementKind::Dml => write!(f, "DML"),
            StatementKind::Ddl => write!(f, "DDL"),
        }
    }
}

/// Split a script on `;`, dropping empty statements.
pub fn split_statements(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|sql| !sql.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a keyword at the start of `input`.
fn parse_keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Classify a statement by its leading keyword.
pub fn classify(sql: &str) -> RatchetResult<StatementKind> {
    let (rest, _) = multispace0::<_, nom::error::Error<&str>>(sql).unwrap_or((sql, ""));
    let position = sql.len() - rest.len();
    let unsupported = || {
        RatchetError::parse(position, format!("unsupported SQL statement: [{}]", sql.trim()))
    };

    let (_, keyword) = parse_keyword(rest).map_err(|_| unsupported())?;
    match keyword.to_ascii_uppercase().as_str() {
        "SELECT" => Ok(StatementKind::Query),
        "INSERT" | "UPDATE" | "DELETE" => Ok(StatementKind::Dml),
        "CREATE" | "ALTER" | "DROP" => Ok(StatementKind::Ddl),
        _ => Err(unsupported()),
    }
}

/// Require every statement to be DDL.
pub fn ensure_ddl(statements: &[String]) -> RatchetResult<()> {
    for sql in statements {
        match classify(sql) {
            Ok(StatementKind::Ddl) => {}
            _ => return Err(RatchetError::NotDdl(sql.clone())),
        }
    }
    Ok(())
}
