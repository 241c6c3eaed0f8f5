//! Query construction errors.

use std::fmt;

/// A query model that cannot be turned into valid SQL
///
/// Raised by `build()` before any I/O takes place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The statement kind requires a clause that was never supplied
    MissingClause {
        statement: &'static str,
        clause: &'static str,
    },
    /// An `all`/`any` group with nothing in it
    EmptyPredicate,
    /// A `:name` placeholder with no binding
    UnboundParameter(String),
    /// A binding no placeholder refers to
    UnusedParameter(String),
    /// The same name bound twice
    DuplicateParameter(String),
    /// A table or column name that is not a plain (optionally dotted) identifier
    InvalidIdentifier(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MissingClause { statement, clause } => {
                write!(f, "{statement} statement is missing its {clause} clause")
            }
            QueryError::EmptyPredicate => write!(f, "Predicate group has no conditions"),
            QueryError::UnboundParameter(name) => {
                write!(f, "Placeholder ':{name}' has no bound value")
            }
            QueryError::UnusedParameter(name) => {
                write!(f, "Parameter '{name}' is bound but never referenced")
            }
            QueryError::DuplicateParameter(name) => {
                write!(f, "Parameter '{name}' is bound more than once")
            }
            QueryError::InvalidIdentifier(ident) => {
                write!(f, "Invalid SQL identifier: '{ident}'")
            }
        }
    }
}

impl std::error::Error for QueryError {}
