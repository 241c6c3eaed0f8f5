//! Mapping error type.

use crate::relation::Identity;
use crate::value::ValueExtractionError;
use std::fmt;

/// Failure while turning flat rows into entities
///
/// Every variant is a wiring defect or a cardinality violation; none of them is
/// recovered from inside the mapping layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    /// The row does not carry a column the mapper reads
    MissingColumn { column: String },
    /// The row carries the column more than once with different values, or a
    /// mapper tree selects two columns under the same output name
    AmbiguousColumn { column: String },
    /// A non-nullable field received SQL NULL
    UnexpectedNull { column: String },
    /// The column value cannot be converted to the field type
    TypeMismatch {
        column: String,
        source: ValueExtractionError,
    },
    /// A root row with a NULL key column
    NullRootKey { table: String, key: Identity },
    /// `single_result()` saw more than one distinct root key
    NonUniqueResult { count: usize },
    /// Raised by hand-written mappers
    Invalid(String),
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::MissingColumn { column } => {
                write!(f, "Row has no column '{column}'")
            }
            MappingError::AmbiguousColumn { column } => {
                write!(
                    f,
                    "Column '{column}' is ambiguous; alias one side with a mapper prefix"
                )
            }
            MappingError::UnexpectedNull { column } => {
                write!(f, "Column '{column}' is NULL but the field is not nullable")
            }
            MappingError::TypeMismatch { column, source } => {
                write!(f, "Column '{column}': {source}")
            }
            MappingError::NullRootKey { table, key } => {
                write!(f, "Root row for '{table}' has a NULL key column in {key}")
            }
            MappingError::NonUniqueResult { count } => {
                write!(f, "Expected at most one result, found {count} distinct keys")
            }
            MappingError::Invalid(msg) => write!(f, "Mapping error: {msg}"),
        }
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MappingError::TypeMismatch { source, .. } => Some(source),
            _ => None,
        }
    }
}
