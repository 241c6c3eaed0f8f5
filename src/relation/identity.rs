//! Identity enum for representing single and composite key columns
//!
//! A mapper node identifies the entity a row describes through its key columns.
//! `Identity` holds one or more column names so both single-column and composite
//! primary keys can drive deduplication.

use std::fmt;

/// Represents the key column(s) of a mapped table
///
/// - Single column keys (`Unary`)
/// - Two column composite keys (`Binary`)
/// - Three column composite keys (`Ternary`)
/// - Four or more column composite keys (`Many`)
///
/// # Example
///
/// ```
/// use incidentdb::Identity;
///
/// let identity = Identity::Binary("incidentid", "incidenttypeid");
/// assert_eq!(identity.arity(), 2);
/// assert!(identity.contains("incidenttypeid"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Single column identifier
    Unary(&'static str),
    /// Two column identifiers (composite key)
    Binary(&'static str, &'static str),
    /// Three column identifiers (composite key)
    Ternary(&'static str, &'static str, &'static str),
    /// Four or more column identifiers (composite key)
    Many(Vec<&'static str>),
}

impl Identity {
    /// Build an identity from a column list, picking the smallest variant.
    pub fn from_columns(columns: &[&'static str]) -> Self {
        match columns {
            [a] => Self::Unary(*a),
            [a, b] => Self::Binary(*a, *b),
            [a, b, c] => Self::Ternary(*a, *b, *c),
            _ => Self::Many(columns.to_vec()),
        }
    }

    /// Number of columns in this identity (1 for Unary, 2 for Binary, etc.)
    pub fn arity(&self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_, _) => 2,
            Self::Ternary(_, _, _) => 3,
            Self::Many(vec) => vec.len(),
        }
    }

    /// Iterate over the key column names in declaration order.
    pub fn iter(&self) -> IdentityIter<'_> {
        IdentityIter {
            identity: self,
            index: 0,
        }
    }

    /// Check if this identity contains a specific column
    pub fn contains(&self, col: &str) -> bool {
        self.iter().any(|c| c == col)
    }

    /// Returns `true` if all columns in `other` are present in `self`.
    pub fn fully_contains(&self, other: &Identity) -> bool {
        other.iter().all(|col| self.contains(col))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<&str> = self.iter().collect();
        write!(f, "({})", columns.join(", "))
    }
}

impl From<&'static str> for Identity {
    fn from(column: &'static str) -> Self {
        Self::Unary(column)
    }
}

impl From<(&'static str, &'static str)> for Identity {
    fn from((a, b): (&'static str, &'static str)) -> Self {
        Self::Binary(a, b)
    }
}

impl From<(&'static str, &'static str, &'static str)> for Identity {
    fn from((a, b, c): (&'static str, &'static str, &'static str)) -> Self {
        Self::Ternary(a, b, c)
    }
}

/// Iterator over the column names of an `Identity`
#[derive(Debug)]
pub struct IdentityIter<'a> {
    identity: &'a Identity,
    index: usize,
}

impl<'a> Iterator for IdentityIter<'a> {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.identity {
            Identity::Unary(a) => (self.index == 0).then_some(*a),
            Identity::Binary(a, b) => match self.index {
                0 => Some(*a),
                1 => Some(*b),
                _ => None,
            },
            Identity::Ternary(a, b, c) => match self.index {
                0 => Some(*a),
                1 => Some(*b),
                2 => Some(*c),
                _ => None,
            },
            Identity::Many(vec) => vec.get(self.index).copied(),
        };
        if result.is_some() {
            self.index += 1;
        }
        result
    }
}
