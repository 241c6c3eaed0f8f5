//! Query construction.
//!
//! # Architecture
//!
//! - **Factory**: [`QueryFactory::new_query`] starts a model for a base table
//! - **Model**: [`QueryModel`], a type-state builder for SELECT/INSERT/UPDATE/DELETE
//! - **Predicates**: [`col`] and [`Predicate`] build parenthesized WHERE trees
//! - **Parameters**: [`Parameters`], the ordered `:name` → value bindings
//! - **Named**: placeholder scanning and the `:name` → `$n` rewrite
//! - **Value Conversion**: binding values to `may_postgres` `ToSql` parameters
//!
//! # Examples
//!
//! ```
//! use incidentdb::query::{col, QueryFactory};
//!
//! let built = QueryFactory::new_query("chat")
//!     .select_all()
//!     .r#where(col("collabroomid").eq(5))
//!     .order_by_asc("seqnum")
//!     .build()?;
//! assert_eq!(
//!     built.to_sql(),
//!     "SELECT * FROM chat WHERE collabroomid = :collabroomid ORDER BY seqnum ASC"
//! );
//! # Ok::<(), incidentdb::query::QueryError>(())
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

pub mod error;
pub mod factory;
pub mod model;
pub mod named;
pub mod params;
pub mod predicate;

// Conversion of bindings into driver parameters
pub(crate) mod value_conversion;

pub use error::QueryError;
pub use factory::QueryFactory;
pub use model::{
    BuiltQuery, Delete, Initial, Insert, JoinBuilder, JoinKind, Order, QueryModel, Select,
    StatementKind, Update,
};
pub use named::{placeholders, to_positional};
pub use params::Parameters;
pub use predicate::{col, Column, CompareOp, Predicate};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern is valid")
});

/// Accept `name` or `table.name`; anything else could smuggle SQL into a
/// statement and is rejected.
pub fn validate_identifier(ident: &str) -> Result<(), QueryError> {
    if IDENTIFIER.is_match(ident) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier(ident.to_string()))
    }
}
