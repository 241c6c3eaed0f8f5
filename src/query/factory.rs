//! Entry point for query models.

use crate::mapper::Entity;
use crate::query::QueryModel;

/// Starts query models
///
/// Stateless; every call returns a fresh model that is built and executed once.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFactory;

impl QueryFactory {
    /// Fresh model over `table`.
    pub fn new_query(table: impl Into<String>) -> QueryModel {
        QueryModel::new(table)
    }

    /// Fresh model over the entity's table.
    pub fn for_entity<E: Entity>() -> QueryModel {
        QueryModel::new(E::TABLE)
    }
}
