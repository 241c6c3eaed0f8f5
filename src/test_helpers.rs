//! In-memory executor for tests.
//!
//! [`StaticExecutor`] records every statement it receives and replays canned
//! row sets and affected-row counts in FIFO order. Placeholders are checked
//! the same way the PostgreSQL executor checks them, so an unbound `:name`
//! fails here too.
//!
//! Compiled for this crate's own tests and behind the `test-helpers` feature.

use crate::executor::{DbError, NamedExecutor};
use crate::query::{to_positional, Parameters};
use crate::row::Row;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// One statement seen by a [`StaticExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub parameters: Parameters,
}

#[derive(Debug, Default)]
struct State {
    row_sets: VecDeque<Vec<Row>>,
    update_counts: VecDeque<u64>,
    failures: VecDeque<String>,
    statements: Vec<RecordedStatement>,
}

/// Canned-response [`NamedExecutor`]
///
/// ```
/// use incidentdb::test_helpers::StaticExecutor;
/// use incidentdb::{NamedExecutor, Parameters, Row};
///
/// let executor = StaticExecutor::new();
/// executor.push_rows(vec![Row::new().with("chatid", 1)]);
/// let rows = executor.query_for_row_list("SELECT chatid FROM chat", &Parameters::new()).unwrap();
/// assert_eq!(rows.len(), 1);
/// assert_eq!(executor.statements()[0].sql, "SELECT chatid FROM chat");
/// ```
#[derive(Debug, Default)]
pub struct StaticExecutor {
    state: Mutex<State>,
}

impl StaticExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rows returned by the next `query`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().row_sets.push_back(rows);
    }

    /// Count returned by the next `update`.
    pub fn push_update_count(&self, count: u64) {
        self.state().update_counts.push_back(count);
    }

    /// Make the next call fail with `DbError::Other(message)`.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state().failures.push_back(message.into());
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.state().statements.clone()
    }

    fn record(&self, sql: &str, params: &Parameters) -> Result<(), DbError> {
        let mut state = self.state();
        state.statements.push(RecordedStatement {
            sql: sql.to_string(),
            parameters: params.clone(),
        });
        if let Some(message) = state.failures.pop_front() {
            return Err(DbError::Other(message));
        }
        to_positional(sql, params)?;
        Ok(())
    }
}

impl NamedExecutor for StaticExecutor {
    fn query(
        &self,
        sql: &str,
        params: &Parameters,
        on_row: &mut dyn FnMut(Row) -> Result<(), DbError>,
    ) -> Result<(), DbError> {
        self.record(sql, params)?;
        let rows = self.state().row_sets.pop_front().unwrap_or_default();
        for row in rows {
            on_row(row)?;
        }
        Ok(())
    }

    fn update(&self, sql: &str, params: &Parameters) -> Result<u64, DbError> {
        self.record(sql, params)?;
        Ok(self.state().update_counts.pop_front().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[test]
    fn test_replays_in_order() {
        let executor = StaticExecutor::new();
        executor.push_rows(vec![Row::new().with("a", 1)]);
        executor.push_rows(vec![]);
        let params = Parameters::new();
        assert_eq!(executor.query_for_row_list("SELECT a", &params).unwrap().len(), 1);
        assert!(executor.query_for_row_list("SELECT a", &params).unwrap().is_empty());
        assert!(executor.query_for_row_list("SELECT a", &params).unwrap().is_empty());
        assert_eq!(executor.statements().len(), 3);
    }

    #[test]
    fn test_unbound_placeholder_fails() {
        let executor = StaticExecutor::new();
        let err = executor.update("DELETE FROM chat WHERE chatid = :id", &Parameters::new());
        assert!(matches!(
            err,
            Err(DbError::Query(QueryError::UnboundParameter(name))) if name == "id"
        ));
    }

    #[test]
    fn test_failure_injection() {
        let executor = StaticExecutor::new();
        executor.push_failure("connection reset");
        assert!(executor.update("SELECT 1", &Parameters::new()).is_err());
        assert_eq!(executor.update("SELECT 1", &Parameters::new()).unwrap(), 0);
    }
}
