//! DAO glue: run a built query through an executor and map the result.
//!
//! Every function wraps failures in [`DbError::Execution`] naming the
//! operation and the query's base table.
//!
//! ```
//! use incidentdb::dao;
//! use incidentdb::query::{col, QueryFactory};
//! use incidentdb::test_helpers::StaticExecutor;
//! use incidentdb::{EntityMapper, Identity, JoinRowMapper, MappingError, Row, RowView};
//!
//! fn chat(row: &RowView<'_>) -> Result<(i32, String), MappingError> {
//!     Ok((row.get("chatid")?, row.get("message")?))
//! }
//!
//! let mapper = JoinRowMapper::new(EntityMapper::new(
//!     "chat",
//!     Identity::Unary("chatid"),
//!     &["chatid", "message"],
//!     chat,
//! ));
//! let query = QueryFactory::new_query("chat")
//!     .select_all()
//!     .r#where(col("collabroomid").eq(5))
//!     .build()
//!     .unwrap();
//!
//! let executor = StaticExecutor::new();
//! executor.push_rows(vec![Row::new().with("chatid", 1).with("message", "hi")]);
//! let chats = dao::fetch_all(&executor, &query, &mapper).unwrap();
//! assert_eq!(chats, vec![(1, "hi".to_string())]);
//! ```

use crate::executor::{DbError, NamedExecutor};
use crate::mapper::{JoinRowMapper, RowCollector};
use crate::query::{BuiltQuery, StatementKind};
use crate::row::Row;
use crate::value::ValueType;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

fn collect<'m, E, X>(
    executor: &X,
    query: &BuiltQuery,
    mapper: &'m JoinRowMapper<E>,
    operation: &'static str,
) -> Result<RowCollector<'m, E>, DbError>
where
    X: NamedExecutor + ?Sized,
{
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::map_rows_span(mapper.root().table()).entered();

    log::debug!("{operation} on '{}': {}", query.table(), query.to_sql());
    let mut collector = RowCollector::new(mapper);
    executor
        .query(query.to_sql(), query.parameters(), &mut |row| {
            collector.on_row(&row).map_err(DbError::from)
        })
        .map_err(|e| e.context(operation, query.table()))?;

    #[cfg(feature = "metrics")]
    METRICS.record_rows_mapped(collector.rows_seen());

    Ok(collector)
}

/// All root entities, deduplicated, in first-seen order.
pub fn fetch_all<E, X>(
    executor: &X,
    query: &BuiltQuery,
    mapper: &JoinRowMapper<E>,
) -> Result<Vec<E>, DbError>
where
    X: NamedExecutor + ?Sized,
{
    Ok(collect(executor, query, mapper, "fetch_all")?.results())
}

/// At most one root entity; more than one distinct root key is an error.
pub fn fetch_single<E, X>(
    executor: &X,
    query: &BuiltQuery,
    mapper: &JoinRowMapper<E>,
) -> Result<Option<E>, DbError>
where
    X: NamedExecutor + ?Sized,
{
    collect(executor, query, mapper, "fetch_single")?
        .single_result()
        .map_err(|e| DbError::from(e).context("fetch_single", query.table()))
}

/// First column of the single result row (`COUNT(*)`, `EXISTS`, …).
pub fn fetch_scalar<T, X>(executor: &X, query: &BuiltQuery) -> Result<T, DbError>
where
    T: ValueType,
    X: NamedExecutor + ?Sized,
{
    log::debug!("fetch_scalar on '{}': {}", query.table(), query.to_sql());
    scalar(executor, query).map_err(|e| e.context("fetch_scalar", query.table()))
}

fn scalar<T, X>(executor: &X, query: &BuiltQuery) -> Result<T, DbError>
where
    T: ValueType,
    X: NamedExecutor + ?Sized,
{
    let value = executor.query_for_value(query.to_sql(), query.parameters())?;
    T::try_from_value(&value)
        .map_err(|e| DbError::ParseError(format!("Failed to extract value: {e}")))
}

/// Untyped rows.
pub fn fetch_rows<X>(executor: &X, query: &BuiltQuery) -> Result<Vec<Row>, DbError>
where
    X: NamedExecutor + ?Sized,
{
    log::debug!("fetch_rows on '{}': {}", query.table(), query.to_sql());
    executor
        .query_for_row_list(query.to_sql(), query.parameters())
        .map_err(|e| e.context("fetch_rows", query.table()))
}

/// Affected-row count of an INSERT/UPDATE/DELETE.
pub fn execute_update<X>(executor: &X, query: &BuiltQuery) -> Result<u64, DbError>
where
    X: NamedExecutor + ?Sized,
{
    log::debug!("execute_update on '{}': {}", query.table(), query.to_sql());
    executor
        .update(query.to_sql(), query.parameters())
        .map_err(|e| e.context("execute_update", query.table()))
}

/// Value of the single `RETURNING` column of an insert, e.g. a generated id.
pub fn insert_returning<T, X>(executor: &X, query: &BuiltQuery) -> Result<T, DbError>
where
    T: ValueType,
    X: NamedExecutor + ?Sized,
{
    if query.kind() != StatementKind::Insert {
        return Err(DbError::Other(format!(
            "insert_returning expects an INSERT statement, got {}",
            query.kind()
        ))
        .context("insert_returning", query.table()));
    }
    log::debug!("insert_returning on '{}': {}", query.table(), query.to_sql());
    scalar(executor, query).map_err(|e| e.context("insert_returning", query.table()))
}
