//! # incidentdb
//!
//! Persistence layer for incident-management data on PostgreSQL:
//!
//! - a type-state query builder producing SQL with `:name` placeholders
//!   ([`query`])
//! - a join-collapsing row mapper that turns the fanned-out rows of a
//!   one-to-many join back into a deduplicated entity graph ([`mapper`])
//! - a named-parameter execution facility over `may_postgres`
//!   ([`executor`]) and the DAO functions tying the three together ([`dao`])
//!
//! ```
//! use incidentdb::query::{col, QueryFactory};
//! use incidentdb::test_helpers::StaticExecutor;
//! use incidentdb::{dao, EntityMapper, FromRow, Identity, JoinRowMapper, MappingError, Relation, Row, RowView};
//!
//! #[derive(Debug)]
//! struct IncidentType {
//!     incidenttypeid: i32,
//! }
//!
//! impl FromRow for IncidentType {
//!     fn from_row(row: &RowView<'_>) -> Result<Self, MappingError> {
//!         Ok(Self { incidenttypeid: row.get("incidenttypeid")? })
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Incident {
//!     incidentid: i32,
//!     types: Vec<IncidentType>,
//! }
//!
//! impl FromRow for Incident {
//!     fn from_row(row: &RowView<'_>) -> Result<Self, MappingError> {
//!         Ok(Self { incidentid: row.get("incidentid")?, types: Vec::new() })
//!     }
//! }
//!
//! let mapper = JoinRowMapper::new(EntityMapper::new(
//!     "incident",
//!     Identity::Unary("incidentid"),
//!     &["incidentid"],
//!     Incident::from_row,
//! ))
//! .attach(
//!     EntityMapper::new(
//!         "incident_incidenttype",
//!         Identity::Binary("incidentid", "incidenttypeid"),
//!         &["incidenttypeid"],
//!         IncidentType::from_row,
//!     ),
//!     Relation::many("types", |i: &mut Incident| &mut i.types),
//! );
//!
//! let query = QueryFactory::new_query("incident")
//!     .select_all()
//!     .left_join("incident_incidenttype")
//!     .using(["incidentid"])
//!     .r#where(col("incidentid").eq(1))
//!     .build()
//!     .unwrap();
//!
//! let executor = StaticExecutor::new();
//! executor.push_rows(
//!     (1..=3)
//!         .map(|t| Row::new().with("incidentid", 1).with("incidenttypeid", t))
//!         .collect(),
//! );
//!
//! let incidents = dao::fetch_all(&executor, &query, &mapper).unwrap();
//! assert_eq!(incidents.len(), 1);
//! assert_eq!(incidents[0].types.len(), 3);
//! ```

// Lets `#[derive(Entity)]` output (`::incidentdb::...`) resolve inside this crate.
extern crate self as incidentdb;

pub mod config;
pub mod connection;
pub mod dao;
pub mod executor;
pub mod mapper;
pub mod metrics;
pub mod query;
pub mod raw_sql;
pub mod relation;
pub mod row;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod value;

pub use incidentdb_derive::Entity;

pub use config::DatabaseConfig;
pub use connection::{connect, connect_with_config, executor_from_config, ConnectionError};
pub use dao::{execute_update, fetch_all, fetch_rows, fetch_scalar, fetch_single, insert_returning};
pub use executor::{DbError, NamedExecutor, PgExecutor};
pub use mapper::{
    CollectorState, Entity, EntityMapper, FromRow, JoinRowMapper, MappingError, RowCollector,
};
pub use query::{col, BuiltQuery, Parameters, Predicate, QueryError, QueryFactory, QueryModel};
pub use raw_sql::{
    execute_statement, execute_unprepared, find_all_by_statement, find_by_statement, query_value,
};
pub use relation::{Identity, Relation, RelationType};
pub use row::{Row, RowView};
pub use value::{Value, ValueType};
