//! Row-to-graph mapping.
//!
//! - [`EntityMapper`] maps one entity out of a flat row
//! - [`JoinRowMapper`] composes a root mapper with attached relations
//! - [`RowCollector`] collapses a join's row stream into deduplicated roots

pub mod collector;
pub mod entity;
pub mod error;
pub mod join;

pub use collector::{CollectorState, RowCollector};
pub use entity::{Entity, EntityMapper, FromRow};
pub use error::MappingError;
pub use join::JoinRowMapper;
