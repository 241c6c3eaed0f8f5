//! Dynamic SQL values.
//!
//! Both parameter bindings and row cells are `sea_query::Value`s. This module
//! converts them to and from Rust field types and renders them into dedup keys.

mod key;
mod types;

pub use key::{is_null, render_key_part, RowKey};
pub use sea_query::Value;
pub use types::{ValueExtractionError, ValueType};
