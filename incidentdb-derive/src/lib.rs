//! Procedural macros for incidentdb
//!
//! This crate provides the `Entity` derive, re-exported as `incidentdb::Entity`.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `Entity` - generates `FromRow` and `Entity` implementations
///
/// Struct attributes:
/// - `#[table_name = "..."]` (defaults to the snake_case struct name)
///
/// Field attributes:
/// - `#[primary_key]` marks a key column; at least one is required, several
///   form a composite key in field order
/// - `#[column_name = "..."]` overrides the column (defaults to the field name)
/// - `#[relation]` marks a field filled by a join mapper; it is not read from
///   the row and starts as `Default::default()`
///
/// # Example
///
/// ```ignore
/// use incidentdb::Entity;
///
/// #[derive(Entity)]
/// #[table_name = "incident_incidenttype"]
/// struct IncidentIncidentType {
///     #[primary_key]
///     incidentid: i32,
///     #[primary_key]
///     incidenttypeid: i32,
///     #[column_name = "defaulttype"]
///     default_type: Option<bool>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(table_name, primary_key, column_name, relation))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    macros::derive_entity(input)
}
