//! Entity row mapping.
//!
//! An [`EntityMapper`] knows which table an entity comes from, which columns
//! identify it, which columns it reads, and how to construct it from a row.
//! Most mappers come straight from an [`Entity`] implementation (usually
//! generated by `#[derive(Entity)]`); hand-written ones use
//! [`EntityMapper::new`].

use crate::mapper::MappingError;
use crate::relation::Identity;
use crate::row::{Row, RowView};
use crate::value::RowKey;
use std::fmt;

/// Construct a value from one flat row.
pub trait FromRow: Sized {
    fn from_row(row: &RowView<'_>) -> Result<Self, MappingError>;
}

/// A plain data holder mapped to one table.
///
/// # Example
///
/// ```
/// use incidentdb::{Entity, FromRow, Identity, MappingError, RowView};
///
/// struct Chat {
///     chatid: i32,
///     message: Option<String>,
/// }
///
/// impl FromRow for Chat {
///     fn from_row(row: &RowView<'_>) -> Result<Self, MappingError> {
///         Ok(Self {
///             chatid: row.get("chatid")?,
///             message: row.get("message")?,
///         })
///     }
/// }
///
/// impl Entity for Chat {
///     const TABLE: &'static str = "chat";
///
///     fn primary_key() -> Identity {
///         Identity::Unary("chatid")
///     }
///
///     fn columns() -> &'static [&'static str] {
///         &["chatid", "message"]
///     }
/// }
/// ```
pub trait Entity: FromRow {
    /// Table name
    const TABLE: &'static str;

    /// Key column(s) used for identity and deduplication
    fn primary_key() -> Identity;

    /// Columns read by [`FromRow::from_row`]
    fn columns() -> &'static [&'static str];
}

/// Maps one entity type out of a flat row
///
/// Stateless: a mapper can be reused across any number of executions.
pub struct EntityMapper<E> {
    table: &'static str,
    identity: Identity,
    columns: Vec<&'static str>,
    prefix: Option<String>,
    build: fn(&RowView<'_>) -> Result<E, MappingError>,
}

impl<E: Entity> EntityMapper<E> {
    /// Mapper described entirely by the entity's [`Entity`] impl.
    pub fn for_entity() -> Self {
        Self::new(E::TABLE, E::primary_key(), E::columns(), E::from_row)
    }
}

impl<E: Entity> Default for EntityMapper<E> {
    fn default() -> Self {
        Self::for_entity()
    }
}

impl<E> EntityMapper<E> {
    /// Hand-assembled mapper.
    pub fn new(
        table: &'static str,
        identity: Identity,
        columns: &[&'static str],
        build: fn(&RowView<'_>) -> Result<E, MappingError>,
    ) -> Self {
        Self {
            table,
            identity,
            columns: columns.to_vec(),
            prefix: None,
            build,
        }
    }

    /// Read every column as `prefix` + name.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Select-list entries that produce exactly the columns this mapper reads.
    ///
    /// Columns are qualified with the table; with a prefix they are aliased so
    /// the row carries `prefix` + name.
    ///
    /// ```
    /// use incidentdb::{EntityMapper, Identity, MappingError, RowView};
    ///
    /// fn id(row: &RowView<'_>) -> Result<i32, MappingError> {
    ///     row.get("chatid")
    /// }
    ///
    /// let mapper = EntityMapper::new("chat", Identity::Unary("chatid"), &["chatid"], id);
    /// assert_eq!(mapper.select_list(), vec!["chat.chatid".to_string()]);
    /// let mapper = mapper.with_prefix("c_");
    /// assert_eq!(mapper.select_list(), vec!["chat.chatid AS c_chatid".to_string()]);
    /// ```
    pub fn select_list(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match &self.prefix {
                Some(prefix) => format!("{}.{column} AS {prefix}{column}", self.table),
                None => format!("{}.{column}", self.table),
            })
            .collect()
    }

    /// View over `row` with this mapper's prefix applied.
    pub fn view<'r>(&'r self, row: &'r Row) -> RowView<'r> {
        match &self.prefix {
            Some(prefix) => row.prefixed(prefix),
            None => row.view(),
        }
    }

    /// Dedup key of the entity in `row`, `None` if any key column is NULL.
    pub fn key(&self, row: &Row) -> Result<Option<RowKey>, MappingError> {
        self.view(row).key(&self.identity)
    }

    /// Construct the entity from `row`.
    pub fn map(&self, row: &Row) -> Result<E, MappingError> {
        (self.build)(&self.view(row))
    }
}

impl<E> Clone for EntityMapper<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            identity: self.identity.clone(),
            columns: self.columns.clone(),
            prefix: self.prefix.clone(),
            build: self.build,
        }
    }
}

impl<E> fmt::Debug for EntityMapper<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMapper")
            .field("table", &self.table)
            .field("identity", &self.identity)
            .field("columns", &self.columns)
            .field("prefix", &self.prefix)
            .finish()
    }
}
