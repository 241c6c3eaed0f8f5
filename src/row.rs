//! Flat result rows.
//!
//! A [`Row`] is one raw query-result row as an ordered mapping from column name
//! to [`Value`]. Mappers read it through a [`RowView`], which optionally applies
//! a column prefix so two joined tables with overlapping column names can be
//! selected under aliases (`SELECT c.created AS chat_created ...`).
//!
//! Reading a column the row does not have is a [`MappingError::MissingColumn`]:
//! a mapper attached to a query that did not select its columns fails loudly
//! instead of producing a partial entity. Reading a name the row carries twice
//! with different values is a [`MappingError::AmbiguousColumn`].

use crate::mapper::MappingError;
use crate::relation::Identity;
use crate::value::{is_null, render_key_part, RowKey, Value, ValueExtractionError, ValueType};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

/// One flat query-result row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
    index: HashMap<String, usize>,
    ambiguous: HashSet<String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Row::push`].
    ///
    /// ```
    /// use incidentdb::Row;
    ///
    /// let row = Row::new().with("chatid", 1).with("message", "hi");
    /// assert_eq!(row.get::<i32>("chatid").unwrap(), 1);
    /// ```
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column.
    ///
    /// When a name repeats (`SELECT *` over a join of tables sharing a column
    /// outside the `USING` list) the first occurrence stays addressable by name
    /// as long as every repeat carries the same value. A repeat with a
    /// different value, typically NULL from an outer-join non-match, marks the
    /// name ambiguous and reads of it fail.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        let position = self.values.len();
        match self.index.get(&column) {
            Some(&first) => {
                if render_key_part(&self.values[first]) != render_key_part(&value) {
                    self.ambiguous.insert(column.clone());
                }
            }
            None => {
                self.index.insert(column.clone(), position);
            }
        }
        self.columns.push(column);
        self.values.push(value);
    }

    /// `true` when `column` appears more than once with differing values.
    pub fn is_ambiguous(&self, column: &str) -> bool {
        self.ambiguous.contains(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Raw cell lookup by column name.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.index.get(column).map(|&i| &self.values[i])
    }

    /// Cell lookup by position.
    pub fn value_at(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Unprefixed view over this row.
    pub fn view(&self) -> RowView<'_> {
        RowView {
            row: self,
            prefix: None,
        }
    }

    /// View that reads `prefix` + column name.
    pub fn prefixed<'r>(&'r self, prefix: &'r str) -> RowView<'r> {
        RowView {
            row: self,
            prefix: Some(prefix),
        }
    }

    /// Typed read, see [`RowView::get`].
    pub fn get<T: ValueType>(&self, column: &str) -> Result<T, MappingError> {
        self.view().get(column)
    }
}

impl<C, V> FromIterator<(C, V)> for Row
where
    C: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.push(column, value);
        }
        row
    }
}

/// Read access to a [`Row`] for one mapper
#[derive(Debug, Clone, Copy)]
pub struct RowView<'r> {
    row: &'r Row,
    prefix: Option<&'r str>,
}

impl<'r> RowView<'r> {
    fn resolve<'c>(&self, column: &'c str) -> Cow<'c, str> {
        match self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}{column}")),
            None => Cow::Borrowed(column),
        }
    }

    /// The underlying row.
    pub fn row(&self) -> &'r Row {
        self.row
    }

    /// Raw cell, failing when the column was not selected or is ambiguous.
    pub fn value(&self, column: &str) -> Result<&'r Value, MappingError> {
        let name = self.resolve(column);
        if self.row.is_ambiguous(&name) {
            return Err(MappingError::AmbiguousColumn {
                column: name.into_owned(),
            });
        }
        self.row
            .value(&name)
            .ok_or_else(|| MappingError::MissingColumn {
                column: name.into_owned(),
            })
    }

    /// Typed read of one column.
    ///
    /// SQL NULL becomes `None` for `Option<T>` fields and
    /// [`MappingError::UnexpectedNull`] for anything else.
    pub fn get<T: ValueType>(&self, column: &str) -> Result<T, MappingError> {
        let value = self.value(column)?;
        T::try_from_value(value).map_err(|err| {
            let column = self.resolve(column).into_owned();
            match err {
                ValueExtractionError::NullValue => MappingError::UnexpectedNull { column },
                source => MappingError::TypeMismatch { column, source },
            }
        })
    }

    pub fn is_null(&self, column: &str) -> Result<bool, MappingError> {
        Ok(is_null(self.value(column)?))
    }

    /// Dedup key for `identity`, or `None` when any key column is NULL.
    pub fn key(&self, identity: &Identity) -> Result<Option<RowKey>, MappingError> {
        let values = identity
            .iter()
            .map(|column| self.value(column))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RowKey::from_values(values))
    }
}
