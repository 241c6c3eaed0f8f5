//! Query model with type-state clause ordering.
//!
//! A model starts in [`Initial`] and picks its statement kind with the first
//! call (`select_all`, `insert_into`, `update`, `delete_from_table_where`, …).
//! From there only the clauses that make sense for that kind exist as methods:
//! joins, ordering and paging on selects, `return_value` on
//! insert/update/delete, and `where` everywhere except insert.
//!
//! Values are kept unrendered until [`QueryModel::build`], which allocates
//! parameter names, renders the SQL and checks that every `:name` placeholder
//! has exactly one binding and every binding is referenced.

use crate::query::named::placeholders;
use crate::query::params::{flatten_name, Binder};
use crate::query::predicate::qualify;
use crate::query::{validate_identifier, Parameters, Predicate, QueryError};
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;

//------------------------------------------------------------------------------
// Type State Markers
//------------------------------------------------------------------------------

/// Marker for a model whose statement kind is not chosen yet
#[derive(Debug, Clone, Copy, Default)]
pub struct Initial;

/// Marker for a SELECT model
#[derive(Debug, Clone, Copy, Default)]
pub struct Select;

/// Marker for an INSERT model
#[derive(Debug, Clone, Copy, Default)]
pub struct Insert;

/// Marker for an UPDATE model
#[derive(Debug, Clone, Copy, Default)]
pub struct Update;

/// Marker for a DELETE model
#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Select {}
    impl Sealed for super::Insert {}
    impl Sealed for super::Update {}
    impl Sealed for super::Delete {}
}

/// Statement kind of a built query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        };
        f.write_str(keyword)
    }
}

/// States that can be built
pub trait Statement: sealed::Sealed {
    const KIND: StatementKind;
}

/// States that accept a WHERE clause
pub trait Filterable: Statement {}

/// States that accept a RETURNING clause
pub trait Returning: Statement {}

/// States that assign column values
pub trait Assigning: Statement {}

impl Statement for Select {
    const KIND: StatementKind = StatementKind::Select;
}
impl Statement for Insert {
    const KIND: StatementKind = StatementKind::Insert;
}
impl Statement for Update {
    const KIND: StatementKind = StatementKind::Update;
}
impl Statement for Delete {
    const KIND: StatementKind = StatementKind::Delete;
}

impl Filterable for Select {}
impl Filterable for Update {}
impl Filterable for Delete {}

impl Returning for Insert {}
impl Returning for Update {}
impl Returning for Delete {}

impl Assigning for Insert {}
impl Assigning for Update {}

//------------------------------------------------------------------------------
// Clause parts
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

#[derive(Debug, Clone)]
enum JoinCondition {
    Using(Vec<String>),
    On(String, String),
}

#[derive(Debug, Clone)]
struct JoinClause {
    table: String,
    kind: JoinKind,
    condition: JoinCondition,
}

#[derive(Debug, Clone)]
enum Projection {
    All,
    Columns(Vec<String>),
    Count,
}

fn owned<I>(columns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    columns.into_iter().map(|c| c.as_ref().to_string()).collect()
}

fn validate_all(idents: &[String]) -> Result<(), QueryError> {
    idents.iter().try_for_each(|ident| validate_identifier(ident))
}

//------------------------------------------------------------------------------
// QueryModel
//------------------------------------------------------------------------------

/// Fluent builder for one SQL statement
///
/// # Example
///
/// ```
/// use incidentdb::query::{col, QueryFactory};
///
/// let built = QueryFactory::new_query("incident")
///     .select_all()
///     .join("incident_incidenttype")
///     .using(["incidentid"])
///     .r#where(col("workspaceid").eq(1).and(col("active").eq(true)))
///     .order_by_desc("created")
///     .limit(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     built.to_sql(),
///     "SELECT * FROM incident INNER JOIN incident_incidenttype USING (incidentid) \
///      WHERE incident.workspaceid = :workspaceid AND incident.active = :active \
///      ORDER BY incident.created DESC LIMIT 10"
/// );
/// assert_eq!(built.parameters().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct QueryModel<S = Initial> {
    table: String,
    projection: Projection,
    distinct: bool,
    columns: Vec<String>,
    joins: Vec<JoinClause>,
    filters: Vec<Predicate>,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    returning: Vec<String>,
    bindings: Vec<(String, Value)>,
    state: PhantomData<S>,
}

impl<S> QueryModel<S> {
    fn into_state<T>(self) -> QueryModel<T> {
        QueryModel {
            table: self.table,
            projection: self.projection,
            distinct: self.distinct,
            columns: self.columns,
            joins: self.joins,
            filters: self.filters,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
            returning: self.returning,
            bindings: self.bindings,
            state: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl QueryModel<Initial> {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::All,
            distinct: false,
            columns: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            offset: None,
            returning: Vec::new(),
            bindings: Vec::new(),
            state: PhantomData,
        }
    }

    /// `SELECT *`
    pub fn select_all(self) -> QueryModel<Select> {
        self.into_state()
    }

    /// `SELECT col, …` – entries may be expressions or `x AS y` aliases.
    pub fn select<I>(mut self, columns: I) -> QueryModel<Select>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.projection = Projection::Columns(owned(columns));
        self.into_state()
    }

    /// `SELECT DISTINCT col, …`
    pub fn select_distinct<I>(mut self, columns: I) -> QueryModel<Select>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.distinct = true;
        self.select(columns)
    }

    /// `SELECT COUNT(*)`
    pub fn select_count(mut self) -> QueryModel<Select> {
        self.projection = Projection::Count;
        self.into_state()
    }

    /// `INSERT INTO table (col, …) VALUES (:col, …)`; values come from
    /// [`QueryModel::bind`] or [`QueryModel::set`].
    pub fn insert_into<I>(mut self, columns: I) -> QueryModel<Insert>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.columns = owned(columns);
        self.into_state()
    }

    /// `UPDATE table SET col = :col, …`
    pub fn update<I>(mut self, columns: I) -> QueryModel<Update>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.columns = owned(columns);
        self.into_state()
    }

    /// `DELETE FROM table WHERE …`; building without a predicate fails.
    pub fn delete_from_table_where(self) -> QueryModel<Delete> {
        self.into_state()
    }
}

/// Pending join awaiting its correlation
#[must_use]
pub struct JoinBuilder {
    model: QueryModel<Select>,
    table: String,
    kind: JoinKind,
}

impl JoinBuilder {
    /// `JOIN table USING (col, …)`
    pub fn using<I>(mut self, columns: I) -> QueryModel<Select>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.model.joins.push(JoinClause {
            table: self.table,
            kind: self.kind,
            condition: JoinCondition::Using(owned(columns)),
        });
        self.model
    }

    /// `JOIN table ON left = right`
    pub fn on(mut self, left: impl Into<String>, right: impl Into<String>) -> QueryModel<Select> {
        self.model.joins.push(JoinClause {
            table: self.table,
            kind: self.kind,
            condition: JoinCondition::On(left.into(), right.into()),
        });
        self.model
    }
}

impl QueryModel<Select> {
    /// Inner join.
    pub fn join(self, table: impl Into<String>) -> JoinBuilder {
        JoinBuilder {
            model: self,
            table: table.into(),
            kind: JoinKind::Inner,
        }
    }

    pub fn left_join(self, table: impl Into<String>) -> JoinBuilder {
        JoinBuilder {
            model: self,
            table: table.into(),
            kind: JoinKind::Left,
        }
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order.push((column.into(), order));
        self
    }

    pub fn order_by_asc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Order::Asc)
    }

    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, Order::Desc)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl<S: Filterable> QueryModel<S> {
    /// Add a WHERE predicate; several calls are combined with `AND`.
    pub fn r#where(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn and_where(self, predicate: Predicate) -> Self {
        self.r#where(predicate)
    }
}

impl<S: Returning> QueryModel<S> {
    /// `RETURNING col, …`
    pub fn return_value<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.returning.extend(owned(columns));
        self
    }
}

impl<S: Assigning> QueryModel<S> {
    /// Assign `column`, adding it to the column list when absent.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        let column = column.into();
        let name = flatten_name(&column);
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self.bindings.push((name, value.into()));
        self
    }
}

impl<S: Statement> QueryModel<S> {
    /// Bind a value to the `:name` placeholder.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.push((name.into(), value.into()));
        self
    }

    /// Render the SQL text and its bindings.
    pub fn build(&self) -> Result<BuiltQuery, QueryError> {
        let mut binder = Binder::default();
        let sql = self.render(&mut binder)?;
        let parameters = binder.into_parameters();
        check_parity(&sql, &parameters)?;
        log::debug!("Built {} on '{}': {sql}", S::KIND, self.table);
        Ok(BuiltQuery {
            sql,
            parameters,
            kind: S::KIND,
            table: self.table.clone(),
        })
    }

    pub(crate) fn render(&self, binder: &mut Binder) -> Result<String, QueryError> {
        validate_identifier(&self.table)?;
        for (name, value) in &self.bindings {
            binder.bind_named(name, value.clone())?;
        }
        match S::KIND {
            StatementKind::Select => self.render_select(binder),
            StatementKind::Insert => self.render_insert(),
            StatementKind::Update => self.render_update(binder),
            StatementKind::Delete => self.render_delete(binder),
        }
    }

    fn render_select(&self, binder: &mut Binder) -> Result<String, QueryError> {
        let projection = match &self.projection {
            Projection::All => "*".to_string(),
            Projection::Count => "COUNT(*)".to_string(),
            Projection::Columns(columns) if columns.is_empty() => {
                return Err(QueryError::MissingClause {
                    statement: "SELECT",
                    clause: "column list",
                });
            }
            Projection::Columns(columns) => columns.join(", "),
        };

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&projection);
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        for join in &self.joins {
            validate_identifier(&join.table)?;
            sql.push_str(&format!(" {} {}", join.kind.as_sql(), join.table));
            match &join.condition {
                JoinCondition::Using(columns) => {
                    if columns.is_empty() {
                        return Err(QueryError::MissingClause {
                            statement: "JOIN",
                            clause: "USING",
                        });
                    }
                    validate_all(columns)?;
                    sql.push_str(&format!(" USING ({})", columns.join(", ")));
                }
                JoinCondition::On(left, right) => {
                    validate_identifier(left)?;
                    validate_identifier(right)?;
                    sql.push_str(&format!(" ON {left} = {right}"));
                }
            }
        }

        let qualifier = if self.joins.is_empty() {
            None
        } else {
            Some(self.table.as_str())
        };
        self.push_where(&mut sql, binder, qualifier)?;

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, order)| {
                    qualify(column, qualifier).map(|target| format!("{target} {}", order.as_sql()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(sql)
    }

    fn render_insert(&self) -> Result<String, QueryError> {
        if self.columns.is_empty() {
            return Err(QueryError::MissingClause {
                statement: "INSERT",
                clause: "column list",
            });
        }
        validate_all(&self.columns)?;
        let values = self
            .columns
            .iter()
            .map(|column| format!(":{}", flatten_name(column)))
            .collect::<Vec<_>>();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.columns.join(", "),
            values.join(", ")
        );
        self.push_returning(&mut sql)?;
        Ok(sql)
    }

    fn render_update(&self, binder: &mut Binder) -> Result<String, QueryError> {
        if self.columns.is_empty() {
            return Err(QueryError::MissingClause {
                statement: "UPDATE",
                clause: "SET",
            });
        }
        validate_all(&self.columns)?;
        let assignments = self
            .columns
            .iter()
            .map(|column| format!("{column} = :{}", flatten_name(column)))
            .collect::<Vec<_>>();
        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        self.push_where(&mut sql, binder, None)?;
        self.push_returning(&mut sql)?;
        Ok(sql)
    }

    fn render_delete(&self, binder: &mut Binder) -> Result<String, QueryError> {
        if self.filters.is_empty() {
            return Err(QueryError::MissingClause {
                statement: "DELETE",
                clause: "WHERE",
            });
        }
        let mut sql = format!("DELETE FROM {}", self.table);
        self.push_where(&mut sql, binder, None)?;
        self.push_returning(&mut sql)?;
        Ok(sql)
    }

    fn push_where(
        &self,
        sql: &mut String,
        binder: &mut Binder,
        qualifier: Option<&str>,
    ) -> Result<(), QueryError> {
        let clause = match self.filters.as_slice() {
            [] => return Ok(()),
            [single] => single.render_clause(binder, qualifier)?,
            many => Predicate::all(many.to_vec()).render_clause(binder, qualifier)?,
        };
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
        Ok(())
    }

    fn push_returning(&self, sql: &mut String) -> Result<(), QueryError> {
        if self.returning.is_empty() {
            return Ok(());
        }
        for column in &self.returning {
            if column != "*" {
                validate_identifier(column)?;
            }
        }
        sql.push_str(" RETURNING ");
        sql.push_str(&self.returning.join(", "));
        Ok(())
    }
}

fn check_parity(sql: &str, parameters: &Parameters) -> Result<(), QueryError> {
    let used = placeholders(sql);
    if let Some(name) = used.iter().find(|name| !parameters.contains(name)) {
        return Err(QueryError::UnboundParameter(name.clone()));
    }
    if let Some(name) = parameters.names().find(|name| !used.iter().any(|u| u == name)) {
        return Err(QueryError::UnusedParameter(name.to_string()));
    }
    Ok(())
}

//------------------------------------------------------------------------------
// BuiltQuery
//------------------------------------------------------------------------------

/// Final SQL text plus its bindings
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    sql: String,
    parameters: Parameters,
    kind: StatementKind,
    table: String,
}

impl BuiltQuery {
    /// Wrap hand-written SQL, checking placeholder/binding parity.
    ///
    /// ```
    /// use incidentdb::query::{BuiltQuery, StatementKind};
    /// use incidentdb::Parameters;
    ///
    /// let query = BuiltQuery::from_sql(
    ///     StatementKind::Select,
    ///     "usersession",
    ///     "SELECT * FROM usersession WHERE userid = :userid",
    ///     Parameters::new().with("userid", 3),
    /// )
    /// .unwrap();
    /// assert_eq!(query.parameters().len(), 1);
    /// ```
    pub fn from_sql(
        kind: StatementKind,
        table: impl Into<String>,
        sql: impl Into<String>,
        parameters: Parameters,
    ) -> Result<Self, QueryError> {
        let sql = sql.into();
        check_parity(&sql, &parameters)?;
        Ok(Self {
            sql,
            parameters,
            kind,
            table: table.into(),
        })
    }

    pub fn to_sql(&self) -> &str {
        &self.sql
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Base table, used for error context and logging.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
