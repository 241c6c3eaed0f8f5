//! WHERE-clause predicate trees.
//!
//! Predicates hold their values until the owning model renders, at which point
//! each value is bound under a unique `:name`. Lists passed to [`Column::is_in`]
//! bind one parameter per element; [`Column::in_integers`] and
//! [`Column::in_sql`] render straight into the SQL text and exist only for
//! values the caller controls.

use crate::query::model::{QueryModel, Select};
use crate::query::params::Binder;
use crate::query::{validate_identifier, QueryError};
use crate::value::Value;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gte,
    Lte,
    ILike,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::ILike => "ILIKE",
        }
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone)]
pub enum Operand {
    /// Bound under an automatically allocated name
    Value(Value),
    /// Refers to a name bound explicitly on the model
    Param(String),
}

/// Members of an `IN` / `NOT IN` test
#[derive(Debug, Clone)]
pub enum ListSource {
    /// One bound parameter per element
    Values(Vec<Value>),
    /// Inlined into the SQL text
    Integers(Vec<i64>),
    /// Caller-controlled subquery text, inlined
    Sql(String),
    /// Nested select sharing the outer parameter namespace
    Select(Box<QueryModel<Select>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joiner {
    And,
    Or,
}

impl Joiner {
    fn as_sql(&self) -> &'static str {
        match self {
            Joiner::And => " AND ",
            Joiner::Or => " OR ",
        }
    }
}

/// A node of a WHERE tree
#[derive(Debug, Clone)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        operand: Operand,
    },
    In {
        column: String,
        negated: bool,
        source: ListSource,
    },
    Null {
        column: String,
        negated: bool,
    },
    /// Parenthesized group; an empty group fails the build
    Group { joiner: Joiner, items: Vec<Predicate> },
}

/// Start a predicate on `column`.
///
/// ```
/// use incidentdb::query::col;
///
/// let p = col("incidentid").eq(7).and(col("name").ilike("%flood%"));
/// # let _ = p;
/// ```
pub fn col(column: impl Into<String>) -> Column {
    Column(column.into())
}

/// Column reference awaiting a test
#[derive(Debug, Clone)]
pub struct Column(String);

impl Column {
    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            column: self.0,
            op,
            operand: Operand::Value(value.into()),
        }
    }

    fn list(self, negated: bool, source: ListSource) -> Predicate {
        Predicate::In {
            column: self.0,
            negated,
            source,
        }
    }

    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    pub fn gte(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    pub fn lte(self, value: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }

    pub fn ilike(self, pattern: impl Into<Value>) -> Predicate {
        self.compare(CompareOp::ILike, pattern)
    }

    /// `column = :name` against a value bound with `bind(name, ..)`.
    pub fn eq_param(self, name: impl Into<String>) -> Predicate {
        self.param(CompareOp::Eq, name)
    }

    /// `column <op> :name` against an explicitly bound value.
    pub fn param(self, op: CompareOp, name: impl Into<String>) -> Predicate {
        Predicate::Compare {
            column: self.0,
            op,
            operand: Operand::Param(name.into()),
        }
    }

    pub fn is_in<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.list(false, ListSource::Values(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.list(true, ListSource::Values(values.into_iter().map(Into::into).collect()))
    }

    /// Inlined integer list.
    pub fn in_integers(self, values: impl IntoIterator<Item = i64>) -> Predicate {
        self.list(false, ListSource::Integers(values.into_iter().collect()))
    }

    pub fn not_in_integers(self, values: impl IntoIterator<Item = i64>) -> Predicate {
        self.list(true, ListSource::Integers(values.into_iter().collect()))
    }

    /// Inlined subquery text. Placeholders inside it must be bound on the
    /// outer model. Blank text fails `build()`.
    pub fn in_sql(self, subquery: impl Into<String>) -> Predicate {
        self.list(false, ListSource::Sql(subquery.into()))
    }

    pub fn not_in_sql(self, subquery: impl Into<String>) -> Predicate {
        self.list(true, ListSource::Sql(subquery.into()))
    }

    pub fn in_subquery(self, subquery: QueryModel<Select>) -> Predicate {
        self.list(false, ListSource::Select(Box::new(subquery)))
    }

    pub fn not_in_subquery(self, subquery: QueryModel<Select>) -> Predicate {
        self.list(true, ListSource::Select(Box::new(subquery)))
    }

    pub fn is_null(self) -> Predicate {
        Predicate::Null {
            column: self.0,
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::Null {
            column: self.0,
            negated: true,
        }
    }
}

impl Predicate {
    /// Group every predicate with `AND`.
    pub fn all(items: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::Group {
            joiner: Joiner::And,
            items: items.into_iter().collect(),
        }
    }

    /// Group every predicate with `OR`.
    pub fn any(items: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::Group {
            joiner: Joiner::Or,
            items: items.into_iter().collect(),
        }
    }

    pub fn and(self, other: Predicate) -> Predicate {
        self.join(Joiner::And, other)
    }

    pub fn or(self, other: Predicate) -> Predicate {
        self.join(Joiner::Or, other)
    }

    fn join(self, joiner: Joiner, other: Predicate) -> Predicate {
        match self {
            Predicate::Group {
                joiner: existing,
                mut items,
            } if existing == joiner && !items.is_empty() => {
                items.push(other);
                Predicate::Group { joiner, items }
            }
            first => Predicate::Group {
                joiner,
                items: vec![first, other],
            },
        }
    }

    /// Render as a top-level clause: the outermost group loses its parens.
    pub(crate) fn render_clause(
        &self,
        binder: &mut Binder,
        qualifier: Option<&str>,
    ) -> Result<String, QueryError> {
        match self {
            Predicate::Group { joiner, items } => render_items(*joiner, items, binder, qualifier),
            other => other.render(binder, qualifier),
        }
    }

    pub(crate) fn render(
        &self,
        binder: &mut Binder,
        qualifier: Option<&str>,
    ) -> Result<String, QueryError> {
        match self {
            Predicate::Compare {
                column,
                op,
                operand,
            } => {
                let target = qualify(column, qualifier)?;
                let name = match operand {
                    Operand::Value(value) => binder.bind_auto(column, value.clone()),
                    Operand::Param(name) => name.clone(),
                };
                Ok(format!("{target} {} :{name}", op.as_sql()))
            }
            Predicate::In {
                column,
                negated,
                source,
            } => {
                let target = qualify(column, qualifier)?;
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let members = match source {
                    ListSource::Values(values) if values.is_empty() => {
                        return Ok(empty_membership(*negated));
                    }
                    ListSource::Integers(values) if values.is_empty() => {
                        return Ok(empty_membership(*negated));
                    }
                    ListSource::Values(values) => values
                        .iter()
                        .map(|value| format!(":{}", binder.bind_auto(column, value.clone())))
                        .collect::<Vec<_>>()
                        .join(", "),
                    ListSource::Integers(values) => values
                        .iter()
                        .map(i64::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    ListSource::Sql(sql) if sql.trim().is_empty() => {
                        return Err(QueryError::MissingClause {
                            statement: keyword,
                            clause: "subquery",
                        });
                    }
                    ListSource::Sql(sql) => sql.clone(),
                    ListSource::Select(model) => model.render(binder)?,
                };
                Ok(format!("{target} {keyword} ({members})"))
            }
            Predicate::Null { column, negated } => {
                let target = qualify(column, qualifier)?;
                Ok(if *negated {
                    format!("{target} IS NOT NULL")
                } else {
                    format!("{target} IS NULL")
                })
            }
            Predicate::Group { joiner, items } => {
                let inner = render_items(*joiner, items, binder, qualifier)?;
                Ok(format!("({inner})"))
            }
        }
    }
}

fn render_items(
    joiner: Joiner,
    items: &[Predicate],
    binder: &mut Binder,
    qualifier: Option<&str>,
) -> Result<String, QueryError> {
    if items.is_empty() {
        return Err(QueryError::EmptyPredicate);
    }
    let rendered = items
        .iter()
        .map(|item| item.render(binder, qualifier))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(joiner.as_sql()))
}

fn empty_membership(negated: bool) -> String {
    let constant = if negated { "TRUE" } else { "FALSE" };
    constant.to_string()
}

/// Qualify a bare column with `table` once joins put several tables in scope.
pub(crate) fn qualify(column: &str, qualifier: Option<&str>) -> Result<String, QueryError> {
    validate_identifier(column)?;
    Ok(match qualifier {
        Some(table) if !column.contains('.') => format!("{table}.{column}"),
        _ => column.to_string(),
    })
}
