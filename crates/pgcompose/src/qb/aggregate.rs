//! Aggregate builders: `count`, `sum`, `avg`, `min`, `max`.

use crate::condition::Where;
use crate::error::ComposeResult;
use crate::fragment::Fragment;
use crate::ident::IntoIdent;
use crate::qb::{ident_list, invalid, option_columns};
use crate::query::Query;
use crate::transform::Transform;

/// Options for the aggregate builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    /// The column to aggregate; `count` defaults to whole rows
    pub columns: Option<Vec<String>>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns = Some(vec![column.into()]);
        self
    }
}

fn aggregate(
    function: &str,
    table: impl IntoIdent,
    filter: Where,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    let table = table.into_ident()?;

    let mut argument = Fragment::empty();
    match &options.columns {
        Some(columns) => {
            let idents = option_columns(function, "columns", columns)?;
            if idents.len() > 1 {
                return Err(invalid(function, "aggregates take a single column"));
            }
            argument.push_fragment(ident_list(&idents, ", "));
        }
        None if function == "count" => {
            argument.push_ident_node(table.clone()).push(".*");
        }
        None => return Err(invalid(function, "a column is required")),
    }

    let mut sql = Fragment::new("SELECT ");
    sql.push(function)
        .push("(")
        .push_fragment(argument)
        .push(") AS result FROM ")
        .push_ident_node(table);
    if let Some(cond) = filter.to_fragment() {
        sql.push(" WHERE ").push_fragment(cond);
    }
    Ok(Query::new(sql, Transform::Numeric))
}

/// Count matching rows, or non-null values of one column.
///
/// ```ignore
/// let q = count("T", pgcompose::all(), AggregateOptions::new())?;
/// // SELECT count("T".*) AS result FROM "T"
/// ```
pub fn count(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    aggregate("count", table, filter.into(), options)
}

pub fn sum(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    aggregate("sum", table, filter.into(), options)
}

pub fn avg(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    aggregate("avg", table, filter.into(), options)
}

pub fn min(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    aggregate("min", table, filter.into(), options)
}

pub fn max(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: AggregateOptions,
) -> ComposeResult<Query> {
    aggregate("max", table, filter.into(), options)
}
