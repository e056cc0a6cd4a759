//! INSERT builder.

use crate::error::ComposeResult;
use crate::fragment::{Fragment, Item};
use crate::ident::{Ident, IntoIdent};
use crate::qb::{invalid, row_object};
use crate::query::Query;
use crate::record::{Record, Rows};
use crate::transform::Transform;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Options for [`insert`].
#[derive(Debug, Clone, Default)]
pub struct InsertOptions {
    /// Return only these columns (default: the whole row)
    pub returning: Option<Vec<String>>,
    /// Extra computed keys merged into each returned object
    pub extras: BTreeMap<String, Fragment>,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.returning = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Fragment>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }
}

/// `INSERT INTO ... VALUES ...` without a RETURNING clause.
pub(crate) enum InsertHead {
    /// Nothing to insert
    Noop(Query),
    Statement { sql: Fragment, columns: Vec<String> },
}

pub(crate) fn insert_head(builder: &str, table: &Ident, rows: &Rows) -> ComposeResult<InsertHead> {
    if rows.is_empty_many() {
        let mut sql = Fragment::new("INSERT INTO ");
        sql.push_ident_node(table.clone()).push(" SELECT null WHERE false");
        return Ok(InsertHead::Noop(Query::noop(
            sql,
            serde_json::Value::Array(Vec::new()),
            Transform::AllRows,
        )));
    }

    let records = rows.records();
    for record in records {
        record.validate_keys(builder)?;
    }

    let columns: Vec<String> = records
        .iter()
        .flat_map(Record::keys)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let mut sql = Fragment::new("INSERT INTO ");
    sql.push_ident_node(table.clone());

    if columns.is_empty() {
        if records.len() > 1 {
            return Err(invalid(
                builder,
                "several records without columns cannot be inserted in one statement",
            ));
        }
        sql.push(" DEFAULT VALUES");
        return Ok(InsertHead::Statement { sql, columns });
    }

    sql.push(" (")
        .embed(crate::fragment::cols(&columns))
        .push(") VALUES ");
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        // missing keys take the column default
        let values = columns
            .iter()
            .map(|c| (c.clone(), record.get(c).cloned().unwrap_or(Value::UseDefault)))
            .collect();
        sql.push("(").embed(Item::Values(values)).push(")");
    }

    Ok(InsertHead::Statement { sql, columns })
}

/// Insert one record, or several in a single statement.
///
/// The column list is the sorted union of all record keys; a record lacking a
/// key inserts `DEFAULT` for it. An empty sequence builds a no-op query that
/// returns `[]` without touching the database.
///
/// ```ignore
/// let q = insert("T", record! { "name" => "John", "age" => 30 }, InsertOptions::new())?;
/// // INSERT INTO "T" ("age","name") VALUES ($1,$2) RETURNING to_jsonb("T".*) AS result
/// ```
pub fn insert(
    table: impl IntoIdent,
    rows: impl Into<Rows>,
    options: InsertOptions,
) -> ComposeResult<Query> {
    let table = table.into_ident()?;
    let rows = rows.into();

    let returning = row_object(
        "insert",
        "returning",
        &table,
        options.returning.as_deref(),
        &options.extras,
    )?;

    let mut sql = match insert_head("insert", &table, &rows)? {
        InsertHead::Noop(q) => return Ok(q),
        InsertHead::Statement { sql, .. } => sql,
    };
    sql.push(" RETURNING ").push_fragment(returning).push(" AS result");

    let transform = if rows.is_many() {
        Transform::AllRows
    } else {
        Transform::FirstRow
    };
    Ok(Query::new(sql, transform))
}
