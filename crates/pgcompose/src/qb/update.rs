//! UPDATE builder.

use crate::condition::Where;
use crate::error::ComposeResult;
use crate::fragment::{Fragment, cols, vals};
use crate::ident::IntoIdent;
use crate::qb::{invalid, row_object};
use crate::query::Query;
use crate::record::Record;
use crate::transform::Transform;
use std::collections::BTreeMap;

/// Options for [`update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Return only these columns (default: the whole row)
    pub returning: Option<Vec<String>>,
    /// Extra computed keys merged into each returned object
    pub extras: BTreeMap<String, Fragment>,
}

impl UpdateOptions {
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

/// Update the rows matching `filter`; the result is an array of the updated rows.
///
/// `UPDATE "t" SET ("a","b") = ROW($1,$2) WHERE <filter> RETURNING ... AS result`
pub fn update(
    table: impl IntoIdent,
    record: Record,
    filter: impl Into<Where>,
    options: UpdateOptions,
) -> ComposeResult<Query> {
    let table = table.into_ident()?;
    if record.is_empty() {
        return Err(invalid("update", "nothing to set: the record has no columns"));
    }
    record.validate_keys("update")?;

    let returning = row_object(
        "update",
        "returning",
        &table,
        options.returning.as_deref(),
        &options.extras,
    )?;

    let mut sql = Fragment::new("UPDATE ");
    sql.push_ident_node(table)
        .push(" SET (")
        .embed(cols(record.keys()))
        .push(") = ROW(")
        .embed(vals(&record))
        .push(") WHERE ")
        .push_fragment(filter.into().to_fragment_or_true())
        .push(" RETURNING ")
        .push_fragment(returning)
        .push(" AS result");

    Ok(Query::new(sql, Transform::AllRows))
}
