//! DELETE builder.

use crate::condition::Where;
use crate::error::ComposeResult;
use crate::fragment::Fragment;
use crate::ident::IntoIdent;
use crate::qb::row_object;
use crate::query::Query;
use crate::transform::Transform;
use std::collections::BTreeMap;

/// Options for [`delete_from`].
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Return only these columns (default: the whole row)
    pub returning: Option<Vec<String>>,
    /// Extra computed keys merged into each returned object
    pub extras: BTreeMap<String, Fragment>,
}

impl DeleteOptions {
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

/// Delete the rows matching `filter`; the result is an array of the deleted rows.
///
/// [`Where::All`] deletes every row (`WHERE TRUE`).
pub fn delete_from(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: DeleteOptions,
) -> ComposeResult<Query> {
    let table = table.into_ident()?;
    let returning = row_object(
        "delete",
        "returning",
        &table,
        options.returning.as_deref(),
        &options.extras,
    )?;

    let mut sql = Fragment::new("DELETE FROM ");
    sql.push_ident_node(table)
        .push(" WHERE ")
        .push_fragment(filter.into().to_fragment_or_true())
        .push(" RETURNING ")
        .push_fragment(returning)
        .push(" AS result");

    Ok(Query::new(sql, Transform::AllRows))
}
