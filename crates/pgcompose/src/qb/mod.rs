//! Shortcut query builders.
//!
//! Each builder validates its inputs, composes a [`Fragment`] and returns a
//! [`Query`](crate::Query) whose rows are `{ result: <json> }`. Rows come back
//! as JSON built by PostgreSQL itself (`to_jsonb`, `jsonb_build_object`,
//! `jsonb_agg`), so nested lateral results need no client-side assembly.
//!
//! # Usage
//!
//! ```ignore
//! use pgcompose::{record, qb, Whereable};
//!
//! // INSERT ... RETURNING
//! let q = qb::insert("users", record! { "name" => "alice", "age" => 30 }, Default::default())?;
//!
//! // UPDATE
//! let q = qb::update(
//!     "users",
//!     record! { "status" => "inactive" },
//!     Whereable::new().set("id", 1),
//!     Default::default(),
//! )?;
//!
//! // SELECT with a lateral join
//! let books = qb::select("books", Whereable::new().set("author_id", pgcompose::parent("id")), Default::default())?;
//! let q = qb::select(
//!     "authors",
//!     pgcompose::all(),
//!     qb::SelectOptions::new().lateral("books", books),
//! )?;
//! ```

mod aggregate;
mod delete;
mod insert;
mod select;
mod truncate;
mod update;
mod upsert;

pub use aggregate::{AggregateOptions, avg, count, max, min, sum};
pub use delete::{DeleteOptions, delete_from};
pub use insert::{InsertOptions, insert};
pub use select::{
    Direction, Distinct, Lateral, LockMode, LockSpec, LockWait, Nulls, OrderSpec, SelectOptions,
    select, select_exactly_one, select_one,
};
pub use truncate::{Behavior, Identity, TruncateOptions, truncate};
pub use update::{UpdateOptions, update};
pub use upsert::{ConflictTarget, ReportAction, UpdateColumns, UpsertOptions, upsert};

use crate::error::{ComposeError, ComposeResult};
use crate::fragment::Fragment;
use crate::ident::Ident;
use crate::record::validate_column_name;
use std::collections::BTreeMap;

/// Build a validation error and trace it.
pub(crate) fn invalid(builder: &str, message: impl std::fmt::Display) -> ComposeError {
    let message = format!("{builder}: {message}");
    tracing::trace!(target: "pgcompose.qb", builder, %message, "rejected builder input");
    ComposeError::Validation(message)
}

/// Validate a list of column names given as an option.
pub(crate) fn option_columns(
    builder: &str,
    option: &str,
    columns: &[String],
) -> ComposeResult<Vec<Ident>> {
    if columns.is_empty() {
        return Err(invalid(builder, format!("`{option}` must not be empty")));
    }
    columns
        .iter()
        .map(|c| {
            validate_column_name(c, builder)?;
            Ok(Ident::column(c))
        })
        .collect()
}

/// Quoted identifiers joined with `separator`.
pub(crate) fn ident_list(idents: &[Ident], separator: &str) -> Fragment {
    let mut f = Fragment::empty();
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            f.push(separator);
        }
        f.push_ident_node(ident.clone());
    }
    f
}

/// `jsonb_build_object($1::text, <a>, $2::text, <b>)`
pub(crate) fn jsonb_object<'a>(pairs: impl IntoIterator<Item = (&'a str, Fragment)>) -> Fragment {
    let mut f = Fragment::new("jsonb_build_object(");
    for (i, (key, value)) in pairs.into_iter().enumerate() {
        if i > 0 {
            f.push(", ");
        }
        f.push_bind_cast(key, "text").push(", ").push_fragment(value);
    }
    f.push(")");
    f
}

/// The object expression built for each row.
///
/// `to_jsonb(<table>.*)` by default, or only the named `columns`; `extras`
/// are merged in as additional keys.
pub(crate) fn row_object(
    builder: &str,
    option: &str,
    table: &Ident,
    columns: Option<&[String]>,
    extras: &BTreeMap<String, Fragment>,
) -> ComposeResult<Fragment> {
    let mut f = match columns {
        Some(columns) => {
            let idents = option_columns(builder, option, columns)?;
            jsonb_object(columns.iter().zip(idents).map(|(name, ident)| {
                let mut v = Fragment::empty();
                v.push_ident_node(ident);
                (name.as_str(), v)
            }))
        }
        None => {
            let mut f = Fragment::new("to_jsonb(");
            f.push_ident_node(table.clone()).push(".*)");
            f
        }
    };

    if !extras.is_empty() {
        for key in extras.keys() {
            validate_column_name(key, builder)?;
        }
        f.push(" || ");
        f.push_fragment(jsonb_object(
            extras.iter().map(|(k, v)| (k.as_str(), v.clone())),
        ));
    }
    Ok(f)
}

#[cfg(test)]
mod tests;
