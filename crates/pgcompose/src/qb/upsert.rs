//! INSERT ... ON CONFLICT builder.

use crate::error::ComposeResult;
use crate::fragment::{Fragment, Scope};
use crate::ident::{Ident, IntoIdent};
use crate::qb::insert::{InsertHead, insert_head};
use crate::qb::{ident_list, invalid, option_columns, row_object};
use crate::query::Query;
use crate::record::{Record, Rows, validate_column_name};
use crate::transform::Transform;
use crate::value::Value;
use std::collections::BTreeMap;

/// What a conflicting row is detected by.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictTarget {
    /// `ON CONFLICT ("a","b")`
    Columns(Vec<String>),
    /// `ON CONFLICT ON CONSTRAINT "name"`
    Constraint(String),
}

impl ConflictTarget {
    pub fn columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        ConflictTarget::Columns(columns.into_iter().map(Into::into).collect())
    }

    pub fn constraint(name: impl Into<String>) -> Self {
        ConflictTarget::Constraint(name.into())
    }
}

/// Which columns a conflicting row gets updated with.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UpdateColumns {
    /// Every inserted column
    #[default]
    Inserted,
    /// Only these columns, in this order
    Only(Vec<String>),
    /// `DO NOTHING`
    DoNothing,
}

/// Whether each returned object carries a `$action` key (`INSERT` or `UPDATE`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportAction {
    #[default]
    Include,
    Suppress,
}

/// Options for [`upsert`].
#[derive(Debug, Clone, Default)]
pub struct UpsertOptions {
    pub update_columns: UpdateColumns,
    /// Values used instead of `EXCLUDED."col"` on update
    pub update_values: Record,
    /// Columns whose existing value is kept when the new one is NULL
    pub no_null_update_columns: Vec<String>,
    pub report_action: ReportAction,
    /// Return only these columns (default: the whole row)
    pub returning: Option<Vec<String>>,
    /// Extra computed keys merged into each returned object
    pub extras: BTreeMap<String, Fragment>,
}

impl UpsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.update_columns = UpdateColumns::Only(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn do_nothing(mut self) -> Self {
        self.update_columns = UpdateColumns::DoNothing;
        self
    }

    pub fn update_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.update_values.insert(column, value);
        self
    }

    pub fn no_null_update_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.no_null_update_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn suppress_action(mut self) -> Self {
        self.report_action = ReportAction::Suppress;
        self
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

fn excluded(column: &Ident) -> Fragment {
    let mut f = Fragment::new("EXCLUDED.");
    f.push_ident_node(column.clone());
    f
}

/// Insert rows, updating (or skipping) those that conflict.
///
/// ```ignore
/// let q = upsert(
///     "users",
///     record! { "email" => "a@example.com", "name" => "A" },
///     ConflictTarget::columns(["email"]),
///     UpsertOptions::new(),
/// )?;
/// // INSERT INTO "users" ("email","name") VALUES ($1,$2)
/// //   ON CONFLICT ("email") DO UPDATE SET ("email","name") = ROW(EXCLUDED."email",EXCLUDED."name")
/// //   RETURNING to_jsonb("users".*) || jsonb_build_object('$action', ...) AS result
/// ```
pub fn upsert(
    table: impl IntoIdent,
    rows: impl Into<Rows>,
    target: ConflictTarget,
    options: UpsertOptions,
) -> ComposeResult<Query> {
    let table = table.into_ident()?;
    let rows = rows.into();

    let do_nothing = options.update_columns == UpdateColumns::DoNothing;
    if do_nothing && !options.update_values.is_empty() {
        return Err(invalid("upsert", "`update_values` cannot be combined with DO NOTHING"));
    }
    if do_nothing && !options.no_null_update_columns.is_empty() {
        return Err(invalid(
            "upsert",
            "`no_null_update_columns` cannot be combined with DO NOTHING",
        ));
    }
    options.update_values.validate_keys("upsert")?;
    for column in &options.no_null_update_columns {
        validate_column_name(column, "upsert")?;
    }

    let conflict = match &target {
        ConflictTarget::Columns(columns) => {
            let idents = option_columns("upsert", "conflict target", columns)?;
            let mut f = Fragment::new("ON CONFLICT (");
            f.push_fragment(ident_list(&idents, ",")).push(")");
            f
        }
        ConflictTarget::Constraint(name) => {
            let mut f = Fragment::new("ON CONFLICT ON CONSTRAINT ");
            f.push_ident_node(Ident::quoted(name)?);
            f
        }
    };

    let mut returning = row_object(
        "upsert",
        "returning",
        &table,
        options.returning.as_deref(),
        &options.extras,
    )?;
    if options.report_action == ReportAction::Include {
        returning.push(
            " || jsonb_build_object('$action', CASE xmax WHEN 0 THEN 'INSERT' ELSE 'UPDATE' END)",
        );
    }

    let (mut sql, inserted) = match insert_head("upsert", &table, &rows)? {
        InsertHead::Noop(q) => return Ok(q),
        InsertHead::Statement { sql, columns } => (sql, columns),
    };

    let mut targets: Vec<String> = match &options.update_columns {
        UpdateColumns::DoNothing => Vec::new(),
        UpdateColumns::Only(columns) => {
            let mut targets = Vec::with_capacity(columns.len());
            for column in columns {
                validate_column_name(column, "upsert")?;
                if !targets.contains(column) {
                    targets.push(column.clone());
                }
            }
            targets
        }
        UpdateColumns::Inserted => inserted,
    };
    if !do_nothing {
        for key in options.update_values.keys() {
            if !targets.contains(key) {
                targets.push(key.clone());
            }
        }
    }

    sql.push(" ").push_fragment(conflict);
    if targets.is_empty() {
        sql.push(" DO NOTHING");
    } else {
        let idents: Vec<Ident> = targets.iter().map(|c| Ident::column(c)).collect();
        sql.push(" DO UPDATE SET (")
            .push_fragment(ident_list(&idents, ","))
            .push(") = ROW(");
        for (i, (name, column)) in targets.iter().zip(&idents).enumerate() {
            if i > 0 {
                sql.push(",");
            }
            match options.update_values.get(name) {
                Some(Value::Sql(f)) => {
                    sql.push_nested(Scope::column(column.clone()), f.clone());
                }
                Some(other) => {
                    sql.push_value(other.clone());
                }
                None if options.no_null_update_columns.contains(name) => {
                    let mut kept = Fragment::empty();
                    kept.push_ident_node(table.clone())
                        .push(".")
                        .push_ident_node(column.clone());
                    sql.push("CASE WHEN ")
                        .push_fragment(excluded(column))
                        .push(" IS NULL THEN ")
                        .push_fragment(kept)
                        .push(" ELSE ")
                        .push_fragment(excluded(column))
                        .push(" END");
                }
                None => {
                    sql.push_fragment(excluded(column));
                }
            }
        }
        sql.push(")");
    }
    sql.push(" RETURNING ").push_fragment(returning).push(" AS result");

    let transform = if rows.is_many() {
        Transform::AllRows
    } else {
        Transform::FirstRow
    };
    Ok(Query::new(sql, transform))
}
