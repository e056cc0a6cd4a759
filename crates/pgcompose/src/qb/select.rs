//! SELECT builders: [`select`], [`select_one`] and [`select_exactly_one`].
//!
//! Every selected row is a single JSON object, so lateral subqueries can be
//! nested to any depth and the whole tree still comes back as one value:
//!
//! ```ignore
//! use pgcompose::{parent, Whereable};
//! use pgcompose::qb::{select, select_exactly_one, SelectOptions};
//!
//! let author = select_exactly_one("authors", Whereable::new().set("id", parent("author_id")), SelectOptions::new())?;
//! let books = select("books", pgcompose::all(), SelectOptions::new().lateral("author", author))?;
//! // [{"id": 1, "title": "...", "author": {"id": 7, ...}}, ...]
//! ```

use crate::condition::Where;
use crate::error::ComposeResult;
use crate::fragment::{Fragment, Scope};
use crate::ident::{Ident, IntoIdent};
use crate::qb::{ident_list, invalid, jsonb_object, option_columns, row_object};
use crate::query::Query;
use crate::transform::{Shape, Slot, Transform};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nulls {
    First,
    Last,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    pub by: Fragment,
    pub direction: Direction,
    pub nulls: Option<Nulls>,
}

impl OrderSpec {
    /// Order by an arbitrary expression.
    pub fn new(by: impl Into<Fragment>, direction: Direction) -> Self {
        Self {
            by: by.into(),
            direction,
            nulls: None,
        }
    }

    /// Order by a column, ascending.
    pub fn asc(column: &str) -> Self {
        Self::new(column_fragment(column), Direction::Asc)
    }

    /// Order by a column, descending.
    pub fn desc(column: &str) -> Self {
        Self::new(column_fragment(column), Direction::Desc)
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(Nulls::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(Nulls::Last);
        self
    }
}

fn column_fragment(column: &str) -> Fragment {
    let mut f = Fragment::empty();
    f.push_ident_node(Ident::column(column));
    f
}

#[derive(Debug, Clone, PartialEq)]
pub enum Distinct {
    /// `DISTINCT`
    All,
    /// `DISTINCT ON ("a","b")`
    On(Vec<String>),
}

/// Subqueries joined with `LEFT JOIN LATERAL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lateral {
    /// Each subquery's result becomes a key of the row object.
    Fields(BTreeMap<String, Query>),
    /// The subquery's result replaces the row object.
    Passthrough(Box<Query>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl LockMode {
    fn as_sql(self) -> &'static str {
        match self {
            LockMode::Update => "UPDATE",
            LockMode::NoKeyUpdate => "NO KEY UPDATE",
            LockMode::Share => "SHARE",
            LockMode::KeyShare => "KEY SHARE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    NoWait,
    SkipLocked,
}

impl LockWait {
    fn as_sql(self) -> &'static str {
        match self {
            LockWait::NoWait => "NOWAIT",
            LockWait::SkipLocked => "SKIP LOCKED",
        }
    }
}

/// One row-locking clause, `FOR <mode>[ OF ...][ <wait>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LockSpec {
    pub mode: LockMode,
    pub of: Option<Vec<String>>,
    pub wait: Option<LockWait>,
}

impl LockSpec {
    pub fn new(mode: LockMode) -> Self {
        Self {
            mode,
            of: None,
            wait: None,
        }
    }

    pub fn of<S: Into<String>>(mut self, tables: impl IntoIterator<Item = S>) -> Self {
        self.of = Some(tables.into_iter().map(Into::into).collect());
        self
    }

    pub fn wait(mut self, wait: LockWait) -> Self {
        self.wait = Some(wait);
        self
    }
}

/// Options for the select builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub distinct: Option<Distinct>,
    /// Select only these columns (default: the whole row)
    pub columns: Option<Vec<String>>,
    /// Extra computed keys merged into each row object
    pub extras: BTreeMap<String, Fragment>,
    /// Alias for the table in `FROM`
    pub alias: Option<String>,
    pub order: Vec<OrderSpec>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// `FETCH FIRST n ROWS WITH TIES` instead of `LIMIT n`
    pub with_ties: bool,
    pub group_by: Option<Vec<String>>,
    pub having: Option<Where>,
    pub lateral: Option<Lateral>,
    pub lock: Vec<LockSpec>,
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = Some(Distinct::All);
        self
    }

    pub fn distinct_on<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.distinct = Some(Distinct::On(columns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Fragment>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Append an `ORDER BY` term.
    pub fn order(mut self, spec: OrderSpec) -> Self {
        self.order.push(spec);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_ties(mut self) -> Self {
        self.with_ties = true;
        self
    }

    pub fn group_by<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.group_by = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn having(mut self, condition: impl Into<Where>) -> Self {
        self.having = Some(condition.into());
        self
    }

    /// Add a lateral subquery whose result is stored under `key`.
    ///
    /// Replaces a previous passthrough lateral.
    pub fn lateral(mut self, key: impl Into<String>, query: Query) -> Self {
        let mut fields = match self.lateral.take() {
            Some(Lateral::Fields(fields)) => fields,
            _ => BTreeMap::new(),
        };
        fields.insert(key.into(), query);
        self.lateral = Some(Lateral::Fields(fields));
        self
    }

    /// Use a single lateral subquery's result as the whole row.
    pub fn passthrough(mut self, query: Query) -> Self {
        self.lateral = Some(Lateral::Passthrough(Box::new(query)));
        self
    }

    /// Append a row-locking clause.
    pub fn lock(mut self, spec: LockSpec) -> Self {
        self.lock.push(spec);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Many,
    One,
    ExactlyOne,
}

impl Mode {
    fn builder(self) -> &'static str {
        match self {
            Mode::Many => "select",
            Mode::One => "select_one",
            Mode::ExactlyOne => "select_exactly_one",
        }
    }
}

/// Select matching rows as a JSON array (`[]` when none match).
pub fn select(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: SelectOptions,
) -> ComposeResult<Query> {
    build(Mode::Many, table.into_ident()?, filter.into(), options)
}

/// Select the first matching row, or null.
///
/// Any `limit` in `options` is replaced by 1.
pub fn select_one(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: SelectOptions,
) -> ComposeResult<Query> {
    build(Mode::One, table.into_ident()?, filter.into(), options)
}

/// Like [`select_one`], but a missing row fails the transform with
/// [`NotExactlyOne`](crate::ComposeError::NotExactlyOne).
///
/// Used as a lateral subquery, the check applies to every outer row.
/// More than one match is not an error; the first row is taken.
pub fn select_exactly_one(
    table: impl IntoIdent,
    filter: impl Into<Where>,
    options: SelectOptions,
) -> ComposeResult<Query> {
    build(Mode::ExactlyOne, table.into_ident()?, filter.into(), options)
}

fn validate(builder: &str, options: &SelectOptions) -> ComposeResult<()> {
    if options.with_ties {
        if options.limit.is_none() {
            return Err(invalid(builder, "`with_ties` requires `limit`"));
        }
        if options.order.is_empty() {
            return Err(invalid(builder, "`with_ties` requires at least one `order`"));
        }
    }
    if options.limit.is_some_and(|n| n < 0) {
        return Err(invalid(builder, "`limit` must not be negative"));
    }
    if options.offset.is_some_and(|n| n < 0) {
        return Err(invalid(builder, "`offset` must not be negative"));
    }
    match &options.lateral {
        Some(Lateral::Fields(fields)) if fields.is_empty() => {
            return Err(invalid(builder, "`lateral` must not be empty"));
        }
        Some(Lateral::Passthrough(_)) if options.columns.is_some() || !options.extras.is_empty() => {
            return Err(invalid(
                builder,
                "a passthrough `lateral` replaces the row; `columns` and `extras` cannot be used with it",
            ));
        }
        _ => {}
    }
    if options
        .lock
        .iter()
        .any(|spec| spec.of.as_ref().is_some_and(Vec::is_empty))
    {
        return Err(invalid(builder, "lock `of` must not be empty"));
    }
    Ok(())
}

fn lateral_alias(key: &str) -> Ident {
    Ident::column(&format!("lateral_{key}"))
}

fn nested_lateral(builder: &str, query: &Query, parent: &Ident) -> ComposeResult<Fragment> {
    if query.is_noop() {
        return Err(invalid(builder, "a no-op query cannot be used as a lateral subquery"));
    }
    let mut f = Fragment::empty();
    f.push_nested(Scope::parent(parent.clone()), query.fragment().clone());
    Ok(f)
}

fn build(mode: Mode, table: Ident, filter: Where, mut options: SelectOptions) -> ComposeResult<Query> {
    let builder = mode.builder();
    if mode != Mode::Many {
        options.limit = Some(1);
    }
    validate(builder, &options)?;

    let alias = match &options.alias {
        Some(a) => Some(Ident::quoted(a)?),
        None => None,
    };
    let table_ref = alias.clone().unwrap_or_else(|| table.clone());

    // row object and lateral joins
    let mut joins = Fragment::empty();
    let mut laterals = Vec::new();
    let row = match &options.lateral {
        Some(Lateral::Passthrough(query)) => {
            let name = Ident::column("lateral_passthru");
            joins
                .push(" LEFT JOIN LATERAL (")
                .push_fragment(nested_lateral(builder, query, &table_ref)?)
                .push(") AS ")
                .push_ident_node(name.clone())
                .push(" ON true");
            laterals.push((Slot::Passthrough, query.shape.clone()));

            let mut f = Fragment::empty();
            f.push_ident_node(name).push(".result");
            f
        }
        lateral => {
            let mut f = row_object(
                builder,
                "columns",
                &table_ref,
                options.columns.as_deref(),
                &options.extras,
            )?;
            if let Some(Lateral::Fields(fields)) = lateral {
                let mut pairs = Vec::with_capacity(fields.len());
                for (key, query) in fields {
                    crate::record::validate_column_name(key, builder)?;
                    let name = lateral_alias(key);
                    joins
                        .push(" LEFT JOIN LATERAL (")
                        .push_fragment(nested_lateral(builder, query, &table_ref)?)
                        .push(") AS ")
                        .push_ident_node(name.clone())
                        .push(" ON true");
                    laterals.push((Slot::Field(key.clone()), query.shape.clone()));

                    let mut v = Fragment::empty();
                    v.push_ident_node(name).push(".result");
                    pairs.push((key.as_str(), v));
                }
                f.push(" || ").push_fragment(jsonb_object(pairs));
            }
            f
        }
    };

    let mut sql = Fragment::new("SELECT");
    match &options.distinct {
        Some(Distinct::All) => {
            sql.push(" DISTINCT");
        }
        Some(Distinct::On(columns)) => {
            let idents = option_columns(builder, "distinct", columns)?;
            sql.push(" DISTINCT ON (")
                .push_fragment(ident_list(&idents, ","))
                .push(")");
        }
        None => {}
    }
    sql.push(" ").push_fragment(row).push(" AS result FROM ");
    sql.push_ident_node(table.clone());
    if let Some(alias) = &alias {
        sql.push(" AS ").push_ident_node(alias.clone());
    }
    sql.push_fragment(joins);

    if let Some(cond) = filter.to_fragment() {
        sql.push(" WHERE ").push_fragment(cond);
    }
    if let Some(group_by) = &options.group_by {
        let idents = option_columns(builder, "group_by", group_by)?;
        sql.push(" GROUP BY ").push_fragment(ident_list(&idents, ", "));
    }
    if let Some(having) = &options.having {
        sql.push(" HAVING ").push_fragment(having.to_fragment_or_true());
    }
    if !options.order.is_empty() {
        sql.push(" ORDER BY ");
        for (i, spec) in options.order.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            sql.push_fragment(spec.by.clone());
            sql.push(match spec.direction {
                Direction::Asc => " ASC",
                Direction::Desc => " DESC",
            });
            if let Some(nulls) = spec.nulls {
                sql.push(match nulls {
                    Nulls::First => " NULLS FIRST",
                    Nulls::Last => " NULLS LAST",
                });
            }
        }
    }
    if let Some(limit) = options.limit {
        if options.with_ties {
            sql.push(" FETCH FIRST ").push_bind(limit).push(" ROWS WITH TIES");
        } else {
            sql.push(" LIMIT ").push_bind(limit);
        }
    }
    if let Some(offset) = options.offset {
        sql.push(" OFFSET ").push_bind(offset);
        if options.with_ties {
            sql.push(" ROWS");
        }
    }
    for spec in &options.lock {
        sql.push(" FOR ").push(spec.mode.as_sql());
        if let Some(of) = &spec.of {
            let tables = of
                .iter()
                .map(|t| Ident::parse(t))
                .collect::<ComposeResult<Vec<_>>>()?;
            sql.push(" OF ").push_fragment(ident_list(&tables, ", "));
        }
        if let Some(wait) = spec.wait {
            sql.push(" ").push(wait.as_sql());
        }
    }

    let shape = Shape {
        required: mode == Mode::ExactlyOne,
        many: mode == Mode::Many,
        laterals,
    };

    if mode == Mode::Many {
        let mut wrapped = Fragment::new("SELECT coalesce(jsonb_agg(result), '[]') AS result FROM (");
        wrapped
            .push_fragment(sql)
            .push(") AS ")
            .push_ident_node(table_ref.prefixed("sq_"));
        return Ok(Query::new(wrapped, Transform::FirstRow).with_shape(shape));
    }
    Ok(Query::new(sql, Transform::FirstRow).with_shape(shape))
}
