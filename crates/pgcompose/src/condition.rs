//! WHERE conditions.
//!
//! - [`Whereable`]: a column → operand mapping, rendered as an `AND` group.
//!   Plain values compare with `=`; fragments are parenthesised and may use
//!   [`self_col`](crate::self_col) to refer to the column they are keyed under.
//! - [`Op`]: comparison operators rendered against the current column.
//! - [`Where`]: the condition a builder filters by.
//! - [`and`], [`or`], [`not`]: combinators.
//!
//! # Example
//! ```ignore
//! use pgcompose::{Op, Whereable};
//!
//! let w = Whereable::new()
//!     .set("status", "active")
//!     .set("age", Op::gte(18));
//! // ("age" >= $1 ... ) rendered as: (("age" >= $1) AND "status" = $2)
//! ```

use crate::fragment::{Fragment, Item, Scope};
use crate::ident::Ident;
use crate::value::{SqlParam, impl_from_params};
use std::collections::BTreeMap;

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Bound as `$n`
    Param(SqlParam),
    /// A fragment; in a [`Whereable`] it is evaluated with its key as the current column
    Sql(Fragment),
    /// A column of the parent table of a lateral subquery
    Parent(Ident),
}

impl Operand {
    fn push_to(self, f: &mut Fragment) {
        match self {
            Operand::Param(p) => {
                f.push_bind(p);
            }
            Operand::Sql(frag) => {
                f.push_fragment(frag);
            }
            Operand::Parent(column) => {
                f.embed(Item::Parent(column));
            }
        }
    }
}

impl From<SqlParam> for Operand {
    fn from(v: SqlParam) -> Self {
        Operand::Param(v)
    }
}

impl From<Fragment> for Operand {
    fn from(v: Fragment) -> Self {
        Operand::Sql(v)
    }
}

impl_from_params!(Operand);

/// Reference to a column of the enclosing lateral query's table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentColumn(Ident);

/// Refer to `column` of the parent table, inside a lateral subquery.
///
/// ```ignore
/// let books = pgcompose::select("books", Whereable::new().set("author_id", parent("id")), SelectOptions::new())?;
/// ```
pub fn parent(column: impl AsRef<str>) -> ParentColumn {
    ParentColumn(Ident::column(column.as_ref()))
}

impl From<ParentColumn> for Operand {
    fn from(v: ParentColumn) -> Self {
        Operand::Parent(v.0)
    }
}

impl From<ParentColumn> for Item {
    fn from(v: ParentColumn) -> Self {
        Item::Parent(v.0)
    }
}

/// Query operator rendered against the current column.
///
/// # Example
/// ```ignore
/// use pgcompose::Op;
///
/// Op::eq("value")
/// Op::gt(100)
/// Op::ilike("%pattern%")
/// Op::<i32>::is_null()
/// Op::in_list(vec![1, 2, 3])
/// Op::between(10, 20)
/// ```
#[derive(Debug, Clone)]
pub enum Op<T> {
    /// Equal: column = value
    Eq(T),
    /// Not equal: column != value
    Ne(T),
    /// Greater than: column > value
    Gt(T),
    /// Greater than or equal: column >= value
    Gte(T),
    /// Less than: column < value
    Lt(T),
    /// Less than or equal: column <= value
    Lte(T),
    /// LIKE pattern match
    Like(T),
    /// Case-insensitive LIKE (PostgreSQL ILIKE)
    Ilike(T),
    /// NOT LIKE pattern match
    NotLike(T),
    /// NOT ILIKE pattern match
    NotIlike(T),
    /// IS DISTINCT FROM
    IsDistinctFrom(T),
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
    /// IN (list)
    In(Vec<T>),
    /// NOT IN (list)
    NotIn(Vec<T>),
    /// BETWEEN a AND b
    Between(T, T),
    /// NOT BETWEEN a AND b
    NotBetween(T, T),
}

impl<T> Op<T> {
    pub fn eq(val: T) -> Self {
        Op::Eq(val)
    }

    pub fn ne(val: T) -> Self {
        Op::Ne(val)
    }

    pub fn gt(val: T) -> Self {
        Op::Gt(val)
    }

    pub fn gte(val: T) -> Self {
        Op::Gte(val)
    }

    pub fn lt(val: T) -> Self {
        Op::Lt(val)
    }

    pub fn lte(val: T) -> Self {
        Op::Lte(val)
    }

    pub fn like(val: T) -> Self {
        Op::Like(val)
    }

    pub fn ilike(val: T) -> Self {
        Op::Ilike(val)
    }

    pub fn not_like(val: T) -> Self {
        Op::NotLike(val)
    }

    pub fn not_ilike(val: T) -> Self {
        Op::NotIlike(val)
    }

    pub fn is_distinct_from(val: T) -> Self {
        Op::IsDistinctFrom(val)
    }

    pub fn is_null() -> Self {
        Op::IsNull
    }

    pub fn is_not_null() -> Self {
        Op::IsNotNull
    }

    pub fn in_list(vals: Vec<T>) -> Self {
        Op::In(vals)
    }

    pub fn not_in(vals: Vec<T>) -> Self {
        Op::NotIn(vals)
    }

    pub fn between(from: T, to: T) -> Self {
        Op::Between(from, to)
    }

    pub fn not_between(from: T, to: T) -> Self {
        Op::NotBetween(from, to)
    }
}

impl<T: Into<Operand>> Op<T> {
    /// Render against the current column.
    pub fn to_fragment(self) -> Fragment {
        let mut f = Fragment::empty();

        // x IN () is not valid SQL
        match &self {
            Op::In(vals) if vals.is_empty() => {
                f.push("false");
                return f;
            }
            Op::NotIn(vals) if vals.is_empty() => {
                f.push("true");
                return f;
            }
            _ => {}
        }

        f.embed(Item::SelfColumn);
        match self {
            Op::Eq(v) => binary(&mut f, " = ", v),
            Op::Ne(v) => binary(&mut f, " != ", v),
            Op::Gt(v) => binary(&mut f, " > ", v),
            Op::Gte(v) => binary(&mut f, " >= ", v),
            Op::Lt(v) => binary(&mut f, " < ", v),
            Op::Lte(v) => binary(&mut f, " <= ", v),
            Op::Like(v) => binary(&mut f, " LIKE ", v),
            Op::Ilike(v) => binary(&mut f, " ILIKE ", v),
            Op::NotLike(v) => binary(&mut f, " NOT LIKE ", v),
            Op::NotIlike(v) => binary(&mut f, " NOT ILIKE ", v),
            Op::IsDistinctFrom(v) => binary(&mut f, " IS DISTINCT FROM ", v),
            Op::IsNull => {
                f.push(" IS NULL");
            }
            Op::IsNotNull => {
                f.push(" IS NOT NULL");
            }
            Op::In(vals) => list(&mut f, " IN (", vals),
            Op::NotIn(vals) => list(&mut f, " NOT IN (", vals),
            Op::Between(from, to) => range(&mut f, " BETWEEN ", from, to),
            Op::NotBetween(from, to) => range(&mut f, " NOT BETWEEN ", from, to),
        }
        f
    }
}

fn binary<T: Into<Operand>>(f: &mut Fragment, operator: &str, value: T) {
    f.push(operator);
    value.into().push_to(f);
}

fn list<T: Into<Operand>>(f: &mut Fragment, open: &str, values: Vec<T>) {
    f.push(open);
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            f.push(", ");
        }
        v.into().push_to(f);
    }
    f.push(")");
}

fn range<T: Into<Operand>>(f: &mut Fragment, operator: &str, from: T, to: T) {
    f.push(operator);
    from.into().push_to(f);
    f.push(" AND ");
    to.into().push_to(f);
}

impl<T: Into<Operand>> From<Op<T>> for Operand {
    fn from(op: Op<T>) -> Self {
        Operand::Sql(op.to_fragment())
    }
}

impl<T: Into<Operand>> From<Op<T>> for Fragment {
    fn from(op: Op<T>) -> Self {
        op.to_fragment()
    }
}

/// A column → operand mapping; all entries are `AND`ed.
///
/// Entries render in ascending column order. An empty mapping renders `TRUE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Whereable {
    conditions: BTreeMap<String, Operand>,
}

impl Whereable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition on `column`, replacing any previous one.
    pub fn set(mut self, column: impl Into<String>, operand: impl Into<Operand>) -> Self {
        self.conditions.insert(column.into(), operand.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Render as `("a" = $1 AND (<fragment on b>))`.
    pub fn to_fragment(&self) -> Fragment {
        let mut f = Fragment::empty();
        if self.conditions.is_empty() {
            f.push("TRUE");
            return f;
        }

        f.push("(");
        for (i, (column, operand)) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.push(" AND ");
            }
            let column = Ident::column(column);
            match operand.clone() {
                Operand::Sql(body) => {
                    f.push("(");
                    f.push_nested(Scope::column(column), body);
                    f.push(")");
                }
                other => {
                    f.push_ident_node(column);
                    f.push(" = ");
                    other.push_to(&mut f);
                }
            }
        }
        f.push(")");
        f
    }
}

impl<K: Into<String>, V: Into<Operand>> FromIterator<(K, V)> for Whereable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            conditions: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The condition a statement filters by.
#[derive(Debug, Clone, PartialEq)]
pub enum Where {
    /// Every row; select omits the WHERE clause, update and delete use `TRUE`
    All,
    /// An equality mapping
    Match(Whereable),
    /// An arbitrary condition fragment
    Sql(Fragment),
}

/// Match every row.
pub fn all() -> Where {
    Where::All
}

impl Where {
    /// The condition as a fragment; `None` for [`Where::All`].
    pub(crate) fn to_fragment(&self) -> Option<Fragment> {
        match self {
            Where::All => None,
            Where::Match(w) => Some(w.to_fragment()),
            Where::Sql(f) => Some(f.clone()),
        }
    }

    /// The condition as a fragment, `TRUE` for [`Where::All`].
    pub(crate) fn to_fragment_or_true(&self) -> Fragment {
        self.to_fragment().unwrap_or_else(|| Fragment::new("TRUE"))
    }
}

impl From<Whereable> for Where {
    fn from(w: Whereable) -> Self {
        Where::Match(w)
    }
}

impl From<Fragment> for Where {
    fn from(f: Fragment) -> Self {
        Where::Sql(f)
    }
}

fn combine<W: Into<Where>>(items: impl IntoIterator<Item = W>, operator: &str, empty: &str) -> Fragment {
    let mut f = Fragment::empty();
    let parts: Vec<Fragment> = items
        .into_iter()
        .map(|w| w.into().to_fragment_or_true())
        .collect();
    if parts.is_empty() {
        f.push(empty);
        return f;
    }

    f.push("(");
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            f.push(operator);
        }
        f.push_fragment(part);
    }
    f.push(")");
    f
}

/// `(a AND b AND ...)`; `TRUE` when empty.
pub fn and<W: Into<Where>>(items: impl IntoIterator<Item = W>) -> Fragment {
    combine(items, " AND ", "TRUE")
}

/// `(a OR b OR ...)`; `FALSE` when empty.
pub fn or<W: Into<Where>>(items: impl IntoIterator<Item = W>) -> Fragment {
    combine(items, " OR ", "FALSE")
}

/// `(NOT a)`
pub fn not(item: impl Into<Where>) -> Fragment {
    let mut f = Fragment::new("(NOT ");
    f.push_fragment(item.into().to_fragment_or_true());
    f.push(")");
    f
}
