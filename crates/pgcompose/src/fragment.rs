//! Composable SQL fragments.
//!
//! A [`Fragment`] is an immutable tree of [`Node`]s: literal text, quoted
//! identifiers, bound parameters, raw SQL and nested fragments. Fragments are
//! composed without tracking placeholder indices; numbering happens once, when
//! the tree is compiled (see [`crate::compile`]).
//!
//! # Example
//!
//! ```ignore
//! use pgcompose::{ident, sql};
//!
//! let users = ident("users")?;
//! let cond = sql!({pgcompose::self_col()} " > " {18});
//! let q = sql!("SELECT * FROM " {users} " WHERE " {pgcompose::Whereable::new().set("age", cond)});
//!
//! let compiled = q.compile()?;
//! assert_eq!(compiled.text, r#"SELECT * FROM "users" WHERE (("age" > $1))"#);
//! ```

use crate::condition::Whereable;
use crate::error::ComposeResult;
use crate::ident::{Ident, IntoIdent};
use crate::record::Record;
use crate::value::{SqlParam, Value, impl_from_params};

/// Name resolution context carried by a nested fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Column that `self_col()` refers to.
    pub(crate) column: Option<Ident>,
    /// Table that `parent(..)` refers to.
    pub(crate) parent: Option<Ident>,
}

impl Scope {
    pub(crate) fn column(column: Ident) -> Self {
        Self {
            column: Some(column),
            parent: None,
        }
    }

    pub(crate) fn parent(parent: Ident) -> Self {
        Self {
            column: None,
            parent: Some(parent),
        }
    }
}

/// One node of a fragment tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// SQL text copied verbatim.
    Literal(String),
    /// A quoted identifier.
    Identifier(Ident),
    /// A bound value, rendered `$n` (with an optional `::cast`).
    Parameter { value: SqlParam, cast: Option<String> },
    /// Caller-supplied SQL copied verbatim.
    Raw(String),
    /// A nested fragment compiled under its own scope.
    Nested { scope: Scope, body: Fragment },
    /// The current column of the enclosing scope.
    SelfColumn,
    /// A column of the enclosing scope's parent table.
    ParentColumn(Ident),
}

/// An immutable, composable piece of SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
}

impl Fragment {
    /// Create a fragment starting with literal text.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        let mut f = Self::empty();
        f.push(&initial_sql.into());
        f
    }

    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self { nodes: Vec::new() }
    }

    /// The nodes of this fragment.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append literal SQL text (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.nodes.last_mut() {
            Some(Node::Literal(last)) => last.push_str(sql),
            _ => self.nodes.push(Node::Literal(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        self.nodes.push(Node::Parameter {
            value: value.into(),
            cast: None,
        });
        self
    }

    /// Append a parameter placeholder with an explicit cast, e.g. `$1::text`.
    pub fn push_bind_cast(&mut self, value: impl Into<SqlParam>, cast: &str) -> &mut Self {
        self.nodes.push(Node::Parameter {
            value: value.into(),
            cast: Some(cast.to_string()),
        });
        self
    }

    /// Append a comma-separated list of placeholders and bind all values.
    ///
    /// If `values` is empty, this appends `NULL` (so `IN (NULL)` is valid SQL).
    pub fn push_bind_list<T: Into<SqlParam>>(
        &mut self,
        values: impl IntoIterator<Item = T>,
    ) -> &mut Self {
        let mut iter = values.into_iter();
        let Some(first) = iter.next() else {
            return self.push("NULL");
        };

        self.push_bind(first);
        for v in iter {
            self.push(", ");
            self.push_bind(v);
        }
        self
    }

    /// Append a SQL identifier, quoted on output.
    pub fn push_ident(&mut self, ident: impl IntoIdent) -> ComposeResult<&mut Self> {
        let ident = ident.into_ident()?;
        self.nodes.push(Node::Identifier(ident));
        Ok(self)
    }

    pub(crate) fn push_ident_node(&mut self, ident: Ident) -> &mut Self {
        self.nodes.push(Node::Identifier(ident));
        self
    }

    /// Append raw SQL that is never escaped or parameterized.
    pub fn push_raw(&mut self, sql: &str) -> &mut Self {
        self.nodes.push(Node::Raw(sql.to_string()));
        self
    }

    /// Splice another fragment in place, consuming it.
    pub fn push_fragment(&mut self, other: Fragment) -> &mut Self {
        for node in other.nodes {
            match node {
                Node::Literal(s) => {
                    self.push(&s);
                }
                other => self.nodes.push(other),
            }
        }
        self
    }

    pub(crate) fn push_nested(&mut self, scope: Scope, body: Fragment) -> &mut Self {
        self.nodes.push(Node::Nested { scope, body });
        self
    }

    /// Append a column or record value.
    pub fn push_value(&mut self, value: Value) -> &mut Self {
        match value {
            Value::Param(p) => self.push_bind(p),
            Value::UseDefault => self.push("DEFAULT"),
            Value::Raw(s) => self.push_raw(&s),
            Value::Sql(f) => self.push_fragment(f),
        }
    }

    /// Embed any composable item at the current position.
    pub fn embed(&mut self, item: impl Into<Item>) -> &mut Self {
        match item.into() {
            Item::Value(v) => self.push_value(v),
            Item::Fragment(f) => self.push_fragment(f),
            Item::Ident(i) => self.push_ident_node(i),
            Item::Columns(names) => {
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        self.push(",");
                    }
                    self.push_ident_node(Ident::column(name));
                }
                self
            }
            Item::Values(pairs) => {
                for (i, (column, value)) in pairs.into_iter().enumerate() {
                    if i > 0 {
                        self.push(",");
                    }
                    match value {
                        // record fragments see their own column as `self`
                        Value::Sql(f) => self.push_nested(Scope::column(Ident::column(&column)), f),
                        other => self.push_value(other),
                    };
                }
                self
            }
            Item::Where(w) => self.push_fragment(w.to_fragment()),
            Item::SelfColumn => {
                self.nodes.push(Node::SelfColumn);
                self
            }
            Item::Parent(column) => {
                self.nodes.push(Node::ParentColumn(column));
                self
            }
            Item::List(items) => {
                for item in items {
                    self.embed(item);
                }
                self
            }
        }
    }
}

/// Anything that can be embedded into a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A bound value, `DEFAULT`, raw SQL or nested fragment.
    Value(Value),
    /// A fragment spliced in place.
    Fragment(Fragment),
    /// A quoted identifier.
    Ident(Ident),
    /// Quoted, comma-joined column names, sorted by name.
    Columns(Vec<String>),
    /// Comma-joined record values, in column-name order.
    Values(Vec<(String, Value)>),
    /// An equality mapping rendered as an `AND` group.
    Where(Whereable),
    /// The current column.
    SelfColumn,
    /// A column of the parent table.
    Parent(Ident),
    /// Items rendered one after another.
    List(Vec<Item>),
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Value(v)
    }
}

impl From<SqlParam> for Item {
    fn from(v: SqlParam) -> Self {
        Item::Value(Value::Param(v))
    }
}

impl From<Fragment> for Item {
    fn from(v: Fragment) -> Self {
        Item::Fragment(v)
    }
}

impl From<&Fragment> for Item {
    fn from(v: &Fragment) -> Self {
        Item::Fragment(v.clone())
    }
}

impl From<Ident> for Item {
    fn from(v: Ident) -> Self {
        Item::Ident(v)
    }
}

impl From<&Ident> for Item {
    fn from(v: &Ident) -> Self {
        Item::Ident(v.clone())
    }
}

impl From<Whereable> for Item {
    fn from(v: Whereable) -> Self {
        Item::Where(v)
    }
}

impl_from_params!(Item);

/// Quoted, comma-joined, name-sorted column list.
pub fn cols<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Item {
    let mut names: Vec<String> = names.into_iter().map(|s| s.as_ref().to_string()).collect();
    names.sort();
    names.dedup();
    Item::Columns(names)
}

/// The values of a record, comma-joined in the same order as `cols(record.keys())`.
pub fn vals(record: &Record) -> Item {
    Item::Values(
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// A reference to the current column (inside a `Whereable` value or record value).
pub fn self_col() -> Item {
    Item::SelfColumn
}

/// A parameter with an explicit cast, e.g. `$1::text`.
pub fn cast_param(value: impl Into<SqlParam>, cast: &str) -> Fragment {
    let mut f = Fragment::empty();
    f.push_bind_cast(value, cast);
    f
}

/// Render items one after another with `separator` between them.
pub fn join<I: Into<Item>>(items: impl IntoIterator<Item = I>, separator: &str) -> Fragment {
    let mut f = Fragment::empty();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.push(separator);
        }
        f.embed(item);
    }
    f
}

/// Build a [`Fragment`] from interleaved literal text and embedded items.
///
/// String literals are SQL text; `{expr}` embeds anything convertible into an
/// [`Item`]. A string inside braces is a bound value, never text.
///
/// ```ignore
/// let f = pgcompose::sql!("SELECT * FROM " {table} " WHERE id = " {42});
/// ```
#[macro_export]
macro_rules! sql {
    ($($parts:tt)*) => {{
        let mut fragment = $crate::Fragment::empty();
        $crate::__sql_parts!(fragment; $($parts)*);
        fragment
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sql_parts {
    ($f:ident;) => {};
    ($f:ident; $text:literal $($rest:tt)*) => {
        $f.push($text);
        $crate::__sql_parts!($f; $($rest)*);
    };
    ($f:ident; { $item:expr } $($rest:tt)*) => {
        $f.embed($item);
        $crate::__sql_parts!($f; $($rest)*);
    };
}
