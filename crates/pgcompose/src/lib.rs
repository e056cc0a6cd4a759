//! # pgcompose
//!
//! Composable, parameter-safe PostgreSQL statements with JSON result shaping.
//!
//! ## Features
//!
//! - **Fragments, not strings**: SQL is built as a tree of text, identifiers and
//!   bound values; `$n` placeholders are numbered once, at compile time
//! - **Injection-safe by construction**: values are always bound, identifiers always quoted
//! - **JSON rows**: every built query returns `{ result: <json> }` rows assembled by PostgreSQL
//! - **Lateral nesting**: related rows nest to any depth in a single round trip,
//!   with exactly-one checks enforced on every nested row
//! - **Transaction-friendly**: pass a transaction anywhere a [`Queryable`] is expected
//!
//! ## Composing SQL
//!
//! ```ignore
//! use pgcompose::{ident, sql, Whereable, Op};
//!
//! let users = ident("users")?;
//! let filter = Whereable::new().set("status", "active").set("age", Op::gte(18));
//! let q = sql!("SELECT * FROM " {users} " WHERE " {filter});
//!
//! let compiled = q.compile()?;
//! // SELECT * FROM "users" WHERE (("age" >= $1) AND "status" = $2)
//! let rows = client.query(&compiled.text, &compiled.params_ref()).await?;
//! ```
//!
//! ## Shortcut builders
//!
//! ```ignore
//! use pgcompose::{qb, record, Whereable, parent};
//!
//! let q = qb::insert("users", record! { "name" => "alice" }, Default::default())?;
//! let alice = q.run(&client).await?;
//!
//! let posts = qb::select("posts", Whereable::new().set("user_id", parent("id")), Default::default())?;
//! let users = qb::select("users", pgcompose::all(), qb::SelectOptions::new().lateral("posts", posts))?;
//! let users_with_posts = users.run(&client).await?;
//! ```

pub mod client;
pub mod compile;
pub mod condition;
pub mod config;
pub mod error;
pub mod fragment;
pub mod ident;
pub mod qb;
pub mod query;
pub mod record;
pub mod transform;
pub mod value;

pub use client::Queryable;
pub use compile::Compiled;
pub use condition::{Op, Operand, ParentColumn, Where, Whereable, all, and, not, or, parent};
pub use config::Config;
pub use error::{ComposeError, ComposeResult};
pub use fragment::{Fragment, Item, Node, Scope, cast_param, cols, join, self_col, vals};
pub use ident::{Ident, IntoIdent, ident};
pub use query::Query;
pub use record::{Record, Rows};
pub use transform::{RawResult, ResultRow};
pub use value::{DEFAULT, SqlParam, Value, raw};

// Re-export the builders for easy access
pub use qb::{
    avg, count, delete_from, insert, max, min, select, select_exactly_one, select_one, sum,
    truncate, update, upsert,
};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_tls};
