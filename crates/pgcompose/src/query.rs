//! Built queries.
//!
//! A [`Query`] is what every builder returns: the statement fragment plus how
//! its `{ result }` rows turn into a value. Queries are plain data; compiling
//! and transforming are pure, and running needs a [`Queryable`](crate::Queryable).

use crate::compile::Compiled;
use crate::config::Config;
use crate::error::{ComposeError, ComposeResult};
use crate::fragment::{Fragment, Item};
use crate::transform::{RawResult, Shape, Transform, find_missing};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub(crate) const NOOP_PREFIX: &str = "/* marked no-op: won't hit DB unless forced -> */ ";

/// A statement ready to compile and run, with its result transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub(crate) fragment: Fragment,
    pub(crate) noop: bool,
    pub(crate) noop_result: JsonValue,
    pub(crate) transform: Transform,
    pub(crate) shape: Shape,
}

impl Query {
    pub(crate) fn new(fragment: Fragment, transform: Transform) -> Self {
        Self {
            fragment,
            noop: false,
            noop_result: JsonValue::Null,
            transform,
            shape: Shape::default(),
        }
    }

    /// A statement that is skipped unless forced; `result` is returned instead.
    pub(crate) fn noop(statement: Fragment, result: JsonValue, transform: Transform) -> Self {
        let mut fragment = Fragment::new(NOOP_PREFIX);
        fragment.push_fragment(statement);
        Self {
            fragment,
            noop: true,
            noop_result: result,
            transform,
            shape: Shape::default(),
        }
    }

    pub(crate) fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    /// The statement fragment.
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub fn into_fragment(self) -> Fragment {
        self.fragment
    }

    /// Whether running this query skips the database unless forced.
    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// The value a skipped no-op query returns.
    pub fn noop_result(&self) -> &JsonValue {
        &self.noop_result
    }

    pub fn compile(&self) -> ComposeResult<Compiled> {
        self.fragment.compile()
    }

    pub fn compile_with(&self, config: &Config) -> ComposeResult<Compiled> {
        self.fragment.compile_with(config)
    }

    /// Turn driver rows into this query's result value.
    ///
    /// Fails with [`ComposeError::NotExactlyOne`] when an exactly-one
    /// selection, at the top level or in any nested lateral, found nothing.
    pub fn run_result_transform(&self, raw: &RawResult) -> ComposeResult<JsonValue> {
        let value = self.transform.apply(raw)?;
        if let Some(path) = find_missing(&value, &self.shape) {
            let sql = self
                .compile()
                .map(|c| c.text)
                .unwrap_or_else(|e| format!("<not compilable: {e}>"));
            return Err(ComposeError::NotExactlyOne { path, sql });
        }
        Ok(value)
    }

    /// [`run_result_transform`](Self::run_result_transform), deserialized into `T`.
    pub fn transform_into<T: DeserializeOwned>(&self, raw: &RawResult) -> ComposeResult<T> {
        let value = self.run_result_transform(raw)?;
        serde_json::from_value(value).map_err(|e| ComposeError::decode("result", e.to_string()))
    }
}

/// A query embeds as its statement text, e.g. as a subquery.
impl From<Query> for Item {
    fn from(q: Query) -> Self {
        Item::Fragment(q.fragment)
    }
}

impl From<&Query> for Item {
    fn from(q: &Query) -> Self {
        Item::Fragment(q.fragment.clone())
    }
}
