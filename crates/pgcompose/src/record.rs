//! Column → value mappings used by insert, update and upsert.

use crate::error::{ComposeError, ComposeResult};
use crate::value::Value;
use std::collections::BTreeMap;

/// A row to write: column name → [`Value`].
///
/// Columns are kept in ascending lexical order, so generated column lists are
/// stable regardless of the order values were set in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous value for that column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Set a column only when `value` is `Some`.
    pub fn set_opt<T: Into<Value>>(self, column: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Column names in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn validate_keys(&self, context: &str) -> ComposeResult<()> {
        for key in self.values.keys() {
            validate_column_name(key, context)?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

pub(crate) fn validate_column_name(name: &str, context: &str) -> ComposeResult<()> {
    if name.is_empty() || name.contains('\0') {
        return Err(ComposeError::validation(format!(
            "{context}: invalid column name {name:?}"
        )));
    }
    Ok(())
}

/// Input rows for insert and upsert: one record, or a sequence of records.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    One(Record),
    Many(Vec<Record>),
}

impl Rows {
    pub(crate) fn is_many(&self) -> bool {
        matches!(self, Rows::Many(_))
    }

    pub(crate) fn is_empty_many(&self) -> bool {
        matches!(self, Rows::Many(v) if v.is_empty())
    }

    pub(crate) fn records(&self) -> &[Record] {
        match self {
            Rows::One(r) => std::slice::from_ref(r),
            Rows::Many(v) => v,
        }
    }
}

impl From<Record> for Rows {
    fn from(r: Record) -> Self {
        Rows::One(r)
    }
}

impl From<Vec<Record>> for Rows {
    fn from(v: Vec<Record>) -> Self {
        Rows::Many(v)
    }
}

/// Build a [`Record`] from `column => value` pairs.
///
/// ```ignore
/// let r = pgcompose::record! { "name" => "John", "age" => 30 };
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::Record::new()$(.set($column, $value))+
    };
}
