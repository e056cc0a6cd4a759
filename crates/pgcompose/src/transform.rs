//! Result shaping.
//!
//! Every built query returns rows of the form `{ result: <json> }`. The
//! transform turns those rows into the caller-facing value, and then walks the
//! value to enforce exactly-one expectations, including those of lateral
//! subqueries nested at any depth.

use crate::error::{ComposeError, ComposeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One driver row; only `result` is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub result: JsonValue,
}

/// The driver result a transform consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub rows: Vec<ResultRow>,
    pub command: String,
    pub row_count: u64,
}

impl RawResult {
    /// Build a result from the `result` column values.
    pub fn from_results(results: impl IntoIterator<Item = JsonValue>) -> Self {
        let rows: Vec<ResultRow> = results
            .into_iter()
            .map(|result| ResultRow { result })
            .collect();
        Self {
            row_count: rows.len() as u64,
            rows,
            command: "SELECT".to_string(),
        }
    }
}

/// How driver rows become the returned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transform {
    /// Array of every row's result
    AllRows,
    /// First row's result, or null
    FirstRow,
    /// First row's result read as a number
    Numeric,
    /// Always null
    Nothing,
}

impl Transform {
    pub(crate) fn apply(self, raw: &RawResult) -> ComposeResult<JsonValue> {
        match self {
            Transform::AllRows => Ok(JsonValue::Array(
                raw.rows.iter().map(|r| r.result.clone()).collect(),
            )),
            Transform::FirstRow => Ok(raw
                .rows
                .first()
                .map_or(JsonValue::Null, |r| r.result.clone())),
            Transform::Numeric => match raw.rows.first() {
                Some(row) => parse_numeric(&row.result),
                None => Err(ComposeError::Numeric {
                    value: "<no rows>".to_string(),
                }),
            },
            Transform::Nothing => Ok(JsonValue::Null),
        }
    }
}

/// Read an aggregate result as a JSON number.
///
/// PostgreSQL returns `bigint` and `numeric` aggregates as text to clients
/// that cannot hold them natively. Integers that fit `i64` stay integers.
/// SQL NULL (e.g. `sum` over no rows) stays null.
pub(crate) fn parse_numeric(value: &JsonValue) -> ComposeResult<JsonValue> {
    match value {
        JsonValue::Null => Ok(JsonValue::Null),
        JsonValue::Number(n) => Ok(JsonValue::Number(n.clone())),
        JsonValue::String(s) => {
            let t = s.trim();
            if let Ok(i) = t.parse::<i64>() {
                return Ok(JsonValue::from(i));
            }
            t.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| ComposeError::Numeric { value: s.clone() })
        }
        other => Err(ComposeError::Numeric {
            value: other.to_string(),
        }),
    }
}

/// Where a lateral subquery's value sits in the outer row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// Under a named key of the row object
    Field(String),
    /// The row itself
    Passthrough,
}

/// Structural expectations on a transformed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Shape {
    /// Null here is an exactly-one violation
    pub(crate) required: bool,
    /// The value is an array of rows rather than a single row
    pub(crate) many: bool,
    /// Lateral subqueries contributing to each row
    pub(crate) laterals: Vec<(Slot, Shape)>,
}

impl Shape {
    pub(crate) fn has_checks(&self) -> bool {
        self.required || self.laterals.iter().any(|(_, s)| s.has_checks())
    }
}

static NULL: JsonValue = JsonValue::Null;

enum Pending<'a> {
    Value(&'a JsonValue, &'a Shape, String),
    Row(&'a JsonValue, &'a [(Slot, Shape)], String),
}

/// Find the first missing exactly-one value, returning its path.
///
/// Every row of every array is inspected, not just the first.
pub(crate) fn find_missing(value: &JsonValue, shape: &Shape) -> Option<String> {
    if !shape.has_checks() {
        return None;
    }

    let mut stack = vec![Pending::Value(value, shape, "result".to_string())];
    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Value(v, s, path) => {
                if v.is_null() {
                    if s.required {
                        return Some(path);
                    }
                    continue;
                }
                if s.laterals.is_empty() {
                    continue;
                }
                match v {
                    JsonValue::Array(items) if s.many => {
                        // reversed so rows are visited in order
                        for (i, item) in items.iter().enumerate().rev() {
                            stack.push(Pending::Row(item, &s.laterals, format!("{path}[{i}]")));
                        }
                    }
                    row => stack.push(Pending::Row(row, &s.laterals, path)),
                }
            }
            Pending::Row(row, laterals, path) => {
                for (slot, sub) in laterals.iter().rev() {
                    match slot {
                        Slot::Field(key) => {
                            let v = row.get(key).unwrap_or(&NULL);
                            stack.push(Pending::Value(v, sub, format!("{path}.{key}")));
                        }
                        Slot::Passthrough => {
                            stack.push(Pending::Value(row, sub, path.clone()));
                        }
                    }
                }
            }
        }
    }
    None
}
