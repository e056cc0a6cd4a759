//! Bindable values and the marker values that never bind.
//!
//! [`SqlParam`] is a closed set of values that can be sent to PostgreSQL as a
//! statement parameter. [`Value`] is what a record column or an embedded item
//! holds: a parameter, the `DEFAULT` keyword, raw SQL, or a nested fragment.

use crate::fragment::Fragment;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A value bound as a statement parameter (`$n`).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlParam {
    pub(crate) fn is_json_array(&self) -> bool {
        matches!(self, SqlParam::Json(serde_json::Value::Array(_)))
    }

    pub(crate) fn is_json_object(&self) -> bool {
        matches!(self, SqlParam::Json(serde_json::Value::Object(_)))
    }
}

impl ToSql for SqlParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlParam::Null => Ok(IsNull::Yes),
            SqlParam::Bool(v) => v.to_sql_checked(ty, out),
            // Integers arrive as i64 but the column decides the wire width.
            SqlParam::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => exact_f32(*v)?.to_sql(ty, out),
                Type::FLOAT8 => exact_f64(*v)?.to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            SqlParam::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            SqlParam::Text(v) => v.as_str().to_sql_checked(ty, out),
            SqlParam::Bytes(v) => v.as_slice().to_sql_checked(ty, out),
            SqlParam::Json(v) => v.to_sql_checked(ty, out),
            SqlParam::Uuid(v) => v.to_sql_checked(ty, out),
            SqlParam::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// 2^63; the first float above every `i64`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn exact_f64(v: i64) -> Result<f64, Box<dyn Error + Sync + Send>> {
    let f = v as f64;
    if f < I64_LIMIT && f as i64 == v {
        Ok(f)
    } else {
        Err(format!("integer {v} has no exact float8 representation").into())
    }
}

fn exact_f32(v: i64) -> Result<f32, Box<dyn Error + Sync + Send>> {
    let f = v as f32;
    if f64::from(f) < I64_LIMIT && f as i64 == v {
        Ok(f)
    } else {
        Err(format!("integer {v} has no exact float4 representation").into())
    }
}

impl From<i16> for SqlParam {
    fn from(v: i16) -> Self {
        SqlParam::Int(i64::from(v))
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(i64::from(v))
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<u32> for SqlParam {
    fn from(v: u32) -> Self {
        SqlParam::Int(i64::from(v))
    }
}

impl From<f32> for SqlParam {
    fn from(v: f32) -> Self {
        SqlParam::Float(f64::from(v))
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&String> for SqlParam {
    fn from(v: &String) -> Self {
        SqlParam::Text(v.clone())
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(v: Vec<u8>) -> Self {
        SqlParam::Bytes(v)
    }
}

impl From<&[u8]> for SqlParam {
    fn from(v: &[u8]) -> Self {
        SqlParam::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for SqlParam {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => SqlParam::Null,
            other => SqlParam::Json(other),
        }
    }
}

impl From<uuid::Uuid> for SqlParam {
    fn from(v: uuid::Uuid) -> Self {
        SqlParam::Uuid(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        SqlParam::Timestamp(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

/// Implement `From<T>` for a type with a `From<SqlParam>` impl, for every
/// type that converts into [`SqlParam`].
macro_rules! impl_from_params {
    ($target:ty) => {
        $crate::value::impl_from_params!(@each $target;
            i16, i32, i64, u32, f32, f64, bool, &str, String, &String, Vec<u8>, &[u8],
            serde_json::Value, uuid::Uuid, chrono::DateTime<chrono::Utc>
        );

        impl<T: Into<$crate::value::SqlParam>> From<Option<T>> for $target {
            fn from(v: Option<T>) -> Self {
                <$target>::from($crate::value::SqlParam::from(v))
            }
        }
    };
    (@each $target:ty; $($t:ty),*) => {
        $(
            impl From<$t> for $target {
                fn from(v: $t) -> Self {
                    <$target>::from($crate::value::SqlParam::from(v))
                }
            }
        )*
    };
}

pub(crate) use impl_from_params;

/// A column value: bound parameter, `DEFAULT`, raw SQL or nested fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Bound as `$n`
    Param(SqlParam),
    /// The `DEFAULT` keyword; never consumes a parameter slot
    UseDefault,
    /// Spliced verbatim; the caller is responsible for its safety
    Raw(String),
    /// Spliced as a nested fragment
    Sql(Fragment),
}

/// The `DEFAULT` marker.
pub const DEFAULT: Value = Value::UseDefault;

/// Wrap SQL text that must be spliced verbatim (e.g. `now()`).
pub fn raw(sql: impl Into<String>) -> Value {
    Value::Raw(sql.into())
}

impl From<SqlParam> for Value {
    fn from(v: SqlParam) -> Self {
        Value::Param(v)
    }
}

impl From<Fragment> for Value {
    fn from(v: Fragment) -> Self {
        Value::Sql(v)
    }
}

impl_from_params!(Value);
