//! Running queries against PostgreSQL.
//!
//! [`Queryable`] unifies clients, transactions and pooled connections, so a
//! [`Query`] runs the same way inside or outside a transaction:
//!
//! ```ignore
//! let q = pgcompose::qb::select("users", pgcompose::all(), Default::default())?;
//! let users = q.run(&client).await?;
//!
//! let tx = client.transaction().await?;
//! let updated = q.run(&tx).await?;
//! tx.commit().await?;
//! ```

use crate::config::Config;
use crate::error::{ComposeError, ComposeResult};
use crate::query::{NOOP_PREFIX, Query};
use crate::transform::{RawResult, ResultRow};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tracing::Level;

/// A trait that unifies database clients and transactions.
pub trait Queryable: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = ComposeResult<Vec<Row>>> + Send;
}

impl Queryable for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ComposeResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(ComposeError::from_db_error)
    }
}

impl Queryable for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ComposeResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(ComposeError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl Queryable for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ComposeResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        Queryable::query(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Queryable for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ComposeResult<Vec<Row>> {
        Queryable::query(&**self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Queryable for deadpool_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ComposeResult<Vec<Row>> {
        Queryable::query(&**self, sql, params).await
    }
}

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

impl Query {
    /// Run with the default [`Config`]. A no-op query returns its no-op
    /// result without touching the database.
    pub async fn run(&self, client: &impl Queryable) -> ComposeResult<JsonValue> {
        self.run_with(client, &Config::default(), false).await
    }

    /// Run with the default [`Config`], sending even a no-op query.
    pub async fn run_forced(&self, client: &impl Queryable) -> ComposeResult<JsonValue> {
        self.run_with(client, &Config::default(), true).await
    }

    /// Compile with `config`, execute, and transform the rows.
    pub async fn run_with(
        &self,
        client: &impl Queryable,
        config: &Config,
        force: bool,
    ) -> ComposeResult<JsonValue> {
        if self.noop && !force {
            emit_at_level!(
                config.log_level,
                target: "pgcompose.sql",
                noop = true,
                "skipping no-op query"
            );
            return Ok(self.noop_result.clone());
        }

        let compiled = self.compile_with(config)?;
        let sql = config.truncate_sql(&compiled.text);
        emit_at_level!(
            config.log_level,
            target: "pgcompose.sql",
            param_count = compiled.values.len(),
            sql = %sql,
            "executing query"
        );

        let rows = client.query(&compiled.text, &compiled.params_ref()).await?;
        emit_at_level!(
            config.log_level,
            target: "pgcompose.sql",
            row_count = rows.len(),
            "query returned"
        );

        let raw = RawResult {
            command: command_tag(&compiled.text),
            row_count: rows.len() as u64,
            rows: rows.iter().map(decode_row).collect::<ComposeResult<_>>()?,
        };
        self.run_result_transform(&raw)
    }

    /// [`run`](Self::run), deserialized into `T`.
    pub async fn run_as<T: DeserializeOwned>(&self, client: &impl Queryable) -> ComposeResult<T> {
        let value = self.run(client).await?;
        serde_json::from_value(value).map_err(|e| ComposeError::decode("result", e.to_string()))
    }
}

fn command_tag(sql: &str) -> String {
    sql.strip_prefix(NOOP_PREFIX)
        .unwrap_or(sql)
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

fn decode_row(row: &Row) -> ComposeResult<ResultRow> {
    let cell: ResultCell = row
        .try_get("result")
        .map_err(|e| ComposeError::decode("result", e.to_string()))?;
    Ok(ResultRow { result: cell.0 })
}

/// The `result` column of any supported type, read as JSON.
struct ResultCell(JsonValue);

impl<'a> FromSql<'a> for ResultCell {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::JSON | Type::JSONB => JsonValue::from_sql(ty, raw)?,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                JsonValue::String(<&str as FromSql>::from_sql(ty, raw)?.to_string())
            }
            Type::BOOL => JsonValue::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => JsonValue::from(i16::from_sql(ty, raw)?),
            Type::INT4 => JsonValue::from(i32::from_sql(ty, raw)?),
            Type::INT8 => JsonValue::from(i64::from_sql(ty, raw)?),
            Type::OID => JsonValue::from(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => float(f64::from_sql(ty, raw)?),
            // exact decimal text; the numeric transform parses it
            Type::NUMERIC => JsonValue::String(Decimal::from_sql(ty, raw)?.to_string()),
            _ => return Err(format!("unsupported result column type {ty}").into()),
        };
        Ok(ResultCell(value))
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(ResultCell(JsonValue::Null))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

/// Non-finite floats have no JSON number form; they are kept as text.
fn float(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}
