//! Error types for pgcompose

use thiserror::Error;

/// Result type alias for pgcompose operations
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors raised while building, compiling, running or transforming queries
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Invalid builder input or options, or an out-of-scope column reference
    #[error("Validation error: {0}")]
    Validation(String),

    /// An exactly-one selection (top-level or nested lateral) found nothing
    #[error("Not exactly one: expected a value at `{path}` but none was returned (query: {sql})")]
    NotExactlyOne { path: String, sql: String },

    /// An aggregate result could not be read as a number
    #[error("Numeric error: cannot interpret {value} as a number")]
    Numeric { value: String },

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl ComposeError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is an exactly-one violation
    pub fn is_not_exactly_one(&self) -> bool {
        matches!(self, Self::NotExactlyOne { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Parse a tokio_postgres error into a more specific ComposeError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ComposeError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
