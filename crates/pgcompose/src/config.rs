use tracing::Level;

/// Compilation and execution settings.
///
/// Passed explicitly to [`Fragment::compile_with`](crate::Fragment::compile_with)
/// and [`Query::run_with`](crate::Query::run_with); there is no global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Compile JSON array parameters as `$n::json`.
    pub cast_array_params_to_json: bool,
    /// Compile JSON object parameters as `$n::json`.
    pub cast_object_params_to_json: bool,
    /// Tracing event level for executed SQL.
    pub log_level: Level,
    /// Truncate logged SQL (in chars). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cast_array_params_to_json: false,
            cast_object_params_to_json: false,
            log_level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast_array_params_to_json(mut self, enabled: bool) -> Self {
        self.cast_array_params_to_json = enabled;
        self
    }

    pub fn cast_object_params_to_json(mut self, enabled: bool) -> Self {
        self.cast_object_params_to_json = enabled;
        self
    }

    /// Override the tracing event level.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.chars().count() > max => {
                let end = sql
                    .char_indices()
                    .nth(max)
                    .map_or(sql.len(), |(i, _)| i);
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}
