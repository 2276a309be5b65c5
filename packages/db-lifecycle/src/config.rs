use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DbError;
use crate::logging::DbLogger;

/// Validated, immutable description of how to reach a backend.
///
/// Constructed by the caller before any lifecycle call. `init` substitutes
/// the process default logger when `logger` is unset; everything else is
/// taken as-is.
#[derive(Clone, Default)]
pub struct DbConfig {
    /// Engine locator: a file path for embedded engines, a URL for
    /// networked ones.
    pub data_source: String,
    /// Minimum number of pooled connections kept open.
    pub pool_min: Option<u32>,
    /// Maximum number of pooled connections.
    pub pool_max: Option<u32>,
    /// How long an idle pooled connection may live.
    pub conn_max_idle: Option<Duration>,
    /// Total lifetime cap for a pooled connection.
    pub conn_max_lifetime: Option<Duration>,
    /// Logger bound to the instance at init.
    pub logger: Option<Arc<dyn DbLogger>>,
}

impl DbConfig {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn with_pool_bounds(mut self, min: u32, max: u32) -> Self {
        self.pool_min = Some(min);
        self.pool_max = Some(max);
        self
    }

    pub fn with_conn_max_idle(mut self, idle: Duration) -> Self {
        self.conn_max_idle = Some(idle);
        self
    }

    pub fn with_conn_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.conn_max_lifetime = Some(lifetime);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn DbLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Pure validation, run by `init` before any engine interaction.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.data_source.is_empty() {
            return Err(DbError::invalid_config("data source must not be empty"));
        }
        if let (Some(min), Some(max)) = (self.pool_min, self.pool_max) {
            if min > max {
                return Err(DbError::invalid_config(format!(
                    "pool bounds inconsistent: pool_min {min} > pool_max {max}"
                )));
            }
        }
        Ok(())
    }

    /// Build a config from environment variables.
    ///
    /// `DB_DATA_SOURCE` is required; `DB_POOL_MIN`, `DB_POOL_MAX`,
    /// `DB_CONN_MAX_IDLE_SECS` and `DB_CONN_MAX_LIFETIME_SECS` are optional.
    pub fn from_env() -> Result<Self, DbError> {
        let mut config = Self::new(must_var("DB_DATA_SOURCE")?);
        config.pool_min = optional_u32("DB_POOL_MIN")?;
        config.pool_max = optional_u32("DB_POOL_MAX")?;
        config.conn_max_idle = optional_secs("DB_CONN_MAX_IDLE_SECS")?;
        config.conn_max_lifetime = optional_secs("DB_CONN_MAX_LIFETIME_SECS")?;
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("data_source", &self.data_source)
            .field("pool_min", &self.pool_min)
            .field("pool_max", &self.pool_max)
            .field("conn_max_idle", &self.conn_max_idle)
            .field("conn_max_lifetime", &self.conn_max_lifetime)
            .field("logger", &self.logger.as_ref().map(|_| "custom"))
            .finish()
    }
}

/// Get required environment variable or return error
fn must_var(name: &str) -> Result<String, DbError> {
    env::var(name).map_err(|_| {
        DbError::invalid_config(format!("required environment variable '{name}' is not set"))
    })
}

fn optional_u32(name: &str) -> Result<Option<u32>, DbError> {
    match env::var(name) {
        Ok(raw) => raw.parse::<u32>().map(Some).map_err(|_| {
            DbError::invalid_config(format!(
                "environment variable '{name}' must be an unsigned integer, got '{raw}'"
            ))
        }),
        Err(_) => Ok(None),
    }
}

fn optional_secs(name: &str) -> Result<Option<Duration>, DbError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                DbError::invalid_config(format!(
                    "environment variable '{name}' must be a number of seconds, got '{raw}'"
                ))
            }),
        Err(_) => Ok(None),
    }
}
