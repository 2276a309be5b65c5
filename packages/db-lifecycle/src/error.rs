use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the backend lifecycle manager.
///
/// Every variant carries the operation and the data-source identifier it
/// relates to, so nothing needs re-wrapping before it crosses a component
/// boundary. No operation in this crate retries; a failed call is terminal
/// and retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum DbError {
    /// The supplied configuration failed validation.
    #[error("invalid database config: {detail}")]
    InvalidConfig { detail: String },

    /// The engine refused or failed the open for a reason other than a
    /// missing resource.
    #[error("open {driver} database {data_source} error: {source}")]
    OpenFailed {
        driver: &'static str,
        data_source: String,
        #[source]
        source: DbErr,
    },

    /// Creating the missing backend resource during absence recovery failed.
    #[error("create {driver} database {data_source} error: {source}")]
    RecoveryFailed {
        driver: &'static str,
        data_source: String,
        #[source]
        source: std::io::Error,
    },

    /// The pooled handle could not be verified after a successful open.
    #[error("{driver} connection pool unavailable: {source}")]
    PoolUnavailable {
        driver: &'static str,
        #[source]
        source: DbErr,
    },

    /// Applying one model's schema failed.
    #[error("migrate model {model} error: {source}")]
    MigrationFailed {
        model: String,
        #[source]
        source: DbErr,
    },

    /// An operation requiring an initialized instance ran before `init`
    /// completed successfully.
    #[error("database not initialized: {operation}")]
    NotInitialized { operation: &'static str },

    /// Factory wrapper for failures during the init stage.
    #[error("init {driver} database error: {source}")]
    Init {
        driver: &'static str,
        #[source]
        source: Box<DbError>,
    },

    /// Factory wrapper for failures during the migrate stage.
    #[error("migrate {driver} database error: {source}")]
    Migrate {
        driver: &'static str,
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    pub(crate) fn init(driver: &'static str, source: DbError) -> Self {
        Self::Init {
            driver,
            source: Box::new(source),
        }
    }

    pub(crate) fn migrate(driver: &'static str, source: DbError) -> Self {
        Self::Migrate {
            driver,
            source: Box::new(source),
        }
    }
}
