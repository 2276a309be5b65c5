#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

//! Database backend lifecycle management.
//!
//! Brings a relational backend from an unconfigured state to a ready,
//! pooled, logged and cleanly-shutdownable connection, behind one contract
//! shared by structurally similar engine adapters (an embedded file-based
//! engine and a networked one ship here; [`BackendLifecycle`] is the seam
//! for further engines).
//!
//! The usual entry points are the per-engine factories, which validate the
//! configuration, initialize the instance, apply the model schemas and
//! register a close with the process shutdown registry:
//!
//! ```no_run
//! use db_lifecycle::{open_sqlite_v2, DatabaseV2, DbConfig};
//!
//! # async fn demo() -> Result<(), db_lifecycle::DbError> {
//! let db = open_sqlite_v2(DbConfig::new("app.db"), &[]).await?;
//! let conn = db.connection().expect("initialized");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod migrate;
pub mod postgres;
pub mod shutdown;
pub mod sqlite;

// Re-exports for public API
pub use config::DbConfig;
pub use error::DbError;
#[allow(deprecated)]
pub use lifecycle::Database;
pub use lifecycle::{BackendCore, BackendLifecycle, DatabaseV2};
pub use logging::{default_logger, DbLogger, TracingLogger};
pub use migrate::Model;
#[allow(deprecated)]
pub use postgres::open_postgres;
pub use postgres::{open_postgres_v2, open_postgres_with_logger, PostgresBackend};
pub use shutdown::{
    default_registry, run_on_signal, ShutdownAction, ShutdownRegistry, SignalRegistry,
};
#[allow(deprecated)]
pub use sqlite::open_sqlite;
pub use sqlite::{open_sqlite_v2, open_sqlite_with_logger, SqliteBackend};
