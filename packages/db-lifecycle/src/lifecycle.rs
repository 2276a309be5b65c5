use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use sea_orm::{ConnectOptions, DatabaseConnection};
use tracing::{info, warn};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::logging::{default_logger, DbLogger};
use crate::migrate::Model;
use crate::shutdown::ShutdownRegistry;

/// Lower clamp for the CPU-derived default pool size.
const MIN_DEFAULT_POOL: u32 = 2;

/// Upper clamp for the CPU-derived default pool size.
const MAX_DEFAULT_POOL: u32 = 32;

fn default_pool_max() -> u32 {
    (num_cpus::get() as u32).clamp(MIN_DEFAULT_POOL, MAX_DEFAULT_POOL)
}

/// State shared by every backend adapter and by both API revisions.
///
/// One instance per adapter. The legacy and current trait views both read
/// this object; neither holds a copy of the flag or the handle.
pub struct BackendCore {
    initialized: AtomicBool,
    connection: RwLock<Option<Arc<DatabaseConnection>>>,
    driver_name: RwLock<String>,
    rand_command: RwLock<String>,
    logger: RwLock<Arc<dyn DbLogger>>,
}

impl BackendCore {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            connection: RwLock::new(None),
            driver_name: RwLock::new(String::new()),
            rand_command: RwLock::new(String::new()),
            logger: RwLock::new(default_logger()),
        }
    }

    /// True once an `init` call has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// The pooled handle. Set iff initialized and the open succeeded.
    pub fn connection(&self) -> Option<Arc<DatabaseConnection>> {
        self.connection.read().clone()
    }

    fn set_connection(&self, conn: Arc<DatabaseConnection>) {
        *self.connection.write() = Some(conn);
    }

    /// Record the SQL dialect identifier consumed by higher query layers.
    pub fn set_driver_name(&self, name: &str) {
        *self.driver_name.write() = name.to_string();
    }

    pub fn driver_name(&self) -> String {
        self.driver_name.read().clone()
    }

    /// Record the engine's random-value expression consumed by higher query
    /// layers.
    pub fn set_rand_command(&self, expr: &str) {
        *self.rand_command.write() = expr.to_string();
    }

    pub fn rand_command(&self) -> String {
        self.rand_command.read().clone()
    }

    pub fn bind_logger(&self, logger: Arc<dyn DbLogger>) {
        *self.logger.write() = logger;
    }

    pub fn logger(&self) -> Arc<dyn DbLogger> {
        Arc::clone(&self.logger.read())
    }
}

impl Default for BackendCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate pool bounds and connection lifetimes into the engine's native
/// pool options.
///
/// Absent options fall back to the engine defaults, except the maximum,
/// which derives from the CPU count clamped to 2..=32.
pub(crate) fn apply_pool_options(options: &mut ConnectOptions, config: &DbConfig) {
    options.max_connections(config.pool_max.unwrap_or_else(default_pool_max));
    if let Some(min) = config.pool_min {
        options.min_connections(min);
    }
    if let Some(idle) = config.conn_max_idle {
        options.idle_timeout(idle);
    }
    if let Some(lifetime) = config.conn_max_lifetime {
        options.max_lifetime(lifetime);
    }
    options.sqlx_logging(true);
}

/// Engine-agnostic lifecycle shared by every concrete adapter.
///
/// Adapters supply the engine-specific `open`; the idempotency check,
/// logger binding, handle verification, dialect flags and shutdown
/// registration are provided here.
#[async_trait]
pub trait BackendLifecycle: Send + Sync {
    /// The shared state object backing every API view of this adapter.
    fn core(&self) -> &BackendCore;

    /// SQL dialect identifier, e.g. `"sqlite"`.
    fn driver(&self) -> &'static str;

    /// The engine's random-value expression, e.g. `"random()"`.
    fn rand_expr(&self) -> &'static str;

    /// The shutdown collaborator this adapter registers its close with.
    fn registry(&self) -> &Arc<dyn ShutdownRegistry>;

    /// Open the engine at the configured locator, translating the pool
    /// settings into the native pool options.
    async fn open(
        &self,
        config: &DbConfig,
        logger: &Arc<dyn DbLogger>,
    ) -> Result<DatabaseConnection, DbError>;

    /// Locator form safe to embed in logs, errors and registry names.
    fn display_locator(&self, config: &DbConfig) -> String {
        config.data_source.clone()
    }

    /// Bring the instance from unconfigured to ready.
    ///
    /// Idempotent: once a call has completed successfully, every later call
    /// returns `Ok` immediately without touching the engine, even when the
    /// new configuration differs from the first; later configurations are
    /// silently ignored.
    ///
    /// The initialized check and the engine open are not atomic. Two
    /// callers racing past the check may both open the engine; the handle
    /// stored last wins and both callers then observe a ready instance.
    /// Callers that need a guaranteed single open must serialize `init`
    /// themselves. `open` may block on engine start-up; no timeout or
    /// cancellation is threaded through.
    async fn init(&self, config: DbConfig) -> Result<(), DbError> {
        let core = self.core();
        if core.is_initialized() {
            return Ok(());
        }
        config.validate()?;

        let locator = self.display_locator(&config);
        let logger = config.logger.clone().unwrap_or_else(default_logger);
        core.bind_logger(Arc::clone(&logger));
        logger.info(&format!("start open {} database", self.driver()), &locator);

        let conn = match self.open(&config, &logger).await {
            Ok(conn) => conn,
            Err(err) => {
                logger.error(&err.to_string(), &locator);
                return Err(err);
            }
        };

        // The native pool is configured at construction; a handle that
        // cannot answer a ping counts as no pool at all.
        conn.ping().await.map_err(|e| DbError::PoolUnavailable {
            driver: self.driver(),
            source: e,
        })?;

        core.set_driver_name(self.driver());
        core.set_rand_command(self.rand_expr());
        let handle = Arc::new(conn);
        core.set_connection(Arc::clone(&handle));
        core.mark_initialized();
        logger.info(
            &format!("successfully opened {} database", self.driver()),
            &locator,
        );

        let driver = self.driver();
        self.registry().register(
            &format!("db-close:{driver}:{locator}"),
            Box::pin(async move {
                match (*handle).clone().close().await {
                    Ok(()) => info!(driver, "database connection closed"),
                    Err(e) => warn!(driver, error = %e, "database close failed"),
                }
            }),
        );
        Ok(())
    }
}

/// Legacy lifecycle surface.
///
/// Kept for callers that predate [`DatabaseV2`]. Both views of an adapter
/// share one [`BackendCore`]; the handle observed here is the same `Arc` as
/// the one observed through the current surface.
#[deprecated(note = "superseded by `DatabaseV2`")]
#[async_trait]
pub trait Database: Send + Sync {
    /// The pooled handle, present once `init` has succeeded.
    fn connection(&self) -> Option<Arc<DatabaseConnection>>;

    /// SQL dialect identifier recorded at init.
    fn driver_name(&self) -> String;

    /// Apply each model's schema against the opened backend, in order.
    async fn migrate(&self, models: &[&dyn Model]) -> Result<(), DbError>;
}

/// Current lifecycle surface; superset of the legacy one.
#[async_trait]
pub trait DatabaseV2: Send + Sync + std::fmt::Debug {
    /// The pooled handle, present once `init` has succeeded.
    fn connection(&self) -> Option<Arc<DatabaseConnection>>;

    /// SQL dialect identifier recorded at init.
    fn driver_name(&self) -> String;

    /// The engine's random-value expression for dialect-correct SQL.
    fn rand_command(&self) -> String;

    /// The logger bound at init.
    fn logger(&self) -> Arc<dyn DbLogger>;

    /// Apply each model's schema against the opened backend, in order.
    async fn migrate(&self, models: &[&dyn Model]) -> Result<(), DbError>;
}
