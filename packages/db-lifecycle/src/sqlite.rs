use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, DatabaseConnection};

use crate::config::DbConfig;
use crate::error::DbError;
#[allow(deprecated)]
use crate::lifecycle::Database;
use crate::lifecycle::{apply_pool_options, BackendCore, BackendLifecycle, DatabaseV2};
use crate::logging::DbLogger;
use crate::migrate::{run_migrations, Model};
use crate::shutdown::{default_registry, ShutdownRegistry};

pub const DRIVER_NAME: &str = "sqlite";

/// Random-value expression understood by the sqlite dialect.
const RAND_COMMAND: &str = "random()";

/// Relative directory where recovery creates a missing database file.
const DATA_DIR: &str = "data";

/// File-based engine adapter.
///
/// Opens without create semantics so a missing file surfaces as the
/// engine's CANTOPEN condition; recovery then creates an empty database
/// under the conventional data directory and serves the created file.
pub struct SqliteBackend {
    core: BackendCore,
    registry: Arc<dyn ShutdownRegistry>,
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("initialized", &self.core.is_initialized())
            .finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Adapter wired to the process-wide shutdown registry.
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    /// Adapter wired to an injected shutdown registry.
    pub fn with_registry(registry: Arc<dyn ShutdownRegistry>) -> Self {
        Self {
            core: BackendCore::new(),
            registry,
        }
    }

    async fn connect(&self, url: &str, config: &DbConfig) -> Result<DatabaseConnection, DbError> {
        let mut options = ConnectOptions::new(url);
        apply_pool_options(&mut options, config);
        sea_orm::Database::connect(options)
            .await
            .map_err(|e| DbError::OpenFailed {
                driver: DRIVER_NAME,
                data_source: config.data_source.clone(),
                source: e,
            })
    }
}

impl Default for SqliteBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn locator_url(data_source: &str) -> String {
    if data_source == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{data_source}")
    }
}

fn file_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

/// Engine-reported "file absent" condition, distinguished from every other
/// open failure by the sqlite CANTOPEN message.
fn is_missing_database(err: &DbError) -> bool {
    match err {
        DbError::OpenFailed { source, .. } => source
            .to_string()
            .contains("unable to open database file"),
        _ => false,
    }
}

/// Create an empty database file under the conventional data directory.
///
/// Relative locators land under `data/`; absolute locators resolve to
/// themselves through `Path::join` and are created in place.
fn create_database_file(data_source: &str) -> std::io::Result<PathBuf> {
    let path = Path::new(DATA_DIR).join(data_source);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    File::create(&path)?;
    Ok(path)
}

#[async_trait]
impl BackendLifecycle for SqliteBackend {
    fn core(&self) -> &BackendCore {
        &self.core
    }

    fn driver(&self) -> &'static str {
        DRIVER_NAME
    }

    fn rand_expr(&self) -> &'static str {
        RAND_COMMAND
    }

    fn registry(&self) -> &Arc<dyn ShutdownRegistry> {
        &self.registry
    }

    async fn open(
        &self,
        config: &DbConfig,
        logger: &Arc<dyn DbLogger>,
    ) -> Result<DatabaseConnection, DbError> {
        match self.connect(&locator_url(&config.data_source), config).await {
            Ok(conn) => Ok(conn),
            Err(err) if is_missing_database(&err) => {
                let created = create_database_file(&config.data_source).map_err(|e| {
                    DbError::RecoveryFailed {
                        driver: DRIVER_NAME,
                        data_source: config.data_source.clone(),
                        source: e,
                    }
                })?;
                logger.info(
                    "created missing sqlite database",
                    &created.display().to_string(),
                );
                // The created file is served as-is; the original locator is
                // not retried.
                self.connect(&file_url(&created), config).await
            }
            Err(err) => Err(err),
        }
    }
}

#[allow(deprecated)]
#[async_trait]
impl Database for SqliteBackend {
    fn connection(&self) -> Option<Arc<DatabaseConnection>> {
        self.core.connection()
    }

    fn driver_name(&self) -> String {
        self.core.driver_name()
    }

    async fn migrate(&self, models: &[&dyn Model]) -> Result<(), DbError> {
        run_migrations(&self.core, models).await
    }
}

#[async_trait]
impl DatabaseV2 for SqliteBackend {
    fn connection(&self) -> Option<Arc<DatabaseConnection>> {
        self.core.connection()
    }

    fn driver_name(&self) -> String {
        self.core.driver_name()
    }

    fn rand_command(&self) -> String {
        self.core.rand_command()
    }

    fn logger(&self) -> Arc<dyn DbLogger> {
        self.core.logger()
    }

    async fn migrate(&self, models: &[&dyn Model]) -> Result<(), DbError> {
        run_migrations(&self.core, models).await
    }
}

/// Open, pool and migrate a sqlite backend, returning the legacy view.
#[deprecated(note = "use `open_sqlite_v2`")]
#[allow(deprecated)]
pub async fn open_sqlite(
    config: DbConfig,
    models: &[&dyn Model],
) -> Result<Arc<dyn Database>, DbError> {
    let backend = SqliteBackend::new();
    backend
        .init(config)
        .await
        .map_err(|e| DbError::init(DRIVER_NAME, e))?;
    run_migrations(backend.core(), models)
        .await
        .map_err(|e| DbError::migrate(DRIVER_NAME, e))?;
    Ok(Arc::new(backend))
}

/// Open, pool and migrate a sqlite backend, returning the current view.
pub async fn open_sqlite_v2(
    config: DbConfig,
    models: &[&dyn Model],
) -> Result<Arc<dyn DatabaseV2>, DbError> {
    let backend = SqliteBackend::new();
    backend
        .init(config)
        .await
        .map_err(|e| DbError::init(DRIVER_NAME, e))?;
    run_migrations(backend.core(), models)
        .await
        .map_err(|e| DbError::migrate(DRIVER_NAME, e))?;
    Ok(Arc::new(backend))
}

/// [`open_sqlite_v2`] with an explicit logger override.
pub async fn open_sqlite_with_logger(
    mut config: DbConfig,
    logger: Arc<dyn DbLogger>,
    models: &[&dyn Model],
) -> Result<Arc<dyn DatabaseV2>, DbError> {
    config.logger = Some(logger);
    open_sqlite_v2(config, models).await
}
