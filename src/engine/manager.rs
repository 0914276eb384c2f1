use super::{convert, tables, RowSource};
use crate::config::{DataFrameLink, DataSourceSettings, EngineConfig};
use crate::error::{DuckPanelError, Result};
use crate::frame::Row;
use async_trait::async_trait;
use duckdb::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// The shared DuckDB instance. Logical connections are cloned from `root`.
#[derive(Debug)]
pub struct Database {
    root: Mutex<Connection>,
}

impl Database {
    /// Opens the database. Extension failures are logged, not fatal; links
    /// that needed the extension then fail in table bootstrap.
    fn open(config: &EngineConfig, load_extensions: bool) -> Result<Self> {
        let bootstrap_err = |e: duckdb::Error| DuckPanelError::EngineBootstrap(e.to_string());

        let mut flags = duckdb::Config::default();
        if let Some(threads) = config.threads {
            flags = flags.threads(threads as i64).map_err(bootstrap_err)?;
        }

        let conn = match &config.database {
            Some(path) => Connection::open_with_flags(path, flags),
            None => Connection::open_in_memory_with_flags(flags),
        }
        .map_err(bootstrap_err)?;

        if load_extensions {
            for extension in &config.extensions {
                match conn.execute_batch(&format!("INSTALL {ext}; LOAD {ext};", ext = extension)) {
                    Ok(()) => debug!(%extension, "Extension loaded"),
                    Err(error) => warn!(%extension, %error, "Extension unavailable"),
                }
            }
        }

        Ok(Self {
            root: Mutex::new(conn),
        })
    }

    pub fn connect(&self) -> Result<Connection> {
        let root = self.root.lock().map_err(|_| DuckPanelError::Poisoned)?;
        Ok(root.try_clone()?)
    }

    /// Runs `work` on a fresh connection and closes it on every exit path.
    pub fn run<T>(&self, work: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.connect()?;
        let result = work(&conn);
        if let Err((_, error)) = conn.close() {
            warn!(%error, "Failed to close DuckDB connection");
        }
        result
    }
}

/// Owns the lazily created database for one data-source instance.
///
/// Initialization is single-flight: concurrent callers of
/// [`ensure_ready`](Self::ensure_ready) await the same attempt, and a failed
/// attempt leaves nothing behind so the next call starts over.
pub struct ConnectionManager {
    config: EngineConfig,
    links: Vec<DataFrameLink>,
    database: OnceCell<Arc<Database>>,
    initializations: AtomicUsize,
}

impl ConnectionManager {
    pub fn new(config: EngineConfig, links: Vec<DataFrameLink>) -> Self {
        Self {
            config,
            links,
            database: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    pub fn from_settings(settings: &DataSourceSettings) -> Self {
        Self::new(settings.engine.clone(), settings.data_frames.clone())
    }

    pub fn links(&self) -> &[DataFrameLink] {
        &self.links
    }

    pub fn is_ready(&self) -> bool {
        self.database.initialized()
    }

    /// Number of initialization attempts started so far.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }

    pub async fn ensure_ready(&self) -> Result<Arc<Database>> {
        let database = self
            .database
            .get_or_try_init(|| self.initialize())
            .await?;
        Ok(Arc::clone(database))
    }

    async fn initialize(&self) -> Result<Arc<Database>> {
        let attempt = self.initializations.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            attempt,
            tables = self.links.len(),
            persistent = self.config.database.is_some(),
            "Initializing DuckDB"
        );

        let config = self.config.clone();
        let links = self.links.clone();
        let load_extensions = links.iter().any(DataFrameLink::is_remote);
        let database = tokio::task::spawn_blocking(move || {
            let database = Database::open(&config, load_extensions)?;
            database.run(|conn| tables::bootstrap_tables(conn, &links))?;
            Ok::<_, DuckPanelError>(database)
        })
        .await??;

        info!(attempt, "DuckDB ready");
        Ok(Arc::new(database))
    }

    pub async fn with_connection<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let database = self.ensure_ready().await?;
        tokio::task::spawn_blocking(move || database.run(work)).await?
    }

    /// Declares additional tables on the live database.
    pub async fn bootstrap_tables(&self, links: Vec<DataFrameLink>) -> Result<()> {
        self.with_connection(move |conn| tables::bootstrap_tables(conn, &links))
            .await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.with_connection(tables::list_tables).await
    }
}

#[async_trait]
impl RowSource for ConnectionManager {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        debug!(%sql, "Executing query");
        let sql = sql.to_string();
        self.with_connection(move |conn| convert::fetch_rows(conn, &sql))
            .await
    }

    async fn ping(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
            Ok(())
        })
        .await
    }
}
