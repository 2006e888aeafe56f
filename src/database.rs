/*!
 * Connection pool and schema for the shared objects table.
 *
 * All durability and uniqueness guarantees live in the backend: the
 * `(project_id, key)` unique constraint is the conflict target every
 * upsert resolves against.
 */

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::ConnectOptions;
use tracing::debug;

use crate::client::ProjectStore;
use crate::error::{ClientResult, DatabaseError, DatabaseResult};

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS objects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        project_id TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT,
        UNIQUE (project_id, key)
    )",
    "CREATE INDEX IF NOT EXISTS idx_objects_project ON objects (project_id)",
];

#[derive(Debug, Clone)]
pub enum PoolSize {
    Fixed(NonZeroU32),
    Adaptive { min: NonZeroU32, max: NonZeroU32 },
}

impl PoolSize {
    pub fn fixed(size: u32) -> Self {
        PoolSize::Fixed(NonZeroU32::new(size.max(1)).unwrap())
    }

    pub fn adaptive(min: u32, max: u32) -> Self {
        let min = min.max(1);
        let max = max.max(min);
        PoolSize::Adaptive {
            min: NonZeroU32::new(min).unwrap(),
            max: NonZeroU32::new(max).unwrap(),
        }
    }

    fn resolve(&self) -> (NonZeroU32, NonZeroU32) {
        match self {
            PoolSize::Fixed(size) => (*size, *size),
            PoolSize::Adaptive { min, max } => {
                let cpu = std::thread::available_parallelism()
                    .map(|n| n.get() as u32)
                    .unwrap_or(4);
                let suggested = (cpu * 2).clamp(min.get(), max.get());
                (*min, NonZeroU32::new(suggested).unwrap())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub path: PathBuf,
    pub pool_size: PoolSize,
    pub connection_timeout: Duration,
    pub busy_timeout: Duration,
    pub wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::DATABASE_FILE_NAME),
            pool_size: PoolSize::Adaptive {
                min: NonZeroU32::new(1).unwrap(),
                max: NonZeroU32::new(8).unwrap(),
            },
            connection_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(30),
            wal: true,
        }
    }
}

#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
    options: DatabaseOptions,
}

impl DatabaseManager {
    pub async fn new(options: DatabaseOptions) -> DatabaseResult<Self> {
        if let Some(parent) = options.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DatabaseError::io(
                        format!("creating database directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let (min_conn, max_conn) = options.pool_size.resolve();

        let connect_options = SqliteConnectOptions::new()
            .filename(&options.path)
            .create_if_missing(true)
            .journal_mode(if options.wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(options.busy_timeout)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .min_connections(min_conn.get())
            .max_connections(max_conn.get())
            .acquire_timeout(options.connection_timeout)
            .idle_timeout(Some(Duration::from_secs(30)))
            .max_lifetime(Some(Duration::from_secs(60 * 15)))
            .connect_with(connect_options)
            .await?;

        Ok(Self { pool, options })
    }

    /// Apply the objects table schema. Safe to call more than once.
    pub async fn initialize(&self) -> DatabaseResult<()> {
        for statement in SCHEMA_STATEMENTS {
            debug!("applying schema statement");
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Bind a project identifier, producing the four-operation client
    /// scoped to that project.
    pub fn project(&self, project_id: impl Into<String>) -> ClientResult<ProjectStore<'_>> {
        ProjectStore::new(self, project_id)
    }

    /// Close the pool. Any operation issued afterwards fails with a
    /// backend error, which the sentinel client surface collapses to
    /// `None`/`false`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
