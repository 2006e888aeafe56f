//! objstore - a minimal project-scoped object store over SQL
//!
//! A thin persistence layer: four asynchronous operations (get, set,
//! delete, prefix scan) against a shared `objects` table, each scoped to
//! a caller-supplied project identifier. Durability, indexing and the
//! `(project_id, key)` uniqueness guarantee are delegated entirely to the
//! SQL backend reached through the connection pool.
//!
//! ```no_run
//! use objstore::{DatabaseManager, DatabaseOptions};
//! use serde_json::json;
//!
//! # async fn run() -> objstore::StoreResult<()> {
//! let db = DatabaseManager::new(DatabaseOptions::default()).await?;
//! db.initialize().await?;
//!
//! let client = db.project("my-project")?;
//! client.set("user:alice", &json!({"name": "Alice", "age": 33})).await;
//! let users = client.get_with_prefix("user:").await;
//! client.delete("user:alice").await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod query;
pub mod record;

pub use client::ProjectStore;
pub use config::{DatabaseConfig, StoreConfig};
pub use database::{DatabaseManager, DatabaseOptions, PoolSize};
pub use error::{
    ClientError, ClientResult, ConfigError, ConfigResult, DatabaseError, DatabaseResult,
    QueryBuilderError, QueryResult, StoreError, StoreResult,
};
pub use logging::init_logging;
pub use record::{KeyValueEntry, ObjectRecord};

/// Name of the shared object table.
pub const OBJECTS_TABLE: &str = "objects";

/// Default database file name.
pub const DATABASE_FILE_NAME: &str = "objects.db";
