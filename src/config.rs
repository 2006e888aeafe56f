/*!
 * TOML configuration for the store.
 *
 * A missing config file is not an error; defaults apply. A file that
 * exists but fails to parse is reported so the caller can decide whether
 * to fall back.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::{DatabaseOptions, PoolSize};
use crate::error::{ConfigError, ConfigResult};
use crate::DATABASE_FILE_NAME;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file location.
    pub path: PathBuf,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Seconds to wait for a pool connection.
    pub connection_timeout_secs: u64,
    /// Seconds a statement waits on a locked database.
    pub busy_timeout_secs: u64,
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DATABASE_FILE_NAME),
            min_connections: 1,
            max_connections: 8,
            connection_timeout_secs: 10,
            busy_timeout_secs: 30,
            wal: true,
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            info!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::read(path.to_path_buf(), e))?;
        let config = toml::from_str(&content)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ConfigError::write(path.to_path_buf(), e))?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| ConfigError::write(path.to_path_buf(), e))?;
        Ok(())
    }
}

impl DatabaseConfig {
    /// Resolve into the runtime options the pool is built from.
    pub fn options(&self) -> DatabaseOptions {
        let min = self.min_connections.max(1);
        let max = self.max_connections.max(min);
        DatabaseOptions {
            path: self.path.clone(),
            pool_size: if min == max {
                PoolSize::fixed(max)
            } else {
                PoolSize::adaptive(min, max)
            },
            connection_timeout: Duration::from_secs(self.connection_timeout_secs),
            busy_timeout: Duration::from_secs(self.busy_timeout_secs),
            wal: self.wal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::load(&temp_dir.path().join("absent.toml"))
            .await
            .unwrap();
        assert_eq!(config.database.max_connections, 8);
        assert!(config.database.wal);
    }

    #[tokio::test]
    async fn save_and_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.toml");

        let mut config = StoreConfig::default();
        config.database.max_connections = 2;
        config.database.wal = false;
        config.save(&path).await.unwrap();

        let reloaded = StoreConfig::load(&path).await.unwrap();
        assert_eq!(reloaded.database.max_connections, 2);
        assert!(!reloaded.database.wal);
    }

    #[tokio::test]
    async fn partial_file_fills_in_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.toml");
        tokio::fs::write(&path, "[database]\nmax_connections = 3\n")
            .await
            .unwrap();

        let config = StoreConfig::load(&path).await.unwrap();
        assert_eq!(config.database.max_connections, 3);
        assert_eq!(config.database.busy_timeout_secs, 30);
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.toml");
        tokio::fs::write(&path, "not = [valid").await.unwrap();

        let result = StoreConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
