use std::path::PathBuf;

use sqlx::Error as SqlxError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;
pub type DatabaseResult<T> = Result<T, DatabaseError>;
pub type QueryResult<T> = Result<T, QueryBuilderError>;
pub type ClientResult<T> = Result<T, ClientError>;
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Query(#[from] QueryBuilderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Store internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Database internal error: {0}")]
    Internal(String),
}

impl DatabaseError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        DatabaseError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DatabaseError::Internal(message.into())
    }
}

#[derive(Debug, Error)]
pub enum QueryBuilderError {
    #[error("No fields specified for upsert")]
    UpsertFieldsEmpty,
    #[error("Unsupported parameter type: {name}")]
    UnsupportedParameterType { name: String },
    #[error("Query builder internal error: {0}")]
    Internal(String),
}

impl QueryBuilderError {
    pub fn unsupported_parameter(name: impl Into<String>) -> Self {
        QueryBuilderError::UnsupportedParameterType { name: name.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        QueryBuilderError::Internal(message.into())
    }
}

/// Errors surfaced by the fallible (`try_`) client operations. The sentinel
/// operations collapse all of these into `None`/`false` after logging.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Backend request failed: {0}")]
    Backend(#[from] SqlxError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Query builder error: {0}")]
    Query(#[from] QueryBuilderError),
    #[error("Validation error: {reason}")]
    Validation { reason: String },
    #[error("Client internal error: {0}")]
    Internal(String),
}

impl ClientError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ClientError::Validation {
            reason: reason.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ClientError::Internal(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub fn read(path: PathBuf, source: std::io::Error) -> Self {
        ConfigError::Read { path, source }
    }

    pub fn write(path: PathBuf, source: std::io::Error) -> Self {
        ConfigError::Write { path, source }
    }
}
