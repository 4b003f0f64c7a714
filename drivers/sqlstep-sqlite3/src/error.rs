//!
//! Driver error types.
//!
//! Everything outside the statement layer itself: opening and closing the
//! database, one-shot execution, reading SQL scripts and loading
//! configuration. Statement errors pass through unchanged.
//!

use std::path::PathBuf;

use sqlstep_core::StatementError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to open database {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    #[error("Failed to close database: {0}")]
    Close(rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to read SQL from {path}: {source}")]
    ReadSql {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan SQL directory {path}: {source}")]
    ScanSql {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Failed to execute {path}: {source}")]
    Script {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("Config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse config at {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
