//!
//! # Database Configuration
//!
//! Connection settings parsed from a TOML file. Statement defaults live in
//! the `[statement]` table and are handed to every statement created against
//! the connection.
//!
//! ## Example sqlstep.toml
//!
//! ```toml
//! path = "data/app.db"
//! read_only = false
//! create = true
//! busy_timeout_ms = 0
//!
//! [statement]
//! max_retry_count = 5
//! ```
//!
//! `path = ":memory:"` opens a private in-memory database.
//!
//! `busy_timeout_ms` is SQLite's own busy handler. It defaults to 0 so busy
//! results reach the statement layer's retry policy immediately.
//!

use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use serde::{Deserialize, Serialize};
use sqlstep_core::StatementConfig;

use crate::error::DatabaseError;

pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_create")]
    pub create: bool,
    #[serde(default)]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub statement: StatementConfig,
}

fn default_create() -> bool {
    true
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
            create: true,
            busy_timeout_ms: 0,
            statement: StatementConfig::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    pub fn load(path: &Path) -> Result<Self, DatabaseError> {
        if !path.exists() {
            return Err(DatabaseError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| DatabaseError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DatabaseError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.path.as_os_str().is_empty() {
            return Err(DatabaseError::InvalidConfig(
                "database path must not be empty".to_string(),
            ));
        }
        if self.read_only && self.is_in_memory() {
            return Err(DatabaseError::InvalidConfig(
                "an in-memory database cannot be opened read-only".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    pub fn open_flags(&self) -> OpenFlags {
        let access = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else if self.create {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = DatabaseConfig::from_toml_str(r#"path = "app.db""#).unwrap();
        assert_eq!(config, DatabaseConfig::new("app.db"));
        assert!(config.create);
        assert!(!config.read_only);
        assert_eq!(config.busy_timeout_ms, 0);
        assert_eq!(config.statement.max_retry_count, 3);
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
path = "data/app.db"
read_only = true
create = false
busy_timeout_ms = 250

[statement]
max_retry_count = 7
"#;
        let config = DatabaseConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.path, PathBuf::from("data/app.db"));
        assert!(config.read_only);
        assert!(!config.create);
        assert_eq!(config.busy_timeout_ms, 250);
        assert_eq!(config.statement.max_retry_count, 7);
        assert!(config.open_flags().contains(OpenFlags::SQLITE_OPEN_READ_ONLY));
        assert!(!config.open_flags().contains(OpenFlags::SQLITE_OPEN_CREATE));
    }

    #[test]
    fn test_missing_path_rejected() {
        let err = DatabaseConfig::from_toml_str("read_only = true").unwrap_err();
        assert!(matches!(err, DatabaseError::Toml(_)));

        let err = DatabaseConfig::from_toml_str(r#"path = """#).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConfig(_)));
    }

    #[test]
    fn test_read_only_memory_rejected() {
        let mut config = DatabaseConfig::in_memory();
        assert!(config.is_in_memory());
        assert!(config.validate().is_ok());
        config.read_only = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_flag() {
        let config = DatabaseConfig::new("x.db");
        assert!(config.open_flags().contains(OpenFlags::SQLITE_OPEN_CREATE));
        assert!(config.open_flags().contains(OpenFlags::SQLITE_OPEN_READ_WRITE));
    }
}
