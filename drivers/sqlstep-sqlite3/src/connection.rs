//!
//! SQLite connection.
//!
//! Wraps a `rusqlite::Connection` and implements the statement layer's
//! `Engine` seam for it. Statements borrow the connection, so `close` is
//! only callable once every statement created from it has been dropped.
//!

use std::ffi::c_int;
use std::path::Path;
use std::time::Duration;

use rusqlite::ffi;
use sqlstep_core::{Engine, EngineError, Statement, StatementConfig, StatementError};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::handle::{self, SqliteHandle};
use crate::source;

pub struct Connection {
    inner: rusqlite::Connection,
    label: String,
    statement: StatementConfig,
}

impl Connection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        Self::open_with_config(&DatabaseConfig::new(path.as_ref()))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::open_with_config(&DatabaseConfig::in_memory())
    }

    pub fn open_with_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        config.validate()?;
        let label = config.path.display().to_string();
        let inner = rusqlite::Connection::open_with_flags(&config.path, config.open_flags())
            .map_err(|source| DatabaseError::Open {
                path: label.clone(),
                source,
            })?;
        // rusqlite installs its own 5s handler on open; replace it.
        inner.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        info!(
            path = %label,
            read_only = config.read_only,
            busy_timeout_ms = config.busy_timeout_ms,
            max_retry_count = config.statement.max_retry_count,
            "database opened"
        );
        Ok(Self {
            inner,
            label,
            statement: config.statement,
        })
    }

    pub fn close(self) -> Result<(), DatabaseError> {
        let label = self.label;
        self.inner.close().map_err(|(_, e)| DatabaseError::Close(e))?;
        info!(path = %label, "database closed");
        Ok(())
    }

    /// Run one or more `;`-separated statements that return no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        self.inner.execute_batch(sql)?;
        Ok(())
    }

    pub fn execute_file(&self, path: &Path) -> Result<(), DatabaseError> {
        let sql = source::read_sql_file(path)?;
        self.inner
            .execute_batch(&sql)
            .map_err(|source| DatabaseError::Script {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(script = %path.display(), "script executed");
        Ok(())
    }

    /// Run every `.sql` file directly inside `dir`, in file name order.
    /// Returns the number of scripts executed.
    pub fn execute_scripts(&self, dir: &Path) -> Result<usize, DatabaseError> {
        let scripts = source::read_sql_dir(dir)?;
        for script in &scripts {
            self.execute_file(script)?;
        }
        info!(dir = %dir.display(), count = scripts.len(), "scripts executed");
        Ok(scripts.len())
    }

    /// Unprepared statement for `sql`.
    pub fn statement(&self, sql: impl Into<String>) -> Statement<'_, Self> {
        Statement::new(self, sql)
    }

    /// Statement with no SQL yet, for `prepare_sql`.
    pub fn empty_statement(&self) -> Statement<'_, Self> {
        Statement::without_sql(self)
    }

    pub fn prepare_statement(&self, sql: impl Into<String>) -> Result<Statement<'_, Self>, StatementError> {
        Statement::prepared(self, sql)
    }

    /// Retry limit handed to statements created from now on.
    pub fn set_max_retry_count(&mut self, count: u32) {
        self.statement.max_retry_count = count;
    }

    pub fn path(&self) -> &str {
        &self.label
    }

    pub fn inner(&self) -> &rusqlite::Connection {
        &self.inner
    }

    fn raw(&self) -> *mut ffi::sqlite3 {
        // SAFETY: the pointer never escapes a call made while `self` is borrowed.
        unsafe { self.inner.handle() }
    }
}

impl Engine for Connection {
    type Handle<'a> = SqliteHandle<'a>;

    fn prepare<'a>(&'a self, sql: &str) -> Result<SqliteHandle<'a>, EngineError> {
        SqliteHandle::compile(&self.inner, sql)
    }

    fn last_insert_rowid(&self) -> i64 {
        self.inner.last_insert_rowid()
    }

    fn rows_affected(&self) -> u64 {
        let changes: c_int = unsafe { ffi::sqlite3_changes(self.raw()) };
        u64::try_from(changes).unwrap_or(0)
    }

    fn last_error_message(&self) -> String {
        handle::error_message(self.raw())
    }

    fn statement_config(&self) -> StatementConfig {
        self.statement
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.label)
            .field("statement", &self.statement)
            .finish()
    }
}
