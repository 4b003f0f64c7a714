//!
//! sqlstep-sqlite3 - SQLite engine for the sqlstep statement layer
//!
//! Opens SQLite databases through rusqlite and hands out `sqlstep_core`
//! statements whose compiled handles are driven step by step against the
//! sqlite3 API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlstep_sqlite3::{Connection, Status};
//!
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let mut insert = conn.prepare_statement("INSERT INTO t(name) VALUES (:name)")?;
//! insert.bind_text("name", "alice")?;
//! insert.execute()?;
//! ```
//!

pub mod config;
pub mod connection;
pub mod error;
pub mod handle;
pub mod source;

pub use config::DatabaseConfig;
pub use connection::Connection;
pub use error::DatabaseError;
pub use handle::SqliteHandle;
pub use sqlstep_core::{ColumnType, ParamKey, Statement, StatementConfig, StatementError, Status, Value};
