//!
//! sqlstep-core - Prepared statement lifecycle over an embedded SQL engine
//!
//! Takes SQL text, compiles it into a reusable handle, binds typed
//! parameters by position or by name, steps through result rows and reads
//! typed column values. Busy/locked results from the engine are retried a
//! bounded number of times.
//!
//! The engine is reached only through the `Engine` and `NativeStatement`
//! traits; `sqlstep-sqlite3` provides the SQLite implementation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlstep_core::{Statement, Status};
//!
//! let mut insert = Statement::prepared(&conn, "INSERT INTO t(name) VALUES (:n)")?;
//! insert.bind_text("n", "alice")?;
//! insert.execute()?;
//!
//! let mut select = Statement::prepared(&conn, "SELECT id, name FROM t WHERE id = ?")?;
//! select.bind_int64(1usize, insert.last_insert_rowid())?;
//! while select.step()? == Status::HasRow {
//!     println!("{}", select.text_value(1)?);
//! }
//! ```
//!

pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod retry;
pub mod row;
pub mod statement;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use binder::ParamKey;
pub use config::{StatementConfig, DEFAULT_MAX_RETRY_COUNT};
pub use engine::{Engine, NativeStatement, StepResult};
pub use error::{EngineError, EngineErrorKind, StatementError};
pub use retry::{RetryError, RetryExhausted, RetryPolicy};
pub use statement::{Statement, Status};
pub use value::{decode_timestamp, encode_timestamp, ColumnType, Value};
