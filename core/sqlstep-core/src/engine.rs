//!
//! Engine seam.
//!
//! The statement layer never talks to an engine library directly. It consumes
//! two traits:
//! - `Engine`: the connection side (compile SQL, last insert rowid, change
//!   count, last diagnostic)
//! - `NativeStatement`: one compiled handle (step, reset, bind, column access)
//!
//! Parameter indexes are 1-based, column indexes 0-based, both exactly as the
//! engine numbers them. Dropping a `NativeStatement` must release the native
//! resource; that drop is the only release path the statement layer uses.
//!
//! A handle borrows the engine that compiled it (`Handle<'a>`), so an engine
//! cannot be closed or dropped while any of its handles is alive.
//!

use crate::config::StatementConfig;
use crate::error::EngineError;
use crate::value::ColumnType;

/// Result of one successful step call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Row,
    Done,
}

pub trait Engine {
    type Handle<'a>: NativeStatement
    where
        Self: 'a;

    fn prepare<'a>(&'a self, sql: &str) -> Result<Self::Handle<'a>, EngineError>;

    fn last_insert_rowid(&self) -> i64;

    /// Rows changed by the most recently completed mutating statement.
    fn rows_affected(&self) -> u64;

    fn last_error_message(&self) -> String;

    /// Settings applied to statements created against this engine.
    fn statement_config(&self) -> StatementConfig {
        StatementConfig::default()
    }
}

pub trait NativeStatement {
    fn step(&mut self) -> Result<StepResult, EngineError>;

    /// Rewind to before the first row. Bindings are kept.
    fn reset(&mut self) -> Result<(), EngineError>;

    fn clear_bindings(&mut self) -> Result<(), EngineError>;

    /// True when stepping can never write to the database.
    fn is_read_only(&self) -> bool;

    fn parameter_count(&self) -> usize;

    /// Resolve an exact parameter name (prefix included) to its index.
    fn parameter_index(&self, name: &str) -> Option<usize>;

    fn bind_null(&mut self, index: usize) -> Result<(), EngineError>;
    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), EngineError>;
    fn bind_int64(&mut self, index: usize, value: i64) -> Result<(), EngineError>;
    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), EngineError>;
    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), EngineError>;
    fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<(), EngineError>;

    fn column_count(&self) -> usize;
    fn column_name(&self, index: usize) -> Option<String>;
    fn column_type(&self, index: usize) -> ColumnType;

    // Column readers apply the engine's own type conversions.
    fn column_int(&self, index: usize) -> i32;
    fn column_int64(&self, index: usize) -> i64;
    fn column_double(&self, index: usize) -> f64;
    fn column_text(&self, index: usize) -> Option<String>;
    fn column_blob(&self, index: usize) -> Vec<u8>;
}
