//!
//! Statement layer error types.
//!
//! `EngineError` is what the underlying engine reports through the
//! `Engine`/`NativeStatement` seam. `StatementError` is what callers of the
//! statement layer receive: compile failures, binding mistakes, exhausted
//! busy retries, row access outside a row and lifecycle misuse.
//!
//! None of these are fatal to the process. The statement keeps working after
//! any of them and records the message as its `last_error`.
//!

use thiserror::Error;

use crate::statement::Status;

/// Coarse classification of an engine result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Busy,
    Locked,
    Constraint,
    Range,
    Misuse,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, code: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Busy and locked results clear up once the competing writer is done.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, EngineErrorKind::Busy | EngineErrorKind::Locked)
    }
}

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("Failed to compile statement: {0}")]
    Compile(EngineError),

    #[error("No SQL text to prepare")]
    MissingSql,

    #[error("No such parameter '{name}'")]
    NoSuchParameter { name: String },

    #[error("Parameter index {index} out of range (statement has {count} parameters)")]
    ParameterOutOfRange { index: usize, count: usize },

    #[error("Failed to bind parameter {index}: {source}")]
    Bind { index: usize, source: EngineError },

    #[error("Bulk bind stopped at pair {position}: {source}")]
    BulkBind {
        position: usize,
        source: Box<StatementError>,
    },

    #[error("Database busy after {attempts} attempts: {source}")]
    Busy { attempts: u32, source: EngineError },

    #[error("Step failed: {0}")]
    Step(EngineError),

    #[error("No current row (statement is {status})")]
    NoCurrentRow { status: Status },

    #[error("Column index {index} out of range (row has {count} columns)")]
    ColumnOutOfRange { index: usize, count: usize },

    #[error("Stored timestamp {seconds} is out of range")]
    InvalidTimestamp { seconds: i64 },

    #[error("Engine error: {0}")]
    Engine(EngineError),

    #[error("Cannot {operation} a statement that is {status}")]
    InvalidState {
        operation: &'static str,
        status: Status,
    },
}

impl StatementError {
    /// The engine diagnostic underneath this error, if the engine produced it.
    pub fn engine_error(&self) -> Option<&EngineError> {
        match self {
            StatementError::Compile(e) | StatementError::Step(e) | StatementError::Engine(e) => {
                Some(e)
            }
            StatementError::Bind { source, .. } | StatementError::Busy { source, .. } => {
                Some(source)
            }
            StatementError::BulkBind { source, .. } => source.engine_error(),
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, StatementError::Busy { .. })
    }
}
