//!
//! Statement lifecycle.
//!
//! A `Statement` owns exactly one compiled handle and borrows the engine it
//! was compiled against, so the handle can never outlive its connection.
//!
//! Status transitions:
//! - `Initialized` --prepare--> `Prepared` | `Error`
//! - `Prepared` | `HasRow` | `Done` --step--> `HasRow` | `Done` | `Error`
//! - any status holding a handle --reset--> `Prepared`
//! - any status --finish--> `Finished` (terminal)
//!
//! The handle is absent before preparation, after a failed prepare and after
//! finish. A step failure keeps the handle so `reset` can recover.
//!
//! Every failing call records its message in `last_error` and returns `Err`.
//! Dropping the statement finishes it.
//!

use std::cell::RefCell;
use std::fmt;

use tracing::debug;

use crate::config::StatementConfig;
use crate::engine::{Engine, NativeStatement, StepResult};
use crate::error::StatementError;
use crate::retry::{RetryError, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Initialized,
    Prepared,
    HasRow,
    Done,
    Finished,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Initialized => "initialized",
            Status::Prepared => "prepared",
            Status::HasRow => "positioned on a row",
            Status::Done => "done",
            Status::Finished => "finished",
            Status::Error => "in an error state",
        };
        f.write_str(text)
    }
}

pub struct Statement<'c, E: Engine> {
    engine: &'c E,
    sql: Option<String>,
    pub(crate) handle: Option<E::Handle<'c>>,
    pub(crate) status: Status,
    last_error: RefCell<Option<String>>,
    last_insert_rowid: i64,
    rows_changed: u64,
    retry: RetryPolicy,
}

impl<'c, E: Engine> Statement<'c, E> {
    /// Create an unprepared statement for `sql`. Call `prepare` next.
    pub fn new(engine: &'c E, sql: impl Into<String>) -> Self {
        let mut stmt = Self::without_sql(engine);
        stmt.sql = Some(sql.into());
        stmt
    }

    /// Create a statement with no SQL yet; supply it through `prepare_sql`.
    pub fn without_sql(engine: &'c E) -> Self {
        Self::with_config(engine, engine.statement_config())
    }

    fn with_config(engine: &'c E, config: StatementConfig) -> Self {
        Self {
            engine,
            sql: None,
            handle: None,
            status: Status::Initialized,
            last_error: RefCell::new(None),
            last_insert_rowid: 0,
            rows_changed: 0,
            retry: RetryPolicy::new(config.max_retry_count),
        }
    }

    /// Create and compile in one call.
    pub fn prepared(engine: &'c E, sql: impl Into<String>) -> Result<Self, StatementError> {
        let mut stmt = Self::new(engine, sql);
        stmt.prepare()?;
        Ok(stmt)
    }

    pub fn prepare(&mut self) -> Result<(), StatementError> {
        if self.handle.is_some() || !matches!(self.status, Status::Initialized | Status::Error) {
            return self.invalid("prepare");
        }
        let engine: &'c E = self.engine;
        let Some(sql) = self.sql.as_deref() else {
            return self.fail(StatementError::MissingSql);
        };
        match engine.prepare(sql) {
            Ok(handle) => {
                debug!(sql, parameters = handle.parameter_count(), "statement prepared");
                self.handle = Some(handle);
                self.status = Status::Prepared;
                self.last_error.replace(None);
                Ok(())
            }
            Err(e) => {
                debug!(sql, error = %e, "statement failed to compile");
                self.status = Status::Error;
                self.fail(StatementError::Compile(e))
            }
        }
    }

    /// Set the SQL text and compile it. Allowed wherever `prepare` is.
    pub fn prepare_sql(&mut self, sql: impl Into<String>) -> Result<(), StatementError> {
        if self.handle.is_some() || !matches!(self.status, Status::Initialized | Status::Error) {
            return self.invalid("prepare");
        }
        self.sql = Some(sql.into());
        self.prepare()
    }

    /// Advance one row, retrying busy results under the retry policy.
    pub fn step(&mut self) -> Result<Status, StatementError> {
        if !self.is_prepared() {
            return self.invalid("step");
        }
        let retry = self.retry;
        let Some(handle) = self.handle.as_mut() else {
            return self.invalid("step");
        };
        let outcome = retry.run(|| handle.step());
        let read_only = handle.is_read_only();

        match outcome {
            Ok(StepResult::Row) => {
                self.status = Status::HasRow;
            }
            Ok(StepResult::Done) => {
                self.status = Status::Done;
                if !read_only {
                    self.last_insert_rowid = self.engine.last_insert_rowid();
                    self.rows_changed = self.engine.rows_affected();
                }
            }
            Err(RetryError::Exhausted(exhausted)) => {
                self.status = Status::Error;
                return self.fail(StatementError::Busy {
                    attempts: exhausted.attempts,
                    source: exhausted.error,
                });
            }
            Err(RetryError::Failed(e)) => {
                self.status = Status::Error;
                return self.fail(StatementError::Step(e));
            }
        }
        debug!(status = %self.status, "statement stepped");
        Ok(self.status)
    }

    /// Step until the statement completes. Rows produced on the way are skipped.
    pub fn execute(&mut self) -> Result<(), StatementError> {
        loop {
            if self.step()? == Status::Done {
                return Ok(());
            }
        }
    }

    /// Rewind to before the first row, keeping bindings.
    pub fn reset(&mut self) -> Result<(), StatementError> {
        if self.status == Status::Finished {
            return self.invalid("reset");
        }
        let Some(handle) = self.handle.as_mut() else {
            return self.invalid("reset");
        };
        // sqlite3_reset style engines repeat the last step failure here; it
        // was already reported by step.
        if let Err(e) = handle.reset() {
            debug!(error = %e, "reset repeated previous step failure");
        }
        self.status = Status::Prepared;
        Ok(())
    }

    /// Set every parameter back to NULL. Status is unchanged.
    pub fn clear_bindings(&mut self) -> Result<(), StatementError> {
        if self.status == Status::Finished {
            return self.invalid("clear bindings of");
        }
        let Some(handle) = self.handle.as_mut() else {
            return self.invalid("clear bindings of");
        };
        match handle.clear_bindings() {
            Ok(()) => Ok(()),
            Err(e) => self.fail(StatementError::Engine(e)),
        }
    }

    /// Release the native handle. Safe to call any number of times.
    pub fn finish(&mut self) {
        if self.status == Status::Finished {
            return;
        }
        if self.handle.take().is_some() {
            debug!(sql = self.sql.as_deref().unwrap_or_default(), "statement finished");
        }
        self.status = Status::Finished;
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.status, Status::Prepared | Status::HasRow | Status::Done)
    }

    pub fn is_finished(&self) -> bool {
        self.status == Status::Finished
    }

    pub fn has_row(&self) -> bool {
        self.status == Status::HasRow
    }

    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    /// Rowid of the last insert, refreshed when a mutating statement completes.
    pub fn last_insert_rowid(&self) -> i64 {
        self.last_insert_rowid
    }

    pub fn rows_changed(&self) -> u64 {
        self.rows_changed
    }

    pub fn max_retry_count(&self) -> u32 {
        self.retry.max_retry_count
    }

    pub fn set_max_retry_count(&mut self, count: u32) {
        self.retry.max_retry_count = count;
    }

    pub(crate) fn fail<T>(&self, err: StatementError) -> Result<T, StatementError> {
        self.last_error.replace(Some(err.to_string()));
        Err(err)
    }

    pub(crate) fn invalid<T>(&self, operation: &'static str) -> Result<T, StatementError> {
        self.fail(StatementError::InvalidState {
            operation,
            status: self.status,
        })
    }
}

impl<E: Engine> Drop for Statement<'_, E> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl<E: Engine> fmt::Debug for Statement<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("status", &self.status)
            .field("last_error", &self.last_error.borrow())
            .field("max_retry_count", &self.retry.max_retry_count)
            .finish()
    }
}
