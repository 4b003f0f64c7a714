//!
//! Row extraction.
//!
//! Column accessors are only valid while the statement is positioned on a row
//! (`Status::HasRow`). Column indexes are 0-based.
//!
//! The typed accessors do not check the stored type. They hand the request to
//! the engine, which converts according to its own affinity rules (a text
//! column read as an integer parses its leading digits, NULL reads as 0 or an
//! empty string, and so on). Use `value` or `column_type` for the stored type.
//!

use chrono::{DateTime, Utc};

use crate::engine::{Engine, NativeStatement};
use crate::error::StatementError;
use crate::marshal;
use crate::statement::{Statement, Status};
use crate::value::{decode_timestamp, ColumnType, Value};

impl<'c, E: Engine> Statement<'c, E> {
    fn row_handle(&self) -> Result<&E::Handle<'c>, StatementError> {
        match (self.status, self.handle.as_ref()) {
            (Status::HasRow, Some(handle)) => Ok(handle),
            (status, _) => self.fail(StatementError::NoCurrentRow { status }),
        }
    }

    fn column_handle(&self, index: usize) -> Result<&E::Handle<'c>, StatementError> {
        let handle = self.row_handle()?;
        let count = handle.column_count();
        if index >= count {
            return self.fail(StatementError::ColumnOutOfRange { index, count });
        }
        Ok(handle)
    }

    pub fn column_count(&self) -> Result<usize, StatementError> {
        Ok(self.row_handle()?.column_count())
    }

    pub fn column_name(&self, index: usize) -> Result<String, StatementError> {
        Ok(self.column_handle(index)?.column_name(index).unwrap_or_default())
    }

    pub fn column_names(&self) -> Result<Vec<String>, StatementError> {
        let handle = self.row_handle()?;
        Ok((0..handle.column_count())
            .map(|i| handle.column_name(i).unwrap_or_default())
            .collect())
    }

    /// Storage class of the column on the current row.
    pub fn column_type(&self, index: usize) -> Result<ColumnType, StatementError> {
        Ok(self.column_handle(index)?.column_type(index))
    }

    pub fn value(&self, index: usize) -> Result<Value, StatementError> {
        Ok(marshal::read_value(self.column_handle(index)?, index))
    }

    pub fn int_value(&self, index: usize) -> Result<i32, StatementError> {
        Ok(self.column_handle(index)?.column_int(index))
    }

    pub fn int64_value(&self, index: usize) -> Result<i64, StatementError> {
        Ok(self.column_handle(index)?.column_int64(index))
    }

    pub fn double_value(&self, index: usize) -> Result<f64, StatementError> {
        Ok(self.column_handle(index)?.column_double(index))
    }

    /// NULL reads as an empty string.
    pub fn text_value(&self, index: usize) -> Result<String, StatementError> {
        Ok(self.column_handle(index)?.column_text(index).unwrap_or_default())
    }

    pub fn blob_value(&self, index: usize) -> Result<Vec<u8>, StatementError> {
        Ok(self.column_handle(index)?.column_blob(index))
    }

    /// Decode a column holding epoch seconds.
    pub fn date_value(&self, index: usize) -> Result<DateTime<Utc>, StatementError> {
        let seconds = self.column_handle(index)?.column_int64(index);
        match decode_timestamp(seconds) {
            Some(ts) => Ok(ts),
            None => self.fail(StatementError::InvalidTimestamp { seconds }),
        }
    }

    /// Snapshot of every column on the current row, in column order.
    pub fn current_values(&self) -> Result<Vec<Value>, StatementError> {
        let handle = self.row_handle()?;
        Ok((0..handle.column_count())
            .map(|i| marshal::read_value(handle, i))
            .collect())
    }
}
