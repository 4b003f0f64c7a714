//!
//! Compiled SQLite statement handle.
//!
//! rusqlite's `Statement`/`Rows` pair ties a cursor to a borrow of the
//! statement, which cannot be held across independent `step` calls. The
//! handle therefore drives `sqlite3_stmt` directly through `rusqlite::ffi`
//! while the owning `rusqlite::Connection` stays borrowed for `'c`.
//!
//! Dropping the handle finalizes the statement.
//!

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use rusqlite::ffi;
use sqlstep_core::{ColumnType, EngineError, EngineErrorKind, NativeStatement, StepResult};

pub struct SqliteHandle<'c> {
    raw: NonNull<ffi::sqlite3_stmt>,
    db: *mut ffi::sqlite3,
    _conn: PhantomData<&'c rusqlite::Connection>,
}

impl<'c> SqliteHandle<'c> {
    /// Compile the first statement in `sql`. Trailing text is ignored.
    pub(crate) fn compile(conn: &'c rusqlite::Connection, sql: &str) -> Result<Self, EngineError> {
        // SAFETY: the pointer is only used while `conn` is borrowed for 'c.
        let db = unsafe { conn.handle() };
        let len = c_int::try_from(sql.len()).map_err(|_| too_big("SQL text"))?;
        let mut raw: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        // SAFETY: `sql` is valid for `len` bytes; SQLite copies what it needs.
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(db, sql.as_ptr().cast::<c_char>(), len, &mut raw, &mut tail)
        };
        if rc != ffi::SQLITE_OK {
            return Err(engine_error(db, rc));
        }
        match NonNull::new(raw) {
            Some(raw) => Ok(Self {
                raw,
                db,
                _conn: PhantomData,
            }),
            None => Err(EngineError::new(
                EngineErrorKind::Misuse,
                ffi::SQLITE_MISUSE,
                "SQL text contains no statement",
            )),
        }
    }

    fn stmt(&self) -> *mut ffi::sqlite3_stmt {
        self.raw.as_ptr()
    }

    fn check(&self, rc: c_int) -> Result<(), EngineError> {
        if rc == ffi::SQLITE_OK {
            Ok(())
        } else {
            Err(engine_error(self.db, rc))
        }
    }

    /// The SQL text as SQLite holds it.
    pub fn sql(&self) -> Option<String> {
        // SAFETY: the returned text lives as long as the statement.
        unsafe {
            let text = ffi::sqlite3_sql(self.stmt());
            (!text.is_null()).then(|| CStr::from_ptr(text).to_string_lossy().into_owned())
        }
    }
}

impl Drop for SqliteHandle<'_> {
    fn drop(&mut self) {
        // SAFETY: the statement is finalized exactly once, here.
        unsafe {
            ffi::sqlite3_finalize(self.stmt());
        }
    }
}

impl NativeStatement for SqliteHandle<'_> {
    fn step(&mut self) -> Result<StepResult, EngineError> {
        // SAFETY: `raw` is a live statement owned by this handle.
        let rc = unsafe { ffi::sqlite3_step(self.stmt()) };
        match rc {
            ffi::SQLITE_ROW => Ok(StepResult::Row),
            ffi::SQLITE_DONE => Ok(StepResult::Done),
            rc => Err(engine_error(self.db, rc)),
        }
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_reset(self.stmt()) };
        self.check(rc)
    }

    fn clear_bindings(&mut self) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_clear_bindings(self.stmt()) };
        self.check(rc)
    }

    fn is_read_only(&self) -> bool {
        unsafe { ffi::sqlite3_stmt_readonly(self.stmt()) != 0 }
    }

    fn parameter_count(&self) -> usize {
        let count = unsafe { ffi::sqlite3_bind_parameter_count(self.stmt()) };
        usize::try_from(count).unwrap_or(0)
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        let name = CString::new(name).ok()?;
        // SAFETY: `name` is NUL terminated and outlives the call.
        let index = unsafe { ffi::sqlite3_bind_parameter_index(self.stmt(), name.as_ptr()) };
        match usize::try_from(index) {
            Ok(0) | Err(_) => None,
            Ok(index) => Some(index),
        }
    }

    fn bind_null(&mut self, index: usize) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_bind_null(self.stmt(), c_index(index)) };
        self.check(rc)
    }

    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_bind_int(self.stmt(), c_index(index), value) };
        self.check(rc)
    }

    fn bind_int64(&mut self, index: usize, value: i64) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_bind_int64(self.stmt(), c_index(index), value) };
        self.check(rc)
    }

    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        let rc = unsafe { ffi::sqlite3_bind_double(self.stmt(), c_index(index), value) };
        self.check(rc)
    }

    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), EngineError> {
        let len = c_int::try_from(value.len()).map_err(|_| too_big("text value"))?;
        // SAFETY: SQLITE_TRANSIENT makes SQLite copy the bytes before returning.
        let rc = unsafe {
            ffi::sqlite3_bind_text(
                self.stmt(),
                c_index(index),
                value.as_ptr().cast::<c_char>(),
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        self.check(rc)
    }

    fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<(), EngineError> {
        // A null data pointer would bind NULL instead of an empty blob.
        if value.is_empty() {
            let rc = unsafe { ffi::sqlite3_bind_zeroblob(self.stmt(), c_index(index), 0) };
            return self.check(rc);
        }
        let len = c_int::try_from(value.len()).map_err(|_| too_big("blob value"))?;
        // SAFETY: SQLITE_TRANSIENT makes SQLite copy the bytes before returning.
        let rc = unsafe {
            ffi::sqlite3_bind_blob(
                self.stmt(),
                c_index(index),
                value.as_ptr().cast::<c_void>(),
                len,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        self.check(rc)
    }

    fn column_count(&self) -> usize {
        let count = unsafe { ffi::sqlite3_column_count(self.stmt()) };
        usize::try_from(count).unwrap_or(0)
    }

    fn column_name(&self, index: usize) -> Option<String> {
        // SAFETY: the name stays valid until the statement is finalized or
        // re-prepared; it is copied out immediately.
        unsafe {
            let name = ffi::sqlite3_column_name(self.stmt(), c_index(index));
            (!name.is_null()).then(|| CStr::from_ptr(name).to_string_lossy().into_owned())
        }
    }

    fn column_type(&self, index: usize) -> ColumnType {
        match unsafe { ffi::sqlite3_column_type(self.stmt(), c_index(index)) } {
            ffi::SQLITE_INTEGER => ColumnType::Integer,
            ffi::SQLITE_FLOAT => ColumnType::Float,
            ffi::SQLITE_TEXT => ColumnType::Text,
            ffi::SQLITE_BLOB => ColumnType::Blob,
            _ => ColumnType::Null,
        }
    }

    fn column_int(&self, index: usize) -> i32 {
        unsafe { ffi::sqlite3_column_int(self.stmt(), c_index(index)) }
    }

    fn column_int64(&self, index: usize) -> i64 {
        unsafe { ffi::sqlite3_column_int64(self.stmt(), c_index(index)) }
    }

    fn column_double(&self, index: usize) -> f64 {
        unsafe { ffi::sqlite3_column_double(self.stmt(), c_index(index)) }
    }

    fn column_text(&self, index: usize) -> Option<String> {
        let col = c_index(index);
        // SAFETY: text must be fetched before its byte length; the buffer is
        // copied before the next call on this statement.
        unsafe {
            let text = ffi::sqlite3_column_text(self.stmt(), col);
            if text.is_null() {
                return None;
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.stmt(), col)).unwrap_or(0);
            let bytes = std::slice::from_raw_parts(text, len);
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    fn column_blob(&self, index: usize) -> Vec<u8> {
        let col = c_index(index);
        // SAFETY: as for column_text.
        unsafe {
            let blob = ffi::sqlite3_column_blob(self.stmt(), col);
            if blob.is_null() {
                return Vec::new();
            }
            let len = usize::try_from(ffi::sqlite3_column_bytes(self.stmt(), col)).unwrap_or(0);
            std::slice::from_raw_parts(blob.cast::<u8>(), len).to_vec()
        }
    }
}

/// Out-of-range indexes saturate and are rejected by SQLite with SQLITE_RANGE.
fn c_index(index: usize) -> c_int {
    c_int::try_from(index).unwrap_or(c_int::MAX)
}

pub(crate) fn error_kind(rc: c_int) -> EngineErrorKind {
    match rc & 0xff {
        ffi::SQLITE_BUSY => EngineErrorKind::Busy,
        ffi::SQLITE_LOCKED => EngineErrorKind::Locked,
        ffi::SQLITE_CONSTRAINT => EngineErrorKind::Constraint,
        ffi::SQLITE_RANGE => EngineErrorKind::Range,
        ffi::SQLITE_MISUSE => EngineErrorKind::Misuse,
        _ => EngineErrorKind::Other,
    }
}

pub(crate) fn error_message(db: *mut ffi::sqlite3) -> String {
    // SAFETY: sqlite3_errmsg always returns a valid string for a live handle.
    unsafe {
        let msg = ffi::sqlite3_errmsg(db);
        if msg.is_null() {
            return String::new();
        }
        CStr::from_ptr(msg).to_string_lossy().into_owned()
    }
}

fn engine_error(db: *mut ffi::sqlite3, rc: c_int) -> EngineError {
    EngineError::new(error_kind(rc), rc, error_message(db))
}

fn too_big(what: &str) -> EngineError {
    EngineError::new(
        EngineErrorKind::Other,
        ffi::SQLITE_TOOBIG,
        format!("{what} exceeds SQLite's size limit"),
    )
}
