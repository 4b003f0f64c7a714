//!
//! Scripted in-memory engine for unit tests.
//!
//! Rows, parameters, busy results and failures are configured up front.
//! Counters shared between the engine and its handles let tests observe
//! step calls, resets and handle release.
//!

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::StatementConfig;
use crate::engine::{Engine, NativeStatement, StepResult};
use crate::error::{EngineError, EngineErrorKind};
use crate::value::{ColumnType, Value};

static NULL: Value = Value::Null;

#[derive(Default)]
struct Shared {
    bindings: RefCell<Vec<Value>>,
    busy_remaining: Cell<u32>,
    step_calls: Cell<u32>,
    resets: Cell<u32>,
    live: Cell<u32>,
    finalized: Cell<u32>,
}

pub(crate) struct FakeEngine {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    params: Vec<String>,
    required: Vec<String>,
    read_only: bool,
    prepare_error: Option<String>,
    last_insert_rowid: i64,
    changes: u64,
    config: StatementConfig,
    shared: Rc<Shared>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            params: Vec::new(),
            required: Vec::new(),
            read_only: false,
            prepare_error: None,
            last_insert_rowid: 0,
            changes: 0,
            config: StatementConfig::default(),
            shared: Rc::new(Shared::default()),
        }
    }

    pub(crate) fn with_rows(mut self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self.rows = rows;
        self
    }

    pub(crate) fn with_params(mut self, names: &[&str]) -> Self {
        self.params = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Steps fail with a NOT NULL violation while any of these is unbound.
    pub(crate) fn requiring_bindings(mut self, names: &[&str]) -> Self {
        self = self.with_params(names);
        self.required = self.params.clone();
        self
    }

    pub(crate) fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub(crate) fn failing_prepare(mut self, message: &str) -> Self {
        self.prepare_error = Some(message.to_string());
        self
    }

    pub(crate) fn with_write_result(mut self, rowid: i64, changes: u64) -> Self {
        self.last_insert_rowid = rowid;
        self.changes = changes;
        self
    }

    pub(crate) fn busy_for(self, count: u32) -> Self {
        self.shared.busy_remaining.set(count);
        self
    }

    pub(crate) fn with_max_retry_count(mut self, count: u32) -> Self {
        self.config.max_retry_count = count;
        self
    }

    pub(crate) fn bindings(&self) -> Vec<Value> {
        self.shared.bindings.borrow().clone()
    }

    pub(crate) fn step_calls(&self) -> u32 {
        self.shared.step_calls.get()
    }

    pub(crate) fn resets(&self) -> u32 {
        self.shared.resets.get()
    }

    pub(crate) fn live_handles(&self) -> u32 {
        self.shared.live.get()
    }

    pub(crate) fn finalized(&self) -> u32 {
        self.shared.finalized.get()
    }
}

impl Engine for FakeEngine {
    type Handle<'a> = FakeHandle;

    fn prepare<'a>(&'a self, _sql: &str) -> Result<FakeHandle, EngineError> {
        if let Some(message) = &self.prepare_error {
            return Err(EngineError::new(EngineErrorKind::Other, 1, message.clone()));
        }
        self.shared.bindings.replace(vec![Value::Null; self.params.len()]);
        self.shared.live.set(self.shared.live.get() + 1);
        Ok(FakeHandle {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
            params: self.params.clone(),
            required: self.required.clone(),
            read_only: self.read_only,
            cursor: None,
            next: 0,
            running: false,
            done: false,
            shared: Rc::clone(&self.shared),
        })
    }

    fn last_insert_rowid(&self) -> i64 {
        self.last_insert_rowid
    }

    fn rows_affected(&self) -> u64 {
        self.changes
    }

    fn last_error_message(&self) -> String {
        self.prepare_error.clone().unwrap_or_else(|| "not an error".to_string())
    }

    fn statement_config(&self) -> StatementConfig {
        self.config
    }
}

pub(crate) struct FakeHandle {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    params: Vec<String>,
    required: Vec<String>,
    read_only: bool,
    cursor: Option<usize>,
    next: usize,
    running: bool,
    done: bool,
    shared: Rc<Shared>,
}

impl FakeHandle {
    fn current(&self, index: usize) -> &Value {
        self.cursor
            .and_then(|row| self.rows.get(row))
            .and_then(|row| row.get(index))
            .unwrap_or(&NULL)
    }

    fn store(&mut self, index: usize, value: Value) -> Result<(), EngineError> {
        if self.running {
            return Err(EngineError::new(EngineErrorKind::Misuse, 21, "bad parameter or other API misuse"));
        }
        if index == 0 || index > self.params.len() {
            return Err(EngineError::new(EngineErrorKind::Range, 25, "column index out of range"));
        }
        self.shared.bindings.borrow_mut()[index - 1] = value;
        Ok(())
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        self.shared.live.set(self.shared.live.get() - 1);
        self.shared.finalized.set(self.shared.finalized.get() + 1);
    }
}

impl NativeStatement for FakeHandle {
    fn step(&mut self) -> Result<StepResult, EngineError> {
        self.shared.step_calls.set(self.shared.step_calls.get() + 1);
        let busy = self.shared.busy_remaining.get();
        if busy > 0 {
            self.shared.busy_remaining.set(busy - 1);
            return Err(EngineError::new(EngineErrorKind::Busy, 5, "database is locked"));
        }
        if self.done {
            self.next = 0;
            self.done = false;
        }
        self.running = true;
        let bindings = self.shared.bindings.borrow().clone();
        for name in &self.required {
            let position = self.params.iter().position(|p| p == name).unwrap_or(0);
            if bindings.get(position).is_none_or(Value::is_null) {
                return Err(EngineError::new(
                    EngineErrorKind::Constraint,
                    19,
                    format!("NOT NULL constraint failed: {name}"),
                ));
            }
        }
        if self.next < self.rows.len() {
            self.cursor = Some(self.next);
            self.next += 1;
            Ok(StepResult::Row)
        } else {
            self.cursor = None;
            self.done = true;
            Ok(StepResult::Done)
        }
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.shared.resets.set(self.shared.resets.get() + 1);
        self.cursor = None;
        self.next = 0;
        self.running = false;
        self.done = false;
        Ok(())
    }

    fn clear_bindings(&mut self) -> Result<(), EngineError> {
        for value in self.shared.bindings.borrow_mut().iter_mut() {
            *value = Value::Null;
        }
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn parameter_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p == name).map(|i| i + 1)
    }

    fn bind_null(&mut self, index: usize) -> Result<(), EngineError> {
        self.store(index, Value::Null)
    }

    fn bind_int(&mut self, index: usize, value: i32) -> Result<(), EngineError> {
        self.store(index, Value::Int(value))
    }

    fn bind_int64(&mut self, index: usize, value: i64) -> Result<(), EngineError> {
        self.store(index, Value::Int64(value))
    }

    fn bind_double(&mut self, index: usize, value: f64) -> Result<(), EngineError> {
        self.store(index, Value::Double(value))
    }

    fn bind_text(&mut self, index: usize, value: &str) -> Result<(), EngineError> {
        self.store(index, Value::Text(value.to_string()))
    }

    fn bind_blob(&mut self, index: usize, value: &[u8]) -> Result<(), EngineError> {
        self.store(index, Value::Blob(value.to_vec()))
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> Option<String> {
        self.columns.get(index).cloned()
    }

    fn column_type(&self, index: usize) -> ColumnType {
        self.current(index).column_type()
    }

    fn column_int(&self, index: usize) -> i32 {
        self.column_int64(index) as i32
    }

    fn column_int64(&self, index: usize) -> i64 {
        match self.current(index) {
            Value::Int(v) => i64::from(*v),
            Value::Int64(v) => *v,
            Value::Double(v) => *v as i64,
            Value::Text(s) => s.trim().parse().unwrap_or(0),
            Value::Timestamp(ts) => ts.timestamp(),
            Value::Null | Value::Blob(_) => 0,
        }
    }

    fn column_double(&self, index: usize) -> f64 {
        match self.current(index) {
            Value::Double(v) => *v,
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            _ => self.column_int64(index) as f64,
        }
    }

    fn column_text(&self, index: usize) -> Option<String> {
        match self.current(index) {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Double(v) => Some(v.to_string()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => Some(self.column_int64(index).to_string()),
        }
    }

    fn column_blob(&self, index: usize) -> Vec<u8> {
        match self.current(index) {
            Value::Null => Vec::new(),
            Value::Blob(b) => b.clone(),
            _ => self.column_text(index).unwrap_or_default().into_bytes(),
        }
    }
}
