//!
//! Parameter binding.
//!
//! Parameters are addressed either by their 1-based index or by name. A name
//! is resolved against the compiled handle on every call; nothing is cached,
//! since compiling different SQL can renumber parameters.
//!
//! Names may carry their prefix (`:id`, `@id`, `$id`). A bare name is tried
//! with `:`, `@` and `$` in that order.
//!
//! Binding is allowed once the statement is prepared and before it is
//! finished. Engines refuse binds on a statement that is mid-execution, so a
//! bind issued on a row or after completion first rewinds the handle (other
//! bindings are kept) and leaves the statement `Prepared`. A key that does not
//! resolve never changes the status.
//!

use std::fmt;

use chrono::{DateTime, Utc};

use crate::engine::{Engine, NativeStatement};
use crate::error::StatementError;
use crate::marshal;
use crate::statement::{Statement, Status};
use crate::value::Value;

const NAME_PREFIXES: [char; 3] = [':', '@', '$'];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Index(i) => write!(f, "{i}"),
            ParamKey::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

impl From<&String> for ParamKey {
    fn from(name: &String) -> Self {
        ParamKey::Name(name.clone())
    }
}

impl<E: Engine> Statement<'_, E> {
    /// Number of parameters in the compiled SQL; 0 when there is no handle.
    pub fn parameter_count(&self) -> usize {
        self.handle.as_ref().map_or(0, NativeStatement::parameter_count)
    }

    /// Resolve a parameter name to its index.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        let handle = self.handle.as_ref()?;
        if name.starts_with(NAME_PREFIXES) || name.starts_with('?') {
            return handle.parameter_index(name);
        }
        NAME_PREFIXES
            .iter()
            .find_map(|prefix| handle.parameter_index(&format!("{prefix}{name}")))
    }

    pub fn bind(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Result<(), StatementError> {
        let key = key.into();
        let value = value.into();
        if !self.is_prepared() {
            return self.invalid("bind");
        }
        let index = match self.resolve(&key) {
            Ok(index) => index,
            Err(e) => return self.fail(e),
        };
        let rewind = matches!(self.status, Status::HasRow | Status::Done);
        let Some(handle) = self.handle.as_mut() else {
            return self.invalid("bind");
        };
        if rewind {
            // A failure here repeats the last step error, already reported.
            let _ = handle.reset();
        }
        let bound = marshal::bind_value(handle, index, &value);
        if rewind {
            self.status = Status::Prepared;
        }
        match bound {
            Ok(()) => Ok(()),
            Err(source) => self.fail(StatementError::Bind { index, source }),
        }
    }

    pub fn bind_null(&mut self, key: impl Into<ParamKey>) -> Result<(), StatementError> {
        self.bind(key, Value::Null)
    }

    pub fn bind_int(&mut self, key: impl Into<ParamKey>, value: i32) -> Result<(), StatementError> {
        self.bind(key, Value::Int(value))
    }

    pub fn bind_int64(&mut self, key: impl Into<ParamKey>, value: i64) -> Result<(), StatementError> {
        self.bind(key, Value::Int64(value))
    }

    pub fn bind_double(&mut self, key: impl Into<ParamKey>, value: f64) -> Result<(), StatementError> {
        self.bind(key, Value::Double(value))
    }

    pub fn bind_text(&mut self, key: impl Into<ParamKey>, value: &str) -> Result<(), StatementError> {
        self.bind(key, Value::Text(value.to_string()))
    }

    pub fn bind_blob(&mut self, key: impl Into<ParamKey>, value: &[u8]) -> Result<(), StatementError> {
        self.bind(key, Value::Blob(value.to_vec()))
    }

    /// Bound as whole seconds since the Unix epoch.
    pub fn bind_timestamp(
        &mut self,
        key: impl Into<ParamKey>,
        value: DateTime<Utc>,
    ) -> Result<(), StatementError> {
        self.bind(key, Value::Timestamp(value))
    }

    /// Bind pairs in order, stopping at the first failure.
    ///
    /// Pairs bound before the failure stay bound; this is not a transaction.
    /// The error carries the 0-based position of the failing pair. On success
    /// returns how many pairs were bound.
    pub fn bind_all<I, K, V>(&mut self, pairs: I) -> Result<usize, StatementError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<ParamKey>,
        V: Into<Value>,
    {
        let mut bound = 0;
        for (position, (key, value)) in pairs.into_iter().enumerate() {
            if let Err(e) = self.bind(key, value) {
                return self.fail(StatementError::BulkBind {
                    position,
                    source: Box::new(e),
                });
            }
            bound += 1;
        }
        Ok(bound)
    }

    fn resolve(&self, key: &ParamKey) -> Result<usize, StatementError> {
        match key {
            ParamKey::Index(index) => {
                let count = self.parameter_count();
                if (1..=count).contains(index) {
                    Ok(*index)
                } else {
                    Err(StatementError::ParameterOutOfRange { index: *index, count })
                }
            }
            ParamKey::Name(name) => self
                .parameter_index(name)
                .ok_or_else(|| StatementError::NoSuchParameter { name: name.clone() }),
        }
    }
}
