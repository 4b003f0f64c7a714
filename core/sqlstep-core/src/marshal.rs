//!
//! Encode/decode between `Value` and a native handle.
//!

use crate::engine::NativeStatement;
use crate::error::EngineError;
use crate::value::{encode_timestamp, ColumnType, Value};

pub fn bind_value<H: NativeStatement>(
    handle: &mut H,
    index: usize,
    value: &Value,
) -> Result<(), EngineError> {
    match value {
        Value::Null => handle.bind_null(index),
        Value::Int(v) => handle.bind_int(index, *v),
        Value::Int64(v) => handle.bind_int64(index, *v),
        Value::Double(v) => handle.bind_double(index, *v),
        Value::Text(v) => handle.bind_text(index, v),
        Value::Blob(v) => handle.bind_blob(index, v),
        Value::Timestamp(ts) => handle.bind_int64(index, encode_timestamp(ts)),
    }
}

/// Integers always decode as `Int64`; the engine does not remember width or
/// whether an integer was written as a timestamp.
pub fn read_value<H: NativeStatement>(handle: &H, index: usize) -> Value {
    match handle.column_type(index) {
        ColumnType::Null => Value::Null,
        ColumnType::Integer => Value::Int64(handle.column_int64(index)),
        ColumnType::Float => Value::Double(handle.column_double(index)),
        ColumnType::Text => Value::Text(handle.column_text(index).unwrap_or_default()),
        ColumnType::Blob => Value::Blob(handle.column_blob(index)),
    }
}
