//! Dynamic values for the reference encoder.

use indexmap::IndexMap;

/// A runtime value, shaped loosely enough to stand in for any Rust value
/// the emitted code would encode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent pointer or nil interface
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Timestamp as seconds and nanoseconds since the epoch
    Time {
        secs: i64,
        nanos: u32,
    },
    /// Extension payload
    Ext {
        typ: i8,
        data: Vec<u8>,
    },
    /// Slice or fixed array elements
    Array(Vec<Value>),
    /// Map entries in iteration order
    Map(Vec<(Value, Value)>),
    /// Struct fields by name
    Record(IndexMap<String, Value>),
}

impl Value {
    /// Build a record from `(field, value)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the value's kind, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::F32(_) => "float32",
            Value::F64(_) => "float64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Time { .. } => "time",
            Value::Ext { .. } => "extension",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Nil, Into::into)
    }
}
