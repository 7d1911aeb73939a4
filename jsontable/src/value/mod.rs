// Dynamic value model for row cells

use crate::schema::ColumnType;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// A single row: upper-cased column name to cell value.
pub type Row = BTreeMap<String, Value>;

/// A cell value as stored in the JSON document.
///
/// Serialized untagged, so a row reads as a plain JSON object on disk.
/// `Array` and `Object` only appear in documents edited by hand; no column
/// type accepts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Runtime type label, in the vocabulary of column types where one applies.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Whether this value may be stored in a column of the given type.
    /// Ints are not widened to floats and null matches nothing. NaN and the
    /// infinities have no JSON form, so they match no column either.
    pub fn matches(&self, column_type: ColumnType) -> bool {
        match (self, column_type) {
            (Value::String(_), ColumnType::String)
            | (Value::Int(_), ColumnType::Int)
            | (Value::Bool(_), ColumnType::Boolean) => true,
            (Value::Float(f), ColumnType::Float) => f.is_finite(),
            _ => false,
        }
    }

    /// Runtime type label for error messages; flags non-finite floats.
    pub fn describe_type(&self) -> &'static str {
        match self {
            Value::Float(f) if !f.is_finite() => "non-finite float",
            other => other.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used by filter matching. Null and nested values have none.
    /// Floats read the way they are written to disk, e.g. `175.0`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Int(i) => Some(Cow::Owned(i.to_string())),
            Value::Float(f) if f.is_finite() => serde_json::to_string(f).ok().map(Cow::Owned),
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Float(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(_) | Value::Object(_) => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str(self.type_name()),
            },
            other => match other.as_text() {
                Some(text) => f.write_str(&text),
                None => f.write_str(other.type_name()),
            },
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
