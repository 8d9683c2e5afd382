//! Host values: captured variables, constants, and materialized row cells.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{HostType, ScalarType};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Text(String),
    /// Arrays are flat; byte arrays hold integers in `0..=255`.
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn integer_array<I: IntoIterator<Item = i64>>(items: I) -> Self {
        Value::Array(items.into_iter().map(Value::Integer).collect())
    }

    pub fn byte_array(bytes: &[u8]) -> Self {
        Value::Array(bytes.iter().map(|b| Value::Integer(i64::from(*b))).collect())
    }

    /// Whether this value can be bound to a slot of type `ty`.
    ///
    /// NULL conforms to every type; array elements must conform to the
    /// element type, and bytes must fit in `0..=255`.
    pub fn conforms_to(&self, ty: &HostType) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (value, HostType::Scalar(scalar)) => value.conforms_to_scalar(*scalar),
            (Value::Array(items), HostType::Array(elem)) => {
                items.iter().all(|item| item.conforms_to_scalar(*elem))
            }
            _ => false,
        }
    }

    fn conforms_to_scalar(&self, scalar: ScalarType) -> bool {
        match (self, scalar) {
            (Value::Null, _) => true,
            (Value::Integer(_), ScalarType::Integer) => true,
            (Value::Integer(i), ScalarType::Byte) => (0..=255).contains(i),
            (Value::Text(_), ScalarType::Text) => true,
            (Value::Boolean(_), ScalarType::Boolean) => true,
            _ => false,
        }
    }

    /// Extract the bytes of a byte array, if every element is a byte.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        self.as_array()?
            .iter()
            .map(|item| item.as_integer().and_then(|i| u8::try_from(i).ok()))
            .collect()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", rendered.join(","))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
