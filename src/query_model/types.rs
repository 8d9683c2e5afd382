//! Static host types carried by every expression node.
//!
//! The translator routes on these types: a `byte[]` indexer lowers to
//! `get_byte`, every other array indexer lowers to a 1-based subscript.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Element type of a scalar value or of an array's elements.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Integer,
    Byte,
    Text,
    Boolean,
}

impl ScalarType {
    /// Integer and byte values compare with each other without a cast.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Integer | ScalarType::Byte)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Integer => f.write_str("integer"),
            ScalarType::Byte => f.write_str("byte"),
            ScalarType::Text => f.write_str("text"),
            ScalarType::Boolean => f.write_str("boolean"),
        }
    }
}

/// Static type of a host expression node.
///
/// Serialized as its display form (`integer`, `integer[]`, `byte[]`, ...).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HostType {
    Scalar(ScalarType),
    /// One-dimensional array of scalars. `Array(Byte)` is a host byte array.
    Array(ScalarType),
    /// The row type bound to a query's lambda parameter.
    Entity,
}

impl HostType {
    pub const INTEGER: HostType = HostType::Scalar(ScalarType::Integer);
    pub const BYTE: HostType = HostType::Scalar(ScalarType::Byte);
    pub const TEXT: HostType = HostType::Scalar(ScalarType::Text);
    pub const BOOLEAN: HostType = HostType::Scalar(ScalarType::Boolean);
    pub const INTEGER_ARRAY: HostType = HostType::Array(ScalarType::Integer);
    pub const BYTE_ARRAY: HostType = HostType::Array(ScalarType::Byte);
    pub const TEXT_ARRAY: HostType = HostType::Array(ScalarType::Text);

    pub fn is_array(&self) -> bool {
        matches!(self, HostType::Array(_))
    }

    pub fn element_type(&self) -> Option<ScalarType> {
        match self {
            HostType::Array(elem) => Some(*elem),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, HostType::Scalar(ScalarType::Integer))
    }

    /// Whether two operands may meet in a comparison.
    pub fn is_comparable_with(&self, other: &HostType) -> bool {
        match (self, other) {
            (HostType::Scalar(a), HostType::Scalar(b)) => {
                a == b || (a.is_numeric() && b.is_numeric())
            }
            (HostType::Array(a), HostType::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Scalar(scalar) => write!(f, "{}", scalar),
            HostType::Array(elem) => write!(f, "{}[]", elem),
            HostType::Entity => f.write_str("entity"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown host type `{0}` (expected integer, byte, text, boolean, an array of those, or bytea)")]
pub struct ParseHostTypeError(pub String);

impl FromStr for HostType {
    type Err = ParseHostTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "bytea" => return Ok(HostType::BYTE_ARRAY),
            "entity" => return Ok(HostType::Entity),
            _ => {}
        }
        let (base, is_array) = match normalized.strip_suffix("[]") {
            Some(base) => (base.trim(), true),
            None => (normalized.as_str(), false),
        };
        let scalar = match base {
            "integer" | "int" | "int4" => ScalarType::Integer,
            "byte" => ScalarType::Byte,
            "text" | "string" => ScalarType::Text,
            "boolean" | "bool" => ScalarType::Boolean,
            _ => return Err(ParseHostTypeError(s.to_string())),
        };
        Ok(if is_array {
            HostType::Array(scalar)
        } else {
            HostType::Scalar(scalar)
        })
    }
}

impl TryFrom<String> for HostType {
    type Error = ParseHostTypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<HostType> for String {
    fn from(ty: HostType) -> Self {
        ty.to_string()
    }
}
