//! The closed set of storage value kinds and their JSON compatibility.
//!
//! Payload type checking is a total function over two tags: the declared
//! [`FieldKind`] and the runtime variant of a [`serde_json::Value`]. No
//! runtime type inspection beyond matching the JSON variant.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared value kind of a stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Signed integer column (also carries the i64 primary keys).
    Integer,
    /// Floating-point column.
    Float,
    /// Text column.
    Text,
    /// Boolean column.
    Bool,
    /// RFC 3339 timestamp, carried as a JSON string on the wire.
    Timestamp,
    /// Opaque JSON blob column (objects or arrays).
    Json,
}

impl FieldKind {
    /// Whether a supplied JSON value is compatible with this kind.
    ///
    /// `Null` is never accepted here; nullability is a property of the
    /// field, checked by the edit guard before this function runs.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Text, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Timestamp, Value::String(_)) => true,
            (Self::Json, Value::Object(_)) | (Self::Json, Value::Array(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Bool => write!(f, "bool"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Json => write!(f, "json"),
        }
    }
}
