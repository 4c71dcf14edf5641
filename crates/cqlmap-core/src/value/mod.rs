mod native;

#[cfg(test)]
mod tests;

use crate::types::{Blob, Counter, Timestamp, Uuid};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use native::NativeValue;

///
/// ValueKind
///
/// Declared class of a mapped value on the object-graph side.
/// Collection kinds describe the container; element kinds are carried by the
/// property metadata.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Int,
    BigInt,
    Float,
    Double,
    Text,
    Blob,
    Uuid,
    Timestamp,
    Enum,
    Json,
    List,
    Set,
    Map,
    Counter,
}

impl ValueKind {
    /// Whether a value of kind `actual` may be assigned where `self` is
    /// declared. Exact matches always pass; integer and floating values
    /// widen to their 64-bit forms.
    #[must_use]
    pub const fn accepts(self, actual: Self) -> bool {
        matches!(
            (self, actual),
            (Self::BigInt, Self::Int) | (Self::Double, Self::Float)
        ) || self as u8 == actual as u8
    }

    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Text => "text",
            Self::Blob => "blob",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
            Self::Enum => "enum",
            Self::Json => "json",
            Self::List => "list",
            Self::Set => "set",
            Self::Map => "map",
            Self::Counter => "counter",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Value
///
/// Native (object-graph side) representation of one mapped field value.
///
/// Null  → the field holds no value (`Option::None`).
/// Set   → element order is irrelevant; duplicates are not expected.
/// Map   → entries as written by the owning field; keys unique.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Blob(Blob),
    Uuid(Uuid),
    Timestamp(Timestamp),
    /// Enum variant name.
    Enum(String),
    Json(serde_json::Value),
    List(Vec<Self>),
    Set(Vec<Self>),
    Map(Vec<(Self, Self)>),
    Counter(Counter),
}

impl Value {
    /// Runtime class of this value; `None` for `Null`.
    #[must_use]
    pub const fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Self::Null => return None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::BigInt(_) => ValueKind::BigInt,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Text(_) => ValueKind::Text,
            Self::Blob(_) => ValueKind::Blob,
            Self::Uuid(_) => ValueKind::Uuid,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Enum(_) => ValueKind::Enum,
            Self::Json(_) => ValueKind::Json,
            Self::List(_) => ValueKind::List,
            Self::Set(_) => ValueKind::Set,
            Self::Map(_) => ValueKind::Map,
            Self::Counter(_) => ValueKind::Counter,
        };

        Some(kind)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Label used in diagnostics (`null` or the kind name).
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        self.kind().map_or("null", ValueKind::as_str)
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn enum_variant(name: impl Into<String>) -> Self {
        Self::Enum(name.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::BigInt(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}
