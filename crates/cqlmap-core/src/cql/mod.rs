//! Wire-level column model: CQL types, CQL values and consistency levels.
//!
//! Nothing here performs I/O; values are handed to the external session
//! collaborator as bound parameters.

mod consistency;


use crate::types::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use consistency::{ConsistencyLevel, ConsistencyPair};

///
/// CqlType
///
/// Wire class of a column.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CqlType {
    Boolean,
    Int,
    BigInt,
    Float,
    Double,
    Text,
    Blob,
    Uuid,
    TimeUuid,
    Timestamp,
    Counter,
    List(Box<Self>),
    Set(Box<Self>),
    Map(Box<Self>, Box<Self>),
}

impl CqlType {
    #[must_use]
    pub fn list(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    #[must_use]
    pub fn set(element: Self) -> Self {
        Self::Set(Box::new(element))
    }

    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(..))
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Int => f.write_str("int"),
            Self::BigInt => f.write_str("bigint"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::Text => f.write_str("text"),
            Self::Blob => f.write_str("blob"),
            Self::Uuid => f.write_str("uuid"),
            Self::TimeUuid => f.write_str("timeuuid"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Counter => f.write_str("counter"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Set(element) => write!(f, "set<{element}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
        }
    }
}

///
/// CqlValue
///
/// Wire value bound to (or read from) a statement.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CqlValue {
    Null,
    Boolean(bool),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Blob(Vec<u8>),
    Uuid(Uuid),
    TimeUuid(Uuid),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Counter(i64),
    List(Vec<Self>),
    Set(Vec<Self>),
    Map(Vec<(Self, Self)>),
}

impl CqlValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Label used in diagnostics.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Blob(_) => "blob",
            Self::Uuid(_) => "uuid",
            Self::TimeUuid(_) => "timeuuid",
            Self::Timestamp(_) => "timestamp",
            Self::Counter(_) => "counter",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}
