//! Transcoding between native [`Value`]s and wire [`CqlValue`]s.
//!
//! Codecs are stateless after construction and shared read-only by every
//! operation on the owning entity type.
//!
//! - scalar codecs: native kinds, enums, JSON, timeuuid, counters
//! - collection codecs: element-wise list/set/map mapping
//! - compound-key codec: key objects ↔ ordered component values

mod collection;
pub(crate) mod compound;

#[cfg(test)]
mod tests;

use crate::{
    cql::CqlType,
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    types::{Blob, Counter, Timestamp},
    value::{Value, ValueKind},
};
use std::{fmt::Debug, sync::Arc};

pub use collection::{ListCodec, MapCodec, SetCodec};

///
/// Codec
///
/// Type-specific encode/decode strategy for one column (or one collection
/// element). `Null` always round-trips to `Null` at this layer.
///

pub trait Codec: Debug + Send + Sync {
    /// Native class accepted by `encode` and produced by `decode`.
    fn source_kind(&self) -> ValueKind;

    /// Wire class produced by `encode`.
    fn cql_type(&self) -> CqlType;

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError>;

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError>;
}

/// Shared codec handle stored in metadata.
pub type CodecRef = Arc<dyn Codec>;

fn encode_mismatch(codec: &str, expected: ValueKind, value: &Value) -> MappingError {
    MappingError::mapping(
        ErrorOrigin::Codec,
        format!(
            "{codec} codec cannot encode a {} value (expects {expected})",
            value.kind_label()
        ),
    )
}

fn decode_mismatch(codec: &str, expected: &CqlType, value: &CqlValue) -> MappingError {
    MappingError::mapping(
        ErrorOrigin::Codec,
        format!(
            "{codec} codec cannot decode a {} value (expects {expected})",
            value.type_label()
        ),
    )
}

///
/// NativeCodec
///
/// Identity mapping of a scalar native kind onto its CQL type.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NativeCodec {
    kind: ValueKind,
}

impl NativeCodec {
    /// Build a codec for a scalar kind. Enum, JSON, counter and collection
    /// kinds have dedicated codecs.
    pub fn new(kind: ValueKind) -> Result<Self, MappingError> {
        match kind {
            ValueKind::Enum
            | ValueKind::Json
            | ValueKind::Counter
            | ValueKind::List
            | ValueKind::Set
            | ValueKind::Map => Err(MappingError::unsupported(
                ErrorOrigin::Codec,
                format!("no native codec for {kind} values"),
            )),
            _ => Ok(Self { kind }),
        }
    }

    #[must_use]
    pub fn shared(kind: ValueKind) -> CodecRef {
        match Self::new(kind) {
            Ok(codec) => Arc::new(codec),
            Err(_) => Arc::new(UnsupportedCodec { kind }),
        }
    }
}

impl Codec for NativeCodec {
    fn source_kind(&self) -> ValueKind {
        self.kind
    }

    fn cql_type(&self) -> CqlType {
        match self.kind {
            ValueKind::Bool => CqlType::Boolean,
            ValueKind::Int => CqlType::Int,
            ValueKind::BigInt => CqlType::BigInt,
            ValueKind::Float => CqlType::Float,
            ValueKind::Double => CqlType::Double,
            ValueKind::Blob => CqlType::Blob,
            ValueKind::Uuid => CqlType::Uuid,
            ValueKind::Timestamp => CqlType::Timestamp,
            _ => CqlType::Text,
        }
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        let encoded = match (self.kind, value) {
            (_, Value::Null) => CqlValue::Null,
            (ValueKind::Bool, Value::Bool(v)) => CqlValue::Boolean(*v),
            (ValueKind::Int, Value::Int(v)) => CqlValue::Int(*v),
            (ValueKind::BigInt, Value::BigInt(v)) => CqlValue::BigInt(*v),
            (ValueKind::BigInt, Value::Int(v)) => CqlValue::BigInt(i64::from(*v)),
            (ValueKind::Float, Value::Float(v)) => CqlValue::Float(*v),
            (ValueKind::Double, Value::Double(v)) => CqlValue::Double(*v),
            (ValueKind::Double, Value::Float(v)) => CqlValue::Double(f64::from(*v)),
            (ValueKind::Text, Value::Text(v)) => CqlValue::Text(v.clone()),
            (ValueKind::Blob, Value::Blob(v)) => CqlValue::Blob(v.to_wire()),
            (ValueKind::Uuid, Value::Uuid(v)) => CqlValue::Uuid(*v),
            (ValueKind::Timestamp, Value::Timestamp(v)) => CqlValue::Timestamp(v.get()),
            _ => return Err(encode_mismatch("native", self.kind, value)),
        };

        Ok(encoded)
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        let decoded = match (self.kind, value) {
            (_, CqlValue::Null) => Value::Null,
            (ValueKind::Bool, CqlValue::Boolean(v)) => Value::Bool(*v),
            (ValueKind::Int, CqlValue::Int(v)) => Value::Int(*v),
            (ValueKind::BigInt, CqlValue::BigInt(v)) => Value::BigInt(*v),
            (ValueKind::Float, CqlValue::Float(v)) => Value::Float(*v),
            (ValueKind::Double, CqlValue::Double(v)) => Value::Double(*v),
            (ValueKind::Text, CqlValue::Text(v)) => Value::Text(v.clone()),
            (ValueKind::Blob, CqlValue::Blob(v)) => Value::Blob(Blob::from(v.clone())),
            (ValueKind::Uuid, CqlValue::Uuid(v) | CqlValue::TimeUuid(v)) => Value::Uuid(*v),
            (ValueKind::Timestamp, CqlValue::Timestamp(v)) => {
                Value::Timestamp(Timestamp::from_millis(*v))
            }
            _ => return Err(decode_mismatch("native", &self.cql_type(), value)),
        };

        Ok(decoded)
    }
}

// Placeholder used by `NativeCodec::shared` for kinds with no native mapping;
// every call fails so misconfigured metadata surfaces on first use.
#[derive(Debug)]
struct UnsupportedCodec {
    kind: ValueKind,
}

impl Codec for UnsupportedCodec {
    fn source_kind(&self) -> ValueKind {
        self.kind
    }

    fn cql_type(&self) -> CqlType {
        CqlType::Text
    }

    fn encode(&self, _value: &Value) -> Result<CqlValue, MappingError> {
        Err(MappingError::unsupported(
            ErrorOrigin::Codec,
            format!("no native codec for {} values", self.kind),
        ))
    }

    fn decode(&self, _value: &CqlValue) -> Result<Value, MappingError> {
        Err(MappingError::unsupported(
            ErrorOrigin::Codec,
            format!("no native codec for {} values", self.kind),
        ))
    }
}

///
/// EnumEncoding
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EnumEncoding {
    /// Variant name stored as `text`.
    Name,
    /// Variant position stored as `int`.
    Ordinal,
}

///
/// EnumCodec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnumCodec {
    type_name: String,
    variants: Vec<String>,
    encoding: EnumEncoding,
}

impl EnumCodec {
    #[must_use]
    pub fn new<S: Into<String>>(
        type_name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
        encoding: EnumEncoding,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
            encoding,
        }
    }

    fn unknown_variant(&self, variant: &str) -> MappingError {
        MappingError::mapping(
            ErrorOrigin::Codec,
            format!("'{variant}' is not a variant of enum '{}'", self.type_name),
        )
    }
}

impl Codec for EnumCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Enum
    }

    fn cql_type(&self) -> CqlType {
        match self.encoding {
            EnumEncoding::Name => CqlType::Text,
            EnumEncoding::Ordinal => CqlType::Int,
        }
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        let name = match value {
            Value::Null => return Ok(CqlValue::Null),
            Value::Enum(name) => name,
            other => return Err(encode_mismatch("enum", ValueKind::Enum, other)),
        };
        let ordinal = self
            .variants
            .iter()
            .position(|variant| variant == name)
            .ok_or_else(|| self.unknown_variant(name))?;

        match self.encoding {
            EnumEncoding::Name => Ok(CqlValue::Text(name.clone())),
            EnumEncoding::Ordinal => i32::try_from(ordinal)
                .map(CqlValue::Int)
                .map_err(|_| self.unknown_variant(name)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match (self.encoding, value) {
            (_, CqlValue::Null) => Ok(Value::Null),
            (EnumEncoding::Name, CqlValue::Text(name)) => {
                if self.variants.iter().any(|variant| variant == name) {
                    Ok(Value::Enum(name.clone()))
                } else {
                    Err(self.unknown_variant(name))
                }
            }
            (EnumEncoding::Ordinal, CqlValue::Int(ordinal)) => usize::try_from(*ordinal)
                .ok()
                .and_then(|index| self.variants.get(index))
                .map(|name| Value::Enum(name.clone()))
                .ok_or_else(|| self.unknown_variant(&ordinal.to_string())),
            _ => Err(decode_mismatch("enum", &self.cql_type(), value)),
        }
    }
}

///
/// JsonCodec
///
/// Arbitrary structured values stored as JSON text.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Json
    }

    fn cql_type(&self) -> CqlType {
        CqlType::Text
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::Json(json) => serde_json::to_string(json).map(CqlValue::Text).map_err(|err| {
                MappingError::mapping(ErrorOrigin::Codec, format!("json encode failed: {err}"))
            }),
            other => Err(encode_mismatch("json", ValueKind::Json, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::Text(text) => serde_json::from_str(text).map(Value::Json).map_err(|err| {
                MappingError::mapping(ErrorOrigin::Codec, format!("json decode failed: {err}"))
            }),
            other => Err(decode_mismatch("json", &CqlType::Text, other)),
        }
    }
}

///
/// TimeUuidCodec
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TimeUuidCodec;

impl Codec for TimeUuidCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Uuid
    }

    fn cql_type(&self) -> CqlType {
        CqlType::TimeUuid
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::Uuid(uuid) if uuid.get_version_num() == 1 => Ok(CqlValue::TimeUuid(*uuid)),
            Value::Uuid(uuid) => Err(MappingError::mapping(
                ErrorOrigin::Codec,
                format!("uuid {uuid} is not time-based (version 1)"),
            )),
            other => Err(encode_mismatch("timeuuid", ValueKind::Uuid, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::TimeUuid(uuid) | CqlValue::Uuid(uuid) => Ok(Value::Uuid(*uuid)),
            other => Err(decode_mismatch("timeuuid", &CqlType::TimeUuid, other)),
        }
    }
}

///
/// CounterCodec
///
/// Encodes the pending delta of a counter handle; the absolute value is
/// never written.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CounterCodec;

impl Codec for CounterCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Counter
    }

    fn cql_type(&self) -> CqlType {
        CqlType::Counter
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::Counter(counter) => Ok(CqlValue::BigInt(counter.delta())),
            other => Err(encode_mismatch("counter", ValueKind::Counter, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::Counter(v) | CqlValue::BigInt(v) => Ok(Value::Counter(Counter::loaded(*v))),
            other => Err(decode_mismatch("counter", &CqlType::Counter, other)),
        }
    }
}
