use crate::{
    codec::{Codec, CodecRef, decode_mismatch, encode_mismatch},
    cql::{CqlType, CqlValue},
    error::MappingError,
    value::{Value, ValueKind},
};

///
/// ListCodec
///

#[derive(Clone, Debug)]
pub struct ListCodec {
    element: CodecRef,
}

impl ListCodec {
    #[must_use]
    pub fn new(element: CodecRef) -> Self {
        Self { element }
    }

    #[must_use]
    pub fn element(&self) -> &CodecRef {
        &self.element
    }
}

impl Codec for ListCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::List
    }

    fn cql_type(&self) -> CqlType {
        CqlType::list(self.element.cql_type())
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::List(items) => items
                .iter()
                .map(|item| self.element.encode(item))
                .collect::<Result<_, _>>()
                .map(CqlValue::List),
            other => Err(encode_mismatch("list", ValueKind::List, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::List(items) => items
                .iter()
                .map(|item| self.element.decode(item))
                .collect::<Result<_, _>>()
                .map(Value::List),
            other => Err(decode_mismatch("list", &self.cql_type(), other)),
        }
    }
}

///
/// SetCodec
///

#[derive(Clone, Debug)]
pub struct SetCodec {
    element: CodecRef,
}

impl SetCodec {
    #[must_use]
    pub fn new(element: CodecRef) -> Self {
        Self { element }
    }

    #[must_use]
    pub fn element(&self) -> &CodecRef {
        &self.element
    }
}

impl Codec for SetCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Set
    }

    fn cql_type(&self) -> CqlType {
        CqlType::set(self.element.cql_type())
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::Set(items) => {
                let mut encoded = Vec::with_capacity(items.len());
                for item in items {
                    let item = self.element.encode(item)?;
                    if !encoded.contains(&item) {
                        encoded.push(item);
                    }
                }

                Ok(CqlValue::Set(encoded))
            }
            other => Err(encode_mismatch("set", ValueKind::Set, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::Set(items) => items
                .iter()
                .map(|item| self.element.decode(item))
                .collect::<Result<_, _>>()
                .map(Value::Set),
            other => Err(decode_mismatch("set", &self.cql_type(), other)),
        }
    }
}

///
/// MapCodec
///

#[derive(Clone, Debug)]
pub struct MapCodec {
    key: CodecRef,
    value: CodecRef,
}

impl MapCodec {
    #[must_use]
    pub fn new(key: CodecRef, value: CodecRef) -> Self {
        Self { key, value }
    }

    #[must_use]
    pub fn key(&self) -> &CodecRef {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &CodecRef {
        &self.value
    }

    /// Encode one map entry; used by differential `put` operations.
    pub fn encode_entry(
        &self,
        key: &Value,
        value: &Value,
    ) -> Result<(CqlValue, CqlValue), MappingError> {
        Ok((self.key.encode(key)?, self.value.encode(value)?))
    }
}

impl Codec for MapCodec {
    fn source_kind(&self) -> ValueKind {
        ValueKind::Map
    }

    fn cql_type(&self) -> CqlType {
        CqlType::map(self.key.cql_type(), self.value.cql_type())
    }

    fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        match value {
            Value::Null => Ok(CqlValue::Null),
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| self.encode_entry(k, v))
                .collect::<Result<_, _>>()
                .map(CqlValue::Map),
            other => Err(encode_mismatch("map", ValueKind::Map, other)),
        }
    }

    fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        match value {
            CqlValue::Null => Ok(Value::Null),
            CqlValue::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((self.key.decode(k)?, self.value.decode(v)?)))
                .collect::<Result<_, MappingError>>()
                .map(Value::Map),
            other => Err(decode_mismatch("map", &self.cql_type(), other)),
        }
    }
}
