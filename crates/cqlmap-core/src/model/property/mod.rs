mod transcode;

use crate::{
    codec::{CodecRef, CounterCodec, ListCodec, MapCodec, SetCodec},
    cql::{ConsistencyPair, CqlType},
    model::{
        binding::{EmbeddedBinding, FieldBinding},
        compound::CompoundKeyMeta,
    },
    value::ValueKind,
};
use std::{fmt, sync::Arc};

///
/// PropertyType
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PropertyType {
    PartitionKey,
    CompoundPrimaryKey,
    Simple,
    List,
    Set,
    Map,
    Counter,
}

impl PropertyType {
    #[must_use]
    pub const fn is_id(self) -> bool {
        matches!(self, Self::PartitionKey | Self::CompoundPrimaryKey)
    }

    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }

    #[must_use]
    pub const fn is_counter(self) -> bool {
        matches!(self, Self::Counter)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PartitionKey => "PARTITION_KEY",
            Self::CompoundPrimaryKey => "COMPOUND_PRIMARY_KEY",
            Self::Simple => "SIMPLE",
            Self::List => "LIST",
            Self::Set => "SET",
            Self::Map => "MAP",
            Self::Counter => "COUNTER",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// IndexMeta
///
/// Secondary index on a column.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexMeta {
    pub name: Option<String>,
}

///
/// Transcoder
///

#[derive(Clone, Debug)]
pub(crate) enum Transcoder {
    Codec(CodecRef),
    Compound(Arc<CompoundKeyMeta>),
}

///
/// Binding
///

#[derive(Clone, Debug)]
pub(crate) enum Binding {
    Field(FieldBinding),
    Embedded(EmbeddedBinding),
}

///
/// PropertyMeta
///
/// Per-column (or compound-key) descriptor. Immutable once built and shared
/// read-only by every operation on the owning entity.
///

#[derive(Clone, Debug)]
pub struct PropertyMeta {
    entity: String,
    name: String,
    cql_name: String,
    property_type: PropertyType,

    // element kind for collections, value kind for maps
    value_kind: Option<ValueKind>,
    key_kind: Option<ValueKind>,
    element: Option<CodecRef>,
    key_codec: Option<CodecRef>,

    transcoder: Transcoder,
    binding: Binding,
    consistency: ConsistencyPair,
    static_column: bool,
    empty_if_null: bool,
    index: Option<IndexMeta>,
}

impl PropertyMeta {
    /// Plain column through a scalar codec.
    #[must_use]
    pub fn simple(binding: FieldBinding, codec: CodecRef) -> PropertyMetaBuilder {
        PropertyMetaBuilder::new(
            PropertyType::Simple,
            Binding::Field(binding),
            Some(codec.source_kind()),
            Transcoder::Codec(codec),
        )
    }

    /// Single-column primary key.
    #[must_use]
    pub fn partition_key(binding: FieldBinding, codec: CodecRef) -> PropertyMetaBuilder {
        PropertyMetaBuilder::new(
            PropertyType::PartitionKey,
            Binding::Field(binding),
            Some(codec.source_kind()),
            Transcoder::Codec(codec),
        )
    }

    #[must_use]
    pub fn list(binding: FieldBinding, element: CodecRef) -> PropertyMetaBuilder {
        let mut builder = PropertyMetaBuilder::new(
            PropertyType::List,
            Binding::Field(binding),
            Some(element.source_kind()),
            Transcoder::Codec(Arc::new(ListCodec::new(element.clone()))),
        );
        builder.meta.element = Some(element);
        builder
    }

    #[must_use]
    pub fn set(binding: FieldBinding, element: CodecRef) -> PropertyMetaBuilder {
        let mut builder = PropertyMetaBuilder::new(
            PropertyType::Set,
            Binding::Field(binding),
            Some(element.source_kind()),
            Transcoder::Codec(Arc::new(SetCodec::new(element.clone()))),
        );
        builder.meta.element = Some(element);
        builder
    }

    #[must_use]
    pub fn map(binding: FieldBinding, key: CodecRef, value: CodecRef) -> PropertyMetaBuilder {
        let mut builder = PropertyMetaBuilder::new(
            PropertyType::Map,
            Binding::Field(binding),
            Some(value.source_kind()),
            Transcoder::Codec(Arc::new(MapCodec::new(key.clone(), value.clone()))),
        );
        builder.meta.key_kind = Some(key.source_kind());
        builder.meta.element = Some(value);
        builder.meta.key_codec = Some(key);
        builder
    }

    #[must_use]
    pub fn counter(binding: FieldBinding) -> PropertyMetaBuilder {
        PropertyMetaBuilder::new(
            PropertyType::Counter,
            Binding::Field(binding),
            Some(ValueKind::Counter),
            Transcoder::Codec(Arc::new(CounterCodec)),
        )
    }

    /// Embedded compound primary key.
    #[must_use]
    pub fn compound_key(binding: EmbeddedBinding, key: CompoundKeyMeta) -> PropertyMetaBuilder {
        PropertyMetaBuilder::new(
            PropertyType::CompoundPrimaryKey,
            Binding::Embedded(binding),
            None,
            Transcoder::Compound(Arc::new(key)),
        )
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn cql_name(&self) -> &str {
        &self.cql_name
    }

    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Declared class of the value (element class for collections).
    #[must_use]
    pub const fn value_kind(&self) -> Option<ValueKind> {
        self.value_kind
    }

    /// Key class of a map property.
    #[must_use]
    pub const fn key_kind(&self) -> Option<ValueKind> {
        self.key_kind
    }

    /// Wire class of the column; `None` for a compound key, which spans
    /// several columns.
    #[must_use]
    pub fn cql_type(&self) -> Option<CqlType> {
        match &self.transcoder {
            Transcoder::Codec(codec) => Some(codec.cql_type()),
            Transcoder::Compound(_) => None,
        }
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyPair {
        self.consistency
    }

    #[must_use]
    pub const fn is_static_column(&self) -> bool {
        self.static_column
    }

    #[must_use]
    pub const fn is_empty_if_null(&self) -> bool {
        self.empty_if_null
    }

    #[must_use]
    pub const fn index(&self) -> Option<&IndexMeta> {
        self.index.as_ref()
    }

    #[must_use]
    pub const fn is_id(&self) -> bool {
        self.property_type.is_id()
    }

    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self.property_type, PropertyType::CompoundPrimaryKey)
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        self.property_type.is_counter()
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.property_type.is_collection()
    }
}

///
/// PropertyMetaBuilder
///
/// One-shot builder; the entity builder finishes it with the owning entity
/// name.
///

#[derive(Debug)]
pub struct PropertyMetaBuilder {
    meta: PropertyMeta,
}

impl PropertyMetaBuilder {
    fn new(
        property_type: PropertyType,
        binding: Binding,
        value_kind: Option<ValueKind>,
        transcoder: Transcoder,
    ) -> Self {
        let name = match &binding {
            Binding::Field(field) => field.field().to_string(),
            Binding::Embedded(embedded) => embedded.field().to_string(),
        };

        Self {
            meta: PropertyMeta {
                entity: String::new(),
                cql_name: name.to_lowercase(),
                name,
                property_type,
                value_kind,
                key_kind: None,
                element: None,
                key_codec: None,
                transcoder,
                binding,
                consistency: ConsistencyPair::default(),
                static_column: false,
                empty_if_null: false,
                index: None,
            },
        }
    }

    #[must_use]
    pub fn cql_name(mut self, cql_name: impl Into<String>) -> Self {
        self.meta.cql_name = cql_name.into();
        self
    }

    #[must_use]
    pub const fn consistency(mut self, consistency: ConsistencyPair) -> Self {
        self.meta.consistency = consistency;
        self
    }

    #[must_use]
    pub const fn static_column(mut self) -> Self {
        self.meta.static_column = true;
        self
    }

    /// Decode a null collection as an empty one.
    #[must_use]
    pub const fn empty_if_null(mut self) -> Self {
        self.meta.empty_if_null = true;
        self
    }

    #[must_use]
    pub fn index(mut self, name: Option<&str>) -> Self {
        self.meta.index = Some(IndexMeta {
            name: name.map(str::to_string),
        });
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        self.meta.property_type
    }

    pub(crate) fn finish(mut self, entity: &str) -> PropertyMeta {
        self.meta.entity = entity.to_string();
        self.meta
    }
}
