use crate::{
    codec::{CodecRef, compound},
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{
        component::KeyComponents,
        compound::{ClusteringOrder, CompoundKeyMeta},
        property::{Binding, PropertyMeta, PropertyType, Transcoder},
    },
    value::Value,
};
use std::any::Any;

impl PropertyMeta {
    // ------------------------------------------------------------------
    // Value access
    // ------------------------------------------------------------------

    /// Read the field value from an entity instance.
    pub fn get_value(&self, entity: &dyn Any) -> Result<Value, MappingError> {
        match &self.binding {
            Binding::Field(binding) => binding.get(entity),
            Binding::Embedded(_) => Err(self.not_simple("get_value")),
        }
    }

    pub fn set_value(&self, entity: &mut dyn Any, value: Value) -> Result<(), MappingError> {
        match &self.binding {
            Binding::Field(binding) => binding.set(entity, value),
            Binding::Embedded(_) => Err(self.not_simple("set_value")),
        }
    }

    /// Borrow the embedded key object of an entity, if set.
    pub fn get_embedded<'a>(&self, entity: &'a dyn Any) -> Result<Option<&'a dyn Any>, MappingError> {
        match &self.binding {
            Binding::Embedded(binding) => binding.get(entity),
            Binding::Field(_) => Err(self.not_compound()),
        }
    }

    pub fn set_embedded(
        &self,
        entity: &mut dyn Any,
        key: Box<dyn Any + Send>,
    ) -> Result<(), MappingError> {
        match &self.binding {
            Binding::Embedded(binding) => binding.set(entity, key),
            Binding::Field(_) => Err(self.not_compound()),
        }
    }

    // ------------------------------------------------------------------
    // Encode / decode
    // ------------------------------------------------------------------

    /// Native → wire, dispatched on the property type. Counters encode their
    /// pending delta.
    pub fn encode(&self, value: &Value) -> Result<CqlValue, MappingError> {
        self.codec()?.encode(value)
    }

    /// Wire → native. A null collection becomes empty only when the
    /// property is declared empty-if-null.
    pub fn decode(&self, value: &CqlValue) -> Result<Value, MappingError> {
        let decoded = self.codec()?.decode(value)?;
        if decoded.is_null() && self.empty_if_null {
            return Ok(self.empty_collection().unwrap_or(Value::Null));
        }

        Ok(decoded)
    }

    /// Read and encode the field of an entity.
    pub fn encode_field(&self, entity: &dyn Any) -> Result<CqlValue, MappingError> {
        self.encode(&self.get_value(entity)?)
    }

    /// Decode a wire value and assign it to the field of an entity.
    pub fn decode_and_set(&self, entity: &mut dyn Any, value: &CqlValue) -> Result<(), MappingError> {
        let decoded = self.decode(value)?;
        self.set_value(entity, decoded)
    }

    /// Encode one element (list/set) or map value.
    pub fn encode_element(&self, value: &Value) -> Result<CqlValue, MappingError> {
        self.element_codec()?.encode(value)
    }

    pub fn encode_map_key(&self, key: &Value) -> Result<CqlValue, MappingError> {
        match (&self.key_codec, self.property_type) {
            (Some(codec), PropertyType::Map) => codec.encode(key),
            _ => Err(MappingError::invariant(
                ErrorOrigin::Property,
                format!("property '{}' of '{}' is not a map", self.name, self.entity),
            )),
        }
    }

    /// Encode a list of elements as one list or set literal.
    pub fn encode_elements(&self, values: &[Value]) -> Result<CqlValue, MappingError> {
        let codec = self.element_codec()?;
        let encoded = values
            .iter()
            .map(|value| codec.encode(value))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match self.property_type {
            PropertyType::Set => CqlValue::Set(encoded),
            _ => CqlValue::List(encoded),
        })
    }

    pub fn encode_entries(&self, entries: &[(Value, Value)]) -> Result<CqlValue, MappingError> {
        let value_codec = self.element_codec()?;
        entries
            .iter()
            .map(|(key, value)| Ok((self.encode_map_key(key)?, value_codec.encode(value)?)))
            .collect::<Result<Vec<_>, MappingError>>()
            .map(CqlValue::Map)
    }

    // ------------------------------------------------------------------
    // Compound key
    // ------------------------------------------------------------------

    /// Compound key descriptor, or a contract violation for simple ids and
    /// ordinary columns.
    pub fn compound_meta(&self) -> Result<&CompoundKeyMeta, MappingError> {
        match &self.transcoder {
            Transcoder::Compound(meta) => Ok(meta.as_ref()),
            Transcoder::Codec(_) => Err(self.not_compound()),
        }
    }

    pub fn decode_from_components(
        &self,
        raw: &[CqlValue],
    ) -> Result<Box<dyn Any + Send>, MappingError> {
        compound::decode_from_components(self.compound_meta()?, raw)
    }

    pub fn decode_partition_only(
        &self,
        raw: &[CqlValue],
    ) -> Result<Box<dyn Any + Send>, MappingError> {
        compound::decode_partition_only(self.compound_meta()?, raw)
    }

    pub fn encode_to_components(
        &self,
        key: &dyn Any,
        partition_only: bool,
    ) -> Result<Vec<CqlValue>, MappingError> {
        compound::encode_to_components(self.compound_meta()?, key, partition_only)
    }

    pub fn encode_partition_components(&self, values: &[Value]) -> Result<Vec<CqlValue>, MappingError> {
        self.partition_components()?.encode_prefix(&self.entity, values)
    }

    pub fn encode_partition_components_in(
        &self,
        values: &[Value],
    ) -> Result<Vec<CqlValue>, MappingError> {
        self.partition_components()?.encode_in(&self.entity, values)
    }

    pub fn encode_clustering_keys(&self, values: &[Value]) -> Result<Vec<CqlValue>, MappingError> {
        self.clustering_components()?.encode_prefix(&self.entity, values)
    }

    pub fn encode_clustering_keys_in(&self, values: &[Value]) -> Result<Vec<CqlValue>, MappingError> {
        self.clustering_components()?.encode_in(&self.entity, values)
    }

    pub fn validate_partition_components(&self, values: &[Value]) -> Result<(), MappingError> {
        self.partition_components()?.validate_components(&self.entity, values)
    }

    pub fn validate_partition_components_in(&self, values: &[Value]) -> Result<(), MappingError> {
        self.partition_components()?
            .validate_components_in(&self.entity, values)
    }

    pub fn validate_clustering_components(&self, values: &[Value]) -> Result<(), MappingError> {
        self.clustering_components()?
            .validate_components(&self.entity, values)
    }

    pub fn validate_clustering_components_in(&self, values: &[Value]) -> Result<(), MappingError> {
        self.clustering_components()?
            .validate_components_in(&self.entity, values)
    }

    pub fn partition_components(&self) -> Result<&KeyComponents, MappingError> {
        Ok(self.compound_meta()?.partition())
    }

    /// Clustering components; a contract violation when the key has none.
    pub fn clustering_components(&self) -> Result<&KeyComponents, MappingError> {
        let meta = self.compound_meta()?;
        if !meta.is_clustered() {
            return Err(self.not_clustered());
        }

        Ok(meta.clustering())
    }

    pub fn clustering_orders(&self) -> Result<&[ClusteringOrder], MappingError> {
        let meta = self.compound_meta()?;
        if !meta.is_clustered() {
            return Err(self.not_clustered());
        }

        Ok(meta.clustering_orders())
    }

    // ------------------------------------------------------------------
    // Primary key extraction
    // ------------------------------------------------------------------

    /// Column names of the id, partition first. With `partition_only` the
    /// clustering columns are left out.
    #[must_use]
    pub fn id_column_names(&self, partition_only: bool) -> Vec<String> {
        match &self.transcoder {
            Transcoder::Codec(_) => vec![self.cql_name.clone()],
            Transcoder::Compound(meta) if partition_only => meta
                .partition()
                .cql_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            Transcoder::Compound(meta) => {
                meta.cql_names().into_iter().map(str::to_string).collect()
            }
        }
    }

    /// Encoded `(column, value)` pairs of the id of `entity`.
    /// A missing id (or any null component) is a validation error.
    pub fn extract_id_components(
        &self,
        entity: &dyn Any,
        partition_only: bool,
    ) -> Result<Vec<(String, CqlValue)>, MappingError> {
        let values = match &self.transcoder {
            Transcoder::Codec(_) => vec![self.encode_field(entity)?],
            Transcoder::Compound(_) => {
                let key = self.get_embedded(entity)?.ok_or_else(|| self.missing_id())?;
                self.encode_to_components(key, partition_only)?
            }
        };

        let names = self.id_column_names(partition_only);
        if values.iter().any(CqlValue::is_null) {
            return Err(self.missing_id());
        }

        Ok(names.into_iter().zip(values).collect())
    }

    /// Native id values of `entity`, partition first.
    pub fn id_native_values(&self, entity: &dyn Any) -> Result<Vec<Value>, MappingError> {
        let values = match &self.transcoder {
            Transcoder::Codec(_) => vec![self.get_value(entity)?],
            Transcoder::Compound(meta) => {
                let key = self.get_embedded(entity)?.ok_or_else(|| self.missing_id())?;
                meta.components()
                    .map(|component| component.binding().get(key))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        if values.iter().any(Value::is_null) {
            return Err(self.missing_id());
        }

        Ok(values)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn codec(&self) -> Result<&CodecRef, MappingError> {
        match &self.transcoder {
            Transcoder::Codec(codec) => Ok(codec),
            Transcoder::Compound(_) => Err(MappingError::invariant(
                ErrorOrigin::Property,
                format!(
                    "compound key '{}' of '{}' is transcoded through its components",
                    self.name, self.entity
                ),
            )),
        }
    }

    fn element_codec(&self) -> Result<&CodecRef, MappingError> {
        self.element.as_ref().ok_or_else(|| {
            MappingError::invariant(
                ErrorOrigin::Property,
                format!(
                    "property '{}' of '{}' is not a collection",
                    self.name, self.entity
                ),
            )
        })
    }

    fn empty_collection(&self) -> Option<Value> {
        match self.property_type {
            PropertyType::List => Some(Value::List(Vec::new())),
            PropertyType::Set => Some(Value::Set(Vec::new())),
            PropertyType::Map => Some(Value::Map(Vec::new())),
            _ => None,
        }
    }

    fn missing_id(&self) -> MappingError {
        MappingError::validation(
            ErrorOrigin::Property,
            format!("the primary key '{}' of entity '{}' should not be null", self.name, self.entity),
        )
    }

    fn not_compound(&self) -> MappingError {
        MappingError::invariant(
            ErrorOrigin::Property,
            format!(
                "property '{}' of '{}' is not a compound primary key",
                self.name, self.entity
            ),
        )
    }

    fn not_clustered(&self) -> MappingError {
        MappingError::invariant(
            ErrorOrigin::Property,
            format!(
                "compound primary key '{}' of '{}' has no clustering component",
                self.name, self.entity
            ),
        )
    }

    fn not_simple(&self, op: &str) -> MappingError {
        MappingError::invariant(
            ErrorOrigin::Property,
            format!(
                "{op} is not available on compound key '{}' of '{}'",
                self.name, self.entity
            ),
        )
    }
}
