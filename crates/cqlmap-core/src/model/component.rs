use crate::{
    codec::CodecRef,
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::binding::FieldBinding,
    value::{Value, ValueKind},
};
use std::fmt;

///
/// ComponentRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ComponentRole {
    Partition,
    Clustering,
}

impl ComponentRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Partition => "partition",
            Self::Clustering => "clustering",
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ComponentMeta
///
/// One key component: declared kind, logical and column names, codec and
/// the binding to the field on the key object.
///

#[derive(Clone, Debug)]
pub struct ComponentMeta {
    name: String,
    cql_name: String,
    kind: ValueKind,
    codec: CodecRef,
    binding: FieldBinding,
}

impl ComponentMeta {
    /// The column name defaults to the lower-cased field name.
    #[must_use]
    pub fn new(codec: CodecRef, binding: FieldBinding) -> Self {
        let name = binding.field().to_string();

        Self {
            cql_name: name.to_lowercase(),
            name,
            kind: codec.source_kind(),
            codec,
            binding,
        }
    }

    #[must_use]
    pub fn with_cql_name(mut self, cql_name: impl Into<String>) -> Self {
        self.cql_name = cql_name.into();
        self
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
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    #[must_use]
    pub const fn codec(&self) -> &CodecRef {
        &self.codec
    }

    #[must_use]
    pub const fn binding(&self) -> &FieldBinding {
        &self.binding
    }
}

///
/// KeyComponents
///
/// Ordered partition or clustering components. Order is fixed at build time.
///

#[derive(Clone, Debug)]
pub struct KeyComponents {
    role: ComponentRole,
    components: Vec<ComponentMeta>,
}

impl KeyComponents {
    #[must_use]
    pub const fn new(role: ComponentRole, components: Vec<ComponentMeta>) -> Self {
        Self { role, components }
    }

    #[must_use]
    pub const fn role(&self) -> ComponentRole {
        self.role
    }

    #[must_use]
    pub fn components(&self) -> &[ComponentMeta] {
        &self.components
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ComponentMeta> {
        self.components.last()
    }

    #[must_use]
    pub fn cql_names(&self) -> Vec<&str> {
        self.components.iter().map(ComponentMeta::cql_name).collect()
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ValueKind> {
        self.components.iter().map(ComponentMeta::kind).collect()
    }

    /// Check a prefix of component values for querying on `entity`.
    ///
    /// At least one value, no more values than declared components, no null
    /// and each value assignable to the declared kind at its index.
    pub fn validate_components(&self, entity: &str, values: &[Value]) -> Result<(), MappingError> {
        self.check_not_empty(entity, values)?;

        if values.len() > self.components.len() {
            return Err(MappingError::validation(
                ErrorOrigin::Component,
                format!(
                    "there should be at most {} value(s) of {} components provided for querying on entity '{entity}'",
                    self.components.len(),
                    self.role
                ),
            ));
        }

        for (index, (component, value)) in self.components.iter().zip(values).enumerate() {
            self.check_value(entity, index, component.kind, value)?;
        }

        Ok(())
    }

    /// Check IN-clause values; every value is checked against the last
    /// declared component.
    pub fn validate_components_in(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<(), MappingError> {
        self.check_not_empty(entity, values)?;
        let last = self.last_component(entity)?;

        for (index, value) in values.iter().enumerate() {
            self.check_value(entity, index, last.kind, value)?;
        }

        Ok(())
    }

    /// Validate then encode a prefix of component values, position by position.
    pub fn encode_prefix(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<Vec<CqlValue>, MappingError> {
        self.validate_components(entity, values)?;

        self.components
            .iter()
            .zip(values)
            .map(|(component, value)| component.codec.encode(value))
            .collect()
    }

    /// Validate then encode IN-clause values through the last component codec.
    pub fn encode_in(&self, entity: &str, values: &[Value]) -> Result<Vec<CqlValue>, MappingError> {
        self.validate_components_in(entity, values)?;
        let last = self.last_component(entity)?;

        values.iter().map(|value| last.codec.encode(value)).collect()
    }

    fn last_component(&self, entity: &str) -> Result<&ComponentMeta, MappingError> {
        self.components.last().ok_or_else(|| {
            MappingError::invariant(
                ErrorOrigin::Component,
                format!("entity '{entity}' declares no {} components", self.role),
            )
        })
    }

    fn check_not_empty(&self, entity: &str, values: &[Value]) -> Result<(), MappingError> {
        if values.is_empty() {
            return Err(MappingError::validation(
                ErrorOrigin::Component,
                format!(
                    "there should be at least one {} key component provided for querying on entity '{entity}'",
                    self.role
                ),
            ));
        }

        Ok(())
    }

    fn check_value(
        &self,
        entity: &str,
        index: usize,
        expected: ValueKind,
        value: &Value,
    ) -> Result<(), MappingError> {
        let Some(actual) = value.kind() else {
            return Err(MappingError::validation(
                ErrorOrigin::Component,
                format!(
                    "the {} component value at index {index} for querying on entity '{entity}' should not be null",
                    self.role
                ),
            ));
        };

        if !expected.accepts(actual) {
            return Err(MappingError::component_mismatch(
                format!(
                    "the type '{actual}' of {} component value at index {index} for querying on entity '{entity}' is not valid, it should be '{expected}'",
                    self.role
                ),
                index,
                expected,
                actual,
            ));
        }

        Ok(())
    }
}
