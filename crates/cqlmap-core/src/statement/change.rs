use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{PropertyMeta, PropertyType},
    statement::Assignment,
    value::Value,
};

///
/// CollectionChange
///
/// Differential operation on one collection column.
///

#[derive(Clone, Debug, PartialEq)]
pub enum CollectionChange {
    /// Replace the whole collection.
    AssignValue(Value),
    /// Drop the whole collection (`discardAll`).
    RemoveCollection,
    AddToSet(Vec<Value>),
    RemoveFromSet(Vec<Value>),
    AppendToList(Vec<Value>),
    PrependToList(Vec<Value>),
    RemoveFromList(Vec<Value>),
    SetToListAtIndex { index: usize, value: Value },
    /// Lists have no positional delete; the element is set to null.
    RemoveFromListAtIndex(usize),
    AddToMap(Vec<(Value, Value)>),
    /// Null out one map key.
    RemoveFromMap(Value),
}

impl CollectionChange {
    const fn target(&self) -> Option<PropertyType> {
        match self {
            Self::AssignValue(_) | Self::RemoveCollection => None,
            Self::AddToSet(_) | Self::RemoveFromSet(_) => Some(PropertyType::Set),
            Self::AppendToList(_)
            | Self::PrependToList(_)
            | Self::RemoveFromList(_)
            | Self::SetToListAtIndex { .. }
            | Self::RemoveFromListAtIndex(_) => Some(PropertyType::List),
            Self::AddToMap(_) | Self::RemoveFromMap(_) => Some(PropertyType::Map),
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::AssignValue(_) => "assign",
            Self::RemoveCollection => "remove collection",
            Self::AddToSet(_) => "add to set",
            Self::RemoveFromSet(_) => "remove from set",
            Self::AppendToList(_) => "append to list",
            Self::PrependToList(_) => "prepend to list",
            Self::RemoveFromList(_) => "remove from list",
            Self::SetToListAtIndex { .. } => "set at index",
            Self::RemoveFromListAtIndex(_) => "remove at index",
            Self::AddToMap(_) => "add to map",
            Self::RemoveFromMap(_) => "remove from map",
        }
    }

    /// Build the assignment for `property`, checking the operation fits its
    /// type.
    pub(crate) fn assignment(&self, property: &PropertyMeta) -> Result<Assignment, MappingError> {
        let fits = match self.target() {
            Some(target) => target == property.property_type(),
            None => property.is_collection(),
        };
        if !fits {
            return Err(MappingError::validation(
                ErrorOrigin::Statement,
                format!(
                    "cannot apply '{}' to {} property '{}' of entity '{}'",
                    self.label(),
                    property.property_type(),
                    property.name(),
                    property.entity()
                ),
            ));
        }

        let column = property.cql_name().to_string();
        let assignment = match self {
            Self::AssignValue(value) => Assignment::Set {
                column,
                value: property.encode(value)?,
            },
            Self::RemoveCollection => Assignment::Set {
                column,
                value: CqlValue::Null,
            },
            Self::AddToSet(values) | Self::AppendToList(values) => Assignment::AddTo {
                column,
                value: property.encode_elements(values)?,
            },
            Self::RemoveFromSet(values) | Self::RemoveFromList(values) => Assignment::RemoveFrom {
                column,
                value: property.encode_elements(values)?,
            },
            Self::PrependToList(values) => Assignment::Prepend {
                column,
                value: property.encode_elements(values)?,
            },
            Self::SetToListAtIndex { index, value } => Assignment::SetAtIndex {
                column,
                index: *index,
                value: property.encode_element(value)?,
            },
            Self::RemoveFromListAtIndex(index) => Assignment::SetAtIndex {
                column,
                index: *index,
                value: CqlValue::Null,
            },
            Self::AddToMap(entries) => Assignment::AddTo {
                column,
                value: property.encode_entries(entries)?,
            },
            Self::RemoveFromMap(key) => Assignment::SetKey {
                column,
                key: property.encode_map_key(key)?,
                value: CqlValue::Null,
            },
        };

        Ok(assignment)
    }
}

///
/// PropertyChange
///

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyChange {
    /// Write the current field value.
    Assign(String),
    Collection {
        property: String,
        change: CollectionChange,
    },
}

impl PropertyChange {
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Assign(property) | Self::Collection { property, .. } => property,
        }
    }
}

///
/// ChangeSet
///
/// Explicit list of modifications for one UPDATE.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<PropertyChange>,
}

impl ChangeSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn assign(mut self, property: impl Into<String>) -> Self {
        self.changes.push(PropertyChange::Assign(property.into()));
        self
    }

    #[must_use]
    pub fn collection(mut self, property: impl Into<String>, change: CollectionChange) -> Self {
        self.changes.push(PropertyChange::Collection {
            property: property.into(),
            change,
        });
        self
    }

    #[must_use]
    pub fn add_to_set(self, property: impl Into<String>, values: Vec<Value>) -> Self {
        self.collection(property, CollectionChange::AddToSet(values))
    }

    #[must_use]
    pub fn remove_from_set(self, property: impl Into<String>, values: Vec<Value>) -> Self {
        self.collection(property, CollectionChange::RemoveFromSet(values))
    }

    #[must_use]
    pub fn append_to_list(self, property: impl Into<String>, values: Vec<Value>) -> Self {
        self.collection(property, CollectionChange::AppendToList(values))
    }

    #[must_use]
    pub fn prepend_to_list(self, property: impl Into<String>, values: Vec<Value>) -> Self {
        self.collection(property, CollectionChange::PrependToList(values))
    }

    #[must_use]
    pub fn set_at_index(self, property: impl Into<String>, index: usize, value: Value) -> Self {
        self.collection(property, CollectionChange::SetToListAtIndex { index, value })
    }

    #[must_use]
    pub fn remove_at_index(self, property: impl Into<String>, index: usize) -> Self {
        self.collection(property, CollectionChange::RemoveFromListAtIndex(index))
    }

    #[must_use]
    pub fn put(self, property: impl Into<String>, key: Value, value: Value) -> Self {
        self.collection(property, CollectionChange::AddToMap(vec![(key, value)]))
    }

    #[must_use]
    pub fn remove_key(self, property: impl Into<String>, key: Value) -> Self {
        self.collection(property, CollectionChange::RemoveFromMap(key))
    }

    #[must_use]
    pub fn discard(self, property: impl Into<String>) -> Self {
        self.collection(property, CollectionChange::RemoveCollection)
    }

    #[must_use]
    pub fn changes(&self) -> &[PropertyChange] {
        &self.changes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl FromIterator<PropertyChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = PropertyChange>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}
