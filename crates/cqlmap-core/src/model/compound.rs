use crate::{
    error::{ErrorOrigin, MappingError},
    model::{
        binding::Instantiator,
        component::{ComponentMeta, ComponentRole, KeyComponents},
    },
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{any::Any, fmt};

///
/// Sorting
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sorting {
    #[default]
    Asc,
    Desc,
}

impl Sorting {
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// ClusteringOrder
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusteringOrder {
    pub column: String,
    pub sorting: Sorting,
}

impl fmt::Display for ClusteringOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.sorting)
    }
}

///
/// CompoundKeyMeta
///
/// Primary-key descriptor of an embedded-id entity: partition components
/// followed by clustering components, with one order per clustering
/// component.
///

#[derive(Clone, Debug)]
pub struct CompoundKeyMeta {
    partition: KeyComponents,
    clustering: KeyComponents,
    orders: Vec<ClusteringOrder>,
    instantiator: Instantiator,
}

impl CompoundKeyMeta {
    #[must_use]
    pub fn builder<K: Any + Default + Send>() -> CompoundKeyMetaBuilder {
        CompoundKeyMetaBuilder {
            partition: Vec::new(),
            clustering: Vec::new(),
            instantiator: Instantiator::of::<K>(),
        }
    }

    #[must_use]
    pub const fn partition(&self) -> &KeyComponents {
        &self.partition
    }

    #[must_use]
    pub const fn clustering(&self) -> &KeyComponents {
        &self.clustering
    }

    #[must_use]
    pub fn clustering_orders(&self) -> &[ClusteringOrder] {
        &self.orders
    }

    #[must_use]
    pub fn is_clustered(&self) -> bool {
        !self.clustering.is_empty()
    }

    /// Every component, partition first, in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.partition
            .components()
            .iter()
            .chain(self.clustering.components())
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.partition.len() + self.clustering.len()
    }

    #[must_use]
    pub fn cql_names(&self) -> Vec<&str> {
        self.components().map(ComponentMeta::cql_name).collect()
    }

    #[must_use]
    pub const fn instantiator(&self) -> &Instantiator {
        &self.instantiator
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.instantiator.type_name()
    }

    pub fn validate_partition_components(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<(), MappingError> {
        self.partition.validate_components(entity, values)
    }

    pub fn validate_partition_components_in(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<(), MappingError> {
        self.partition.validate_components_in(entity, values)
    }

    pub fn validate_clustering_components(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<(), MappingError> {
        self.clustering.validate_components(entity, values)
    }

    pub fn validate_clustering_components_in(
        &self,
        entity: &str,
        values: &[Value],
    ) -> Result<(), MappingError> {
        self.clustering.validate_components_in(entity, values)
    }
}

///
/// CompoundKeyMetaBuilder
///

#[derive(Debug)]
pub struct CompoundKeyMetaBuilder {
    partition: Vec<ComponentMeta>,
    clustering: Vec<(ComponentMeta, Sorting)>,
    instantiator: Instantiator,
}

impl CompoundKeyMetaBuilder {
    #[must_use]
    pub fn partition(mut self, component: ComponentMeta) -> Self {
        self.partition.push(component);
        self
    }

    /// Ascending clustering component.
    #[must_use]
    pub fn clustering(self, component: ComponentMeta) -> Self {
        self.clustering_with(component, Sorting::Asc)
    }

    #[must_use]
    pub fn clustering_with(mut self, component: ComponentMeta, sorting: Sorting) -> Self {
        self.clustering.push((component, sorting));
        self
    }

    pub fn build(self) -> Result<CompoundKeyMeta, MappingError> {
        let type_name = self.instantiator.type_name();
        if self.partition.is_empty() {
            return Err(MappingError::validation(
                ErrorOrigin::Component,
                format!("compound key '{type_name}' declares no partition component"),
            ));
        }

        let mut names: Vec<&str> = Vec::new();
        for component in self
            .partition
            .iter()
            .chain(self.clustering.iter().map(|(c, _)| c))
        {
            if names.contains(&component.cql_name()) {
                return Err(MappingError::validation(
                    ErrorOrigin::Component,
                    format!(
                        "compound key '{type_name}' declares column '{}' twice",
                        component.cql_name()
                    ),
                ));
            }
            names.push(component.cql_name());
        }

        let orders = self
            .clustering
            .iter()
            .map(|(component, sorting)| ClusteringOrder {
                column: component.cql_name().to_string(),
                sorting: *sorting,
            })
            .collect();
        let clustering = self.clustering.into_iter().map(|(c, _)| c).collect();

        Ok(CompoundKeyMeta {
            partition: KeyComponents::new(ComponentRole::Partition, self.partition),
            clustering: KeyComponents::new(ComponentRole::Clustering, clustering),
            orders,
            instantiator: self.instantiator,
        })
    }
}
