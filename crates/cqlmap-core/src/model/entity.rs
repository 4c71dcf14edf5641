use crate::{
    DEFAULT_COUNTER_TABLE,
    config::MappingConfig,
    cql::ConsistencyPair,
    error::{ErrorOrigin, MappingError},
    model::{
        binding::Instantiator,
        compound::CompoundKeyMeta,
        interceptor::{Event, InterceptorRef},
        property::{PropertyMeta, PropertyMetaBuilder, PropertyType},
    },
};
use serde::Deserialize;
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

///
/// InsertStrategy
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsertStrategy {
    #[default]
    AllFields,
    OnlyNonNull,
}

type Snapshot = Arc<dyn Fn(&dyn Any) -> Option<Box<dyn Any + Send>> + Send + Sync>;

///
/// EntityMeta
///
/// Descriptor of one mapped type. Built once, then shared read-only.
///

#[derive(Clone)]
pub struct EntityMeta {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    keyspace: Option<String>,
    table: String,
    counter_table: String,

    // id first, then declaration order
    properties: Vec<PropertyMeta>,
    by_name: HashMap<String, usize>,
    by_cql_name: HashMap<String, usize>,
    except_id: Vec<usize>,
    except_id_and_counters: Vec<usize>,
    except_counters: Vec<usize>,

    consistency: ConsistencyPair,
    insert_strategy: InsertStrategy,
    schema_update: bool,
    clustered_entity: bool,
    clustered_counter: bool,
    only_static_columns: bool,

    interceptors: Vec<InterceptorRef>,
    instantiator: Instantiator,
    snapshot: Snapshot,
}

impl EntityMeta {
    /// Start describing entity type `E` stored in `table`.
    #[must_use]
    pub fn builder<E>(table: impl Into<String>) -> EntityMetaBuilder
    where
        E: Any + Clone + Default + Send,
    {
        let type_name = type_name::<E>();

        EntityMetaBuilder {
            name: type_name.rsplit("::").next().unwrap_or(type_name).to_string(),
            type_id: TypeId::of::<E>(),
            type_name,
            keyspace: None,
            table: table.into(),
            counter_table: DEFAULT_COUNTER_TABLE.to_string(),
            properties: Vec::new(),
            consistency: ConsistencyPair::default(),
            insert_strategy: InsertStrategy::default(),
            schema_update: false,
            interceptors: Vec::new(),
            instantiator: Instantiator::of::<E>(),
            snapshot: Arc::new(|entity: &dyn Any| {
                entity
                    .downcast_ref::<E>()
                    .map(|typed| Box::new(typed.clone()) as Box<dyn Any + Send>)
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `keyspace.table`, or the bare table when no keyspace is set.
    #[must_use]
    pub fn qualified_table(&self) -> String {
        qualify(self.keyspace.as_deref(), &self.table)
    }

    #[must_use]
    pub fn qualified_counter_table(&self) -> String {
        qualify(self.keyspace.as_deref(), &self.counter_table)
    }

    #[must_use]
    pub fn id(&self) -> &PropertyMeta {
        &self.properties[0]
    }

    /// Every property, id first.
    #[must_use]
    pub fn all(&self) -> &[PropertyMeta] {
        &self.properties
    }

    pub fn all_except_id(&self) -> impl Iterator<Item = &PropertyMeta> {
        self.view(&self.except_id)
    }

    pub fn all_except_id_and_counters(&self) -> impl Iterator<Item = &PropertyMeta> {
        self.view(&self.except_id_and_counters)
    }

    pub fn all_except_counters(&self) -> impl Iterator<Item = &PropertyMeta> {
        self.view(&self.except_counters)
    }

    /// Counters stored in the shared counter table (entities that are not
    /// clustered counters).
    pub fn simple_counters(&self) -> impl Iterator<Item = &PropertyMeta> {
        let simple = !self.clustered_counter;
        self.all_except_id()
            .filter(move |property| simple && property.is_counter())
    }

    pub fn property(&self, name: &str) -> Result<&PropertyMeta, MappingError> {
        self.by_name
            .get(name)
            .map(|index| &self.properties[*index])
            .ok_or_else(|| {
                MappingError::mapping(
                    ErrorOrigin::Entity,
                    format!("entity '{}' has no property '{name}'", self.name),
                )
            })
    }

    /// Property mapped to column `column`; a mapping error signals drift
    /// between metadata and schema.
    pub fn property_by_cql(&self, column: &str) -> Result<&PropertyMeta, MappingError> {
        self.find_by_cql(column).ok_or_else(|| {
            MappingError::mapping(
                ErrorOrigin::Entity,
                format!(
                    "cannot find property meta for column '{column}' of entity '{}'",
                    self.name
                ),
            )
        })
    }

    #[must_use]
    pub fn find_by_cql(&self, column: &str) -> Option<&PropertyMeta> {
        self.by_cql_name
            .get(column)
            .map(|index| &self.properties[*index])
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyPair {
        self.consistency
    }

    #[must_use]
    pub const fn insert_strategy(&self) -> InsertStrategy {
        self.insert_strategy
    }

    #[must_use]
    pub const fn schema_update(&self) -> bool {
        self.schema_update
    }

    #[must_use]
    pub const fn is_clustered_entity(&self) -> bool {
        self.clustered_entity
    }

    #[must_use]
    pub const fn is_clustered_counter(&self) -> bool {
        self.clustered_counter
    }

    #[must_use]
    pub const fn has_only_static_columns(&self) -> bool {
        self.only_static_columns
    }

    /// Run every interceptor registered for `event` on `entity`.
    pub fn intercept(&self, event: Event, entity: &mut dyn Any) -> Result<(), MappingError> {
        for interceptor in self.interceptors.iter().filter(|i| i.accepts(event)) {
            interceptor.on_event(event, entity)?;
        }

        Ok(())
    }

    #[must_use]
    pub fn has_interceptor(&self, event: Event) -> bool {
        self.interceptors.iter().any(|i| i.accepts(event))
    }

    /// Interceptors bound to `event`, for deferred invocation.
    #[must_use]
    pub fn interceptors_for(&self, event: Event) -> Vec<InterceptorRef> {
        self.interceptors
            .iter()
            .filter(|i| i.accepts(event))
            .cloned()
            .collect()
    }

    /// Contract check that `entity` is an instance of the described type.
    pub fn check_type(&self, entity: &dyn Any) -> Result<(), MappingError> {
        if entity.type_id() == self.type_id {
            Ok(())
        } else {
            Err(MappingError::invariant(
                ErrorOrigin::Entity,
                format!("instance is not of mapped type '{}'", self.type_name),
            ))
        }
    }

    #[must_use]
    pub fn new_instance(&self) -> Box<dyn Any + Send> {
        self.instantiator.instantiate()
    }

    /// Owned copy of `entity`, used by deferred interceptors.
    pub fn snapshot(&self, entity: &dyn Any) -> Result<Box<dyn Any + Send>, MappingError> {
        (self.snapshot)(entity).ok_or_else(|| {
            MappingError::invariant(
                ErrorOrigin::Entity,
                format!("instance is not of mapped type '{}'", self.type_name),
            )
        })
    }

    fn view<'a>(&'a self, indexes: &'a [usize]) -> impl Iterator<Item = &'a PropertyMeta> {
        indexes.iter().map(|index| &self.properties[*index])
    }
}

impl fmt::Debug for EntityMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMeta")
            .field("name", &self.name)
            .field("table", &self.qualified_table())
            .field("properties", &self.properties)
            .field("clustered_entity", &self.clustered_entity)
            .field("clustered_counter", &self.clustered_counter)
            .finish_non_exhaustive()
    }
}

fn qualify(keyspace: Option<&str>, table: &str) -> String {
    match keyspace {
        Some(keyspace) => format!("{keyspace}.{table}"),
        None => table.to_string(),
    }
}

///
/// EntityMetaBuilder
///

pub struct EntityMetaBuilder {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    keyspace: Option<String>,
    table: String,
    counter_table: String,
    properties: Vec<PropertyMetaBuilder>,
    consistency: ConsistencyPair,
    insert_strategy: InsertStrategy,
    schema_update: bool,
    interceptors: Vec<InterceptorRef>,
    instantiator: Instantiator,
    snapshot: Snapshot,
}

impl EntityMetaBuilder {
    /// Apply keyspace, consistency, insert strategy, counter table and
    /// schema-update defaults.
    #[must_use]
    pub fn with_config(mut self, config: &MappingConfig) -> Self {
        if config.keyspace.is_some() {
            self.keyspace.clone_from(&config.keyspace);
        }
        self.consistency = self.consistency.or(config.consistency());
        self.insert_strategy = config.insert_strategy;
        self.counter_table.clone_from(&config.counter_table);
        self.schema_update = config.force_schema_update;
        self
    }

    #[must_use]
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn consistency(mut self, consistency: ConsistencyPair) -> Self {
        self.consistency = consistency;
        self
    }

    #[must_use]
    pub const fn insert_strategy(mut self, strategy: InsertStrategy) -> Self {
        self.insert_strategy = strategy;
        self
    }

    #[must_use]
    pub const fn schema_update(mut self, enabled: bool) -> Self {
        self.schema_update = enabled;
        self
    }

    #[must_use]
    pub fn property(mut self, property: PropertyMetaBuilder) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: InterceptorRef) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> Result<EntityMeta, MappingError> {
        let name = self.name;
        let fail = |message: String| MappingError::validation(ErrorOrigin::Entity, message);

        let mut ids = Vec::new();
        let mut others = Vec::new();
        for builder in self.properties {
            if builder.property_type().is_id() {
                ids.push(builder.finish(&name));
            } else {
                others.push(builder.finish(&name));
            }
        }

        let id = match ids.len() {
            1 => ids.remove(0),
            0 => return Err(fail(format!("entity '{name}' declares no primary key"))),
            n => {
                return Err(fail(format!(
                    "entity '{name}' declares {n} primary keys, exactly one is allowed"
                )));
            }
        };

        let clustered_entity = id
            .compound_meta()
            .is_ok_and(CompoundKeyMeta::is_clustered);

        let mut properties = Vec::with_capacity(others.len() + 1);
        properties.push(id);
        properties.extend(others);

        let mut by_name = HashMap::new();
        let mut by_cql_name = HashMap::new();
        for (index, property) in properties.iter().enumerate() {
            if by_name.insert(property.name().to_string(), index).is_some() {
                return Err(fail(format!(
                    "entity '{name}' declares property '{}' twice",
                    property.name()
                )));
            }

            let columns = if property.is_compound() {
                property.id_column_names(false)
            } else {
                vec![property.cql_name().to_string()]
            };
            for column in columns {
                if by_cql_name.contains_key(&column) {
                    return Err(fail(format!(
                        "entity '{name}' maps column '{column}' twice"
                    )));
                }
                // component columns resolve to the id property
                by_cql_name.insert(column, index);
            }

            if property.is_static_column() && !clustered_entity {
                return Err(fail(format!(
                    "static column '{}' requires entity '{name}' to have clustering columns",
                    property.name()
                )));
            }
        }

        let except_id: Vec<usize> = (1..properties.len()).collect();
        let except_id_and_counters = except_id
            .iter()
            .copied()
            .filter(|index| !properties[*index].is_counter())
            .collect();
        let except_counters = (0..properties.len())
            .filter(|index| !properties[*index].is_counter())
            .collect();

        let clustered_counter = !except_id.is_empty()
            && except_id
                .iter()
                .all(|index| properties[*index].property_type() == PropertyType::Counter);
        let only_static_columns = !except_id.is_empty()
            && except_id
                .iter()
                .all(|index| properties[*index].is_static_column());

        Ok(EntityMeta {
            name,
            type_id: self.type_id,
            type_name: self.type_name,
            keyspace: self.keyspace,
            table: self.table,
            counter_table: self.counter_table,
            properties,
            by_name,
            by_cql_name,
            except_id,
            except_id_and_counters,
            except_counters,
            consistency: self.consistency,
            insert_strategy: self.insert_strategy,
            schema_update: self.schema_update,
            clustered_entity,
            clustered_counter,
            only_static_columns,
            interceptors: self.interceptors,
            instantiator: self.instantiator,
            snapshot: self.snapshot,
        })
    }
}
