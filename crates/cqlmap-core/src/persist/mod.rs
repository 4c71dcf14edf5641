//! Persistence operations over a [`FlushContext`].
//!
//! Writes run the synchronous pre-interceptor, generate and push their
//! statements, then flush (a no-op in BATCH mode). Post-write interceptors
//! run at once in IMMEDIATE mode and are staged as event holders in BATCH
//! mode. Reads always execute immediately. Counter deltas are folded into
//! the entity only once sent, so BATCH callers settle them with
//! [`settle_counters`] after `end_batch`.

mod mapper;


use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    flush::{EventHolder, FlushContext},
    model::{EntityMeta, Event},
    session::Row,
    statement::{
        self, BoundStatement, ChangeSet, Options, PropertyChange, SliceQuery, Statement,
        pending_delta,
    },
    value::Value,
};
use std::{any::Any, fmt};

///
/// PrimaryKey
///
/// Caller-supplied id for lookups and deletes by key.
///

pub enum PrimaryKey {
    /// Value of a simple id.
    Simple(Value),
    /// Native component values of a compound id, partition first.
    Components(Vec<Value>),
    /// Compound key object.
    Embedded(Box<dyn Any + Send>),
}

impl PrimaryKey {
    /// Encoded `(column, value)` pairs, partition first. An entity holding
    /// only static columns is keyed by its partition components, so a
    /// component list of that length is accepted and extra clustering
    /// values are dropped.
    pub fn encode(&self, meta: &EntityMeta) -> Result<Vec<(String, CqlValue)>, MappingError> {
        let id = meta.id();
        let partition_only = meta.has_only_static_columns();
        let values = match self {
            Self::Simple(value) => {
                self.expect_compound(meta, false)?;
                if value.is_null() {
                    return Err(null_key(meta));
                }
                vec![id.encode(value)?]
            }
            Self::Components(values) => {
                self.expect_compound(meta, true)?;
                let key = id.compound_meta()?;
                let split = key.partition().len();
                let fits = values.len() == key.component_count()
                    || (partition_only && values.len() == split);
                if !fits {
                    return Err(MappingError::validation(
                        ErrorOrigin::Entity,
                        format!(
                            "primary key of entity '{}' needs {} component(s), found {}",
                            meta.name(),
                            key.component_count(),
                            values.len()
                        ),
                    ));
                }

                let mut encoded = id.encode_partition_components(&values[..split])?;
                if key.is_clustered() && !partition_only {
                    encoded.extend(id.encode_clustering_keys(&values[split..])?);
                }
                encoded
            }
            Self::Embedded(key) => {
                self.expect_compound(meta, true)?;
                let encoded = id.encode_to_components(key.as_ref(), partition_only)?;
                if encoded.iter().any(CqlValue::is_null) {
                    return Err(null_key(meta));
                }
                encoded
            }
        };

        Ok(id.id_column_names(partition_only).into_iter().zip(values).collect())
    }

    /// Native id values, partition first.
    pub fn native_values(&self, meta: &EntityMeta) -> Result<Vec<Value>, MappingError> {
        match self {
            Self::Simple(value) => Ok(vec![value.clone()]),
            Self::Components(values) => Ok(values.clone()),
            Self::Embedded(key) => meta
                .id()
                .compound_meta()?
                .components()
                .map(|component| component.binding().get(key.as_ref()))
                .collect(),
        }
    }

    fn expect_compound(&self, meta: &EntityMeta, compound: bool) -> Result<(), MappingError> {
        if meta.id().is_compound() == compound {
            return Ok(());
        }

        Err(MappingError::validation(
            ErrorOrigin::Entity,
            format!(
                "entity '{}' has a {} primary key; {self:?} does not fit",
                meta.name(),
                if compound { "simple" } else { "compound" },
            ),
        ))
    }
}

impl fmt::Debug for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(value) => f.debug_tuple("Simple").field(value).finish(),
            Self::Components(values) => f.debug_tuple("Components").field(values).finish(),
            Self::Embedded(_) => f.write_str("Embedded(..)"),
        }
    }
}

// ----------------------------------------------------------------------
// Writes
// ----------------------------------------------------------------------

/// Insert a full entity, including pending counter deltas.
pub fn insert(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    entity: &mut dyn Any,
    options: &Options,
) -> Result<(), MappingError> {
    meta.check_type(entity)?;
    meta.intercept(Event::PrePersist, entity)?;

    if meta.is_clustered_counter() {
        meta.id().extract_id_components(entity, false)?;
        if let Some(statement) = statement::clustered_counter_update(meta, entity, None)? {
            ctx.push_counter_statement(bind_counter(meta, statement, options))?;
        }
    } else {
        let statement = statement::insert(meta, entity, options)?;
        ctx.push_statement(bind_write(ctx, meta, statement, options))?;
        push_simple_counters(ctx, meta, entity, None, options)?;
    }

    ctx.flush()?;
    if !ctx.is_batch() {
        settle(meta, entity, None)?;
    }

    after_write(ctx, meta, Event::PostPersist, entity)
}

/// Apply `changes` to the row of `entity`. Counter properties are routed
/// to counter statements; everything else becomes one UPDATE.
pub fn update(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    entity: &mut dyn Any,
    changes: &ChangeSet,
    options: &Options,
) -> Result<(), MappingError> {
    meta.check_type(entity)?;
    meta.intercept(Event::PreUpdate, entity)?;

    let mut counters = Vec::new();
    let mut regular = Vec::new();
    for change in changes.changes() {
        let property = meta.property(change.property())?;
        match change {
            PropertyChange::Assign(name) if property.is_counter() => counters.push(name.as_str()),
            PropertyChange::Collection { .. } if property.is_counter() => {
                return Err(MappingError::validation(
                    ErrorOrigin::Statement,
                    format!(
                        "counter '{}' of entity '{}' does not support collection changes",
                        property.name(),
                        meta.name()
                    ),
                ));
            }
            _ => regular.push(change.clone()),
        }
    }

    if !regular.is_empty() || counters.is_empty() {
        let regular: ChangeSet = regular.into_iter().collect();
        let statement = statement::update(meta, entity, &regular, options)?;
        ctx.push_statement(bind_write(ctx, meta, statement, options))?;
    }

    if !counters.is_empty() {
        if meta.is_clustered_counter() {
            if let Some(statement) =
                statement::clustered_counter_update(meta, entity, Some(counters.as_slice()))?
            {
                ctx.push_counter_statement(bind_counter(meta, statement, options))?;
            }
        } else {
            push_simple_counters(ctx, meta, entity, Some(counters.as_slice()), options)?;
        }
    }

    ctx.flush()?;
    if !ctx.is_batch() && !counters.is_empty() {
        settle(meta, entity, Some(counters.as_slice()))?;
    }

    after_write(ctx, meta, Event::PostUpdate, entity)
}

/// Delete the row of `entity` and its simple counters.
pub fn remove(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    entity: &mut dyn Any,
    options: &Options,
) -> Result<(), MappingError> {
    meta.check_type(entity)?;
    meta.intercept(Event::PreRemove, entity)?;

    let id = meta
        .id()
        .extract_id_components(entity, meta.has_only_static_columns())?;
    let counter_key = if meta.simple_counters().next().is_some() {
        Some(statement::primary_key_json(
            &meta.id().id_native_values(entity)?,
        )?)
    } else {
        None
    };
    push_delete(ctx, meta, &id, counter_key.as_deref(), options)?;

    ctx.flush()?;

    after_write(ctx, meta, Event::PostRemove, entity)
}

/// Delete by primary key; no interceptor runs without an instance.
pub fn remove_by_id(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    key: &PrimaryKey,
    options: &Options,
) -> Result<(), MappingError> {
    let id = key.encode(meta)?;
    let counter_key = if meta.simple_counters().next().is_some() {
        Some(statement::primary_key_json(&key.native_values(meta)?)?)
    } else {
        None
    };
    push_delete(ctx, meta, &id, counter_key.as_deref(), options)?;

    ctx.flush()
}

/// Delete the rows matched by an equality-only slice.
pub fn delete_slice(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    query: &SliceQuery,
    options: &Options,
) -> Result<(), MappingError> {
    let statement = query.delete(meta)?;
    if meta.is_clustered_counter() {
        ctx.push_counter_statement(bind_counter(meta, statement, options))?;
    } else {
        ctx.push_statement(bind_write(ctx, meta, statement, options))?;
    }

    ctx.flush()
}

// ----------------------------------------------------------------------
// Reads
// ----------------------------------------------------------------------

/// Load one entity by primary key.
pub fn find<E: Any>(
    ctx: &FlushContext,
    meta: &EntityMeta,
    key: &PrimaryKey,
) -> Result<Option<E>, MappingError> {
    let id = key.encode(meta)?;
    let statement = statement::select_by_id(meta, &id);
    let result = ctx.execute_read(&bind_read(meta, statement))?;

    result
        .first()
        .map(|row| load(ctx, meta, row))
        .transpose()
}

/// Load every entity whose indexed `property` equals `value`.
pub fn find_by_index<E: Any>(
    ctx: &FlushContext,
    meta: &EntityMeta,
    property: &str,
    value: &Value,
) -> Result<Vec<E>, MappingError> {
    let statement = statement::select_by_index(meta, property, value)?;
    let result = ctx.execute_read(&bind_read(meta, statement))?;

    result.rows.iter().map(|row| load(ctx, meta, row)).collect()
}

/// Load the entities of one clustering slice.
pub fn slice<E: Any>(
    ctx: &FlushContext,
    meta: &EntityMeta,
    query: &SliceQuery,
) -> Result<Vec<E>, MappingError> {
    let statement = query.select(meta)?;
    let result = ctx.execute_read(&bind_read(meta, statement))?;

    result.rows.iter().map(|row| load(ctx, meta, row)).collect()
}

// ----------------------------------------------------------------------
// Internals
// ----------------------------------------------------------------------

fn load<E: Any>(ctx: &FlushContext, meta: &EntityMeta, row: &Row) -> Result<E, MappingError> {
    let mut entity = mapper::map_row(meta, row)?;

    if meta.simple_counters().next().is_some() {
        let key = statement::primary_key_json(&meta.id().id_native_values(entity.as_ref())?)?;
        let statement = statement::counter_table_select(meta, &key);
        let counters = ctx.execute_read(&bind_read(meta, statement))?;
        mapper::apply_counter_rows(meta, entity.as_mut(), &counters.rows)?;
    }

    meta.intercept(Event::PostLoad, entity.as_mut())?;

    entity.downcast::<E>().map(|typed| *typed).map_err(|_| {
        MappingError::invariant(
            ErrorOrigin::Entity,
            format!(
                "entity '{}' is mapped to '{}', not the requested type",
                meta.name(),
                meta.type_name()
            ),
        )
    })
}

fn push_delete(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    id: &statement::IdComponents,
    counter_key: Option<&str>,
    options: &Options,
) -> Result<(), MappingError> {
    if meta.is_clustered_counter() {
        let statement = statement::clustered_counter_delete(meta, id);
        ctx.push_counter_statement(bind_counter(meta, statement, options))?;
    } else {
        let statement = statement::delete(meta, id, options)?;
        ctx.push_statement(bind_write(ctx, meta, statement, options))?;
    }

    if let Some(key) = counter_key {
        let statement = statement::counter_table_delete(meta, key);
        ctx.push_counter_statement(bind_counter(meta, statement, options))?;
    }

    Ok(())
}

fn push_simple_counters(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    entity: &dyn Any,
    only: Option<&[&str]>,
    options: &Options,
) -> Result<(), MappingError> {
    let mut deltas = Vec::new();
    for property in meta.simple_counters() {
        if only.is_some_and(|names| !names.contains(&property.name())) {
            continue;
        }
        if let Some(delta) = pending_delta(property, entity)? {
            deltas.push((property, delta));
        }
    }
    if deltas.is_empty() {
        return Ok(());
    }

    let key = statement::primary_key_json(&meta.id().id_native_values(entity)?)?;
    for (property, delta) in deltas {
        let statement = statement::counter_table_update(meta, property, &key, delta);
        ctx.push_counter_statement(bind_counter(meta, statement, options))?;
    }

    Ok(())
}

/// Fold the pending counter deltas of `entity` into its loaded values.
///
/// IMMEDIATE writes do this once their statements are sent. BATCH writes
/// leave the deltas pending, so call this after a successful `end_batch`;
/// a failed batch keeps them for a retry.
pub fn settle_counters(meta: &EntityMeta, entity: &mut dyn Any) -> Result<(), MappingError> {
    meta.check_type(entity)?;

    settle(meta, entity, None)
}

fn settle(
    meta: &EntityMeta,
    entity: &mut dyn Any,
    only: Option<&[&str]>,
) -> Result<(), MappingError> {
    for property in meta.all_except_id().filter(|p| p.is_counter()) {
        if only.is_some_and(|names| !names.contains(&property.name())) {
            continue;
        }
        if let Value::Counter(counter) = property.get_value(entity)? {
            property.set_value(entity, Value::Counter(counter.settled()))?;
        }
    }

    Ok(())
}

fn after_write(
    ctx: &mut FlushContext,
    meta: &EntityMeta,
    event: Event,
    entity: &mut dyn Any,
) -> Result<(), MappingError> {
    if !ctx.is_batch() {
        return meta.intercept(event, entity);
    }

    if let Some(holder) = EventHolder::for_interceptors(meta, event, entity)? {
        ctx.push_event(holder);
    }

    Ok(())
}

// Caller options first; the entity's write consistency applies outside a
// batch only, where the batch level governs.
fn bind_write(
    ctx: &FlushContext,
    meta: &EntityMeta,
    statement: Statement,
    options: &Options,
) -> BoundStatement {
    let bound = BoundStatement::new(meta.name(), statement).with_options(options);
    match (ctx.is_batch(), bound.consistency(), meta.consistency().write) {
        (false, None, Some(level)) => bound.with_consistency(level),
        _ => bound,
    }
}

fn bind_counter(meta: &EntityMeta, statement: Statement, options: &Options) -> BoundStatement {
    let options = Options {
        consistency: options.consistency,
        ..Options::default()
    };

    BoundStatement::new(meta.name(), statement).with_options(&options)
}

fn bind_read(meta: &EntityMeta, statement: Statement) -> BoundStatement {
    let bound = BoundStatement::new(meta.name(), statement);
    match meta.consistency().read {
        Some(level) => bound.with_consistency(level),
        None => bound,
    }
}

fn null_key(meta: &EntityMeta) -> MappingError {
    MappingError::validation(
        ErrorOrigin::Entity,
        format!("primary key of entity '{}' should not be null", meta.name()),
    )
}
