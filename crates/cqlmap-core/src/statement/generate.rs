use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{ClusteringOrder, EntityMeta, InsertStrategy, PropertyMeta},
    statement::{
        Assignment, ChangeSet, Condition, Delete, Insert, Options, PropertyChange, Relation,
        Select, Statement, Update,
    },
    value::Value,
};
use std::any::Any;

/// Encoded primary key: `(column, value)` pairs, partition first.
pub type IdComponents = [(String, CqlValue)];

/// AND-chain of equalities over the given id columns, in order.
#[must_use]
pub fn where_clause(id: &IdComponents) -> Vec<Relation> {
    id.iter()
        .map(|(column, value)| Relation::eq(column.clone(), value.clone()))
        .collect()
}

/// INSERT for a full entity.
///
/// When every written column is static only the partition components are
/// bound for the key.
pub fn insert(
    meta: &EntityMeta,
    entity: &dyn Any,
    options: &Options,
) -> Result<Statement, MappingError> {
    if meta.is_clustered_counter() {
        return Err(MappingError::invariant(
            ErrorOrigin::Statement,
            format!(
                "clustered counter entity '{}' is written through counter statements",
                meta.name()
            ),
        ));
    }
    if options.if_exists || !options.conditions.is_empty() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!("insert of '{}' only supports IF NOT EXISTS", meta.name()),
        ));
    }

    let mut written: Vec<(&PropertyMeta, CqlValue)> = Vec::new();
    for property in meta.all_except_id_and_counters() {
        let value = property.get_value(entity)?;
        if value.is_null() && meta.insert_strategy() == InsertStrategy::OnlyNonNull {
            continue;
        }
        written.push((property, property.encode(&value)?));
    }

    let static_only = is_static_only(written.iter().map(|(p, _)| *p));
    let mut columns = meta.id().extract_id_components(entity, static_only)?;
    columns.extend(
        written
            .into_iter()
            .map(|(property, value)| (property.cql_name().to_string(), value)),
    );

    Ok(Statement::Insert(Insert {
        table: meta.qualified_table(),
        columns,
        if_not_exists: options.if_not_exists,
        ttl: options.ttl,
    }))
}

/// UPDATE applying `changes` to the row of `entity`.
///
/// Counter properties are rejected here; they are written through counter
/// statements.
pub fn update(
    meta: &EntityMeta,
    entity: &dyn Any,
    changes: &ChangeSet,
    options: &Options,
) -> Result<Statement, MappingError> {
    if changes.is_empty() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!("no change to update on entity '{}'", meta.name()),
        ));
    }

    let mut touched = Vec::with_capacity(changes.changes().len());
    let mut assignments = Vec::with_capacity(changes.changes().len());
    for change in changes.changes() {
        let property = meta.property(change.property())?;
        if property.is_id() {
            return Err(MappingError::validation(
                ErrorOrigin::Statement,
                format!(
                    "primary key '{}' of entity '{}' cannot be updated",
                    property.name(),
                    meta.name()
                ),
            ));
        }
        if property.is_counter() {
            return Err(MappingError::invariant(
                ErrorOrigin::Statement,
                format!(
                    "counter '{}' of entity '{}' is updated through counter statements",
                    property.name(),
                    meta.name()
                ),
            ));
        }

        let assignment = match change {
            PropertyChange::Assign(_) => Assignment::Set {
                column: property.cql_name().to_string(),
                value: property.encode_field(entity)?,
            },
            PropertyChange::Collection { change, .. } => change.assignment(property)?,
        };
        touched.push(property);
        assignments.push(assignment);
    }

    let static_only = is_static_only(touched.into_iter());
    let id = meta.id().extract_id_components(entity, static_only)?;

    Ok(Statement::Update(Update {
        table: meta.qualified_table(),
        assignments,
        relations: where_clause(&id),
        conditions: conditions(meta, options)?,
        if_exists: options.if_exists,
        ttl: options.ttl,
    }))
}

/// Whole-row DELETE by encoded id. An entity holding only static columns
/// is addressed by its partition columns.
pub fn delete(
    meta: &EntityMeta,
    id: &IdComponents,
    options: &Options,
) -> Result<Statement, MappingError> {
    if options.if_not_exists {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!("delete of '{}' cannot use IF NOT EXISTS", meta.name()),
        ));
    }

    Ok(Statement::Delete(Delete {
        table: meta.qualified_table(),
        columns: Vec::new(),
        relations: where_clause(entity_target(meta, id)),
        conditions: conditions(meta, options)?,
        if_exists: options.if_exists,
    }))
}

/// SELECT of every table column by encoded id, with the same static
/// branching as [`delete`].
#[must_use]
pub fn select_by_id(meta: &EntityMeta, id: &IdComponents) -> Statement {
    Statement::Select(Select {
        table: meta.qualified_table(),
        columns: select_columns(meta),
        relations: where_clause(entity_target(meta, id)),
        order_by: Vec::new(),
        limit: None,
    })
}

/// SELECT of one column by encoded id. A static column is addressed by the
/// partition columns only.
pub fn select_property(
    meta: &EntityMeta,
    property: &str,
    id: &IdComponents,
) -> Result<Statement, MappingError> {
    let property = column_target(meta, property)?;

    Ok(Statement::Select(Select {
        table: meta.qualified_table(),
        columns: vec![property.cql_name().to_string()],
        relations: where_clause(property_target(meta, property, id)),
        order_by: Vec::new(),
        limit: None,
    }))
}

/// DELETE of one column by encoded id, with the same static branching as
/// [`select_property`].
pub fn delete_property(
    meta: &EntityMeta,
    property: &str,
    id: &IdComponents,
    options: &Options,
) -> Result<Statement, MappingError> {
    if options.if_not_exists {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!("delete of '{}' cannot use IF NOT EXISTS", meta.name()),
        ));
    }
    let property = column_target(meta, property)?;

    Ok(Statement::Delete(Delete {
        table: meta.qualified_table(),
        columns: vec![property.cql_name().to_string()],
        relations: where_clause(property_target(meta, property, id)),
        conditions: conditions(meta, options)?,
        if_exists: options.if_exists,
    }))
}

/// SELECT by equality on an indexed property.
pub fn select_by_index(
    meta: &EntityMeta,
    property: &str,
    value: &Value,
) -> Result<Statement, MappingError> {
    let property = meta.property(property)?;
    if property.index().is_none() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!(
                "property '{}' of entity '{}' is not indexed",
                property.name(),
                meta.name()
            ),
        ));
    }
    if value.is_null() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!(
                "index value for '{}' of entity '{}' should not be null",
                property.name(),
                meta.name()
            ),
        ));
    }

    Ok(Statement::Select(Select {
        table: meta.qualified_table(),
        columns: select_columns(meta),
        relations: vec![Relation::eq(property.cql_name(), property.encode(value)?)],
        order_by: Vec::new(),
        limit: None,
    }))
}

/// Declared clustering order of the entity's key; a contract violation for
/// non-clustered entities.
pub fn clustering_order_clause(meta: &EntityMeta) -> Result<Vec<ClusteringOrder>, MappingError> {
    if !meta.is_clustered_entity() {
        return Err(MappingError::invariant(
            ErrorOrigin::Statement,
            format!("entity '{}' is not clustered", meta.name()),
        ));
    }

    meta.id().clustering_orders().map(<[ClusteringOrder]>::to_vec)
}

/// Columns read back for an entity: id columns then data columns. Simple
/// counters live in the counter table and are not selected.
pub(crate) fn select_columns(meta: &EntityMeta) -> Vec<String> {
    let mut columns = meta.id().id_column_names(false);
    columns.extend(
        meta.all_except_id()
            .filter(|property| meta.is_clustered_counter() || !property.is_counter())
            .map(|property| property.cql_name().to_string()),
    );

    columns
}

fn conditions(meta: &EntityMeta, options: &Options) -> Result<Vec<Condition>, MappingError> {
    if options.if_exists && !options.conditions.is_empty() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!(
                "IF EXISTS cannot be combined with column conditions on '{}'",
                meta.name()
            ),
        ));
    }

    options
        .conditions
        .iter()
        .map(|condition| {
            let property = meta.property(&condition.property)?;
            Ok(Condition {
                column: property.cql_name().to_string(),
                value: property.encode(&condition.value)?,
            })
        })
        .collect()
}

// Leading partition columns of an encoded id.
fn partition_columns<'a>(meta: &EntityMeta, id: &'a IdComponents) -> &'a IdComponents {
    let partition = meta.id().id_column_names(true).len();

    &id[..partition.min(id.len())]
}

fn entity_target<'a>(meta: &EntityMeta, id: &'a IdComponents) -> &'a IdComponents {
    if meta.has_only_static_columns() {
        partition_columns(meta, id)
    } else {
        id
    }
}

fn property_target<'a>(
    meta: &EntityMeta,
    property: &PropertyMeta,
    id: &'a IdComponents,
) -> &'a IdComponents {
    if property.is_static_column() {
        partition_columns(meta, id)
    } else {
        id
    }
}

// A data column stored in the entity table.
fn column_target<'a>(meta: &'a EntityMeta, name: &str) -> Result<&'a PropertyMeta, MappingError> {
    let property = meta.property(name)?;
    if property.is_id() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!(
                "primary key '{}' of entity '{}' is not a data column",
                property.name(),
                meta.name()
            ),
        ));
    }
    if property.is_counter() && !meta.is_clustered_counter() {
        return Err(MappingError::validation(
            ErrorOrigin::Statement,
            format!(
                "counter '{}' of entity '{}' lives in the counter table",
                property.name(),
                meta.name()
            ),
        ));
    }

    Ok(property)
}

fn is_static_only<'a>(mut properties: impl Iterator<Item = &'a PropertyMeta>) -> bool {
    let Some(first) = properties.next() else {
        return false;
    };

    first.is_static_column() && properties.all(PropertyMeta::is_static_column)
}
