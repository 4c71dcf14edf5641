//! Counter statements.
//!
//! Clustered-counter entities keep their counters in their own table. Simple
//! counters of ordinary entities live in the shared counter table:
//!
//! ```text
//! CREATE TABLE cqlmap_counter_table (
//!     fqcn text, primary_key text, property_name text, counter_value counter,
//!     PRIMARY KEY ((fqcn, primary_key), property_name))
//! ```

use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{EntityMeta, PropertyMeta},
    statement::{Assignment, Delete, IdComponents, Relation, Select, Statement, Update, where_clause},
    value::Value,
};
use std::any::Any;

pub const COUNTER_FQCN: &str = "fqcn";
pub const COUNTER_PRIMARY_KEY: &str = "primary_key";
pub const COUNTER_PROPERTY_NAME: &str = "property_name";
pub const COUNTER_VALUE: &str = "counter_value";

/// Increment every counter of a clustered-counter entity that carries a
/// pending delta. `None` when no counter changed.
pub fn clustered_counter_update(
    meta: &EntityMeta,
    entity: &dyn Any,
    only: Option<&[&str]>,
) -> Result<Option<Statement>, MappingError> {
    if !meta.is_clustered_counter() {
        return Err(MappingError::invariant(
            ErrorOrigin::Statement,
            format!("entity '{}' is not a clustered counter", meta.name()),
        ));
    }

    let mut assignments = Vec::new();
    for property in meta.all_except_id() {
        if only.is_some_and(|names| !names.contains(&property.name())) {
            continue;
        }
        if let Some(delta) = pending_delta(property, entity)? {
            assignments.push(Assignment::AddTo {
                column: property.cql_name().to_string(),
                value: CqlValue::BigInt(delta),
            });
        }
    }

    if assignments.is_empty() {
        return Ok(None);
    }

    let id = meta.id().extract_id_components(entity, false)?;

    Ok(Some(Statement::Update(Update {
        table: meta.qualified_table(),
        assignments,
        relations: where_clause(&id),
        ..Update::default()
    })))
}

/// Delete the row of a clustered-counter entity.
#[must_use]
pub fn clustered_counter_delete(meta: &EntityMeta, id: &IdComponents) -> Statement {
    Statement::Delete(Delete {
        table: meta.qualified_table(),
        relations: where_clause(id),
        ..Delete::default()
    })
}

/// `counter_value = counter_value + ?` for one simple counter.
#[must_use]
pub fn counter_table_update(
    meta: &EntityMeta,
    property: &PropertyMeta,
    primary_key: &str,
    delta: i64,
) -> Statement {
    let mut relations = counter_partition(meta, primary_key);
    relations.push(Relation::eq(
        COUNTER_PROPERTY_NAME,
        CqlValue::text(property.cql_name()),
    ));

    Statement::Update(Update {
        table: meta.qualified_counter_table(),
        assignments: vec![Assignment::AddTo {
            column: COUNTER_VALUE.to_string(),
            value: CqlValue::BigInt(delta),
        }],
        relations,
        ..Update::default()
    })
}

/// Every simple counter of one entity instance.
#[must_use]
pub fn counter_table_select(meta: &EntityMeta, primary_key: &str) -> Statement {
    Statement::Select(Select {
        table: meta.qualified_counter_table(),
        columns: vec![COUNTER_PROPERTY_NAME.to_string(), COUNTER_VALUE.to_string()],
        relations: counter_partition(meta, primary_key),
        ..Select::default()
    })
}

/// Drop every simple counter of one entity instance.
#[must_use]
pub fn counter_table_delete(meta: &EntityMeta, primary_key: &str) -> Statement {
    Statement::Delete(Delete {
        table: meta.qualified_counter_table(),
        relations: counter_partition(meta, primary_key),
        ..Delete::default()
    })
}

/// JSON form of native id values, used as the counter table key.
pub fn primary_key_json(values: &[Value]) -> Result<String, MappingError> {
    serde_json::to_string(values).map_err(|err| {
        MappingError::mapping(
            ErrorOrigin::Statement,
            format!("cannot encode primary key as json: {err}"),
        )
    })
}

/// Pending delta of a counter property, `None` when zero or unset.
pub(crate) fn pending_delta(
    property: &PropertyMeta,
    entity: &dyn Any,
) -> Result<Option<i64>, MappingError> {
    match property.get_value(entity)? {
        Value::Counter(counter) if counter.has_pending_delta() => Ok(Some(counter.delta())),
        Value::Counter(_) | Value::Null => Ok(None),
        other => Err(MappingError::mapping(
            ErrorOrigin::Statement,
            format!(
                "counter '{}' of entity '{}' holds a {} value",
                property.name(),
                property.entity(),
                other.kind_label()
            ),
        )),
    }
}

fn counter_partition(meta: &EntityMeta, primary_key: &str) -> Vec<Relation> {
    vec![
        Relation::eq(COUNTER_FQCN, CqlValue::text(meta.type_name())),
        Relation::eq(COUNTER_PRIMARY_KEY, CqlValue::text(primary_key)),
    ]
}
