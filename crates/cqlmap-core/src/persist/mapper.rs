//! Row → entity mapping.

use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{EntityMeta, PropertyMeta},
    session::Row,
    statement::{COUNTER_PROPERTY_NAME, COUNTER_VALUE},
};
use std::any::Any;

/// Build a fresh entity from one result row.
///
/// Every returned column must map to a property. Columns missing from the
/// row are left at their default; a compound id whose clustering columns
/// are all absent or null is rebuilt from its partition columns only.
pub(crate) fn map_row(meta: &EntityMeta, row: &Row) -> Result<Box<dyn Any + Send>, MappingError> {
    let mut entity = meta.new_instance();
    let id = meta.id();
    set_id(meta, id, &mut *entity, row)?;

    let id_columns = id.id_column_names(false);
    for (column, value) in row.columns() {
        if id_columns.iter().any(|name| name == column) {
            continue;
        }

        let property = meta.property_by_cql(column)?;
        property.decode_and_set(&mut *entity, value)?;
    }

    Ok(entity)
}

/// Load counter-table rows (`property_name`, `counter_value`) into `entity`.
pub(crate) fn apply_counter_rows(
    meta: &EntityMeta,
    entity: &mut dyn Any,
    rows: &[Row],
) -> Result<(), MappingError> {
    for row in rows {
        let Some(CqlValue::Text(name)) = row.get(COUNTER_PROPERTY_NAME) else {
            return Err(MappingError::mapping(
                ErrorOrigin::Entity,
                format!(
                    "counter row of entity '{}' has no '{COUNTER_PROPERTY_NAME}' column",
                    meta.name()
                ),
            ));
        };
        let property = meta.property_by_cql(name)?;
        let value = row.get(COUNTER_VALUE).unwrap_or(&CqlValue::Null);

        property.decode_and_set(entity, value)?;
    }

    Ok(())
}

/// Value of a property's column in `row`. `None` when the row does not
/// carry the column; for a static column that means no static value is
/// present for the partition.
fn column_value<'a>(row: &'a Row, property: &PropertyMeta) -> Option<&'a CqlValue> {
    row.get(property.cql_name())
}

fn set_id(
    meta: &EntityMeta,
    id: &PropertyMeta,
    entity: &mut dyn Any,
    row: &Row,
) -> Result<(), MappingError> {
    if !id.is_compound() {
        let value = column_value(row, id).ok_or_else(|| missing_column(meta, id.cql_name()))?;
        return id.decode_and_set(entity, value);
    }

    let key = id.compound_meta()?;
    let mut partition = Vec::with_capacity(key.partition().len());
    for name in key.partition().cql_names() {
        match row.get(name) {
            Some(value) if !value.is_null() => partition.push(value.clone()),
            _ => return Err(missing_column(meta, name)),
        }
    }

    let clustering: Vec<Option<&CqlValue>> = key
        .clustering()
        .cql_names()
        .into_iter()
        .map(|name| row.get(name).filter(|value| !value.is_null()))
        .collect();

    let decoded = if clustering.iter().all(Option::is_none) && key.is_clustered() {
        id.decode_partition_only(&partition)?
    } else {
        let mut raw = partition;
        for (name, value) in key.clustering().cql_names().into_iter().zip(clustering) {
            raw.push(value.ok_or_else(|| missing_column(meta, name))?.clone());
        }
        id.decode_from_components(&raw)?
    };

    id.set_embedded(entity, decoded)
}

fn missing_column(meta: &EntityMeta, column: &str) -> MappingError {
    MappingError::mapping(
        ErrorOrigin::Entity,
        format!(
            "row of entity '{}' has no value for primary key column '{column}'",
            meta.name()
        ),
    )
}
