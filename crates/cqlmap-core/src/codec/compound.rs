//! Compound-key transcoding: key object ↔ ordered component values.

use crate::{
    cql::CqlValue,
    error::{ErrorOrigin, MappingError},
    model::{compound::CompoundKeyMeta, component::ComponentMeta},
};
use std::any::Any;

/// Encode a key object into wire components, partition first.
/// With `partition_only`, clustering fields are neither read nor encoded.
pub(crate) fn encode_to_components(
    meta: &CompoundKeyMeta,
    key: &dyn Any,
    partition_only: bool,
) -> Result<Vec<CqlValue>, MappingError> {
    let components: Vec<&ComponentMeta> = if partition_only {
        meta.partition().components().iter().collect()
    } else {
        meta.components().collect()
    };

    components
        .into_iter()
        .map(|component| {
            let value = component.binding().get(key)?;
            component.codec().encode(&value)
        })
        .collect()
}

/// Build a fresh key object from one raw value per declared component.
pub(crate) fn decode_from_components(
    meta: &CompoundKeyMeta,
    raw: &[CqlValue],
) -> Result<Box<dyn Any + Send>, MappingError> {
    check_arity(meta, raw.len(), meta.component_count())?;

    let mut key = meta.instantiator().instantiate();
    for (component, raw) in meta.components().zip(raw) {
        set_component(component, &mut *key, raw)?;
    }

    Ok(key)
}

/// Build a key object with only its partition fields set; used for rows
/// that carry static columns only.
pub(crate) fn decode_partition_only(
    meta: &CompoundKeyMeta,
    raw: &[CqlValue],
) -> Result<Box<dyn Any + Send>, MappingError> {
    check_arity(meta, raw.len(), meta.partition().len())?;

    let mut key = meta.instantiator().instantiate();
    for (component, raw) in meta.partition().components().iter().zip(raw) {
        set_component(component, &mut *key, raw)?;
    }

    Ok(key)
}

fn set_component(
    component: &ComponentMeta,
    key: &mut dyn Any,
    raw: &CqlValue,
) -> Result<(), MappingError> {
    let value = component.codec().decode(raw)?;
    component.binding().set(key, value)
}

fn check_arity(meta: &CompoundKeyMeta, found: usize, expected: usize) -> Result<(), MappingError> {
    if found != expected {
        return Err(MappingError::validation(
            ErrorOrigin::Codec,
            format!(
                "there should be exactly {expected} component(s) to build compound key '{}', found {found}",
                meta.type_name()
            ),
        ));
    }

    Ok(())
}
