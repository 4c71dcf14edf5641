use crate::{
    error::MappingError,
    model::{EntityMeta, Event},
};
use std::{any::Any, fmt};

type Deferred = Box<dyn FnOnce() -> Result<(), MappingError> + Send>;

///
/// EventHolder
///
/// Lifecycle callback staged with a write and invoked only once the write's
/// statements have been sent.
///

pub struct EventHolder {
    entity: String,
    event: Event,
    run: Deferred,
}

impl EventHolder {
    /// Stage the interceptors `meta` registers for `event` against a
    /// snapshot of `instance`. `None` when nothing listens to `event`.
    pub fn for_interceptors(
        meta: &EntityMeta,
        event: Event,
        instance: &dyn Any,
    ) -> Result<Option<Self>, MappingError> {
        let interceptors = meta.interceptors_for(event);
        if interceptors.is_empty() {
            return Ok(None);
        }

        let mut snapshot = meta.snapshot(instance)?;

        Ok(Some(Self {
            entity: meta.name().to_string(),
            event,
            run: Box::new(move || {
                for interceptor in &interceptors {
                    interceptor.on_event(event, snapshot.as_mut())?;
                }
                Ok(())
            }),
        }))
    }

    /// Stage an arbitrary callback.
    pub fn from_fn(
        entity: impl Into<String>,
        event: Event,
        run: impl FnOnce() -> Result<(), MappingError> + Send + 'static,
    ) -> Self {
        Self {
            entity: entity.into(),
            event,
            run: Box::new(run),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn event(&self) -> Event {
        self.event
    }

    pub(crate) fn fire(self) -> Result<(), MappingError> {
        (self.run)()
    }
}

impl fmt::Debug for EventHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHolder")
            .field("entity", &self.entity)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}
