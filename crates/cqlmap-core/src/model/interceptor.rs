use crate::error::{ErrorOrigin, MappingError};
use std::{
    any::{Any, type_name},
    fmt,
    sync::Arc,
};

///
/// Event
///
/// Entity lifecycle event.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Event {
    PrePersist,
    PostPersist,
    PreUpdate,
    PostUpdate,
    PreRemove,
    PostRemove,
    PostLoad,
}

impl Event {
    /// Post-write events are deferred until the statements are sent.
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        matches!(
            self,
            Self::PostPersist | Self::PostUpdate | Self::PostRemove
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PrePersist => "pre_persist",
            Self::PostPersist => "post_persist",
            Self::PreUpdate => "pre_update",
            Self::PostUpdate => "post_update",
            Self::PreRemove => "pre_remove",
            Self::PostRemove => "post_remove",
            Self::PostLoad => "post_load",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Interceptor
///
/// Lifecycle callback registered on an entity descriptor.
///

pub trait Interceptor: Send + Sync {
    fn accepts(&self, event: Event) -> bool;

    fn on_event(&self, event: Event, entity: &mut dyn Any) -> Result<(), MappingError>;
}

pub type InterceptorRef = Arc<dyn Interceptor>;

type Callback = Box<dyn Fn(Event, &mut dyn Any) -> Result<(), MappingError> + Send + Sync>;

///
/// FnInterceptor
///
/// Closure-backed interceptor over a concrete entity type.
///

pub struct FnInterceptor {
    events: Vec<Event>,
    callback: Callback,
}

impl FnInterceptor {
    pub fn new<T: Any>(
        events: impl IntoIterator<Item = Event>,
        callback: impl Fn(Event, &mut T) -> Result<(), MappingError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            events: events.into_iter().collect(),
            callback: Box::new(move |event: Event, entity: &mut dyn Any| {
                let typed = entity.downcast_mut::<T>().ok_or_else(|| {
                    MappingError::invariant(
                        ErrorOrigin::Interceptor,
                        format!("interceptor for '{}' invoked on another type", type_name::<T>()),
                    )
                })?;

                callback(event, typed)
            }),
        }
    }

    #[must_use]
    pub fn shared(self) -> InterceptorRef {
        Arc::new(self)
    }
}

impl Interceptor for FnInterceptor {
    fn accepts(&self, event: Event) -> bool {
        self.events.contains(&event)
    }

    fn on_event(&self, event: Event, entity: &mut dyn Any) -> Result<(), MappingError> {
        (self.callback)(event, entity)
    }
}

impl fmt::Debug for FnInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
