use crate::{
    error::{ErrorOrigin, MappingError},
    value::{NativeValue, Value},
};
use std::{
    any::{Any, type_name},
    fmt,
    sync::Arc,
};

type Getter = Arc<dyn Fn(&dyn Any) -> Result<Value, MappingError> + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<(), MappingError> + Send + Sync>;
type EmbeddedGetter =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Result<Option<&'a dyn Any>, MappingError> + Send + Sync>;
type EmbeddedSetter =
    Arc<dyn Fn(&mut dyn Any, Box<dyn Any + Send>) -> Result<(), MappingError> + Send + Sync>;

// Pin the higher-ranked signature so the returned borrow is tied to the input.
fn embedded_getter<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Result<Option<&'a dyn Any>, MappingError> + Send + Sync,
{
    f
}

fn downcast_ref<'a, T: Any>(instance: &'a dyn Any, field: &str) -> Result<&'a T, MappingError> {
    instance.downcast_ref::<T>().ok_or_else(|| {
        MappingError::invariant(
            ErrorOrigin::Property,
            format!(
                "field '{field}' is bound to '{}' but was accessed on another type",
                type_name::<T>()
            ),
        )
    })
}

fn downcast_mut<'a, T: Any>(
    instance: &'a mut dyn Any,
    field: &str,
) -> Result<&'a mut T, MappingError> {
    instance.downcast_mut::<T>().ok_or_else(|| {
        MappingError::invariant(
            ErrorOrigin::Property,
            format!(
                "field '{field}' is bound to '{}' but was accessed on another type",
                type_name::<T>()
            ),
        )
    })
}

///
/// Instantiator
///
/// Factory for fresh instances of a mapped type (entities and compound keys).
///

#[derive(Clone)]
pub struct Instantiator {
    type_name: &'static str,
    make: Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>,
}

impl Instantiator {
    #[must_use]
    pub fn of<T: Any + Default + Send>() -> Self {
        Self {
            type_name: type_name::<T>(),
            make: Arc::new(|| Box::new(T::default())),
        }
    }

    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Any + Send> {
        (self.make)()
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Instantiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instantiator").field(&self.type_name).finish()
    }
}

///
/// FieldBinding
///
/// `{get(instance) -> value, set(instance, value)}` capability for one field.
/// Built once during metadata bootstrap; never reflective at run time.
///

#[derive(Clone)]
pub struct FieldBinding {
    field: String,
    owner: &'static str,
    get: Getter,
    set: Setter,
}

impl FieldBinding {
    /// Bind a typed field through borrowing accessors.
    pub fn new<T, V>(
        field: impl Into<String>,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        V: NativeValue + 'static,
    {
        let field = field.into();
        let owner = type_name::<T>();
        let get_name = field.clone();
        let set_name = field.clone();

        Self {
            field,
            owner,
            get: Arc::new(move |instance: &dyn Any| {
                let typed = downcast_ref::<T>(instance, &get_name)?;

                Ok(get(typed).to_value())
            }),
            set: Arc::new(move |instance: &mut dyn Any, value: Value| {
                let typed = downcast_mut::<T>(instance, &set_name)?;
                let label = value.kind_label();
                let converted = V::from_value(value).ok_or_else(|| {
                    MappingError::mapping(
                        ErrorOrigin::Property,
                        format!(
                            "field '{set_name}' of '{owner}' cannot accept a {label} value (declared {})",
                            V::kind()
                        ),
                    )
                })?;
                *get_mut(typed) = converted;

                Ok(())
            }),
        }
    }

    /// Bind a field through value-level closures (computed or converted fields).
    pub fn from_fns<T: Any>(
        field: impl Into<String>,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> Result<(), MappingError> + Send + Sync + 'static,
    ) -> Self {
        let field = field.into();
        let get_name = field.clone();
        let set_name = field.clone();

        Self {
            field,
            owner: type_name::<T>(),
            get: Arc::new(move |instance: &dyn Any| {
                Ok(get(downcast_ref::<T>(instance, &get_name)?))
            }),
            set: Arc::new(move |instance: &mut dyn Any, value: Value| {
                set(downcast_mut::<T>(instance, &set_name)?, value)
            }),
        }
    }

    pub fn get(&self, instance: &dyn Any) -> Result<Value, MappingError> {
        (self.get)(instance)
    }

    pub fn set(&self, instance: &mut dyn Any, value: Value) -> Result<(), MappingError> {
        (self.set)(instance, value)
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn owner(&self) -> &'static str {
        self.owner
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldBinding({}::{})", self.owner, self.field)
    }
}

///
/// EmbeddedBinding
///
/// Accessor for an embedded compound-key object held by an entity.
///

#[derive(Clone)]
pub struct EmbeddedBinding {
    field: String,
    owner: &'static str,
    get: EmbeddedGetter,
    set: EmbeddedSetter,
    instantiator: Instantiator,
}

impl EmbeddedBinding {
    pub fn new<T, K>(
        field: impl Into<String>,
        get: impl Fn(&T) -> Option<&K> + Send + Sync + 'static,
        set: impl Fn(&mut T, K) + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        K: Any + Default + Send,
    {
        let field = field.into();
        let get_name = field.clone();
        let set_name = field.clone();

        let getter = embedded_getter(move |instance: &dyn Any| {
            let typed = downcast_ref::<T>(instance, &get_name)?;

            Ok(get(typed).map(|key| key as &dyn Any))
        });

        Self {
            field,
            owner: type_name::<T>(),
            get: Arc::new(getter),
            set: Arc::new(move |instance: &mut dyn Any, key: Box<dyn Any + Send>| {
                let typed = downcast_mut::<T>(instance, &set_name)?;
                let key = key.downcast::<K>().map_err(|_| {
                    MappingError::invariant(
                        ErrorOrigin::Property,
                        format!(
                            "embedded key '{set_name}' expects a '{}' instance",
                            type_name::<K>()
                        ),
                    )
                })?;
                set(typed, *key);

                Ok(())
            }),
            instantiator: Instantiator::of::<K>(),
        }
    }

    pub fn get<'a>(&self, instance: &'a dyn Any) -> Result<Option<&'a dyn Any>, MappingError> {
        (self.get)(instance)
    }

    pub fn set(
        &self,
        instance: &mut dyn Any,
        key: Box<dyn Any + Send>,
    ) -> Result<(), MappingError> {
        (self.set)(instance, key)
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub const fn owner(&self) -> &'static str {
        self.owner
    }

    #[must_use]
    pub const fn instantiator(&self) -> &Instantiator {
        &self.instantiator
    }
}

impl fmt::Debug for EmbeddedBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EmbeddedBinding({}::{} -> {})",
            self.owner,
            self.field,
            self.instantiator.type_name()
        )
    }
}
