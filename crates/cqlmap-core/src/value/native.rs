use crate::{
    types::{Blob, Counter, Timestamp, Uuid},
    value::{Value, ValueKind},
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::Hash,
};

///
/// NativeValue
///
/// Conversion between a typed Rust field and its [`Value`] form.
/// `from_value` returns `None` when the value cannot be assigned to the type.
///

pub trait NativeValue: Sized {
    /// Declared class of the field (container kind for collections).
    fn kind() -> ValueKind;

    fn to_value(&self) -> Value;

    #[must_use]
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_native_scalar {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl NativeValue for $ty {
            fn kind() -> ValueKind {
                ValueKind::$kind
            }

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_native_scalar!(bool, Bool, Bool);
impl_native_scalar!(i32, Int, Int);
impl_native_scalar!(f32, Float, Float);
impl_native_scalar!(String, Text, Text);
impl_native_scalar!(Blob, Blob, Blob);
impl_native_scalar!(Uuid, Uuid, Uuid);
impl_native_scalar!(Timestamp, Timestamp, Timestamp);
impl_native_scalar!(serde_json::Value, Json, Json);

// A counter column without a value reads as a fresh counter.
impl NativeValue for Counter {
    fn kind() -> ValueKind {
        ValueKind::Counter
    }

    fn to_value(&self) -> Value {
        Value::Counter(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Counter(v) => Some(v),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl NativeValue for i64 {
    fn kind() -> ValueKind {
        ValueKind::BigInt
    }

    fn to_value(&self) -> Value {
        Value::BigInt(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::BigInt(v) => Some(v),
            Value::Int(v) => Some(Self::from(v)),
            _ => None,
        }
    }
}

impl NativeValue for f64 {
    fn kind() -> ValueKind {
        ValueKind::Double
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(v),
            Value::Float(v) => Some(Self::from(v)),
            _ => None,
        }
    }
}

impl<T: NativeValue> NativeValue for Option<T> {
    fn kind() -> ValueKind {
        T::kind()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, NativeValue::to_value)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: NativeValue> NativeValue for Vec<T> {
    fn kind() -> ValueKind {
        ValueKind::List
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(NativeValue::to_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: NativeValue + Ord> NativeValue for BTreeSet<T> {
    fn kind() -> ValueKind {
        ValueKind::Set
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(NativeValue::to_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: NativeValue + Eq + Hash> NativeValue for HashSet<T> {
    fn kind() -> ValueKind {
        ValueKind::Set
    }

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(NativeValue::to_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Set(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<K: NativeValue + Ord, V: NativeValue> NativeValue for BTreeMap<K, V> {
    fn kind() -> ValueKind {
        ValueKind::Map
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}

impl<K: NativeValue + Eq + Hash, V: NativeValue> NativeValue for HashMap<K, V> {
    fn kind() -> ValueKind {
        ValueKind::Map
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            _ => None,
        }
    }
}
