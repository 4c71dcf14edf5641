//! Mapping metadata: entity, property and key-component descriptors.
//!
//! Descriptors are assembled once through builders and are immutable
//! afterwards; every operation on a mapped type borrows them read-only.

pub mod binding;
pub mod component;
pub mod compound;
pub mod entity;
pub mod interceptor;
pub mod property;

#[cfg(test)]
mod tests;

pub use binding::{EmbeddedBinding, FieldBinding, Instantiator};
pub use component::{ComponentMeta, ComponentRole, KeyComponents};
pub use compound::{ClusteringOrder, CompoundKeyMeta, CompoundKeyMetaBuilder, Sorting};
pub use entity::{EntityMeta, EntityMetaBuilder, InsertStrategy};
pub use interceptor::{Event, FnInterceptor, Interceptor, InterceptorRef};
pub use property::{IndexMeta, PropertyMeta, PropertyMetaBuilder, PropertyType};
