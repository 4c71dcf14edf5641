//! Core of the cqlmap object mapper: entity metadata, codecs, CQL statement
//! generation, and the flush/batch machinery that sends statements to a
//! session.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod codec;
pub mod config;
pub mod cql;
pub mod error;
pub mod flush;
pub mod model;
pub mod obs;
pub mod persist;
pub mod schema;
pub mod session;
pub mod statement;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Table holding the simple (non-clustered) counters of every entity.
pub const DEFAULT_COUNTER_TABLE: &str = "cqlmap_counter_table";

///
/// Prelude
///
/// Vocabulary needed to describe and persist entities. Codecs beyond the
/// native one, statement internals and observability stay one level down.
///

pub mod prelude {
    pub use crate::{
        codec::NativeCodec,
        cql::{ConsistencyLevel, CqlValue},
        error::MappingError,
        flush::FlushContext,
        model::{
            ComponentMeta, CompoundKeyMeta, EmbeddedBinding, EntityMeta, Event, FieldBinding,
            PropertyMeta, Sorting,
        },
        persist::PrimaryKey,
        session::SessionExecutor,
        statement::{ChangeSet, Options, SliceQuery},
        types::Counter,
        value::{Value, ValueKind},
    };
}
