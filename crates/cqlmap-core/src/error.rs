use crate::{cql::CqlValue, session::TransportError, value::ValueKind};
use std::fmt;
use thiserror::Error as ThisError;

///
/// MappingError
///
/// Structured error raised by the mapping engine.
/// Every contract violation is raised at the point of detection; nothing in
/// this crate retries.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct MappingError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured detail. The variant (if present) must correspond
    /// to `class`.
    pub detail: Option<ErrorDetail>,
}

impl MappingError {
    /// Construct a MappingError without detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a validation failure (malformed key values, arity, nulls).
    pub(crate) fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    /// Construct a mapping failure (metadata/schema drift, unconvertible values).
    pub(crate) fn mapping(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Mapping, origin, message)
    }

    /// Construct a batch-contract violation.
    pub(crate) fn batch_contract(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::BatchContract, ErrorOrigin::Flush, message)
    }

    /// Construct a programming-contract violation.
    pub(crate) fn invariant(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, origin, message)
    }

    /// Construct an unsupported-operation error.
    pub(crate) fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, origin, message)
    }

    /// Construct a component type mismatch with structured detail.
    pub(crate) fn component_mismatch(
        message: impl Into<String>,
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    ) -> Self {
        Self {
            class: ErrorClass::Validation,
            origin: ErrorOrigin::Component,
            message: message.into(),
            detail: Some(ErrorDetail::ComponentMismatch {
                index,
                expected,
                actual,
            }),
        }
    }

    /// Wrap a transport failure; the source error is kept unchanged.
    pub(crate) fn transport(err: TransportError) -> Self {
        Self {
            class: ErrorClass::Transport,
            origin: ErrorOrigin::Session,
            message: format!("statement execution failed: {err}"),
            detail: Some(ErrorDetail::Transport(err)),
        }
    }

    /// Construct a conditional-write rejection carrying the returned row.
    pub(crate) fn lwt_rejected(cql: &str, current: Vec<(String, CqlValue)>) -> Self {
        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Session,
            message: format!("lightweight transaction was not applied: {cql}"),
            detail: Some(ErrorDetail::LwtRejected { current }),
        }
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_batch_contract(&self) -> bool {
        matches!(self.class, ErrorClass::BatchContract)
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self.class, ErrorClass::Transport)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, class-specific detail carried by [`MappingError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("component {index}: expected {expected}, found {actual}")]
    ComponentMismatch {
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("{0}")]
    Transport(TransportError),

    #[error("conditional write rejected ({} column(s) returned)", current.len())]
    LwtRejected { current: Vec<(String, CqlValue)> },
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Validation,
    Mapping,
    BatchContract,
    Transport,
    Conflict,
    InvariantViolation,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Validation => "validation",
            Self::Mapping => "mapping",
            Self::BatchContract => "batch_contract",
            Self::Transport => "transport",
            Self::Conflict => "conflict",
            Self::InvariantViolation => "invariant_violation",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Component,
    Property,
    Codec,
    Entity,
    Statement,
    Flush,
    Session,
    Schema,
    Config,
    Interceptor,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Component => "component",
            Self::Property => "property",
            Self::Codec => "codec",
            Self::Entity => "entity",
            Self::Statement => "statement",
            Self::Flush => "flush",
            Self::Session => "session",
            Self::Schema => "schema",
            Self::Config => "config",
            Self::Interceptor => "interceptor",
        };
        write!(f, "{label}")
    }
}
