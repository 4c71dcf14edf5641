//! Boundary to the CQL session that actually talks to the cluster.
//!
//! Connection management, retries and timeouts belong to the implementor;
//! failures come back as [`TransportError`] and are propagated unchanged.

use crate::{
    cql::{ConsistencyLevel, CqlValue},
    statement::BoundStatement,
};
use std::{error::Error as StdError, fmt};
use thiserror::Error as ThisError;

///
/// TransportError
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

///
/// Row
///
/// One result row: columns in result order. A column that was not selected
/// (or not returned) is absent, which is distinct from a null value.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, CqlValue)>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: CqlValue) -> Self {
        self.columns.push((column.into(), value));
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&CqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn columns(&self) -> &[(String, CqlValue)] {
        &self.columns
    }

    #[must_use]
    pub fn into_columns(self) -> Vec<(String, CqlValue)> {
        self.columns
    }
}

impl FromIterator<(String, CqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, CqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

///
/// ResultSet
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,

    /// `[applied]` flag of a conditional statement; `None` otherwise.
    pub applied: Option<bool>,
}

impl ResultSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rows: Vec::new(),
            applied: None,
        }
    }

    #[must_use]
    pub const fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            applied: None,
        }
    }

    /// Result of a conditional write; on rejection `current` holds the
    /// values the server returned.
    #[must_use]
    pub fn lwt(applied: bool, current: Row) -> Self {
        Self {
            rows: vec![current],
            applied: Some(applied),
        }
    }

    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    #[must_use]
    pub const fn was_applied(&self) -> bool {
        !matches!(self.applied, Some(false))
    }
}

///
/// BatchType
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchType {
    Logged,
    Unlogged,
    Counter,
}

impl fmt::Display for BatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Logged => "LOGGED",
            Self::Unlogged => "UNLOGGED",
            Self::Counter => "COUNTER",
        })
    }
}

///
/// BatchStatement
///

#[derive(Clone, Debug, PartialEq)]
pub struct BatchStatement {
    pub batch_type: BatchType,
    pub statements: Vec<BoundStatement>,
    pub consistency: ConsistencyLevel,
    pub serial_consistency: Option<ConsistencyLevel>,
}

impl BatchStatement {
    #[must_use]
    pub fn is_lwt(&self) -> bool {
        self.statements.iter().any(BoundStatement::is_lwt)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

///
/// SessionExecutor
///
/// Executes bound statements and batches against the cluster.
///

pub trait SessionExecutor: Send + Sync {
    fn execute(
        &self,
        statement: &BoundStatement,
        consistency: ConsistencyLevel,
        serial_consistency: Option<ConsistencyLevel>,
    ) -> Result<ResultSet, TransportError>;

    fn execute_batch(&self, batch: &BatchStatement) -> Result<ResultSet, TransportError>;
}
