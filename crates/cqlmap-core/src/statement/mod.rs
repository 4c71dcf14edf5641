//! Statement generation.
//!
//! Statements are structured values; `Display` renders them as CQL with
//! positional bind markers and `bound_values` yields the markers' values in
//! order. Nothing here executes anything.

mod change;
mod counter;
mod generate;
mod render;
mod slice;


use crate::{
    cql::{ConsistencyLevel, CqlValue},
    model::ClusteringOrder,
    value::Value,
};
use std::fmt;

pub use change::{ChangeSet, CollectionChange, PropertyChange};
pub use counter::{
    COUNTER_FQCN, COUNTER_PRIMARY_KEY, COUNTER_PROPERTY_NAME, COUNTER_VALUE,
    clustered_counter_delete, clustered_counter_update, counter_table_delete,
    counter_table_select, counter_table_update, primary_key_json,
};
pub use generate::{
    IdComponents, clustering_order_clause, delete, delete_property, insert, select_by_id,
    select_by_index, select_property, update, where_clause,
};
pub use slice::{Bounding, SliceQuery};

pub(crate) use counter::pending_delta;
pub(crate) use generate::select_columns;

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl StatementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// Operator
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "IN",
        }
    }
}

///
/// Relation
///
/// One WHERE-clause term. `In` relations bind a single list value.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Relation {
    Column {
        column: String,
        op: Operator,
        value: CqlValue,
    },
    Tuple {
        columns: Vec<String>,
        op: Operator,
        values: Vec<CqlValue>,
    },
}

impl Relation {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: CqlValue) -> Self {
        Self::Column {
            column: column.into(),
            op: Operator::Eq,
            value,
        }
    }

    #[must_use]
    pub fn in_list(column: impl Into<String>, values: Vec<CqlValue>) -> Self {
        Self::Column {
            column: column.into(),
            op: Operator::In,
            value: CqlValue::List(values),
        }
    }
}

///
/// Assignment
///

#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    /// `c = ?`
    Set { column: String, value: CqlValue },
    /// `c[index] = ?`
    SetAtIndex {
        column: String,
        index: usize,
        value: CqlValue,
    },
    /// `c[?] = ?`
    SetKey {
        column: String,
        key: CqlValue,
        value: CqlValue,
    },
    /// `c = c + ?` (append, add, put-all, counter increment)
    AddTo { column: String, value: CqlValue },
    /// `c = ? + c`
    Prepend { column: String, value: CqlValue },
    /// `c = c - ?`
    RemoveFrom { column: String, value: CqlValue },
}

impl Assignment {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Set { column, .. }
            | Self::SetAtIndex { column, .. }
            | Self::SetKey { column, .. }
            | Self::AddTo { column, .. }
            | Self::Prepend { column, .. }
            | Self::RemoveFrom { column, .. } => column,
        }
    }
}

///
/// Condition
///
/// LWT condition `IF column = ?`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: CqlValue,
}

///
/// LwtCondition
///
/// Caller-facing LWT condition on a property, encoded through its codec.
///

#[derive(Clone, Debug, PartialEq)]
pub struct LwtCondition {
    pub property: String,
    pub value: Value,
}

///
/// Options
///
/// Per-operation settings.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    pub ttl: Option<u32>,
    /// Microseconds since the epoch, sent as the statement's default timestamp.
    pub timestamp: Option<i64>,
    pub consistency: Option<ConsistencyLevel>,
    pub serial_consistency: Option<ConsistencyLevel>,
    pub if_not_exists: bool,
    pub if_exists: bool,
    pub conditions: Vec<LwtCondition>,
}

impl Options {
    #[must_use]
    pub const fn ttl(mut self, seconds: u32) -> Self {
        self.ttl = Some(seconds);
        self
    }

    #[must_use]
    pub const fn timestamp(mut self, micros: i64) -> Self {
        self.timestamp = Some(micros);
        self
    }

    #[must_use]
    pub const fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    #[must_use]
    pub const fn serial_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.serial_consistency = Some(level);
        self
    }

    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    #[must_use]
    pub fn if_equal(mut self, property: impl Into<String>, value: Value) -> Self {
        self.conditions.push(LwtCondition {
            property: property.into(),
            value,
        });
        self
    }

    #[must_use]
    pub const fn is_lwt(&self) -> bool {
        self.if_not_exists || self.if_exists || !self.conditions.is_empty()
    }
}

///
/// Statement
///

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Select(Select),
}

impl Statement {
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        match self {
            Self::Insert(_) => StatementKind::Insert,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
            Self::Select(_) => StatementKind::Select,
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::Insert(s) => &s.table,
            Self::Update(s) => &s.table,
            Self::Delete(s) => &s.table,
            Self::Select(s) => &s.table,
        }
    }

    /// Conditional (lightweight transaction) statement.
    #[must_use]
    pub fn is_lwt(&self) -> bool {
        match self {
            Self::Insert(s) => s.if_not_exists,
            Self::Update(s) => s.if_exists || !s.conditions.is_empty(),
            Self::Delete(s) => s.if_exists || !s.conditions.is_empty(),
            Self::Select(_) => false,
        }
    }

    /// Values for the bind markers, in marker order.
    #[must_use]
    pub fn bound_values(&self) -> Vec<CqlValue> {
        let mut values = Vec::new();
        match self {
            Self::Insert(s) => {
                values.extend(s.columns.iter().map(|(_, v)| v.clone()));
                values.extend(s.ttl.map(ttl_value));
            }
            Self::Update(s) => {
                values.extend(s.ttl.map(ttl_value));
                for assignment in &s.assignments {
                    match assignment {
                        Assignment::SetKey { key, value, .. } => {
                            values.push(key.clone());
                            values.push(value.clone());
                        }
                        Assignment::Set { value, .. }
                        | Assignment::SetAtIndex { value, .. }
                        | Assignment::AddTo { value, .. }
                        | Assignment::Prepend { value, .. }
                        | Assignment::RemoveFrom { value, .. } => values.push(value.clone()),
                    }
                }
                push_relations(&mut values, &s.relations);
                values.extend(s.conditions.iter().map(|c| c.value.clone()));
            }
            Self::Delete(s) => {
                push_relations(&mut values, &s.relations);
                values.extend(s.conditions.iter().map(|c| c.value.clone()));
            }
            Self::Select(s) => push_relations(&mut values, &s.relations),
        }

        values
    }
}

fn ttl_value(ttl: u32) -> CqlValue {
    CqlValue::Int(i32::try_from(ttl).unwrap_or(i32::MAX))
}

fn push_relations(values: &mut Vec<CqlValue>, relations: &[Relation]) {
    for relation in relations {
        match relation {
            Relation::Column { value, .. } => values.push(value.clone()),
            Relation::Tuple { values: tuple, .. } => values.extend(tuple.iter().cloned()),
        }
    }
}

///
/// Insert
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<(String, CqlValue)>,
    pub if_not_exists: bool,
    pub ttl: Option<u32>,
}

///
/// Update
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub relations: Vec<Relation>,
    pub conditions: Vec<Condition>,
    pub if_exists: bool,
    pub ttl: Option<u32>,
}

///
/// Delete
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delete {
    pub table: String,
    /// Empty for a whole-row delete.
    pub columns: Vec<String>,
    pub relations: Vec<Relation>,
    pub conditions: Vec<Condition>,
    pub if_exists: bool,
}

///
/// Select
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    pub table: String,
    pub columns: Vec<String>,
    pub relations: Vec<Relation>,
    pub order_by: Vec<ClusteringOrder>,
    pub limit: Option<u32>,
}

///
/// BoundStatement
///
/// Generated statement ready for the session: rendered CQL, bound values and
/// per-statement execution settings.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundStatement {
    statement: Statement,
    cql: String,
    values: Vec<CqlValue>,
    entity: String,
    timestamp: Option<i64>,
    consistency: Option<ConsistencyLevel>,
    serial_consistency: Option<ConsistencyLevel>,
}

impl BoundStatement {
    #[must_use]
    pub fn new(entity: impl Into<String>, statement: Statement) -> Self {
        Self {
            cql: statement.to_string(),
            values: statement.bound_values(),
            statement,
            entity: entity.into(),
            timestamp: None,
            consistency: None,
            serial_consistency: None,
        }
    }

    /// Apply the timestamp and consistency settings of `options`.
    #[must_use]
    pub fn with_options(mut self, options: &Options) -> Self {
        self.timestamp = options.timestamp.or(self.timestamp);
        self.consistency = options.consistency.or(self.consistency);
        self.serial_consistency = options.serial_consistency.or(self.serial_consistency);
        self
    }

    #[must_use]
    pub const fn with_timestamp(mut self, micros: i64) -> Self {
        self.timestamp = Some(micros);
        self
    }

    #[must_use]
    pub const fn with_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }

    pub(crate) const fn stamp(&mut self, micros: i64) {
        self.timestamp = Some(micros);
    }

    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    #[must_use]
    pub fn cql(&self) -> &str {
        &self.cql
    }

    #[must_use]
    pub fn values(&self) -> &[CqlValue] {
        &self.values
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    #[must_use]
    pub const fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    #[must_use]
    pub const fn consistency(&self) -> Option<ConsistencyLevel> {
        self.consistency
    }

    #[must_use]
    pub const fn serial_consistency(&self) -> Option<ConsistencyLevel> {
        self.serial_consistency
    }

    #[must_use]
    pub fn is_lwt(&self) -> bool {
        self.statement.is_lwt()
    }
}

impl fmt::Display for BoundStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql)
    }
}
