//! Schema boundary.
//!
//! This crate only describes what it expects of a table; comparing that with
//! live cluster metadata is the job of a [`SchemaValidator`].

use crate::{
    cql::CqlType,
    error::{ErrorOrigin, MappingError},
    model::{EntityMeta, PropertyMeta, Sorting},
    statement::{COUNTER_FQCN, COUNTER_PRIMARY_KEY, COUNTER_PROPERTY_NAME, COUNTER_VALUE},
};
use std::fmt;
use tracing::warn;

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    PartitionKey,
    ClusteringKey(Sorting),
    Regular,
    Static,
    Counter,
}

///
/// ExpectedColumn
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedColumn {
    pub name: String,
    pub cql_type: CqlType,
    pub kind: ColumnKind,
}

///
/// TableExpectation
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableExpectation {
    pub keyspace: Option<String>,
    pub table: String,
    pub columns: Vec<ExpectedColumn>,
}

impl TableExpectation {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ExpectedColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{keyspace}.{}", self.table),
            None => self.table.clone(),
        }
    }
}

///
/// SchemaReport
///
/// Outcome of one table check; an empty mismatch list means the table fits.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaReport {
    pub table: String,
    pub mismatches: Vec<String>,
}

impl SchemaReport {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            write!(f, "table '{}' matches", self.table)
        } else {
            write!(f, "table '{}': {}", self.table, self.mismatches.join("; "))
        }
    }
}

///
/// SchemaValidator
///
/// Compares an expectation with the live table definition.
///

pub trait SchemaValidator {
    fn validate(&self, expected: &TableExpectation) -> SchemaReport;
}

/// Columns the entity's own table must carry, key columns first.
pub fn expected_table(meta: &EntityMeta) -> Result<TableExpectation, MappingError> {
    let id = meta.id();
    let mut columns = Vec::new();

    if id.is_compound() {
        let key = id.compound_meta()?;
        columns.extend(key.partition().components().iter().map(|component| {
            ExpectedColumn {
                name: component.cql_name().to_string(),
                cql_type: component.codec().cql_type(),
                kind: ColumnKind::PartitionKey,
            }
        }));
        columns.extend(
            key.clustering()
                .components()
                .iter()
                .zip(key.clustering_orders())
                .map(|(component, order)| ExpectedColumn {
                    name: component.cql_name().to_string(),
                    cql_type: component.codec().cql_type(),
                    kind: ColumnKind::ClusteringKey(order.sorting),
                }),
        );
    } else {
        columns.push(ExpectedColumn {
            name: id.cql_name().to_string(),
            cql_type: column_type(meta, id)?,
            kind: ColumnKind::PartitionKey,
        });
    }

    for property in meta.all_except_id() {
        let kind = if property.is_counter() {
            if !meta.is_clustered_counter() {
                continue;
            }
            ColumnKind::Counter
        } else if property.is_static_column() {
            ColumnKind::Static
        } else {
            ColumnKind::Regular
        };

        columns.push(ExpectedColumn {
            name: property.cql_name().to_string(),
            cql_type: column_type(meta, property)?,
            kind,
        });
    }

    Ok(TableExpectation {
        keyspace: meta.keyspace().map(str::to_string),
        table: meta.table().to_string(),
        columns,
    })
}

/// Shared counter table, when the entity has simple counters.
#[must_use]
pub fn expected_counter_table(meta: &EntityMeta) -> Option<TableExpectation> {
    meta.simple_counters().next()?;

    let qualified = meta.qualified_counter_table();
    let table = qualified.rsplit('.').next().unwrap_or(&qualified).to_string();
    let column = |name: &str, cql_type, kind| ExpectedColumn {
        name: name.to_string(),
        cql_type,
        kind,
    };

    Some(TableExpectation {
        keyspace: meta.keyspace().map(str::to_string),
        table,
        columns: vec![
            column(COUNTER_FQCN, CqlType::Text, ColumnKind::PartitionKey),
            column(COUNTER_PRIMARY_KEY, CqlType::Text, ColumnKind::PartitionKey),
            column(
                COUNTER_PROPERTY_NAME,
                CqlType::Text,
                ColumnKind::ClusteringKey(Sorting::Asc),
            ),
            column(COUNTER_VALUE, CqlType::Counter, ColumnKind::Counter),
        ],
    })
}

/// Validate every table of `meta`. Mismatches fail unless the entity allows
/// schema updates, in which case they are logged and returned.
pub fn check_schema(
    meta: &EntityMeta,
    validator: &dyn SchemaValidator,
) -> Result<Vec<SchemaReport>, MappingError> {
    let mut expectations = vec![expected_table(meta)?];
    expectations.extend(expected_counter_table(meta));

    let mut reports = Vec::with_capacity(expectations.len());
    for expected in &expectations {
        let report = validator.validate(expected);
        if !report.is_ok() {
            if !meta.schema_update() {
                return Err(MappingError::mapping(
                    ErrorOrigin::Schema,
                    format!("schema mismatch for entity '{}': {report}", meta.name()),
                ));
            }
            warn!(
                entity = meta.name(),
                table = %expected.qualified_name(),
                mismatches = report.mismatches.len(),
                "schema mismatch tolerated under schema update"
            );
        }
        reports.push(report);
    }

    Ok(reports)
}

fn column_type(meta: &EntityMeta, property: &PropertyMeta) -> Result<CqlType, MappingError> {
    property.cql_type().ok_or_else(|| {
        MappingError::invariant(
            ErrorOrigin::Schema,
            format!(
                "property '{}' of entity '{}' has no single column type",
                property.name(),
                meta.name()
            ),
        )
    })
}

///
/// TESTS
///
