use crate::{
    error::{ErrorOrigin, MappingError},
    model::{ClusteringOrder, EntityMeta, Sorting},
    statement::{Delete, Operator, Relation, Select, Statement, select_columns},
    value::Value,
};

///
/// Bounding
///
/// Inclusiveness of the `from` / `to` clustering bounds.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Bounding {
    #[default]
    InclusiveBounds,
    ExclusiveBounds,
    InclusiveStartBoundOnly,
    InclusiveEndBoundOnly,
}

impl Bounding {
    const fn start_operator(self) -> Operator {
        match self {
            Self::InclusiveBounds | Self::InclusiveStartBoundOnly => Operator::Gte,
            Self::ExclusiveBounds | Self::InclusiveEndBoundOnly => Operator::Gt,
        }
    }

    const fn end_operator(self) -> Operator {
        match self {
            Self::InclusiveBounds | Self::InclusiveEndBoundOnly => Operator::Lte,
            Self::ExclusiveBounds | Self::InclusiveStartBoundOnly => Operator::Lt,
        }
    }
}

///
/// SliceQuery
///
/// Range query over one partition (or an IN list of partitions) of a
/// clustered entity.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceQuery {
    partition: Vec<Value>,
    partition_in: Vec<Value>,
    clustering: Vec<Value>,
    clustering_in: Vec<Value>,
    from: Vec<Value>,
    to: Vec<Value>,
    bounding: Bounding,
    ordering: Option<Sorting>,
    limit: Option<u32>,
}

impl SliceQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition component values. With `partition_in`, every partition
    /// component but the last.
    #[must_use]
    pub fn partition(mut self, values: Vec<Value>) -> Self {
        self.partition = values;
        self
    }

    /// IN values for the last partition component.
    #[must_use]
    pub fn partition_in(mut self, values: Vec<Value>) -> Self {
        self.partition_in = values;
        self
    }

    /// Clustering equality prefix.
    #[must_use]
    pub fn clustering(mut self, values: Vec<Value>) -> Self {
        self.clustering = values;
        self
    }

    /// IN values for the last clustering component; the equality prefix
    /// must cover every other clustering component.
    #[must_use]
    pub fn clustering_in(mut self, values: Vec<Value>) -> Self {
        self.clustering_in = values;
        self
    }

    #[must_use]
    pub fn from(mut self, values: Vec<Value>) -> Self {
        self.from = values;
        self
    }

    #[must_use]
    pub fn to(mut self, values: Vec<Value>) -> Self {
        self.to = values;
        self
    }

    #[must_use]
    pub const fn bounding(mut self, bounding: Bounding) -> Self {
        self.bounding = bounding;
        self
    }

    /// `Asc` reads in declared clustering order, `Desc` in reverse.
    #[must_use]
    pub const fn ordering(mut self, ordering: Sorting) -> Self {
        self.ordering = Some(ordering);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// SELECT for this slice.
    pub fn select(&self, meta: &EntityMeta) -> Result<Statement, MappingError> {
        let mut relations = self.partition_relations(meta)?;
        relations.extend(self.clustering_relations(meta)?);

        let order_by = match self.ordering {
            Some(ordering) => meta
                .id()
                .clustering_orders()?
                .iter()
                .map(|order| ClusteringOrder {
                    column: order.column.clone(),
                    sorting: match ordering {
                        Sorting::Asc => order.sorting,
                        Sorting::Desc => order.sorting.reverse(),
                    },
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Statement::Select(Select {
            table: meta.qualified_table(),
            columns: select_columns(meta),
            relations,
            order_by,
            limit: self.limit,
        }))
    }

    /// DELETE for this slice; only equality restrictions are allowed.
    pub fn delete(&self, meta: &EntityMeta) -> Result<Statement, MappingError> {
        if !self.clustering_in.is_empty()
            || !self.from.is_empty()
            || !self.to.is_empty()
            || self.ordering.is_some()
            || self.limit.is_some()
        {
            return Err(MappingError::validation(
                ErrorOrigin::Statement,
                format!(
                    "slice delete on entity '{}' only supports partition and clustering equality",
                    meta.name()
                ),
            ));
        }

        let mut relations = self.partition_relations(meta)?;
        relations.extend(self.clustering_relations(meta)?);

        Ok(Statement::Delete(Delete {
            table: meta.qualified_table(),
            relations,
            ..Delete::default()
        }))
    }

    fn partition_relations(&self, meta: &EntityMeta) -> Result<Vec<Relation>, MappingError> {
        let id = meta.id();
        let components = id.partition_components()?;
        let names = components.cql_names();

        let expected = if self.partition_in.is_empty() {
            names.len()
        } else {
            names.len() - 1
        };
        if self.partition.len() != expected {
            return Err(MappingError::validation(
                ErrorOrigin::Statement,
                format!(
                    "slice on entity '{}' needs {expected} partition component value(s), found {}",
                    meta.name(),
                    self.partition.len()
                ),
            ));
        }

        let mut relations = Vec::with_capacity(names.len());
        if !self.partition.is_empty() {
            let encoded = id.encode_partition_components(&self.partition)?;
            relations.extend(
                names
                    .iter()
                    .zip(encoded)
                    .map(|(name, value)| Relation::eq(*name, value)),
            );
        }
        if !self.partition_in.is_empty() {
            let encoded = id.encode_partition_components_in(&self.partition_in)?;
            if let Some(last) = names.last() {
                relations.push(Relation::in_list(*last, encoded));
            }
        }

        Ok(relations)
    }

    fn clustering_relations(&self, meta: &EntityMeta) -> Result<Vec<Relation>, MappingError> {
        if self.clustering.is_empty()
            && self.clustering_in.is_empty()
            && self.from.is_empty()
            && self.to.is_empty()
        {
            return Ok(Vec::new());
        }

        let id = meta.id();
        let names = id.clustering_components()?.cql_names();
        let has_bounds = !self.from.is_empty() || !self.to.is_empty();
        if has_bounds && !(self.clustering.is_empty() && self.clustering_in.is_empty()) {
            return Err(MappingError::validation(
                ErrorOrigin::Statement,
                format!(
                    "slice on entity '{}' cannot mix clustering bounds with equality or IN",
                    meta.name()
                ),
            ));
        }

        let mut relations = Vec::new();
        if !self.clustering.is_empty() {
            let encoded = id.encode_clustering_keys(&self.clustering)?;
            relations.extend(
                names
                    .iter()
                    .zip(encoded)
                    .map(|(name, value)| Relation::eq(*name, value)),
            );
        }

        if !self.clustering_in.is_empty() {
            if self.clustering.len() + 1 != names.len() {
                return Err(MappingError::validation(
                    ErrorOrigin::Statement,
                    format!(
                        "clustering IN on entity '{}' needs {} equality value(s) first",
                        meta.name(),
                        names.len() - 1
                    ),
                ));
            }
            let encoded = id.encode_clustering_keys_in(&self.clustering_in)?;
            if let Some(last) = names.last() {
                relations.push(Relation::in_list(*last, encoded));
            }
        }

        for (values, op) in [
            (&self.from, self.bounding.start_operator()),
            (&self.to, self.bounding.end_operator()),
        ] {
            if values.is_empty() {
                continue;
            }
            let encoded = id.encode_clustering_keys(values)?;
            relations.push(Relation::Tuple {
                columns: names[..values.len()].iter().map(ToString::to_string).collect(),
                op,
                values: encoded,
            });
        }

        Ok(relations)
    }
}
