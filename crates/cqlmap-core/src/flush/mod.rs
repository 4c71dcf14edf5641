//! Flush/batch context.
//!
//! IMMEDIATE contexts send every pushed statement on `flush`. BATCH contexts
//! accumulate statements until `end_batch`, which sends the regular and the
//! counter group as separate batches and then resets the context whatever
//! the outcome. A BATCH context is confined to one unit of work on one
//! thread; it is `Send` but deliberately not shared.

mod event;
mod timestamp;

#[cfg(test)]
mod tests;

use crate::{
    config::{ConfiguredBatchType, MappingConfig},
    cql::ConsistencyLevel,
    error::{ErrorOrigin, MappingError},
    obs::sink::{MetricsEvent, record},
    session::{BatchStatement, BatchType, ResultSet, SessionExecutor},
    statement::BoundStatement,
};
use std::{fmt, mem, sync::Arc};
use tracing::{debug, warn};

pub use event::EventHolder;
pub use timestamp::MicrosClock;

///
/// FlushMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlushMode {
    Immediate,
    Batch,
}

///
/// FlushContext
///

pub struct FlushContext {
    executor: Arc<dyn SessionExecutor>,
    mode: FlushMode,
    ordered: bool,
    batch_type: ConfiguredBatchType,
    warn_threshold: usize,
    clock: MicrosClock,

    default_consistency: ConsistencyLevel,
    default_serial: Option<ConsistencyLevel>,
    read_consistency: ConsistencyLevel,
    consistency: ConsistencyLevel,
    serial_consistency: Option<ConsistencyLevel>,

    pending: Vec<BoundStatement>,
    counters: Vec<BoundStatement>,
    events: Vec<EventHolder>,
}

impl FlushContext {
    #[must_use]
    pub fn immediate(executor: Arc<dyn SessionExecutor>) -> Self {
        Self::from_config(executor, &MappingConfig::default(), FlushMode::Immediate)
    }

    #[must_use]
    pub fn batch(executor: Arc<dyn SessionExecutor>) -> Self {
        Self::from_config(executor, &MappingConfig::default(), FlushMode::Batch)
    }

    /// Context using the consistency levels, batch type, ordering and warn
    /// threshold of `config`.
    #[must_use]
    pub fn from_config(
        executor: Arc<dyn SessionExecutor>,
        config: &MappingConfig,
        mode: FlushMode,
    ) -> Self {
        Self {
            executor,
            mode,
            ordered: config.ordered_batches,
            batch_type: config.batch_type,
            warn_threshold: config.batch_size_warn_threshold,
            clock: MicrosClock::new(),
            default_consistency: config.write_consistency,
            default_serial: config.serial_consistency,
            read_consistency: config.read_consistency,
            consistency: config.write_consistency,
            serial_consistency: config.serial_consistency,
            pending: Vec::new(),
            counters: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Stamp every pushed statement with a strictly increasing timestamp.
    #[must_use]
    pub const fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    #[must_use]
    pub const fn with_batch_type(mut self, batch_type: ConfiguredBatchType) -> Self {
        self.batch_type = batch_type;
        self
    }

    #[must_use]
    pub const fn with_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.default_consistency = level;
        self.consistency = level;
        self
    }

    #[must_use]
    pub const fn with_read_consistency(mut self, level: ConsistencyLevel) -> Self {
        self.read_consistency = level;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> FlushMode {
        self.mode
    }

    #[must_use]
    pub const fn is_batch(&self) -> bool {
        matches!(self.mode, FlushMode::Batch)
    }

    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.ordered
    }

    #[must_use]
    pub const fn consistency(&self) -> ConsistencyLevel {
        self.consistency
    }

    #[must_use]
    pub const fn serial_consistency(&self) -> Option<ConsistencyLevel> {
        self.serial_consistency
    }

    #[must_use]
    pub const fn read_consistency(&self) -> ConsistencyLevel {
        self.read_consistency
    }

    #[must_use]
    pub const fn default_consistency(&self) -> ConsistencyLevel {
        self.default_consistency
    }

    #[must_use]
    pub fn pending(&self) -> &[BoundStatement] {
        &self.pending
    }

    #[must_use]
    pub fn pending_counters(&self) -> &[BoundStatement] {
        &self.counters
    }

    #[must_use]
    pub const fn pending_events(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.counters.is_empty() && self.events.is_empty()
    }

    /// Enter BATCH mode with an empty context. `None` levels fall back to
    /// the defaults.
    pub fn start_batch(
        &mut self,
        consistency: Option<ConsistencyLevel>,
        serial_consistency: Option<ConsistencyLevel>,
    ) {
        self.discard("start_batch");
        self.mode = FlushMode::Batch;
        self.consistency = consistency.unwrap_or(self.default_consistency);
        self.serial_consistency = serial_consistency.or(self.default_serial);
    }

    pub fn push_statement(&mut self, statement: BoundStatement) -> Result<(), MappingError> {
        let statement = self.admit(statement, self.ordered)?;
        self.pending.push(statement);

        Ok(())
    }

    /// Counter writes carry no client timestamp, ordered or not.
    pub fn push_counter_statement(&mut self, statement: BoundStatement) -> Result<(), MappingError> {
        let statement = self.admit(statement, false)?;
        self.counters.push(statement);

        Ok(())
    }

    /// Queue a lifecycle callback; it runs after the next successful
    /// `flush` (IMMEDIATE) or `end_batch` (BATCH).
    pub fn push_event(&mut self, holder: EventHolder) {
        self.events.push(holder);
    }

    /// IMMEDIATE: send each pending statement on its own, then run the
    /// queued events. BATCH: no-op until `end_batch`. The pending lists are
    /// empty afterwards, on success or failure.
    pub fn flush(&mut self) -> Result<(), MappingError> {
        if self.is_batch() {
            return Ok(());
        }

        let statements: Vec<_> = mem::take(&mut self.pending)
            .into_iter()
            .chain(mem::take(&mut self.counters))
            .collect();
        let events = mem::take(&mut self.events);

        for statement in &statements {
            let consistency = statement.consistency().unwrap_or(self.consistency);
            let serial = statement.serial_consistency().or(self.serial_consistency);
            self.send(statement, consistency, serial)?;
        }

        fire(events)
    }

    /// Send the accumulated batch and reset to an empty BATCH context with
    /// the default consistency, whatever the outcome.
    pub fn end_batch(&mut self) -> Result<(), MappingError> {
        if !self.is_batch() {
            return Err(MappingError::unsupported(
                ErrorOrigin::Flush,
                "end_batch called on an immediate flush context",
            ));
        }

        let pending = mem::take(&mut self.pending);
        let counters = mem::take(&mut self.counters);
        let events = mem::take(&mut self.events);
        let consistency = self.consistency;
        let serial = self.serial_consistency;
        self.reset();

        let regular_type = match self.batch_type {
            ConfiguredBatchType::Logged => BatchType::Logged,
            ConfiguredBatchType::Unlogged => BatchType::Unlogged,
        };
        let groups = [(regular_type, pending), (BatchType::Counter, counters)];
        let total: usize = groups.iter().map(|(_, s)| s.len()).sum();

        for (index, (batch_type, statements)) in groups.into_iter().enumerate() {
            if statements.is_empty() {
                continue;
            }

            let batch = BatchStatement {
                batch_type,
                statements,
                consistency,
                serial_consistency: serial,
            };
            if let Err(err) = self.send_batch(&batch) {
                if index == 0 && total > batch.len() {
                    warn!(
                        statements = total - batch.len(),
                        "counter batch discarded after failed batch"
                    );
                    record(MetricsEvent::BatchDiscarded {
                        statements: (total - batch.len()) as u64,
                    });
                }
                return Err(err);
            }
        }

        fire(events)
    }

    /// Execute a read now, in either mode.
    pub fn execute_read(&self, statement: &BoundStatement) -> Result<ResultSet, MappingError> {
        let consistency = statement.consistency().unwrap_or(self.read_consistency);
        let serial = statement.serial_consistency().or(self.serial_consistency);

        self.send(statement, consistency, serial)
    }

    /// Same configuration and executor, nothing pending.
    #[must_use]
    pub fn duplicate_with_no_data(
        &self,
        consistency: ConsistencyLevel,
        serial_consistency: Option<ConsistencyLevel>,
    ) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            mode: self.mode,
            ordered: self.ordered,
            batch_type: self.batch_type,
            warn_threshold: self.warn_threshold,
            clock: self.clock.clone(),
            default_consistency: self.default_consistency,
            default_serial: self.default_serial,
            read_consistency: self.read_consistency,
            consistency,
            serial_consistency: serial_consistency.or(self.default_serial),
            pending: Vec::new(),
            counters: Vec::new(),
            events: Vec::new(),
        }
    }

    // Check the batch contract and stamp ordered statements.
    fn admit(
        &mut self,
        mut statement: BoundStatement,
        stamp: bool,
    ) -> Result<BoundStatement, MappingError> {
        if self.is_batch()
            && (statement.consistency().is_some() || statement.serial_consistency().is_some())
        {
            self.discard("consistency override");
            return Err(MappingError::batch_contract(format!(
                "cannot set a consistency level on a single statement inside a batch ({}); \
                 set it once with start_batch",
                statement.cql()
            )));
        }

        if stamp {
            statement.stamp(self.clock.next());
        }

        Ok(statement)
    }

    fn send(
        &self,
        statement: &BoundStatement,
        consistency: ConsistencyLevel,
        serial: Option<ConsistencyLevel>,
    ) -> Result<ResultSet, MappingError> {
        let table = statement.statement().table();
        debug!(
            entity = statement.entity(),
            cql = statement.cql(),
            consistency = %consistency,
            "executing statement"
        );

        let result = self
            .executor
            .execute(statement, consistency, serial)
            .map_err(|err| {
                record(MetricsEvent::ExecutionFailed { table });
                MappingError::transport(err)
            })?;

        record(MetricsEvent::StatementExecuted {
            kind: statement.kind(),
            table,
        });
        check_applied(&result, statement.cql())?;

        Ok(result)
    }

    fn send_batch(&self, batch: &BatchStatement) -> Result<(), MappingError> {
        if batch.len() > self.warn_threshold {
            warn!(
                batch_type = %batch.batch_type,
                statements = batch.len(),
                threshold = self.warn_threshold,
                "batch exceeds the size warning threshold"
            );
        }
        debug!(
            batch_type = %batch.batch_type,
            statements = batch.len(),
            consistency = %batch.consistency,
            "executing batch"
        );

        let result = self.executor.execute_batch(batch).map_err(|err| {
            for statement in &batch.statements {
                record(MetricsEvent::ExecutionFailed {
                    table: statement.statement().table(),
                });
            }
            MappingError::transport(err)
        })?;

        record(MetricsEvent::BatchExecuted {
            batch_type: batch.batch_type,
            statements: batch.len() as u64,
        });
        check_applied(&result, &format!("{} batch", batch.batch_type))
    }

    // Empty everything and restore the default consistency; mode is kept.
    fn reset(&mut self) {
        self.pending.clear();
        self.counters.clear();
        self.events.clear();
        self.consistency = self.default_consistency;
        self.serial_consistency = self.default_serial;
    }

    fn discard(&mut self, reason: &'static str) {
        let statements = self.pending.len() + self.counters.len();
        if statements > 0 {
            warn!(statements, reason, "discarding pending statements");
            record(MetricsEvent::BatchDiscarded {
                statements: statements as u64,
            });
        }
        self.reset();
    }
}

impl fmt::Debug for FlushContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushContext")
            .field("mode", &self.mode)
            .field("ordered", &self.ordered)
            .field("consistency", &self.consistency)
            .field("serial_consistency", &self.serial_consistency)
            .field("pending", &self.pending.len())
            .field("counters", &self.counters.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

fn check_applied(result: &ResultSet, cql: &str) -> Result<(), MappingError> {
    if result.was_applied() {
        return Ok(());
    }

    let current = result
        .first()
        .map(|row| row.columns().to_vec())
        .unwrap_or_default();

    Err(MappingError::lwt_rejected(cql, current))
}

fn fire(events: Vec<EventHolder>) -> Result<(), MappingError> {
    for holder in events {
        debug!(entity = holder.entity(), event = %holder.event(), "firing deferred event");
        holder.fire()?;
    }

    Ok(())
}
