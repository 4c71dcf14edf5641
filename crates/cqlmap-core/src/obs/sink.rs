//! Metrics sink boundary.
//!
//! Execution logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{obs::metrics, session::BatchType, statement::StatementKind};
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    StatementExecuted {
        kind: StatementKind,
        table: &'a str,
    },
    BatchExecuted {
        batch_type: BatchType,
        statements: u64,
    },
    BatchDiscarded {
        statements: u64,
    },
    ExecutionFailed {
        table: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local metrics state.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::StatementExecuted { kind, table } => {
                metrics::with_state_mut(|m| {
                    let entry = m.tables.entry(table.to_string()).or_default();
                    match kind {
                        StatementKind::Insert => {
                            m.ops.inserts = m.ops.inserts.saturating_add(1);
                            entry.inserts = entry.inserts.saturating_add(1);
                        }
                        StatementKind::Update => {
                            m.ops.updates = m.ops.updates.saturating_add(1);
                            entry.updates = entry.updates.saturating_add(1);
                        }
                        StatementKind::Delete => {
                            m.ops.deletes = m.ops.deletes.saturating_add(1);
                            entry.deletes = entry.deletes.saturating_add(1);
                        }
                        StatementKind::Select => {
                            m.ops.selects = m.ops.selects.saturating_add(1);
                            entry.selects = entry.selects.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::BatchExecuted {
                batch_type,
                statements,
            } => {
                metrics::with_state_mut(|m| {
                    if batch_type == BatchType::Counter {
                        m.ops.counter_batches = m.ops.counter_batches.saturating_add(1);
                    } else {
                        m.ops.batches = m.ops.batches.saturating_add(1);
                    }
                    m.ops.batched_statements = m.ops.batched_statements.saturating_add(statements);
                });
            }

            MetricsEvent::BatchDiscarded { statements } => {
                metrics::with_state_mut(|m| {
                    m.ops.discarded_batches = m.ops.discarded_batches.saturating_add(1);
                    m.ops.discarded_statements =
                        m.ops.discarded_statements.saturating_add(statements);
                });
            }

            MetricsEvent::ExecutionFailed { table } => {
                metrics::with_state_mut(|m| {
                    m.ops.failures = m.ops.failures.saturating_add(1);
                    let entry = m.tables.entry(table.to_string()).or_default();
                    entry.failures = entry.failures.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn MetricsSink` in `with_metrics_sink`,
        //   which restores the previous slot on every exit, including unwind.
        // - `record` is synchronous and never keeps `ptr` beyond this call.
        // - Only a shared reference is materialized.
        unsafe { (&*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report(window_start_ms: Option<i64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - `sink_ptr` is installed only for this dynamic scope and `Guard`
    //   restores the previous slot on all exits.
    // - `record` dereferences synchronously and never persists `sink_ptr`.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}

///
/// TESTS
///
