use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for executed statements and batches.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<String, TableCounters>,
    pub since_ms: i64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            tables: BTreeMap::new(),
            since_ms: Utc::now().timestamp_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Statements sent one by one
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub selects: u64,

    // Batches
    pub batches: u64,
    pub counter_batches: u64,
    pub batched_statements: u64,
    pub discarded_batches: u64,
    pub discarded_statements: u64,

    pub failures: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableCounters {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub selects: u64,
    pub failures: u64,
}

impl TableCounters {
    const fn statements(&self) -> u64 {
        self.inserts
            .saturating_add(self.updates)
            .saturating_add(self.deletes)
            .saturating_add(self.selects)
    }
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since `since_ms`.
    pub counters: Option<EventState>,
    /// Per-table summaries, busiest first.
    pub table_counters: Vec<TableSummary>,
}

///
/// TableSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub statements: u64,
    pub failures: u64,
    pub failure_ratio: f64,
}

/// Build a report from the in-memory counters. With `window_start_ms`, an
/// older window yields no counters.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<i64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| snap.since_ms < start) {
        return EventReport::default();
    }

    let mut table_counters: Vec<TableSummary> = snap
        .tables
        .iter()
        .map(|(table, counters)| {
            let statements = counters.statements();
            let failure_ratio = if statements > 0 {
                counters.failures as f64 / statements as f64
            } else {
                0.0
            };

            TableSummary {
                table: table.clone(),
                statements,
                failures: counters.failures,
                failure_ratio,
            }
        })
        .collect();

    table_counters.sort_by(|a, b| match b.statements.cmp(&a.statements) {
        Ordering::Equal => a.table.cmp(&b.table),
        other => other,
    });

    EventReport {
        counters: Some(snap),
        table_counters,
    }
}

///
/// TESTS
///

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn reset_all_clears_state() {
        with_state_mut(|m| {
            m.ops.inserts = 3;
            m.ops.batches = 2;
            m.tables.insert(
                "app.users".to_string(),
                TableCounters {
                    inserts: 1,
                    ..Default::default()
                },
            );
        });

        reset_all();

        with_state(|m| {
            assert_eq!(m.ops.inserts, 0);
            assert_eq!(m.ops.batches, 0);
            assert!(m.tables.is_empty());
        });
    }

    #[test]
    fn report_sorts_tables_by_statement_count() {
        reset_all();
        with_state_mut(|m| {
            m.tables.insert(
                "alpha".to_string(),
                TableCounters {
                    inserts: 2,
                    ..Default::default()
                },
            );
            m.tables.insert(
                "beta".to_string(),
                TableCounters {
                    selects: 3,
                    failures: 3,
                    ..Default::default()
                },
            );
            m.tables.insert(
                "gamma".to_string(),
                TableCounters {
                    updates: 2,
                    ..Default::default()
                },
            );
        });

        let report = report_window_start(None);
        let tables: Vec<_> = report
            .table_counters
            .iter()
            .map(|t| t.table.as_str())
            .collect();

        assert_eq!(tables, ["beta", "alpha", "gamma"]);
        assert_eq!(report.table_counters[0].failure_ratio, 1.0);
        assert_eq!(report.table_counters[1].failure_ratio, 0.0);
    }
}
