use super::*;
use crate::{
    cql::CqlValue,
    error::{ErrorClass, ErrorDetail},
    model::Event,
    obs::{metrics_report, metrics_reset_all},
    session::Row,
    statement::{Assignment, Insert, Relation, Select, Statement, Update},
    test_support::{Executed, RecordingSession},
};
use std::sync::Mutex;

fn insert(table: &str, id: i64) -> BoundStatement {
    BoundStatement::new(
        "User",
        Statement::Insert(Insert {
            table: table.to_string(),
            columns: vec![("id".to_string(), CqlValue::BigInt(id))],
            ..Insert::default()
        }),
    )
}

fn increment(table: &str, id: i64) -> BoundStatement {
    BoundStatement::new(
        "PageStats",
        Statement::Update(Update {
            table: table.to_string(),
            assignments: vec![Assignment::AddTo {
                column: "views".to_string(),
                value: CqlValue::BigInt(1),
            }],
            relations: vec![Relation::eq("id", CqlValue::BigInt(id))],
            ..Update::default()
        }),
    )
}

fn select(table: &str) -> BoundStatement {
    BoundStatement::new(
        "User",
        Statement::Select(Select {
            table: table.to_string(),
            relations: vec![Relation::eq("id", CqlValue::BigInt(1))],
            ..Select::default()
        }),
    )
}

fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> EventHolder) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let make = move |label: &'static str| {
        let sink = Arc::clone(&sink);
        EventHolder::from_fn("User", Event::PostPersist, move || {
            sink.lock().unwrap().push(label);
            Ok(())
        })
    };

    (fired, make)
}

// ----------------------------------------------------------------------
// Immediate mode
// ----------------------------------------------------------------------

#[test]
fn immediate_flush_sends_each_statement_in_order() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();
    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    ctx.flush().unwrap();

    let statements = session.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0].values(), [CqlValue::BigInt(1)]);
    assert_eq!(statements[1].values(), [CqlValue::BigInt(2)]);
    assert!(statements[2].cql().starts_with("UPDATE page_stats"));
    assert!(session.batches().is_empty());
    assert!(ctx.is_empty());
}

#[test]
fn immediate_statement_consistency_overrides_context_level() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(session.clone()).with_consistency(ConsistencyLevel::Two);

    ctx.push_statement(insert("users", 1).with_consistency(ConsistencyLevel::All))
        .unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();
    ctx.flush().unwrap();

    let levels: Vec<_> = session
        .executed()
        .into_iter()
        .map(|e| match e {
            Executed::Statement { consistency, .. } => consistency,
            Executed::Batch(batch) => batch.consistency,
        })
        .collect();
    assert_eq!(levels, [ConsistencyLevel::All, ConsistencyLevel::Two]);
}

#[test]
fn immediate_failure_still_clears_pending() {
    let session = RecordingSession::new();
    session.fail_when("users");
    let mut ctx = FlushContext::immediate(session.clone());
    let (fired, event) = recorder();

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();
    ctx.push_event(event("persisted"));

    let err = ctx.flush().unwrap_err();

    assert!(err.is_transport());
    assert!(matches!(err.detail, Some(ErrorDetail::Transport(_))));
    assert_eq!(session.statements().len(), 1);
    assert!(ctx.is_empty());
    assert!(fired.lock().unwrap().is_empty());
}

#[test]
fn immediate_flush_fires_events_after_statements() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(session.clone());
    let (fired, event) = recorder();

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_event(event("first"));
    ctx.push_event(event("second"));
    assert_eq!(ctx.pending_events(), 2);

    ctx.flush().unwrap();

    assert_eq!(*fired.lock().unwrap(), ["first", "second"]);
    assert_eq!(ctx.pending_events(), 0);
}

#[test]
fn end_batch_on_immediate_context_is_unsupported() {
    let mut ctx = FlushContext::immediate(RecordingSession::new());

    let err = ctx.end_batch().unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Flush);
}

// ----------------------------------------------------------------------
// Batch mode
// ----------------------------------------------------------------------

#[test]
fn batch_flush_defers_until_end_batch() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.flush().unwrap();
    assert!(session.executed().is_empty());
    assert_eq!(ctx.pending().len(), 1);

    ctx.end_batch().unwrap();

    let batches = session.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_type, BatchType::Logged);
    assert_eq!(batches[0].len(), 1);
}

#[test]
fn counters_go_in_their_own_batch_after_regular_statements() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();
    ctx.end_batch().unwrap();

    let batches = session.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].batch_type, BatchType::Logged);
    assert_eq!(batches[0].len(), 2);
    assert_eq!(batches[1].batch_type, BatchType::Counter);
    assert_eq!(batches[1].len(), 1);
}

#[test]
fn counter_only_batch_sends_a_single_counter_batch() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    ctx.end_batch().unwrap();

    let batches = session.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].batch_type, BatchType::Counter);
}

#[test]
fn empty_batch_sends_nothing() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.end_batch().unwrap();

    assert!(session.executed().is_empty());
}

#[test]
fn unlogged_batch_type_is_honoured() {
    let session = RecordingSession::new();
    let mut ctx =
        FlushContext::batch(session.clone()).with_batch_type(ConfiguredBatchType::Unlogged);

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.end_batch().unwrap();

    assert_eq!(session.batches()[0].batch_type, BatchType::Unlogged);
}

#[test]
fn statement_consistency_inside_batch_discards_everything() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    let err = ctx
        .push_statement(insert("users", 2).with_consistency(ConsistencyLevel::Quorum))
        .unwrap_err();

    assert!(err.is_batch_contract());
    assert_eq!(err.origin, ErrorOrigin::Flush);
    assert!(ctx.is_empty());

    ctx.end_batch().unwrap();
    assert!(session.executed().is_empty());
}

#[test]
fn end_batch_resets_after_failure() {
    let session = RecordingSession::new();
    session.fail_when("users");
    let mut ctx = FlushContext::batch(session.clone()).with_consistency(ConsistencyLevel::One);
    let (fired, event) = recorder();

    ctx.start_batch(Some(ConsistencyLevel::Quorum), None);
    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    ctx.push_event(event("persisted"));

    let err = ctx.end_batch().unwrap_err();

    assert!(err.is_transport());
    assert_eq!(session.batches().len(), 1, "counter batch must not be sent");
    assert!(ctx.is_empty());
    assert!(ctx.is_batch());
    assert_eq!(ctx.consistency(), ConsistencyLevel::One);
    assert!(fired.lock().unwrap().is_empty());
}

#[test]
fn end_batch_resets_consistency_after_success() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.start_batch(
        Some(ConsistencyLevel::EachQuorum),
        Some(ConsistencyLevel::LocalSerial),
    );
    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.end_batch().unwrap();

    let batch = &session.batches()[0];
    assert_eq!(batch.consistency, ConsistencyLevel::EachQuorum);
    assert_eq!(batch.serial_consistency, Some(ConsistencyLevel::LocalSerial));
    assert_eq!(ctx.consistency(), ctx.default_consistency());
    assert_eq!(ctx.serial_consistency(), None);
}

#[test]
fn start_batch_discards_pending_work() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::immediate(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.start_batch(None, None);

    assert!(ctx.is_batch());
    assert!(ctx.is_empty());
    assert_eq!(ctx.consistency(), ctx.default_consistency());
}

#[test]
fn batch_events_fire_after_end_batch() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());
    let (fired, event) = recorder();

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_event(event("persisted"));
    ctx.flush().unwrap();
    assert!(fired.lock().unwrap().is_empty());

    ctx.end_batch().unwrap();
    assert_eq!(*fired.lock().unwrap(), ["persisted"]);
}

#[test]
fn ordered_batches_stamp_increasing_timestamps() {
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone()).ordered(true);

    for id in 0..5 {
        ctx.push_statement(insert("users", id)).unwrap();
    }
    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();

    let stamps: Vec<i64> = ctx.pending().iter().filter_map(BoundStatement::timestamp).collect();
    assert_eq!(stamps.len(), 5);
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(ctx.pending_counters()[0].timestamp(), None);
}

#[test]
fn unordered_batches_keep_caller_timestamps() {
    let mut ctx = FlushContext::batch(RecordingSession::new());

    ctx.push_statement(insert("users", 1).with_timestamp(42))
        .unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();

    assert_eq!(ctx.pending()[0].timestamp(), Some(42));
    assert_eq!(ctx.pending()[1].timestamp(), None);
}

#[test]
fn duplicate_shares_the_timestamp_sequence() {
    let ctx = FlushContext::batch(RecordingSession::new()).ordered(true);
    let mut first = ctx.duplicate_with_no_data(ConsistencyLevel::Quorum, None);
    let mut second = ctx.duplicate_with_no_data(ConsistencyLevel::One, None);

    first.push_statement(insert("users", 1)).unwrap();
    second.push_statement(insert("users", 2)).unwrap();
    first.push_statement(insert("users", 3)).unwrap();

    let a = first.pending()[0].timestamp().unwrap();
    let b = second.pending()[0].timestamp().unwrap();
    let c = first.pending()[1].timestamp().unwrap();
    assert!(a < b && b < c);
    assert_eq!(first.consistency(), ConsistencyLevel::Quorum);
    assert!(first.is_batch());
}

// ----------------------------------------------------------------------
// Results
// ----------------------------------------------------------------------

#[test]
fn rejected_conditional_write_carries_current_values() {
    let session = RecordingSession::new();
    session.reply(ResultSet::lwt(
        false,
        Row::new().with("name", CqlValue::Text("taken".into())),
    ));
    let mut ctx = FlushContext::immediate(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    let err = ctx.flush().unwrap_err();

    assert_eq!(err.class, ErrorClass::Conflict);
    match err.detail {
        Some(ErrorDetail::LwtRejected { current }) => {
            assert_eq!(
                current,
                [("name".to_string(), CqlValue::Text("taken".into()))]
            );
        }
        other => panic!("unexpected detail: {other:?}"),
    }
}

#[test]
fn reads_use_the_read_consistency_in_any_mode() {
    let session = RecordingSession::new();
    session.reply(ResultSet::rows(vec![
        Row::new().with("id", CqlValue::BigInt(1)),
    ]));
    let mut ctx = FlushContext::batch(session.clone())
        .with_read_consistency(ConsistencyLevel::LocalQuorum);
    ctx.push_statement(insert("users", 2)).unwrap();

    let result = ctx.execute_read(&select("users")).unwrap();

    assert_eq!(result.rows.len(), 1);
    assert_eq!(ctx.pending().len(), 1);
    match &session.executed()[0] {
        Executed::Statement { consistency, .. } => {
            assert_eq!(*consistency, ConsistencyLevel::LocalQuorum);
        }
        Executed::Batch(_) => panic!("read was batched"),
    }
}

#[test]
fn batches_are_counted_by_type() {
    metrics_reset_all();
    let session = RecordingSession::new();
    let mut ctx = FlushContext::batch(session.clone());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_counter_statement(increment("page_stats", 1))
        .unwrap();
    ctx.end_batch().unwrap();

    let ops = metrics_report(None).counters.unwrap().ops;
    assert_eq!(ops.batches, 1);
    assert_eq!(ops.counter_batches, 1);
    assert_eq!(ops.batched_statements, 2);
}

#[test]
fn discarded_statements_are_counted() {
    metrics_reset_all();
    let mut ctx = FlushContext::batch(RecordingSession::new());

    ctx.push_statement(insert("users", 1)).unwrap();
    ctx.push_statement(insert("users", 2)).unwrap();
    ctx.start_batch(None, None);

    let ops = metrics_report(None).counters.unwrap().ops;
    assert_eq!(ops.discarded_batches, 1);
    assert_eq!(ops.discarded_statements, 2);
}
