//! Shared fixtures: a recording session and a few mapped entities.

use crate::{
    codec::NativeCodec,
    cql::ConsistencyLevel,
    model::{
        ComponentMeta, CompoundKeyMeta, EmbeddedBinding, EntityMeta, FieldBinding, PropertyMeta,
        Sorting,
    },
    session::{BatchStatement, ResultSet, SessionExecutor, TransportError},
    statement::BoundStatement,
    types::Counter,
    value::ValueKind,
};
use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex},
};

///
/// Executed
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Executed {
    Statement {
        statement: BoundStatement,
        consistency: ConsistencyLevel,
        serial: Option<ConsistencyLevel>,
    },
    Batch(BatchStatement),
}

///
/// RecordingSession
///
/// Records everything it is asked to run and answers from a FIFO of
/// scripted results (empty results once the queue runs dry).
///

#[derive(Debug, Default)]
pub(crate) struct RecordingSession {
    log: Mutex<Vec<Executed>>,
    replies: Mutex<VecDeque<ResultSet>>,
    fail_on: Mutex<Option<String>>,
}

impl RecordingSession {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn reply(&self, result: ResultSet) {
        self.replies.lock().unwrap().push_back(result);
    }

    /// Fail every statement (or batch holding a statement) whose CQL
    /// contains `needle`.
    pub(crate) fn fail_when(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    pub(crate) fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub(crate) fn executed(&self) -> Vec<Executed> {
        self.log.lock().unwrap().clone()
    }

    /// Statements executed one by one.
    pub(crate) fn statements(&self) -> Vec<BoundStatement> {
        self.executed()
            .into_iter()
            .filter_map(|e| match e {
                Executed::Statement { statement, .. } => Some(statement),
                Executed::Batch(_) => None,
            })
            .collect()
    }

    pub(crate) fn batches(&self) -> Vec<BatchStatement> {
        self.executed()
            .into_iter()
            .filter_map(|e| match e {
                Executed::Batch(batch) => Some(batch),
                Executed::Statement { .. } => None,
            })
            .collect()
    }

    /// CQL of everything executed, batches flattened in order.
    pub(crate) fn cqls(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .flat_map(|e| match e {
                Executed::Statement { statement, .. } => vec![statement.cql().to_string()],
                Executed::Batch(batch) => batch
                    .statements
                    .iter()
                    .map(|s| s.cql().to_string())
                    .collect(),
            })
            .collect()
    }

    fn check_failure(&self, cql: &str) -> Result<(), TransportError> {
        match self.fail_on.lock().unwrap().as_deref() {
            Some(needle) if cql.contains(needle) => {
                Err(TransportError::new(format!("unavailable: {cql}")))
            }
            _ => Ok(()),
        }
    }

    fn next_reply(&self) -> ResultSet {
        self.replies.lock().unwrap().pop_front().unwrap_or_default()
    }
}

impl SessionExecutor for RecordingSession {
    fn execute(
        &self,
        statement: &BoundStatement,
        consistency: ConsistencyLevel,
        serial_consistency: Option<ConsistencyLevel>,
    ) -> Result<ResultSet, TransportError> {
        self.log.lock().unwrap().push(Executed::Statement {
            statement: statement.clone(),
            consistency,
            serial: serial_consistency,
        });
        self.check_failure(statement.cql())?;

        Ok(self.next_reply())
    }

    fn execute_batch(&self, batch: &BatchStatement) -> Result<ResultSet, TransportError> {
        self.log.lock().unwrap().push(Executed::Batch(batch.clone()));
        for statement in &batch.statements {
            self.check_failure(statement.cql())?;
        }

        Ok(self.next_reply())
    }
}

// ----------------------------------------------------------------------
// User: simple id, collections, an indexed column and a simple counter
// ----------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct User {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub friends: Option<Vec<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub prefs: Option<BTreeMap<String, i32>>,
    pub visits: Counter,
}

pub(crate) fn user_meta() -> EntityMeta {
    let text = || NativeCodec::shared(ValueKind::Text);

    EntityMeta::builder::<User>("users")
        .keyspace("app")
        .schema_update(true)
        .property(PropertyMeta::partition_key(
            FieldBinding::new("id", |u: &User| &u.id, |u: &mut User| &mut u.id),
            NativeCodec::shared(ValueKind::BigInt),
        ))
        .property(PropertyMeta::simple(
            FieldBinding::new("name", |u: &User| &u.name, |u: &mut User| &mut u.name),
            text(),
        ))
        .property(
            PropertyMeta::simple(
                FieldBinding::new("email", |u: &User| &u.email, |u: &mut User| &mut u.email),
                text(),
            )
            .index(None),
        )
        .property(
            PropertyMeta::list(
                FieldBinding::new("friends", |u: &User| &u.friends, |u: &mut User| {
                    &mut u.friends
                }),
                text(),
            )
            .empty_if_null(),
        )
        .property(PropertyMeta::set(
            FieldBinding::new("tags", |u: &User| &u.tags, |u: &mut User| &mut u.tags),
            text(),
        ))
        .property(PropertyMeta::map(
            FieldBinding::new("prefs", |u: &User| &u.prefs, |u: &mut User| &mut u.prefs),
            text(),
            NativeCodec::shared(ValueKind::Int),
        ))
        .property(PropertyMeta::counter(FieldBinding::new(
            "visits",
            |u: &User| &u.visits,
            |u: &mut User| &mut u.visits,
        )))
        .build()
        .unwrap()
}

// ----------------------------------------------------------------------
// Tweet: compound key (user_id | posted_at DESC) with a static column
// ----------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TweetKey {
    pub user_id: Option<i64>,
    pub posted_at: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tweet {
    pub key: Option<TweetKey>,
    pub content: Option<String>,
    pub owner_name: Option<String>,
}

pub(crate) fn tweet_key_meta() -> CompoundKeyMeta {
    let bigint = || NativeCodec::shared(ValueKind::BigInt);

    CompoundKeyMeta::builder::<TweetKey>()
        .partition(ComponentMeta::new(
            bigint(),
            FieldBinding::new(
                "user_id",
                |k: &TweetKey| &k.user_id,
                |k: &mut TweetKey| &mut k.user_id,
            ),
        ))
        .clustering_with(
            ComponentMeta::new(
                bigint(),
                FieldBinding::new(
                    "posted_at",
                    |k: &TweetKey| &k.posted_at,
                    |k: &mut TweetKey| &mut k.posted_at,
                ),
            ),
            Sorting::Desc,
        )
        .build()
        .unwrap()
}

pub(crate) fn tweet_meta() -> EntityMeta {
    let text = || NativeCodec::shared(ValueKind::Text);

    EntityMeta::builder::<Tweet>("tweets")
        .keyspace("app")
        .property(PropertyMeta::compound_key(
            EmbeddedBinding::new(
                "key",
                |t: &Tweet| t.key.as_ref(),
                |t: &mut Tweet, key: TweetKey| t.key = Some(key),
            ),
            tweet_key_meta(),
        ))
        .property(PropertyMeta::simple(
            FieldBinding::new(
                "content",
                |t: &Tweet| &t.content,
                |t: &mut Tweet| &mut t.content,
            ),
            text(),
        ))
        .property(
            PropertyMeta::simple(
                FieldBinding::new(
                    "owner_name",
                    |t: &Tweet| &t.owner_name,
                    |t: &mut Tweet| &mut t.owner_name,
                ),
                text(),
            )
            .static_column(),
        )
        .build()
        .unwrap()
}

/// Static-only view of the tweets table: the key plus `owner_name`.
pub(crate) fn tweet_owner_meta() -> EntityMeta {
    EntityMeta::builder::<Tweet>("tweets")
        .keyspace("app")
        .name("TweetOwner")
        .property(PropertyMeta::compound_key(
            EmbeddedBinding::new(
                "key",
                |t: &Tweet| t.key.as_ref(),
                |t: &mut Tweet, key: TweetKey| t.key = Some(key),
            ),
            tweet_key_meta(),
        ))
        .property(
            PropertyMeta::simple(
                FieldBinding::new(
                    "owner_name",
                    |t: &Tweet| &t.owner_name,
                    |t: &mut Tweet| &mut t.owner_name,
                ),
                NativeCodec::shared(ValueKind::Text),
            )
            .static_column(),
        )
        .build()
        .unwrap()
}

pub(crate) fn tweet(user_id: i64, posted_at: i64, content: &str) -> Tweet {
    Tweet {
        key: Some(TweetKey {
            user_id: Some(user_id),
            posted_at: Some(posted_at),
        }),
        content: Some(content.to_string()),
        owner_name: None,
    }
}

// ----------------------------------------------------------------------
// PageStats: clustered counter entity
// ----------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct StatsKey {
    pub page: Option<String>,
    pub day: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PageStats {
    pub key: Option<StatsKey>,
    pub views: Counter,
    pub clicks: Counter,
}

pub(crate) fn stats_meta() -> EntityMeta {
    let text = || NativeCodec::shared(ValueKind::Text);
    let key = CompoundKeyMeta::builder::<StatsKey>()
        .partition(ComponentMeta::new(
            text(),
            FieldBinding::new("page", |k: &StatsKey| &k.page, |k: &mut StatsKey| &mut k.page),
        ))
        .clustering(ComponentMeta::new(
            text(),
            FieldBinding::new("day", |k: &StatsKey| &k.day, |k: &mut StatsKey| &mut k.day),
        ))
        .build()
        .unwrap();

    EntityMeta::builder::<PageStats>("page_stats")
        .property(PropertyMeta::compound_key(
            EmbeddedBinding::new(
                "key",
                |s: &PageStats| s.key.as_ref(),
                |s: &mut PageStats, key: StatsKey| s.key = Some(key),
            ),
            key,
        ))
        .property(PropertyMeta::counter(FieldBinding::new(
            "views",
            |s: &PageStats| &s.views,
            |s: &mut PageStats| &mut s.views,
        )))
        .property(PropertyMeta::counter(FieldBinding::new(
            "clicks",
            |s: &PageStats| &s.clicks,
            |s: &mut PageStats| &mut s.clicks,
        )))
        .build()
        .unwrap()
}

pub(crate) fn page_stats(page: &str, day: &str) -> PageStats {
    PageStats {
        key: Some(StatsKey {
            page: Some(page.to_string()),
            day: Some(day.to_string()),
        }),
        ..PageStats::default()
    }
}

// ----------------------------------------------------------------------
// ArchiveKey: one partition component, two clustering components
// ----------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ArchiveKey {
    pub id: Option<i64>,
    pub year: Option<String>,
    pub month: Option<String>,
}

pub(crate) fn archive_key_meta() -> CompoundKeyMeta {
    let text = || NativeCodec::shared(ValueKind::Text);

    CompoundKeyMeta::builder::<ArchiveKey>()
        .partition(ComponentMeta::new(
            NativeCodec::shared(ValueKind::BigInt),
            FieldBinding::new("id", |k: &ArchiveKey| &k.id, |k: &mut ArchiveKey| &mut k.id),
        ))
        .clustering(ComponentMeta::new(
            text(),
            FieldBinding::new(
                "year",
                |k: &ArchiveKey| &k.year,
                |k: &mut ArchiveKey| &mut k.year,
            ),
        ))
        .clustering(ComponentMeta::new(
            text(),
            FieldBinding::new(
                "month",
                |k: &ArchiveKey| &k.month,
                |k: &mut ArchiveKey| &mut k.month,
            ),
        ))
        .build()
        .unwrap()
}
