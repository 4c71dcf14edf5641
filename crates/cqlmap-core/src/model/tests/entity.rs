use super::{assert_class, bigint, text};
use crate::{
    config::MappingConfig,
    cql::{ConsistencyLevel, ConsistencyPair},
    error::ErrorClass,
    model::{EntityMeta, FieldBinding, InsertStrategy, PropertyMeta, PropertyMetaBuilder},
    test_support::{PageStats, Tweet, User, stats_meta, tweet, tweet_meta, user_meta},
};

#[derive(Clone, Debug, Default, PartialEq)]
struct Note {
    id: Option<i64>,
    body: Option<String>,
}

fn note_body(column: &str) -> PropertyMetaBuilder {
    PropertyMeta::simple(
        FieldBinding::new("body", |n: &Note| &n.body, |n: &mut Note| &mut n.body),
        text(),
    )
    .cql_name(column)
}

fn note_id_builder() -> PropertyMetaBuilder {
    PropertyMeta::partition_key(
        FieldBinding::new("id", |n: &Note| &n.id, |n: &mut Note| &mut n.id),
        bigint(),
    )
}

// ----------------------------------------------------------------------
// Naming
// ----------------------------------------------------------------------

#[test]
fn names_and_tables() {
    let users = user_meta();
    let stats = stats_meta();

    assert_eq!(users.name(), "User");
    assert!(users.type_name().ends_with("test_support::User"));
    assert_eq!(users.qualified_table(), "app.users");
    assert_eq!(
        users.qualified_counter_table(),
        "app.cqlmap_counter_table"
    );
    assert_eq!(stats.keyspace(), None);
    assert_eq!(stats.qualified_table(), "page_stats");
}

#[test]
fn explicit_name_overrides_type_name() {
    let meta = EntityMeta::builder::<Note>("notes")
        .name("Memo")
        .property(note_id_builder())
        .build()
        .unwrap();

    assert_eq!(meta.name(), "Memo");
    assert_eq!(meta.id().entity(), "Memo");
}

#[test]
fn config_supplies_defaults() {
    let config = MappingConfig {
        keyspace: Some("shop".to_string()),
        read_consistency: ConsistencyLevel::Quorum,
        insert_strategy: InsertStrategy::OnlyNonNull,
        counter_table: "counters".to_string(),
        force_schema_update: true,
        ..MappingConfig::default()
    };

    let meta = EntityMeta::builder::<Note>("notes")
        .consistency(ConsistencyPair::new(None, Some(ConsistencyLevel::All)))
        .with_config(&config)
        .property(note_id_builder())
        .build()
        .unwrap();

    assert_eq!(meta.qualified_table(), "shop.notes");
    assert_eq!(meta.qualified_counter_table(), "shop.counters");
    assert_eq!(meta.consistency().read, Some(ConsistencyLevel::Quorum));
    assert_eq!(meta.consistency().write, Some(ConsistencyLevel::All));
    assert_eq!(meta.insert_strategy(), InsertStrategy::OnlyNonNull);
    assert!(meta.schema_update());
}

// ----------------------------------------------------------------------
// Column groups and flags
// ----------------------------------------------------------------------

fn names<'a>(properties: impl Iterator<Item = &'a PropertyMeta>) -> Vec<&'a str> {
    properties.map(PropertyMeta::name).collect()
}

#[test]
fn column_groups_keep_the_id_first() {
    let meta = user_meta();

    assert_eq!(meta.id().name(), "id");
    assert_eq!(meta.all().len(), 7);
    assert_eq!(
        names(meta.all_except_id()),
        ["name", "email", "friends", "tags", "prefs", "visits"]
    );
    assert_eq!(
        names(meta.all_except_id_and_counters()),
        ["name", "email", "friends", "tags", "prefs"]
    );
    assert_eq!(
        names(meta.all_except_counters()),
        ["id", "name", "email", "friends", "tags", "prefs"]
    );
    assert_eq!(names(meta.simple_counters()), ["visits"]);
}

#[test]
fn id_goes_first_whatever_the_declaration_order() {
    let meta = EntityMeta::builder::<Note>("notes")
        .property(note_body("body"))
        .property(note_id_builder())
        .build()
        .unwrap();

    assert_eq!(names(meta.all().iter()), ["id", "body"]);
}

#[test]
fn entity_flags() {
    let users = user_meta();
    let tweets = tweet_meta();
    let stats = stats_meta();

    assert!(!users.is_clustered_entity());
    assert!(!users.is_clustered_counter());

    assert!(tweets.is_clustered_entity());
    assert!(!tweets.is_clustered_counter());
    assert!(!tweets.has_only_static_columns());

    assert!(stats.is_clustered_entity());
    assert!(stats.is_clustered_counter());
    assert_eq!(stats.simple_counters().count(), 0);
}

#[test]
fn id_only_entity_is_not_a_clustered_counter() {
    let meta = EntityMeta::builder::<Note>("notes")
        .property(note_id_builder())
        .build()
        .unwrap();

    assert!(!meta.is_clustered_counter());
    assert!(!meta.has_only_static_columns());
    assert_eq!(meta.all_except_id().count(), 0);
}

// ----------------------------------------------------------------------
// Lookup
// ----------------------------------------------------------------------

#[test]
fn property_lookup_by_name_and_column() {
    let tweets = tweet_meta();

    assert_eq!(tweets.property("content").unwrap().cql_name(), "content");
    // key component columns resolve to the id
    assert!(tweets.property_by_cql("posted_at").unwrap().is_id());
    assert!(tweets.find_by_cql("owner_name").unwrap().is_static_column());

    let message = assert_class(tweets.property("title"), ErrorClass::Mapping);
    assert!(message.contains("no property 'title'"));
    let message = assert_class(tweets.property_by_cql("title"), ErrorClass::Mapping);
    assert!(message.contains("cannot find property meta for column 'title'"));
}

#[test]
fn instances_are_type_checked() {
    let users = user_meta();

    users.check_type(&User::default()).unwrap();
    assert_class(
        users.check_type(&PageStats::default()),
        ErrorClass::InvariantViolation,
    );
}

#[test]
fn new_instances_and_snapshots() {
    let tweets = tweet_meta();
    let original = tweet(1, 2, "hello");

    let fresh = tweets.new_instance();
    assert_eq!(fresh.downcast_ref::<Tweet>(), Some(&Tweet::default()));

    let copy = tweets.snapshot(&original).unwrap();
    assert_eq!(copy.downcast_ref::<Tweet>(), Some(&original));
    assert_class(
        tweets.snapshot(&User::default()),
        ErrorClass::InvariantViolation,
    );
}

// ----------------------------------------------------------------------
// Build validation
// ----------------------------------------------------------------------

#[test]
fn entity_requires_exactly_one_id() {
    let none = EntityMeta::builder::<Note>("notes")
        .property(note_body("body"))
        .build();
    let message = assert_class(none, ErrorClass::Validation);
    assert!(message.contains("declares no primary key"));

    let two = EntityMeta::builder::<Note>("notes")
        .property(note_id_builder())
        .property(note_id_builder().cql_name("other_id"))
        .build();
    let message = assert_class(two, ErrorClass::Validation);
    assert!(message.contains("2 primary keys"));
}

#[test]
fn property_names_must_be_unique() {
    let result = EntityMeta::builder::<Note>("notes")
        .property(note_id_builder())
        .property(note_body("body"))
        .property(note_body("body_copy"))
        .build();

    let message = assert_class(result, ErrorClass::Validation);
    assert!(message.contains("property 'body' twice"));
}

#[test]
fn column_names_must_be_unique() {
    let result = EntityMeta::builder::<Note>("notes")
        .property(note_id_builder())
        .property(note_body("id"))
        .build();

    let message = assert_class(result, ErrorClass::Validation);
    assert!(message.contains("maps column 'id' twice"));
}

#[test]
fn static_columns_need_clustering() {
    let result = EntityMeta::builder::<Note>("notes")
        .property(note_id_builder())
        .property(note_body("body").static_column())
        .build();

    let message = assert_class(result, ErrorClass::Validation);
    assert!(message.contains("static column 'body' requires entity 'Note'"));
}
