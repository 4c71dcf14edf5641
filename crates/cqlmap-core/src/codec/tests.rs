use super::*;
use crate::{
    error::ErrorClass,
    test_support::{ArchiveKey, archive_key_meta},
    types::Uuid,
};
use proptest::prelude::*;

fn text() -> CodecRef {
    NativeCodec::shared(ValueKind::Text)
}

// ----------------------------------------------------------------------
// Scalar codecs
// ----------------------------------------------------------------------

#[test]
fn native_codec_maps_kinds_to_cql_types() {
    assert_eq!(NativeCodec::shared(ValueKind::Bool).cql_type(), CqlType::Boolean);
    assert_eq!(NativeCodec::shared(ValueKind::BigInt).cql_type(), CqlType::BigInt);
    assert_eq!(NativeCodec::shared(ValueKind::Timestamp).cql_type(), CqlType::Timestamp);
    assert_eq!(text().cql_type(), CqlType::Text);
}

#[test]
fn native_codec_widens_small_numbers() {
    let bigint = NativeCodec::shared(ValueKind::BigInt);

    assert_eq!(bigint.encode(&Value::Int(3)).unwrap(), CqlValue::BigInt(3));
    assert!(bigint.encode(&Value::text("3")).is_err());
}

#[test]
fn null_passes_through_every_codec() {
    let codecs: Vec<CodecRef> = vec![
        text(),
        Arc::new(JsonCodec),
        Arc::new(TimeUuidCodec),
        Arc::new(CounterCodec),
        Arc::new(ListCodec::new(text())),
        Arc::new(EnumCodec::new("Color", ["Red"], EnumEncoding::Name)),
    ];

    for codec in codecs {
        assert_eq!(codec.encode(&Value::Null).unwrap(), CqlValue::Null, "{codec:?}");
        assert_eq!(codec.decode(&CqlValue::Null).unwrap(), Value::Null, "{codec:?}");
    }
}

#[test]
fn native_codec_refuses_non_scalar_kinds() {
    let err = NativeCodec::new(ValueKind::List).unwrap_err();
    assert_eq!(err.class, ErrorClass::Unsupported);

    let placeholder = NativeCodec::shared(ValueKind::Counter);
    assert!(placeholder.encode(&Value::BigInt(1)).is_err());
}

#[test]
fn blobs_keep_their_bytes() {
    let codec = NativeCodec::shared(ValueKind::Blob);
    let blob = Blob::from(vec![0xca, 0xfe]);

    assert_eq!(blob.to_string(), "0x<2 bytes>");
    assert_eq!(
        codec.encode(&Value::Blob(blob.clone())).unwrap(),
        CqlValue::Blob(vec![0xca, 0xfe])
    );
    assert_eq!(
        codec.decode(&CqlValue::Blob(vec![0xca, 0xfe])).unwrap(),
        Value::Blob(blob)
    );
}

#[test]
fn timestamps_travel_as_millis() {
    let codec = NativeCodec::shared(ValueKind::Timestamp);
    let at = Timestamp::from_millis(1_600_000_000_123);

    assert_eq!(
        codec.encode(&Value::Timestamp(at)).unwrap(),
        CqlValue::Timestamp(1_600_000_000_123)
    );
    assert_eq!(
        codec.decode(&CqlValue::Timestamp(1_600_000_000_123)).unwrap(),
        Value::Timestamp(at)
    );
}

#[test]
fn enum_codec_by_name_and_ordinal() {
    let variants = ["Draft", "Published"];
    let by_name = EnumCodec::new("Status", variants, EnumEncoding::Name);
    let by_ordinal = EnumCodec::new("Status", variants, EnumEncoding::Ordinal);
    let published = Value::enum_variant("Published");

    assert_eq!(by_name.encode(&published).unwrap(), CqlValue::text("Published"));
    assert_eq!(by_ordinal.encode(&published).unwrap(), CqlValue::Int(1));
    assert_eq!(by_ordinal.decode(&CqlValue::Int(0)).unwrap(), Value::enum_variant("Draft"));

    assert!(by_name.encode(&Value::enum_variant("Archived")).is_err());
    assert!(by_ordinal.decode(&CqlValue::Int(5)).is_err());
    assert!(by_ordinal.decode(&CqlValue::Int(-1)).is_err());
}

#[test]
fn json_codec_stores_text() {
    let json = serde_json::json!({"theme": "dark", "size": 3});

    let encoded = JsonCodec.encode(&Value::Json(json.clone())).unwrap();
    let CqlValue::Text(text) = &encoded else {
        panic!("json must encode as text, got {encoded:?}");
    };
    assert!(text.contains("\"theme\":\"dark\""));
    assert_eq!(JsonCodec.decode(&encoded).unwrap(), Value::Json(json));
    assert!(JsonCodec.decode(&CqlValue::text("{not json")).is_err());
}

#[test]
fn timeuuid_codec_requires_version_one() {
    let time_based = Uuid::NAMESPACE_DNS;
    let random = Uuid::parse_str("936da01f-9abd-4d9d-80c7-02af85c822a8").unwrap();

    assert_eq!(
        TimeUuidCodec.encode(&Value::Uuid(time_based)).unwrap(),
        CqlValue::TimeUuid(time_based)
    );
    assert!(TimeUuidCodec.encode(&Value::Uuid(random)).is_err());
}

#[test]
fn counter_codec_writes_the_delta_and_reads_the_value() {
    let mut counter = Counter::loaded(10);
    counter.incr_by(5);

    assert_eq!(
        CounterCodec.encode(&Value::Counter(counter)).unwrap(),
        CqlValue::BigInt(5)
    );
    assert_eq!(
        CounterCodec.decode(&CqlValue::Counter(15)).unwrap(),
        Value::Counter(Counter::loaded(15))
    );
}

// ----------------------------------------------------------------------
// Collection codecs
// ----------------------------------------------------------------------

#[test]
fn list_codec_keeps_order() {
    let codec = ListCodec::new(text());
    let value = Value::List(vec![Value::text("b"), Value::text("a")]);

    let encoded = codec.encode(&value).unwrap();

    assert_eq!(
        encoded,
        CqlValue::List(vec![CqlValue::text("b"), CqlValue::text("a")])
    );
    assert_eq!(codec.decode(&encoded).unwrap(), value);
    assert_eq!(codec.cql_type(), CqlType::list(CqlType::Text));
}

#[test]
fn set_codec_drops_duplicate_encodings() {
    let codec = SetCodec::new(NativeCodec::shared(ValueKind::BigInt));
    let value = Value::Set(vec![Value::Int(1), Value::BigInt(1), Value::BigInt(2)]);

    assert_eq!(
        codec.encode(&value).unwrap(),
        CqlValue::Set(vec![CqlValue::BigInt(1), CqlValue::BigInt(2)])
    );
}

#[test]
fn map_codec_transcodes_keys_and_values() {
    let codec = MapCodec::new(
        text(),
        Arc::new(EnumCodec::new("Level", ["Low", "High"], EnumEncoding::Ordinal)),
    );
    let value = Value::Map(vec![(Value::text("cpu"), Value::enum_variant("High"))]);

    let encoded = codec.encode(&value).unwrap();

    assert_eq!(
        encoded,
        CqlValue::Map(vec![(CqlValue::text("cpu"), CqlValue::Int(1))])
    );
    assert_eq!(codec.decode(&encoded).unwrap(), value);
    assert_eq!(codec.cql_type().to_string(), "map<text, int>");
}

#[test]
fn collection_codecs_reject_other_shapes() {
    assert!(ListCodec::new(text()).encode(&Value::text("a")).is_err());
    assert!(
        SetCodec::new(text())
            .decode(&CqlValue::List(Vec::new()))
            .is_err()
    );
    assert!(
        ListCodec::new(text())
            .encode(&Value::List(vec![Value::Int(1)]))
            .is_err()
    );
}

// ----------------------------------------------------------------------
// Compound keys
// ----------------------------------------------------------------------

fn archive(id: i64, year: &str, month: &str) -> ArchiveKey {
    ArchiveKey {
        id: Some(id),
        year: Some(year.to_string()),
        month: Some(month.to_string()),
    }
}

#[test]
fn compound_key_encodes_partition_then_clustering() {
    let meta = archive_key_meta();
    let key = archive(42, "2020", "09");

    assert_eq!(
        compound::encode_to_components(&meta, &key, false).unwrap(),
        [
            CqlValue::BigInt(42),
            CqlValue::text("2020"),
            CqlValue::text("09"),
        ]
    );
    assert_eq!(
        compound::encode_to_components(&meta, &key, true).unwrap(),
        [CqlValue::BigInt(42)]
    );
}

#[test]
fn compound_key_decode_builds_a_fresh_key() {
    let meta = archive_key_meta();
    let raw = [
        CqlValue::BigInt(42),
        CqlValue::text("2020"),
        CqlValue::text("09"),
    ];

    let key = compound::decode_from_components(&meta, &raw).unwrap();

    assert_eq!(
        key.downcast_ref::<ArchiveKey>(),
        Some(&archive(42, "2020", "09"))
    );
}

#[test]
fn compound_key_decode_checks_arity() {
    let meta = archive_key_meta();

    let err = compound::decode_from_components(&meta, &[CqlValue::BigInt(42)]).unwrap_err();

    assert!(err.is_validation());
    assert!(err.message.contains("exactly 3 component(s)"));
}

#[test]
fn partition_only_decode_leaves_clustering_unset() {
    let meta = archive_key_meta();

    let key = compound::decode_partition_only(&meta, &[CqlValue::BigInt(42)]).unwrap();

    assert_eq!(
        key.downcast_ref::<ArchiveKey>(),
        Some(&ArchiveKey {
            id: Some(42),
            ..ArchiveKey::default()
        })
    );
}

proptest! {
    #[test]
    fn compound_key_round_trips(id in any::<i64>(), year in "[0-9]{4}", month in "[0-9]{2}") {
        let meta = archive_key_meta();
        let key = archive(id, &year, &month);

        let raw = compound::encode_to_components(&meta, &key, false).unwrap();
        let decoded = compound::decode_from_components(&meta, &raw).unwrap();

        prop_assert_eq!(decoded.downcast_ref::<ArchiveKey>(), Some(&key));
    }
}
