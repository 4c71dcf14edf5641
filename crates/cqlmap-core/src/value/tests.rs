use super::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[test]
fn kind_acceptance_widens_numbers_only() {
    assert!(ValueKind::BigInt.accepts(ValueKind::Int));
    assert!(ValueKind::Double.accepts(ValueKind::Float));
    assert!(ValueKind::Text.accepts(ValueKind::Text));

    assert!(!ValueKind::Int.accepts(ValueKind::BigInt));
    assert!(!ValueKind::Float.accepts(ValueKind::Double));
    assert!(!ValueKind::Text.accepts(ValueKind::Enum));
}

#[test]
fn null_has_no_kind() {
    assert_eq!(Value::Null.kind(), None);
    assert_eq!(Value::Null.kind_label(), "null");
    assert_eq!(Value::from(3_i64).kind_label(), "bigint");
}

#[test]
fn options_map_none_to_null() {
    let none: Option<String> = None;

    assert_eq!(none.to_value(), Value::Null);
    assert_eq!(Some("a".to_string()).to_value(), Value::text("a"));
    assert_eq!(Option::<String>::from_value(Value::Null), Some(None));
    assert_eq!(Option::<String>::kind(), ValueKind::Text);
}

#[test]
fn integers_widen_on_assignment() {
    assert_eq!(i64::from_value(Value::Int(7)), Some(7));
    assert_eq!(f64::from_value(Value::Float(1.5)), Some(1.5));
    assert_eq!(i32::from_value(Value::BigInt(7)), None);
}

#[test]
fn mismatched_values_are_rejected() {
    assert_eq!(String::from_value(Value::Int(1)), None);
    assert_eq!(Vec::<i32>::from_value(Value::Set(vec![Value::Int(1)])), None);
    assert_eq!(
        Vec::<i32>::from_value(Value::List(vec![Value::Int(1), Value::text("x")])),
        None
    );
}

#[test]
fn collections_convert_element_wise() {
    let list = vec!["a".to_string(), "b".to_string()];
    assert_eq!(
        list.to_value(),
        Value::List(vec![Value::text("a"), Value::text("b")])
    );

    let set: BTreeSet<i32> = [3, 1].into_iter().collect();
    assert_eq!(set.to_value(), Value::Set(vec![Value::Int(1), Value::Int(3)]));

    let hashed = HashSet::<i32>::from_value(Value::Set(vec![Value::Int(2), Value::Int(2)]));
    assert_eq!(hashed.map(|s| s.len()), Some(1));

    let map: BTreeMap<String, i32> = [("k".to_string(), 1)].into_iter().collect();
    let value = map.to_value();
    assert_eq!(value, Value::Map(vec![(Value::text("k"), Value::Int(1))]));
    assert_eq!(BTreeMap::<String, i32>::from_value(value), Some(map));
}

#[test]
fn null_counter_reads_as_fresh() {
    assert_eq!(Counter::from_value(Value::Null), Some(Counter::new()));
    assert_eq!(
        Counter::from_value(Value::Counter(Counter::loaded(4))),
        Some(Counter::loaded(4))
    );
    assert_eq!(Counter::from_value(Value::BigInt(4)), None);
}

#[test]
fn values_serialize_with_their_variant() {
    let json = serde_json::to_string(&vec![Value::BigInt(42), Value::text("2020")]).unwrap();

    assert_eq!(json, r#"[{"BigInt":42},{"Text":"2020"}]"#);
}
