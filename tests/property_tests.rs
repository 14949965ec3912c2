//! Property tests for path matching and transactions.

use indexmap::IndexMap;
use proptest::prelude::*;
use respdiff::datapath::{self, ExecuteOptions, TransactionPlan};
use respdiff::document::{DataValue, Scalar};

const KEYS: &[&str] = &["a", "b", "c", "0", "1"];
const PATHS: &[&str] = &["*", "*/a", "a/*", "**/b", "**=1", "0..1", "*/0", "**/c/*", "*/*/.."];
/// Paths a reselect over `preserve_indices` output may not find again:
/// negative bounds only resolve on sequences, and nested parent matches
/// overlap.
const DELETE_PATHS: &[&str] = &["-1..-1", "*/-1..-1", "*/-2..-1", "**/-1..-1", "**/a/.."];

fn arb_value() -> impl Strategy<Value = DataValue> {
    let leaf = prop_oneof![
        Just(DataValue::Scalar(Scalar::Null)),
        any::<bool>().prop_map(DataValue::from),
        (0i64..4).prop_map(DataValue::from),
        "[a-c]{1,2}".prop_map(DataValue::from),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(DataValue::Seq),
            arb_map(inner),
        ]
    })
}

fn arb_map(inner: impl Strategy<Value = DataValue>) -> impl Strategy<Value = DataValue> {
    prop::collection::vec((prop::sample::select(KEYS), inner), 0..4).prop_map(|entries| {
        DataValue::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect::<IndexMap<_, _>>(),
        )
    })
}

fn arb_root() -> impl Strategy<Value = DataValue> {
    prop_oneof![
        arb_map(arb_value()),
        prop::collection::vec(arb_value(), 0..4).prop_map(DataValue::Seq),
    ]
}

fn arb_path() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PATHS)
}

fn arb_any_path() -> impl Strategy<Value = &'static str> {
    prop_oneof![prop::sample::select(PATHS), prop::sample::select(DELETE_PATHS)]
}

/// Rendered values at every match, sorted so map order does not matter.
fn found_values(path: &str, data: &DataValue) -> Vec<String> {
    let path = datapath::compile(path).unwrap();
    let mut values: Vec<String> = datapath::find_values(&path, data)
        .map(|(_, value)| value.to_string())
        .collect();
    values.sort();
    values
}

proptest! {
    #[test]
    fn find_is_deterministic(data in arb_root(), path in arb_any_path()) {
        let compiled = datapath::compile(path).unwrap();
        let first: Vec<_> = datapath::find(&compiled, &data).collect();
        let second: Vec<_> = datapath::find(&compiled, &data).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn select_then_reselect_finds_same_values(data in arb_root(), path in arb_path()) {
        let mut plan = TransactionPlan::new();
        plan.select(path).unwrap();
        let selected = plan
            .execute(&data, ExecuteOptions { preserve_indices: true })
            .unwrap()
            .data;
        prop_assert_eq!(found_values(path, &selected), found_values(path, &data));
    }

    #[test]
    fn delete_twice_equals_delete_once(data in arb_root(), path in arb_any_path()) {
        let mut once = TransactionPlan::new();
        once.delete(path).unwrap();
        let mut twice = once.clone();
        twice.delete(path).unwrap();

        let options = ExecuteOptions::default();
        prop_assert_eq!(
            once.execute(&data, options).unwrap(),
            twice.execute(&data, options).unwrap()
        );
    }

    #[test]
    fn untouched_subtrees_keep_their_shape(data in arb_value(), path in arb_any_path()) {
        let mut root = IndexMap::new();
        root.insert("keep".to_string(), data.clone());
        root.insert("other".to_string(), data.clone());
        let root = DataValue::Map(root);

        let mut plan = TransactionPlan::new();
        plan.delete(&format!("other/{}", path)).unwrap();
        let out = plan
            .execute(&root, ExecuteOptions { preserve_indices: true })
            .unwrap()
            .data;
        prop_assert_eq!(out.get(&"keep".into()), Some(&data));
    }
}
