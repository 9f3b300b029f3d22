//! Merge-rule coverage: leaf precedence, sequence replacement, shape
//! preservation, and the deliberate absent-default asymmetry.

use std::collections::BTreeMap;

use rstest::rstest;

use crate::value::ParamValue;

use super::merge;

fn map(entries: &[(&str, ParamValue)]) -> ParamValue {
    ParamValue::Map(
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect(),
    )
}

fn tree(entries: &[(&str, ParamValue)]) -> ParamValue {
    ParamValue::Tree(
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect(),
    )
}

#[rstest]
fn file_leaves_win_and_defaults_fill_gaps() {
    let default = map(&[("a", ParamValue::Int(1)), ("b", ParamValue::Int(2))]);
    let from_file = map(&[("a", ParamValue::Int(9))]);

    let merged = merge(Some(&default), &from_file);

    assert_eq!(merged.get("a"), Some(&ParamValue::Int(9)));
    assert_eq!(merged.get("b"), Some(&ParamValue::Int(2)));
}

#[rstest]
fn sequences_replace_wholesale() {
    let default = map(&[(
        "list",
        ParamValue::Seq(vec![
            ParamValue::Int(1),
            ParamValue::Int(2),
            ParamValue::Int(3),
        ]),
    )]);
    let from_file = map(&[("list", ParamValue::Seq(vec![ParamValue::Int(9)]))]);

    let merged = merge(Some(&default), &from_file);

    assert_eq!(
        merged.get("list"),
        Some(&ParamValue::Seq(vec![ParamValue::Int(9)]))
    );
}

#[rstest]
fn tree_defaults_keep_their_shape() {
    let default = tree(&[
        ("ip", ParamValue::from("192.168.3.42")),
        ("secret", ParamValue::from("s3cret")),
    ]);
    let from_file = map(&[("ip", ParamValue::from("10.0.0.1"))]);

    let merged = merge(Some(&default), &from_file);

    let ParamValue::Tree(result) = merged else {
        panic!("tree default must yield a tree, got {}", merged.kind());
    };
    assert_eq!(
        result.get("ip").and_then(ParamValue::as_str),
        Some("10.0.0.1")
    );
    assert_eq!(
        result.get("secret").and_then(ParamValue::as_str),
        Some("s3cret")
    );
}

#[rstest]
fn absent_default_yields_a_plain_mapping() {
    // Deliberate asymmetry: with no typed default to dictate the shape, a
    // file-supplied mapping stays plain.
    let from_file = map(&[("x", ParamValue::Int(1))]);

    let merged = merge(None, &from_file);

    assert!(matches!(merged, ParamValue::Map(_)));
}

#[rstest]
#[case(ParamValue::Int(7))]
#[case(ParamValue::from("scalar"))]
#[case(ParamValue::Seq(vec![ParamValue::Int(1)]))]
fn non_mapping_defaults_contribute_nothing(#[case] default: ParamValue) {
    let from_file = map(&[("x", ParamValue::Int(1))]);

    let merged = merge(Some(&default), &from_file);

    let ParamValue::Map(result) = merged else {
        panic!("expected plain mapping");
    };
    assert_eq!(result.len(), 1);
    assert_eq!(result.get("x"), Some(&ParamValue::Int(1)));
}

#[rstest]
fn nested_gaps_are_repaired_recursively() {
    let default = map(&[(
        "minio",
        tree(&[
            ("ip", ParamValue::from("192.168.3.42")),
            ("secret_key", ParamValue::from("Proton")),
        ]),
    )]);
    // The user deleted `secret_key` and edited `ip`.
    let from_file = map(&[("minio", map(&[("ip", ParamValue::from("10.0.0.1"))]))]);

    let merged = merge(Some(&default), &from_file);

    let minio = merged.get("minio").cloned().unwrap_or_default();
    assert!(matches!(minio, ParamValue::Tree(_)));
    assert_eq!(minio.get("ip").and_then(ParamValue::as_str), Some("10.0.0.1"));
    assert_eq!(
        minio.get("secret_key").and_then(ParamValue::as_str),
        Some("Proton")
    );
}

#[rstest]
fn file_null_wins_over_the_default() {
    let default = map(&[("a", ParamValue::Int(1))]);
    let from_file = map(&[("a", ParamValue::Null)]);

    let merged = merge(Some(&default), &from_file);

    assert_eq!(merged.get("a"), Some(&ParamValue::Null));
}

#[rstest]
fn scalar_file_values_win_outright() {
    let default = ParamValue::Map(BTreeMap::from([(
        "nested".to_owned(),
        ParamValue::Int(1),
    )]));
    let from_file = ParamValue::from("flattened");

    assert_eq!(merge(Some(&default), &from_file), from_file);
}

#[rstest]
fn unknown_file_keys_are_carried_into_the_result() {
    let default = map(&[("known", ParamValue::Int(1))]);
    let from_file = map(&[("novel", ParamValue::Int(2))]);

    let merged = merge(Some(&default), &from_file);

    assert_eq!(merged.get("known"), Some(&ParamValue::Int(1)));
    assert_eq!(merged.get("novel"), Some(&ParamValue::Int(2)));
}
