use arrow::datatypes::{DataType, Field, Fields, TimeUnit};
use lancedoc_codec::encode_document;
use lancedoc_filter::{ComparisonOp, FilterNode, FilterValue, Predicate, lower};
use lancedoc_schema::build_root_schema;
use lancedoc_test_utils::{author, count_metadata, init_tracing_for_tests, nested_metadata};
use lancedoc_types::{Document, MetaValue, StorageRow};
use serde_json::json;

fn count_rows() -> Vec<StorageRow> {
    let schema = build_root_schema(&count_metadata(), 2).unwrap();
    [
        Document::new("a").with_embedding(vec![0.1, 0.2]).with_meta("count", 5),
        Document::new("b"),
    ]
    .iter()
    .map(|doc| encode_document(doc, &schema).unwrap())
    .collect()
}

fn matching_ids(predicate: &Predicate, rows: &[StorageRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| predicate.matches(row).unwrap())
        .map(|row| match row.get("id") {
            Some(lancedoc_types::StorageValue::Utf8(id)) => id.clone(),
            other => panic!("unexpected id {other:?}"),
        })
        .collect()
}

#[test]
fn and_of_equality_and_presence_matches_only_the_populated_row() {
    init_tracing_for_tests();
    let node = FilterNode::from_json(&json!({
        "operator": "AND",
        "conditions": [
            {"field": "meta.count", "operator": "==", "value": 5},
            {"field": "meta.count", "operator": "!=", "value": null}
        ]
    }))
    .unwrap();
    let predicate = lower(&node).unwrap();
    assert_eq!(matching_ids(&predicate, &count_rows()), vec!["a"]);
}

#[test]
fn embedding_presence_follows_the_root_flag() {
    let rows = count_rows();
    let with = lower(&FilterNode::comparison("embedding", ComparisonOp::NotEq, FilterValue::Null))
        .unwrap();
    let without =
        lower(&FilterNode::comparison("vector", ComparisonOp::Eq, FilterValue::Null)).unwrap();
    assert_eq!(matching_ids(&with, &rows), vec!["a"]);
    assert_eq!(matching_ids(&without, &rows), vec!["b"]);
}

/// Rows covering present, declared-null and absent values at both nesting
/// levels, including a declared-null parent struct.
fn nested_rows() -> Vec<StorageRow> {
    let schema = build_root_schema(&nested_metadata(), 2).unwrap();
    [
        Document::new("full").with_meta("author", author("Ada", Some("Main St"), Some(1))),
        Document::new("no-street").with_meta("author", author("Ada", None, Some(2))),
        Document::new("null-name").with_meta("author", {
            let mut map = lancedoc_types::Metadata::new();
            map.insert("name".into(), MetaValue::Null);
            MetaValue::Map(map)
        }),
        Document::new("null-author").with_meta("author", MetaValue::Null),
        Document::new("bare").with_meta("title", "t"),
    ]
    .iter()
    .map(|doc| encode_document(doc, &schema).unwrap())
    .collect()
}

#[test]
fn equal_null_is_the_negation_of_not_equal_null() {
    init_tracing_for_tests();
    let rows = nested_rows();
    for field in ["meta.title", "meta.author.name", "meta.author.address.street", "content"] {
        let eq = lower(&FilterNode::comparison(field, ComparisonOp::Eq, FilterValue::Null)).unwrap();
        let not_ne = lower(&FilterNode::none_of(vec![FilterNode::comparison(
            field,
            ComparisonOp::NotEq,
            FilterValue::Null,
        )]))
        .unwrap();
        for row in &rows {
            assert_eq!(
                eq.evaluate(row).unwrap(),
                not_ne.evaluate(row).unwrap(),
                "{field} on {:?}",
                row.get("id")
            );
            assert!(eq.evaluate(row).unwrap().is_some(), "{field}");
        }
    }
}

#[test]
fn presence_tests_read_flags_at_the_right_level() {
    let rows = nested_rows();
    let present = |field: &str| {
        let predicate =
            lower(&FilterNode::comparison(field, ComparisonOp::NotEq, FilterValue::Null)).unwrap();
        matching_ids(&predicate, &rows)
    };
    assert_eq!(present("meta.author.name"), vec!["full", "no-street"]);
    assert_eq!(present("meta.author.address.street"), vec!["full"]);
    assert_eq!(present("meta.author.address.zip"), vec!["full", "no-street"]);
    assert_eq!(present("meta.title"), vec!["bare"]);
}

#[test]
fn ordering_against_null_never_matches() {
    let rows = nested_rows();
    for operator in [">", ">=", "<", "<="] {
        let node = FilterNode::from_json(
            &json!({"field": "meta.author.address.zip", "operator": operator, "value": null}),
        )
        .unwrap();
        let predicate = lower(&node).unwrap();
        assert_eq!(predicate, Predicate::Literal(false));
        assert!(matching_ids(&predicate, &rows).is_empty());
    }
}

#[test]
fn ordering_ignores_absent_and_null_values() {
    let rows = nested_rows();
    let predicate = lower(&FilterNode::comparison(
        "meta.author.address.zip",
        ComparisonOp::GtEq,
        0,
    ))
    .unwrap();
    assert_eq!(matching_ids(&predicate, &rows), vec!["full", "no-street"]);
}

#[test]
fn in_and_not_in_partition_present_rows() {
    let rows = nested_rows();
    let list = FilterValue::from(vec![1_i64, 3]);
    let inside =
        lower(&FilterNode::comparison("meta.author.address.zip", ComparisonOp::In, list.clone()))
            .unwrap();
    let outside =
        lower(&FilterNode::comparison("meta.author.address.zip", ComparisonOp::NotIn, list))
            .unwrap();

    assert_eq!(matching_ids(&inside, &rows), vec!["full"]);
    // Absent and null values land on the `not in` side.
    assert_eq!(
        matching_ids(&outside, &rows),
        vec!["no-street", "null-name", "null-author", "bare"]
    );
}

#[test]
fn zero_placeholders_do_not_satisfy_equality() {
    let metadata = Fields::from(vec![Field::new("rank", DataType::Int32, false)]);
    let schema = build_root_schema(&metadata, 1).unwrap();
    let rows: Vec<StorageRow> = [Document::new("set").with_meta("rank", 0), Document::new("unset")]
        .iter()
        .map(|doc| encode_document(doc, &schema).unwrap())
        .collect();

    let predicate = lower(&FilterNode::comparison("meta.rank", ComparisonOp::Eq, 0)).unwrap();
    assert_eq!(matching_ids(&predicate, &rows), vec!["set"]);

    let absent = lower(&FilterNode::comparison("meta.rank", ComparisonOp::Eq, FilterValue::Null))
        .unwrap();
    assert_eq!(matching_ids(&absent, &rows), vec!["unset"]);
}

#[test]
fn timestamp_filters_compare_instants() {
    let metadata = Fields::from(vec![Field::new(
        "date",
        DataType::Timestamp(TimeUnit::Second, None),
        true,
    )]);
    let schema = build_root_schema(&metadata, 1).unwrap();
    let rows: Vec<StorageRow> = [
        Document::new("moon").with_meta("date", "1969-07-21T02:56:15"),
        Document::new("later").with_meta("date", "1972-12-11T19:54:58+00:00"),
        Document::new("none"),
    ]
    .iter()
    .map(|doc| encode_document(doc, &schema).unwrap())
    .collect();

    let node = FilterNode::from_json(
        &json!({"field": "meta.date", "operator": ">", "value": "1970-01-01"}),
    )
    .unwrap();
    assert_eq!(matching_ids(&lower(&node).unwrap(), &rows), vec!["later"]);

    let node = FilterNode::from_json(
        &json!({"field": "meta.date", "operator": "==", "value": "1969-07-21T02:56:15"}),
    )
    .unwrap();
    assert_eq!(matching_ids(&lower(&node).unwrap(), &rows), vec!["moon"]);
}
