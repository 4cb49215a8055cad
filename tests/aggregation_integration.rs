//! Integration tests for aggregation compilation and result reshaping

use serde_json::{json, Value};
use squidex_dsl::aggregation::{extract_metrics, flatten_distinct, AggregationArgs};
use squidex_dsl::{
    AggregationDescriptor, ClauseDescriptor, CompileSession, DistinctSpec, DslError, FieldMap,
    OrderSpec, StaticMappingProvider,
};
use std::sync::Arc;

fn setup_session() -> CompileSession {
    let fields = FieldMap::from_pairs([
        ("category", "text"),
        ("category.keyword", "keyword"),
        ("brand", "keyword"),
        ("price", "scaled_float"),
        ("stock", "integer"),
        ("sold_at", "date"),
        ("notes", "text"),
    ]);
    let provider = StaticMappingProvider::new().with_index("sales", fields);
    CompileSession::new("sales", Arc::new(provider))
}

/// Count `terms` levels along the first-key chain of a distinct aggregation
fn terms_depth(aggs: &serde_json::Map<String, Value>) -> usize {
    let mut depth = 0;
    let mut level = aggs.values().next();
    while let Some(node) = level {
        if node.get("terms").is_none() {
            break;
        }
        depth += 1;
        level = node
            .get("aggs")
            .and_then(Value::as_object)
            .and_then(|children| children.values().find(|child| child.get("terms").is_some()));
    }
    depth
}

#[test]
fn test_distinct_depth_matches_field_count() {
    let session = setup_session();
    for fields in [vec!["brand"], vec!["brand", "category"], vec!["brand", "category", "stock"]] {
        let spec = DistinctSpec::new(fields.clone())
            .with_metric(AggregationDescriptor::field("revenue", "sum", "price"));
        let aggs = session.compile_distinct(&spec).unwrap();
        assert_eq!(terms_depth(&aggs), fields.len());
    }
}

#[test]
fn test_distinct_metrics_only_at_innermost_level() {
    let session = setup_session();
    let spec = DistinctSpec::new(["brand", "category"])
        .with_metric(AggregationDescriptor::field("revenue", "sum", "price"))
        .with_size(25);
    let aggs = session.compile_distinct(&spec).unwrap();

    let outer = &aggs["brand"];
    assert_eq!(outer["terms"]["field"], json!("brand"));
    assert_eq!(outer["terms"]["size"], json!(25));
    assert!(outer["aggs"].get("revenue").is_none());

    let inner = &outer["aggs"]["category"];
    assert_eq!(inner["terms"]["field"], json!("category.keyword"));
    assert_eq!(inner["aggs"]["revenue"], json!({ "sum": { "field": "price" } }));
}

#[test]
fn test_distinct_orders_per_level() {
    let session = setup_session();
    let spec = DistinctSpec::new(["brand", "category"])
        .with_order(OrderSpec::desc("category"))
        .with_order(OrderSpec::asc("_count"));
    let aggs = session.compile_distinct(&spec).unwrap();

    assert_eq!(aggs["brand"]["terms"]["order"], json!({ "_count": "asc" }));
    assert_eq!(
        aggs["brand"]["aggs"]["category"]["terms"]["order"],
        json!({ "_key": "desc" })
    );
}

#[test]
fn test_bucket_with_sibling_metrics() {
    let session = setup_session();
    let aggs = session
        .compile_aggregations(&[AggregationDescriptor::terms("by_brand", "brand")
            .with_option("size", 5)
            .with_sub(AggregationDescriptor::field("avg_price", "avg", "price"))
            .with_sub(AggregationDescriptor::field("stock", "sum", "stock"))])
        .unwrap();

    assert_eq!(
        Value::Object(aggs),
        json!({ "by_brand": {
            "terms": { "field": "brand", "size": 5 },
            "aggs": {
                "avg_price": { "avg": { "field": "price" } },
                "stock": { "sum": { "field": "stock" } }
            }
        } })
    );
}

#[test]
fn test_filter_bucket_compiles_where_clauses() {
    let session = setup_session();
    let aggs = session
        .compile_aggregations(&[AggregationDescriptor::filter(
            "in_stock",
            vec![
                ClauseDescriptor::basic("stock", squidex_dsl::Operator::Gt, 0),
                ClauseDescriptor::eq("brand", "acme").not(),
            ],
        )
        .with_sub(AggregationDescriptor::field("n", "count", "stock"))])
        .unwrap();

    assert_eq!(
        aggs["in_stock"]["filter"],
        json!({ "bool": {
            "must": [{ "range": { "stock": { "gt": 0 } } }],
            "must_not": [{ "term": { "brand": "acme" } }]
        } })
    );
    assert!(aggs["in_stock"]["aggs"]["n"]["value_count"]["script"].is_object());
}

#[test]
fn test_aggregation_options_are_filtered() {
    let session = setup_session();
    let cases = vec![
        (
            AggregationDescriptor::field("a", "avg", "price")
                .with_option("missing", 0)
                .with_option("order", "x"),
            json!({ "avg": { "field": "price", "missing": 0 } }),
        ),
        (
            AggregationDescriptor::terms("t", "brand")
                .with_option("min_doc_count", 1)
                .with_option("percents", [50]),
            json!({ "terms": { "field": "brand", "size": 10, "min_doc_count": 1 } }),
        ),
        (
            AggregationDescriptor::date_histogram("h", "sold_at", "1d")
                .with_option("time_zone", "+01:00")
                .with_option("size", 3),
            json!({ "date_histogram": {
                "field": "sold_at",
                "calendar_interval": "1d",
                "time_zone": "+01:00"
            } }),
        ),
        (
            AggregationDescriptor::new("top", "top_hits", AggregationArgs::None)
                .with_option("size", 1)
                .with_option("field", "x"),
            json!({ "top_hits": { "size": 1 } }),
        ),
        (
            AggregationDescriptor::field("hist", "histogram", "price")
                .with_option("interval", 10)
                .with_option("size", 3),
            json!({ "histogram": { "field": "price", "interval": 10 } }),
        ),
        (
            AggregationDescriptor::new(
                "r",
                "range",
                AggregationArgs::Ranges {
                    field: "price".to_string(),
                    ranges: vec![json!({ "to": 10 })],
                },
            )
            .with_option("keyed", true)
            .with_option("size", 2),
            json!({ "range": { "field": "price", "ranges": [{ "to": 10 }], "keyed": true } }),
        ),
        (
            AggregationDescriptor::new(
                "dr",
                "date_range",
                AggregationArgs::Ranges {
                    field: "sold_at".to_string(),
                    ranges: vec![json!({ "from": "now-1M" })],
                },
            )
            .with_option("time_zone", "+01:00")
            .with_option("interval", "1d"),
            json!({ "date_range": {
                "field": "sold_at",
                "ranges": [{ "from": "now-1M" }],
                "time_zone": "+01:00"
            } }),
        ),
        (
            AggregationDescriptor::new(
                "c",
                "composite",
                AggregationArgs::Fields(vec!["brand".to_string()]),
            )
            .with_option("size", 50)
            .with_option("order", "asc"),
            json!({ "composite": {
                "size": 50,
                "sources": [{ "brand": { "terms": { "field": "brand" } } }]
            } }),
        ),
    ];

    for (desc, expected) in cases {
        assert_eq!(session.compile_aggregations(&[desc.clone()]).unwrap()[&desc.key], expected);
    }
}

#[test]
fn test_unknown_aggregation_type_fails_fast() {
    let session = setup_session();
    let err = session
        .compile_aggregations(&[AggregationDescriptor::field("m", "matrix_stats", "price")])
        .unwrap_err();
    assert!(matches!(err, DslError::UnsupportedAggregation(ref t) if t == "matrix_stats"));
    assert!(err.is_caller_error());
}

#[test]
fn test_aggregation_on_text_field_fails() {
    let session = setup_session();
    let err = session
        .compile_aggregations(&[AggregationDescriptor::terms("by_notes", "notes")])
        .unwrap_err();
    assert_eq!(err.field(), Some("notes"));
}

#[test]
fn test_reshape_round_trip_through_response() {
    let session = setup_session();
    let spec = DistinctSpec::new(["brand", "category"])
        .with_metric(AggregationDescriptor::field("revenue", "sum", "price"));
    let aggs = session.compile_distinct(&spec).unwrap();
    assert!(aggs.contains_key("brand"));

    let response = json!({ "aggregations": {
        "brand": { "buckets": [
            { "key": "acme", "doc_count": 4, "category": { "buckets": [
                { "key": "tools", "doc_count": 3, "revenue": { "value": 30.0 } },
                { "key": "toys", "doc_count": 1, "revenue": { "value": 5.0 } }
            ] } }
        ] }
    } });
    let rows = flatten_distinct(&response, &spec.fields, &["revenue".to_string()]);
    assert_eq!(rows.len(), 2);
    assert_eq!(
        Value::Object(rows[1].clone()),
        json!({ "brand": "acme", "category": "toys", "_count": 1, "revenue": 5.0 })
    );

    let metrics = extract_metrics(
        &json!({ "aggregations": { "total": { "value": 35.0 } } }),
        &[AggregationDescriptor::field("total", "sum", "price")],
    );
    assert_eq!(metrics["total"], json!(35.0));
}
