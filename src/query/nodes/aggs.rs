//! Aggregation fragments

use super::{filter_options, single};
use crate::query::types::Options;
use serde_json::{Map, Value};

pub const METRIC_OPTIONS: &[&str] = &[
    "missing",
    "script",
    "format",
    "percents",
    "values",
    "keyed",
    "precision_threshold",
    "compression",
    "hdr",
    "tdigest",
    "sigma",
    "show_distribution",
];
pub const TERMS_AGG_OPTIONS: &[&str] = &[
    "size",
    "shard_size",
    "order",
    "min_doc_count",
    "shard_min_doc_count",
    "missing",
    "include",
    "exclude",
    "collect_mode",
    "execution_hint",
    "show_term_doc_count_error",
    "value_type",
];
pub const DATE_HISTOGRAM_OPTIONS: &[&str] = &[
    "format",
    "time_zone",
    "min_doc_count",
    "offset",
    "keyed",
    "missing",
    "order",
];
pub const HISTOGRAM_OPTIONS: &[&str] = &[
    "interval",
    "min_doc_count",
    "extended_bounds",
    "hard_bounds",
    "offset",
    "keyed",
    "missing",
    "order",
];
pub const RANGE_AGG_OPTIONS: &[&str] = &["keyed", "format", "time_zone", "missing"];
pub const COMPOSITE_OPTIONS: &[&str] = &["size", "after"];
pub const TOP_HITS_OPTIONS: &[&str] = &[
    "size",
    "from",
    "sort",
    "_source",
    "highlight",
    "explain",
    "docvalue_fields",
    "stored_fields",
];

/// Painless source counting a field's values, zero where the field is missing or empty
const NULL_SAFE_COUNT_SCRIPT: &str =
    "doc.containsKey(params.field) && doc[params.field].size() > 0 ? doc[params.field].value : 0";

/// Single-field metric such as `{"avg": {"field": "price"}}`
pub fn metric(kind: &str, field: Option<&str>, options: &Options) -> Value {
    let mut body = filter_options(options, METRIC_OPTIONS);
    if let Some(field) = field {
        body.insert("field".to_string(), Value::from(field));
    }
    single(kind, body)
}

/// `value_count` driven by a script that tolerates missing values
pub fn null_safe_value_count(field: &str) -> Value {
    let mut params = Map::new();
    params.insert("field".to_string(), Value::from(field));

    let mut script = Map::new();
    script.insert("source".to_string(), Value::from(NULL_SAFE_COUNT_SCRIPT));
    script.insert("params".to_string(), Value::Object(params));

    let mut body = Map::new();
    body.insert("script".to_string(), Value::Object(script));
    single("value_count", body)
}

/// `terms` aggregation; an explicit `size` option overrides `size`
pub fn terms_agg(field: &str, size: usize, options: &Options) -> Value {
    let mut body = filter_options(options, TERMS_AGG_OPTIONS);
    body.entry("size".to_string()).or_insert_with(|| Value::from(size));
    body.insert("field".to_string(), Value::from(field));
    single("terms", body)
}

/// `date_histogram` aggregation
///
/// `interval_key` is `calendar_interval` or `fixed_interval`; bounds are epoch millis.
pub fn date_histogram(
    field: &str,
    interval_key: &str,
    interval: &str,
    extended_bounds: Option<(i64, i64)>,
    options: &Options,
) -> Value {
    let mut body = filter_options(options, DATE_HISTOGRAM_OPTIONS);
    body.insert("field".to_string(), Value::from(field));
    body.insert(interval_key.to_string(), Value::from(interval));
    if let Some((min, max)) = extended_bounds {
        let mut bounds = Map::new();
        bounds.insert("min".to_string(), Value::from(min));
        bounds.insert("max".to_string(), Value::from(max));
        body.insert("extended_bounds".to_string(), Value::Object(bounds));
    }
    single("date_histogram", body)
}

/// `histogram` aggregation
pub fn histogram(field: &str, options: &Options) -> Value {
    let mut body = filter_options(options, HISTOGRAM_OPTIONS);
    body.insert("field".to_string(), Value::from(field));
    single("histogram", body)
}

/// `range` or `date_range` aggregation
pub fn range_agg(kind: &str, field: &str, ranges: &[Value], options: &Options) -> Value {
    let mut body = filter_options(options, RANGE_AGG_OPTIONS);
    body.insert("field".to_string(), Value::from(field));
    body.insert("ranges".to_string(), Value::Array(ranges.to_vec()));
    single(kind, body)
}

/// `filter` aggregation wrapping a compiled query
pub fn filter_agg(query: Value) -> Value {
    let mut map = Map::new();
    map.insert("filter".to_string(), query);
    Value::Object(map)
}

/// `nested` aggregation
pub fn nested_agg(path: &str) -> Value {
    let mut body = Map::new();
    body.insert("path".to_string(), Value::from(path));
    single("nested", body)
}

/// `reverse_nested` aggregation, back to the root when `path` is absent
pub fn reverse_nested_agg(path: Option<&str>) -> Value {
    let mut body = Map::new();
    if let Some(path) = path {
        body.insert("path".to_string(), Value::from(path));
    }
    single("reverse_nested", body)
}

/// `composite` aggregation with one `terms` source per `(name, field)`
pub fn composite(sources: &[(String, String)], options: &Options) -> Value {
    let sources = sources
        .iter()
        .map(|(name, field)| {
            let mut terms = Map::new();
            terms.insert("field".to_string(), Value::from(field.as_str()));
            let mut source = Map::new();
            source.insert(name.clone(), single("terms", terms));
            Value::Object(source)
        })
        .collect();

    let mut body = filter_options(options, COMPOSITE_OPTIONS);
    body.insert("sources".to_string(), Value::Array(sources));
    single("composite", body)
}

/// `missing` aggregation
pub fn missing_agg(field: &str) -> Value {
    let mut body = Map::new();
    body.insert("field".to_string(), Value::from(field));
    single("missing", body)
}

/// `top_hits` aggregation
pub fn top_hits(options: &Options) -> Value {
    single("top_hits", filter_options(options, TOP_HITS_OPTIONS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(value: Value) -> Options {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_metric() {
        assert_eq!(
            metric("avg", Some("price"), &opts(json!({ "missing": 0, "size": 5 }))),
            json!({ "avg": { "field": "price", "missing": 0 } })
        );
        assert_eq!(
            metric("sum", None, &opts(json!({ "script": "doc['a'].value" }))),
            json!({ "sum": { "script": "doc['a'].value" } })
        );
    }

    #[test]
    fn test_null_safe_value_count() {
        let count = null_safe_value_count("views");
        assert_eq!(count["value_count"]["script"]["params"]["field"], json!("views"));
        assert!(count["value_count"]["script"]["source"]
            .as_str()
            .unwrap()
            .contains(": 0"));
    }

    #[test]
    fn test_terms_agg_size() {
        assert_eq!(
            terms_agg("status", 10, &Options::new()),
            json!({ "terms": { "field": "status", "size": 10 } })
        );
        assert_eq!(
            terms_agg("status", 10, &opts(json!({ "size": 3, "min_doc_count": 2, "boost": 1 }))),
            json!({ "terms": { "field": "status", "size": 3, "min_doc_count": 2 } })
        );
    }

    #[test]
    fn test_date_histogram() {
        assert_eq!(
            date_histogram("created_at", "calendar_interval", "1M", Some((0, 1000)), &Options::new()),
            json!({ "date_histogram": {
                "field": "created_at",
                "calendar_interval": "1M",
                "extended_bounds": { "min": 0, "max": 1000 }
            } })
        );
    }

    #[test]
    fn test_composite() {
        let sources = vec![
            ("brand".to_string(), "brand.keyword".to_string()),
            ("year".to_string(), "year".to_string()),
        ];
        assert_eq!(
            composite(&sources, &opts(json!({ "size": 50 }))),
            json!({ "composite": {
                "sources": [
                    { "brand": { "terms": { "field": "brand.keyword" } } },
                    { "year": { "terms": { "field": "year" } } }
                ],
                "size": 50
            } })
        );
    }

    #[test]
    fn test_nested_family() {
        assert_eq!(nested_agg("comments"), json!({ "nested": { "path": "comments" } }));
        assert_eq!(reverse_nested_agg(None), json!({ "reverse_nested": {} }));
        assert_eq!(filter_agg(json!({ "match_all": {} })), json!({ "filter": { "match_all": {} } }));
    }
}
