//! Aggregation result reshaping
//!
//! Turns the engine's aggregation response back into flat rows: one row per
//! innermost distinct bucket, and one value per metric.

use super::descriptor::AggregationDescriptor;
use serde_json::{Map, Value};

/// Row member holding a bucket's document count
pub const COUNT_KEY: &str = "_count";

/// The aggregations object of a search response, or the response itself
fn aggregations_root(response: &Value) -> &Value {
    response.get("aggregations").unwrap_or(response)
}

/// Value of a metric result: `value` for single-value metrics, the whole object otherwise
fn metric_value(result: &Value) -> Value {
    match result.get("value") {
        Some(value) if result.get("values").is_none() => value.clone(),
        _ => result.clone(),
    }
}

/// Flatten a distinct bucket tree into rows
///
/// Each row holds the bucket key of every grouping field, the innermost
/// `doc_count` under `_count`, and each metric's value. Missing levels yield
/// no rows.
pub fn flatten_distinct(
    response: &Value,
    fields: &[String],
    metric_keys: &[String],
) -> Vec<Map<String, Value>> {
    let mut rows = Vec::new();
    if !fields.is_empty() {
        collect_rows(
            aggregations_root(response),
            fields,
            metric_keys,
            Map::new(),
            &mut rows,
        );
    }
    rows
}

fn collect_rows(
    node: &Value,
    fields: &[String],
    metric_keys: &[String],
    row: Map<String, Value>,
    rows: &mut Vec<Map<String, Value>>,
) {
    let Some((field, rest)) = fields.split_first() else {
        return;
    };
    let Some(buckets) = node
        .get(field)
        .and_then(|level| level.get("buckets"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for bucket in buckets {
        let mut row = row.clone();
        row.insert(
            field.clone(),
            bucket.get("key").cloned().unwrap_or(Value::Null),
        );

        if !rest.is_empty() {
            collect_rows(bucket, rest, metric_keys, row, rows);
            continue;
        }

        row.insert(
            COUNT_KEY.to_string(),
            bucket.get("doc_count").cloned().unwrap_or(Value::from(0)),
        );
        for key in metric_keys {
            if let Some(result) = bucket.get(key) {
                row.insert(key.clone(), metric_value(result));
            }
        }
        rows.push(row);
    }
}

/// Metric values keyed by aggregation key
pub fn extract_metrics(response: &Value, descriptors: &[AggregationDescriptor]) -> Map<String, Value> {
    let root = aggregations_root(response);
    descriptors
        .iter()
        .filter_map(|desc| {
            root.get(&desc.key)
                .map(|result| (desc.key.clone(), metric_value(result)))
        })
        .collect()
}
