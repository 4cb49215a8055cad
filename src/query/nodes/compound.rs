//! Compound query fragments wrapping an inner query

use super::{filter_options, single};
use crate::query::types::Options;
use serde_json::{Map, Value};

pub const NESTED_OPTIONS: &[&str] = &[
    "score_mode",
    "ignore_unmapped",
    "inner_hits",
    "boost",
    "_name",
];
pub const FUNCTION_SCORE_OPTIONS: &[&str] = &[
    "boost",
    "boost_mode",
    "max_boost",
    "min_score",
    "score_mode",
    "_name",
];
pub const HAS_PARENT_OPTIONS: &[&str] = &["score", "ignore_unmapped", "inner_hits", "_name"];
pub const HAS_CHILD_OPTIONS: &[&str] = &[
    "score_mode",
    "min_children",
    "max_children",
    "ignore_unmapped",
    "inner_hits",
    "_name",
];
pub const PARENT_ID_OPTIONS: &[&str] = &["ignore_unmapped", "_name"];

/// `{"match_all": {}}`
pub fn match_all() -> Value {
    single("match_all", Map::new())
}

/// `bool` query, empty groups are omitted
pub fn bool_query(must: &[Value], must_not: &[Value], should: &[Value], filter: &[Value]) -> Value {
    let mut body = Map::new();
    for (key, group) in [
        ("must", must),
        ("must_not", must_not),
        ("should", should),
        ("filter", filter),
    ] {
        if !group.is_empty() {
            body.insert(key.to_string(), Value::Array(group.to_vec()));
        }
    }
    single("bool", body)
}

/// `nested` query
///
/// A computed `inner_hits` replaces one passed through `options`.
pub fn nested(path: &str, query: Value, inner_hits: Option<Value>, options: &Options) -> Value {
    let mut body = filter_options(options, NESTED_OPTIONS);
    body.insert("path".to_string(), Value::from(path));
    body.insert("query".to_string(), query);
    if let Some(inner_hits) = inner_hits {
        body.insert("inner_hits".to_string(), inner_hits);
    }
    single("nested", body)
}

/// `function_score` query with a single named score function
pub fn function_score(query: Value, function: &str, params: &Value, options: &Options) -> Value {
    let mut body = filter_options(options, FUNCTION_SCORE_OPTIONS);
    body.insert("query".to_string(), query);
    body.insert(function.to_string(), params.clone());
    single("function_score", body)
}

/// `has_parent` query
pub fn has_parent(parent_type: &str, query: Value, options: &Options) -> Value {
    let mut body = filter_options(options, HAS_PARENT_OPTIONS);
    body.insert("parent_type".to_string(), Value::from(parent_type));
    body.insert("query".to_string(), query);
    single("has_parent", body)
}

/// `has_child` query
pub fn has_child(child_type: &str, query: Value, options: &Options) -> Value {
    let mut body = filter_options(options, HAS_CHILD_OPTIONS);
    body.insert("type".to_string(), Value::from(child_type));
    body.insert("query".to_string(), query);
    single("has_child", body)
}

/// `parent_id` query
pub fn parent_id(child_type: &str, id: &Value, options: &Options) -> Value {
    let mut body = filter_options(options, PARENT_ID_OPTIONS);
    body.insert("type".to_string(), Value::from(child_type));
    body.insert("id".to_string(), id.clone());
    single("parent_id", body)
}

/// Bounded `inner_hits` body; unset members are omitted
pub fn inner_hits(sort: Vec<Value>, from: Option<usize>, size: Option<usize>) -> Value {
    let mut body = Map::new();
    if !sort.is_empty() {
        body.insert("sort".to_string(), Value::Array(sort));
    }
    if let Some(from) = from {
        body.insert("from".to_string(), Value::from(from));
    }
    if let Some(size) = size {
        body.insert("size".to_string(), Value::from(size));
    }
    Value::Object(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bool_query_omits_empty_groups() {
        let a = json!({ "term": { "a": 1 } });
        assert_eq!(
            bool_query(&[], &[a.clone()], &[], &[]),
            json!({ "bool": { "must_not": [a] } })
        );
        assert_eq!(bool_query(&[], &[], &[], &[]), json!({ "bool": {} }));
    }

    #[test]
    fn test_nested_with_inner_hits() {
        let q = json!({ "match_all": {} });
        let options: Options = json!({ "score_mode": "avg", "size": 3 })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(
            nested("comments", q.clone(), Some(json!({ "size": 2 })), &options),
            json!({ "nested": {
                "path": "comments",
                "query": q,
                "score_mode": "avg",
                "inner_hits": { "size": 2 }
            } })
        );
    }

    #[test]
    fn test_relationship_fragments() {
        let q = match_all();
        assert_eq!(
            has_parent("post", q.clone(), &Options::new()),
            json!({ "has_parent": { "parent_type": "post", "query": { "match_all": {} } } })
        );
        assert_eq!(
            has_child("comment", q, &Options::new()),
            json!({ "has_child": { "type": "comment", "query": { "match_all": {} } } })
        );
        assert_eq!(
            parent_id("comment", &json!("p1"), &Options::new()),
            json!({ "parent_id": { "type": "comment", "id": "p1" } })
        );
    }

    #[test]
    fn test_function_score() {
        let options: Options = json!({ "boost_mode": "multiply", "inner_hits": {} })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(
            function_score(match_all(), "field_value_factor", &json!({ "field": "likes" }), &options),
            json!({ "function_score": {
                "query": { "match_all": {} },
                "field_value_factor": { "field": "likes" },
                "boost_mode": "multiply"
            } })
        );
    }

    #[test]
    fn test_inner_hits() {
        assert_eq!(inner_hits(vec![], None, None), json!({}));
        assert_eq!(
            inner_hits(vec![json!({ "a": { "order": "asc" } })], Some(5), Some(10)),
            json!({ "sort": [{ "a": { "order": "asc" } }], "from": 5, "size": 10 })
        );
    }
}
