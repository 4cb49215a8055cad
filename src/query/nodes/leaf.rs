//! Leaf query fragments: term-level and full-text queries

use super::{filter_options, single, wrap};
use crate::query::types::Options;
use serde_json::{Map, Value};

pub const TERM_OPTIONS: &[&str] = &["boost", "case_insensitive", "_name"];
pub const TERMS_OPTIONS: &[&str] = &["boost", "_name"];
pub const RANGE_OPTIONS: &[&str] = &["boost", "format", "time_zone", "relation", "_name"];
pub const WILDCARD_OPTIONS: &[&str] = &["boost", "case_insensitive", "rewrite", "_name"];
pub const REGEXP_OPTIONS: &[&str] = &[
    "boost",
    "flags",
    "case_insensitive",
    "max_determinized_states",
    "rewrite",
    "_name",
];
pub const PREFIX_OPTIONS: &[&str] = &["boost", "case_insensitive", "rewrite", "_name"];
pub const FUZZY_OPTIONS: &[&str] = &[
    "boost",
    "fuzziness",
    "max_expansions",
    "prefix_length",
    "transpositions",
    "rewrite",
    "_name",
];
pub const MATCH_OPTIONS: &[&str] = &[
    "analyzer",
    "auto_generate_synonyms_phrase_query",
    "boost",
    "fuzziness",
    "fuzzy_rewrite",
    "fuzzy_transpositions",
    "lenient",
    "max_expansions",
    "minimum_should_match",
    "operator",
    "prefix_length",
    "zero_terms_query",
    "_name",
];
pub const MATCH_PHRASE_OPTIONS: &[&str] = &["analyzer", "boost", "slop", "zero_terms_query", "_name"];
pub const MATCH_PHRASE_PREFIX_OPTIONS: &[&str] = &[
    "analyzer",
    "boost",
    "max_expansions",
    "slop",
    "zero_terms_query",
    "_name",
];
pub const MULTI_MATCH_OPTIONS: &[&str] = &[
    "analyzer",
    "boost",
    "cutoff_frequency",
    "fuzziness",
    "fuzzy_rewrite",
    "lenient",
    "max_expansions",
    "minimum_should_match",
    "operator",
    "prefix_length",
    "slop",
    "tie_breaker",
    "type",
    "zero_terms_query",
    "_name",
];
pub const QUERY_STRING_OPTIONS: &[&str] = &[
    "allow_leading_wildcard",
    "analyze_wildcard",
    "analyzer",
    "auto_generate_synonyms_phrase_query",
    "boost",
    "default_field",
    "default_operator",
    "enable_position_increments",
    "fuzziness",
    "fuzzy_max_expansions",
    "fuzzy_prefix_length",
    "fuzzy_transpositions",
    "lenient",
    "max_determinized_states",
    "minimum_should_match",
    "phrase_slop",
    "quote_analyzer",
    "quote_field_suffix",
    "rewrite",
    "time_zone",
    "type",
    "_name",
];
pub const EXISTS_OPTIONS: &[&str] = &["boost", "_name"];
pub const SCRIPT_OPTIONS: &[&str] = &["boost", "_name"];
pub const SCRIPT_BODY_OPTIONS: &[&str] = &["lang", "params"];

/// Short form `{kind: {field: value}}` without options, long form otherwise
fn field_value(kind: &str, field: &str, value_key: &str, value: &Value, options: Map<String, Value>) -> Value {
    if options.is_empty() {
        return wrap(kind, field, value.clone());
    }
    let mut body = options;
    body.insert(value_key.to_string(), value.clone());
    wrap(kind, field, Value::Object(body))
}

/// `term` query
pub fn term(field: &str, value: &Value, options: &Options) -> Value {
    field_value("term", field, "value", value, filter_options(options, TERM_OPTIONS))
}

/// `terms` query, options sit next to the field
pub fn terms(field: &str, values: &[Value], options: &Options) -> Value {
    let mut body = filter_options(options, TERMS_OPTIONS);
    body.insert(field.to_string(), Value::Array(values.to_vec()));
    single("terms", body)
}

/// `range` query from `(bound, value)` pairs such as `("gte", 10)`
pub fn range(field: &str, bounds: &[(&str, Value)], options: &Options) -> Value {
    let mut body = filter_options(options, RANGE_OPTIONS);
    for (bound, value) in bounds {
        body.insert((*bound).to_string(), value.clone());
    }
    wrap("range", field, Value::Object(body))
}

/// `wildcard` query
pub fn wildcard(field: &str, pattern: &str, options: &Options) -> Value {
    let mut body = filter_options(options, WILDCARD_OPTIONS);
    body.insert("value".to_string(), Value::from(pattern));
    wrap("wildcard", field, Value::Object(body))
}

/// `regexp` query
pub fn regexp(field: &str, pattern: &str, options: &Options) -> Value {
    field_value(
        "regexp",
        field,
        "value",
        &Value::from(pattern),
        filter_options(options, REGEXP_OPTIONS),
    )
}

/// `prefix` query
pub fn prefix(field: &str, prefix: &str, options: &Options) -> Value {
    field_value(
        "prefix",
        field,
        "value",
        &Value::from(prefix),
        filter_options(options, PREFIX_OPTIONS),
    )
}

/// `fuzzy` query
pub fn fuzzy(field: &str, value: &Value, options: &Options) -> Value {
    field_value("fuzzy", field, "value", value, filter_options(options, FUZZY_OPTIONS))
}

/// `match` query
pub fn match_query(field: &str, query: &Value, options: &Options) -> Value {
    field_value("match", field, "query", query, filter_options(options, MATCH_OPTIONS))
}

/// `match_phrase` query
pub fn match_phrase(field: &str, query: &Value, options: &Options) -> Value {
    field_value(
        "match_phrase",
        field,
        "query",
        query,
        filter_options(options, MATCH_PHRASE_OPTIONS),
    )
}

/// `match_phrase_prefix` query
pub fn match_phrase_prefix(field: &str, query: &Value, options: &Options) -> Value {
    field_value(
        "match_phrase_prefix",
        field,
        "query",
        query,
        filter_options(options, MATCH_PHRASE_PREFIX_OPTIONS),
    )
}

/// `multi_match` query
pub fn multi_match(fields: &[String], query: &Value, options: &Options) -> Value {
    let mut body = filter_options(options, MULTI_MATCH_OPTIONS);
    body.insert("query".to_string(), query.clone());
    body.insert(
        "fields".to_string(),
        Value::Array(fields.iter().map(|f| Value::from(f.as_str())).collect()),
    );
    single("multi_match", body)
}

/// `query_string` query, `fields` omitted when empty
pub fn query_string(fields: &[String], query: &str, options: &Options) -> Value {
    let mut body = filter_options(options, QUERY_STRING_OPTIONS);
    body.insert("query".to_string(), Value::from(query));
    if !fields.is_empty() {
        body.insert(
            "fields".to_string(),
            Value::Array(fields.iter().map(|f| Value::from(f.as_str())).collect()),
        );
    }
    single("query_string", body)
}

/// `exists` query
pub fn exists(field: &str, options: &Options) -> Value {
    let mut body = filter_options(options, EXISTS_OPTIONS);
    body.insert("field".to_string(), Value::from(field));
    single("exists", body)
}

/// `script` query
pub fn script(source: &str, options: &Options) -> Value {
    let mut script = filter_options(options, SCRIPT_BODY_OPTIONS);
    script.insert("source".to_string(), Value::from(source));
    let mut body = filter_options(options, SCRIPT_OPTIONS);
    body.insert("script".to_string(), Value::Object(script));
    single("script", body)
}
