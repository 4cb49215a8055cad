//! DSL node factory
//!
//! Stateless constructors for every query and aggregation fragment the
//! compilers emit. Callers pass already-resolved field names; each builder
//! filters its options through the allow-list for its kind and returns the
//! literal DSL fragment. All knowledge of the target DSL's shape lives here.

mod aggs;
mod compound;
mod geo;
mod leaf;

pub use aggs::*;
pub use compound::*;
pub use geo::*;
pub use leaf::*;

use crate::query::types::Options;
use serde_json::{Map, Value};

/// Keep only the option keys a fragment kind accepts
pub fn filter_options(options: &Options, allowed: &[&str]) -> Map<String, Value> {
    options
        .iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// `{outer: {key: body}}`
pub(crate) fn wrap(outer: &str, key: &str, body: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(key.to_string(), body);
    let mut map = Map::new();
    map.insert(outer.to_string(), Value::Object(inner));
    Value::Object(map)
}

/// `{outer: body}`
pub(crate) fn single(outer: &str, body: Map<String, Value>) -> Value {
    let mut map = Map::new();
    map.insert(outer.to_string(), Value::Object(body));
    Value::Object(map)
}
