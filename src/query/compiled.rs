//! Compiled query representation
//!
//! The clause compiler's only output: a bare leaf, a bool container, or the
//! match-everything sentinel.

use crate::query::nodes;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Accumulated groups of a bool query
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoolGroup {
    pub must: Vec<Value>,
    pub must_not: Vec<Value>,
    pub should: Vec<Value>,
    pub filter: Vec<Value>,
}

impl BoolGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no clause was added
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.must_not.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
    }

    /// Get total number of clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.must_not.len() + self.should.len() + self.filter.len()
    }

    /// The only clause, when the group is a single non-negated `must`
    pub fn single_must(&self) -> Option<&Value> {
        if self.must.len() == 1 && self.clause_count() == 1 {
            self.must.first()
        } else {
            None
        }
    }

    pub fn to_value(&self) -> Value {
        nodes::bool_query(&self.must, &self.must_not, &self.should, &self.filter)
    }
}

/// Result of compiling one clause list
#[derive(Clone, Debug, PartialEq)]
pub enum CompiledQuery {
    /// No clauses: matches every document
    MatchAll,
    /// A single leaf fragment, no bool wrapper
    Leaf(Value),
    Bool(BoolGroup),
}

impl CompiledQuery {
    pub fn is_match_all(&self) -> bool {
        matches!(self, CompiledQuery::MatchAll)
    }

    /// Render as a DSL document
    pub fn to_value(&self) -> Value {
        match self {
            CompiledQuery::MatchAll => nodes::match_all(),
            CompiledQuery::Leaf(leaf) => leaf.clone(),
            CompiledQuery::Bool(group) => group.to_value(),
        }
    }

    /// Render as a DSL document, consuming self
    pub fn into_value(self) -> Value {
        match self {
            CompiledQuery::Leaf(leaf) => leaf,
            other => other.to_value(),
        }
    }
}

impl Serialize for CompiledQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_all_sentinel() {
        let query = CompiledQuery::MatchAll;
        assert!(query.is_match_all());
        assert_eq!(query.to_value(), json!({ "match_all": {} }));
    }

    #[test]
    fn test_single_must() {
        let mut group = BoolGroup::new();
        group.must.push(json!({ "term": { "a": 1 } }));
        assert_eq!(group.single_must(), Some(&json!({ "term": { "a": 1 } })));

        group.must_not.push(json!({ "term": { "b": 1 } }));
        assert_eq!(group.single_must(), None);
        assert_eq!(group.clause_count(), 2);
    }

    #[test]
    fn test_serialize_bool() {
        let group = BoolGroup {
            must: vec![json!({ "term": { "a": 1 } })],
            ..Default::default()
        };
        let json = serde_json::to_string(&CompiledQuery::Bool(group)).unwrap();
        assert_eq!(json, r#"{"bool":{"must":[{"term":{"a":1}}]}}"#);
    }
}
