//! Mapping providers
//!
//! The compiler never talks to the engine itself. Hosts implement
//! [`MappingProvider`] on top of whatever transport they use; the compiler calls
//! it once per index per session.

use super::field_type::FieldType;
use super::mapping::{FieldMap, IndexMapping};
use crate::error::DslError;
use crate::Result;
use std::collections::HashMap;

/// Synchronous source of index mappings
pub trait MappingProvider: Send + Sync {
    /// Fetch the flattened field map for an index
    fn fetch_mapping(&self, index: &str) -> Result<FieldMap>;

    /// Declared type of a single path, fetching the whole mapping
    fn declared_type(&self, index: &str, path: &str) -> Result<Option<FieldType>> {
        Ok(self.fetch_mapping(index)?.declared_type(path).cloned())
    }
}

/// In-memory provider backed by fixed mappings
#[derive(Clone, Debug, Default)]
pub struct StaticMappingProvider {
    indices: HashMap<String, FieldMap>,
}

impl StaticMappingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already flattened field map
    pub fn with_index(mut self, index: impl Into<String>, fields: FieldMap) -> Self {
        self.indices.insert(index.into(), fields);
        self
    }

    /// Register an index mapping
    pub fn with_mapping(self, index: impl Into<String>, mapping: &IndexMapping) -> Self {
        self.with_index(index, mapping.flatten())
    }
}

impl MappingProvider for StaticMappingProvider {
    fn fetch_mapping(&self, index: &str) -> Result<FieldMap> {
        self.indices
            .get(index)
            .cloned()
            .ok_or_else(|| DslError::MappingLookup {
                index: index.to_string(),
                reason: "index not found".to_string(),
            })
    }
}
