//! Field resolver
//!
//! Maps a logical field name to the sub-field the engine can match exactly,
//! sort and aggregate on (e.g. `name` -> `name.keyword`).

use crate::error::DslError;
use crate::schema::{FieldMap, FieldType, MappingProvider};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine-internal document id field
pub const ID_FIELD: &str = "_id";

/// Pseudo-fields passed through untouched
const PASSTHROUGH_FIELDS: &[&str] = &["_score", "_count", "_key", "_doc"];

/// Per-session cache of flattened field maps, keyed by index
///
/// Cloning the handle shares the cache; a fresh `MappingCache` is independent.
#[derive(Clone, Debug, Default)]
pub struct MappingCache {
    inner: Arc<RwLock<HashMap<String, Arc<FieldMap>>>>,
}

impl MappingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached map for an index or fetch and cache it
    pub fn get_or_fetch<F>(&self, index: &str, fetch: F) -> Result<Arc<FieldMap>>
    where
        F: FnOnce() -> Result<FieldMap>,
    {
        if let Some(cached) = self.inner.read().get(index) {
            return Ok(Arc::clone(cached));
        }

        debug!(index, "field mapping cache miss");
        let fetched = Arc::new(fetch()?);
        let mut cache = self.inner.write();
        let entry = cache
            .entry(index.to_string())
            .or_insert_with(|| Arc::clone(&fetched));
        Ok(Arc::clone(entry))
    }

    /// Drop the cached map for one index
    pub fn invalidate(&self, index: &str) {
        self.inner.write().remove(index);
    }

    /// Drop all cached maps
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn contains(&self, index: &str) -> bool {
        self.inner.read().contains_key(index)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Resolves logical field names against one index's mapping
pub struct FieldResolver {
    index: String,
    provider: Arc<dyn MappingProvider>,
    cache: MappingCache,
    overrides: HashMap<String, String>,
    bypass: bool,
}

impl FieldResolver {
    /// Create a resolver with its own cache
    pub fn new(index: impl Into<String>, provider: Arc<dyn MappingProvider>) -> Self {
        Self {
            index: index.into(),
            provider,
            cache: MappingCache::new(),
            overrides: HashMap::new(),
            bypass: false,
        }
    }

    /// Use an existing cache handle
    pub fn with_cache(mut self, cache: MappingCache) -> Self {
        self.cache = cache;
        self
    }

    /// Per-query logical -> concrete field overrides
    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Trust caller field names without consulting the mapping
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// Resolver for one query: same index, provider and cache, with its own overrides
    pub fn for_query(&self, overrides: HashMap<String, String>) -> FieldResolver {
        FieldResolver {
            index: self.index.clone(),
            provider: Arc::clone(&self.provider),
            cache: self.cache.clone(),
            overrides,
            bypass: self.bypass,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn cache(&self) -> &MappingCache {
        &self.cache
    }

    /// Resolve the field to query, sort or aggregate on
    pub fn resolve(&self, field: &str) -> Result<String> {
        if field == "id" || field == ID_FIELD {
            return Ok(ID_FIELD.to_string());
        }
        if PASSTHROUGH_FIELDS.contains(&field) {
            return Ok(field.to_string());
        }
        if let Some(mapped) = self.overrides.get(field) {
            return Ok(mapped.clone());
        }
        if self.bypass {
            return Ok(field.to_string());
        }

        let fields = self.field_map()?;
        match fields.find_indexable(field) {
            Some(path) => Ok(path.to_string()),
            None => {
                warn!(field, index = %self.index, "no exact-match field in mapping");
                Err(DslError::FieldResolution {
                    field: field.to_string(),
                    index: self.index.clone(),
                })
            }
        }
    }

    /// Flattened mapping of this resolver's index, fetched once
    pub fn field_map(&self) -> Result<Arc<FieldMap>> {
        self.cache
            .get_or_fetch(&self.index, || self.provider.fetch_mapping(&self.index))
    }

    /// Declared type of an exact path
    pub fn declared_type(&self, path: &str) -> Result<Option<FieldType>> {
        Ok(self.field_map()?.declared_type(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::StaticMappingProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        fields: FieldMap,
        calls: AtomicUsize,
    }

    impl MappingProvider for CountingProvider {
        fn fetch_mapping(&self, _index: &str) -> Result<FieldMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.fields.clone())
        }
    }

    fn provider() -> Arc<dyn MappingProvider> {
        Arc::new(StaticMappingProvider::new().with_index(
            "people",
            FieldMap::from_pairs([
                ("name", "text"),
                ("name.keyword", "keyword"),
                ("bio", "text"),
                ("age", "integer"),
            ]),
        ))
    }

    #[test]
    fn test_resolves_keyword_subfield() {
        let resolver = FieldResolver::new("people", provider());
        assert_eq!(resolver.resolve("name").unwrap(), "name.keyword");
        assert_eq!(resolver.resolve("age").unwrap(), "age");
        // deterministic on repeat
        assert_eq!(resolver.resolve("name").unwrap(), "name.keyword");
    }

    #[test]
    fn test_text_only_field_fails() {
        let resolver = FieldResolver::new("people", provider());
        let err = resolver.resolve("bio").unwrap_err();
        assert_eq!(err.field(), Some("bio"));
        assert!(resolver.resolve("unknown").is_err());
    }

    #[test]
    fn test_id_and_pseudo_fields() {
        let resolver = FieldResolver::new("people", provider());
        assert_eq!(resolver.resolve("id").unwrap(), "_id");
        assert_eq!(resolver.resolve("_id").unwrap(), "_id");
        assert_eq!(resolver.resolve("_score").unwrap(), "_score");
        assert_eq!(resolver.resolve("_count").unwrap(), "_count");
        // no mapping lookup needed for these
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_override_wins_over_mapping() {
        let mut overrides = HashMap::new();
        overrides.insert("bio".to_string(), "bio.raw".to_string());
        let resolver = FieldResolver::new("people", provider()).with_overrides(overrides);
        assert_eq!(resolver.resolve("bio").unwrap(), "bio.raw");
    }

    #[test]
    fn test_for_query_shares_cache() {
        let base = FieldResolver::new("people", provider());
        let mut overrides = HashMap::new();
        overrides.insert("bio".to_string(), "bio.raw".to_string());

        let scoped = base.for_query(overrides);
        assert_eq!(scoped.resolve("bio").unwrap(), "bio.raw");
        assert_eq!(scoped.resolve("name").unwrap(), "name.keyword");
        assert!(base.cache().contains("people"));
        assert!(base.resolve("bio").is_err());
    }

    #[test]
    fn test_bypass_passes_through() {
        let resolver = FieldResolver::new("people", provider()).with_bypass(true);
        assert_eq!(resolver.resolve("bio").unwrap(), "bio");
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_mapping_fetched_once_per_index() {
        let counting = Arc::new(CountingProvider {
            fields: FieldMap::from_pairs([("status", "keyword")]),
            calls: AtomicUsize::new(0),
        });
        let resolver = FieldResolver::new("posts", counting.clone());

        for _ in 0..5 {
            resolver.resolve("status").unwrap();
        }
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);

        resolver.cache().invalidate("posts");
        resolver.resolve("status").unwrap();
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shared_cache_handle() {
        let cache = MappingCache::new();
        let a = FieldResolver::new("people", provider()).with_cache(cache.clone());
        let b = FieldResolver::new("people", provider()).with_cache(cache.clone());
        a.resolve("name").unwrap();
        assert!(cache.contains("people"));
        assert_eq!(b.resolve("name").unwrap(), "name.keyword");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_provider_error_surfaces() {
        let resolver = FieldResolver::new("ghost", provider());
        assert!(matches!(
            resolver.resolve("name"),
            Err(DslError::MappingLookup { .. })
        ));
    }
}
