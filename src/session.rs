//! Compile session
//!
//! A session binds one index to its settings, field resolver, mapping cache
//! and aggregation registry. Every compiler is reached through it.

use crate::aggregation::{AggregationCompiler, AggregationDescriptor, AggregationRegistry, DistinctSpec};
use crate::config::CompilerSettings;
use crate::query::clause::ClauseCompiler;
use crate::query::compiled::CompiledQuery;
use crate::query::descriptor::{AdHocSort, ClauseDescriptor, HighlightRequest, OrderSpec};
use crate::query::order::OrderCompiler;
use crate::query::request::{CompiledRequest, RequestCompiler, SearchDescriptor};
use crate::query::resolver::{FieldResolver, MappingCache};
use crate::schema::MappingProvider;
use crate::Result;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Compilation context for one index
pub struct CompileSession {
    settings: CompilerSettings,
    resolver: FieldResolver,
    registry: AggregationRegistry,
}

impl CompileSession {
    /// Create a session with default settings and its own mapping cache
    pub fn new(index: impl Into<String>, provider: Arc<dyn MappingProvider>) -> Self {
        let settings = CompilerSettings::default();
        let resolver = FieldResolver::new(index, provider)
            .with_bypass(settings.bypass_mapping_validation);
        Self {
            settings,
            resolver,
            registry: AggregationRegistry::new(),
        }
    }

    pub fn with_settings(mut self, settings: CompilerSettings) -> Self {
        self.resolver = self
            .resolver
            .with_bypass(settings.bypass_mapping_validation);
        self.settings = settings;
        self
    }

    /// Share a mapping cache with other sessions
    pub fn with_cache(mut self, cache: MappingCache) -> Self {
        self.resolver = self.resolver.with_cache(cache);
        self
    }

    pub fn with_registry(mut self, registry: AggregationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a custom aggregation type
    pub fn register_aggregation<F>(&mut self, agg_type: impl Into<String>, compiler: F)
    where
        F: Fn(&AggregationCompiler<'_>, &AggregationDescriptor) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register(agg_type, compiler);
    }

    pub fn index(&self) -> &str {
        self.resolver.index()
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    pub fn registry(&self) -> &AggregationRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &MappingCache {
        self.resolver.cache()
    }

    /// Resolve a logical field name
    pub fn resolve_field(&self, field: &str) -> Result<String> {
        self.resolver.resolve(field)
    }

    /// Compile a where, filter or post-filter clause list
    pub fn compile_query(&self, clauses: &[ClauseDescriptor]) -> Result<CompiledQuery> {
        debug!(index = self.index(), clauses = clauses.len(), "compiling query");
        ClauseCompiler::new(&self.resolver, &self.settings).compile(clauses)
    }

    /// Compile sibling aggregations into a `name -> fragment` map
    pub fn compile_aggregations(
        &self,
        aggregations: &[AggregationDescriptor],
    ) -> Result<Map<String, Value>> {
        debug!(
            index = self.index(),
            aggregations = aggregations.len(),
            "compiling aggregations"
        );
        self.aggregation_compiler().compile(aggregations)
    }

    /// Compile a distinct / group-by request
    pub fn compile_distinct(&self, spec: &DistinctSpec) -> Result<Map<String, Value>> {
        self.aggregation_compiler().compile_distinct(spec)
    }

    /// Compile orders and merge ad hoc sorts into them
    pub fn compile_orders(&self, orders: &[OrderSpec], sorts: &[AdHocSort]) -> Result<Vec<Value>> {
        let compiler = OrderCompiler::new(&self.resolver, &self.settings);
        compiler.merge_sorts(compiler.compile_orders(orders)?, sorts)
    }

    pub fn compile_highlight(&self, request: &HighlightRequest) -> Value {
        OrderCompiler::new(&self.resolver, &self.settings).compile_highlight(request)
    }

    /// Compile a full search request
    pub fn compile_request(&self, search: &SearchDescriptor) -> Result<CompiledRequest> {
        RequestCompiler::new(&self.resolver, &self.settings, &self.registry).compile(search)
    }

    fn aggregation_compiler(&self) -> AggregationCompiler<'_> {
        AggregationCompiler::new(&self.resolver, &self.settings, &self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldMap, StaticMappingProvider};
    use serde_json::json;

    fn provider() -> Arc<dyn MappingProvider> {
        Arc::new(StaticMappingProvider::new().with_index(
            "posts",
            FieldMap::from_pairs([("title", "text"), ("title.keyword", "keyword")]),
        ))
    }

    #[test]
    fn test_session_compiles_query() {
        let session = CompileSession::new("posts", provider());
        let query = session
            .compile_query(&[ClauseDescriptor::eq("title", "hello")])
            .unwrap();
        assert_eq!(query.to_value(), json!({ "term": { "title.keyword": "hello" } }));
        assert!(session.cache().contains("posts"));
    }

    #[test]
    fn test_settings_drive_bypass() {
        let session = CompileSession::new("posts", provider())
            .with_settings(CompilerSettings::default().with_bypass_mapping_validation(true));
        assert_eq!(session.resolve_field("title").unwrap(), "title");
        assert!(session.cache().is_empty());
    }

    #[test]
    fn test_sessions_have_separate_caches() {
        let a = CompileSession::new("posts", provider());
        let b = CompileSession::new("posts", provider());
        a.resolve_field("title").unwrap();
        assert!(a.cache().contains("posts"));
        assert!(!b.cache().contains("posts"));

        let shared = CompileSession::new("posts", provider()).with_cache(a.cache().clone());
        assert!(shared.cache().contains("posts"));
    }

    #[test]
    fn test_custom_aggregation() {
        let mut session = CompileSession::new("posts", provider());
        session.register_aggregation("significant_terms", |compiler, desc| {
            let field = match &desc.args {
                crate::aggregation::AggregationArgs::Field(field) => {
                    compiler.resolver().resolve(field)?
                }
                _ => desc.key.clone(),
            };
            Ok(json!({ "significant_terms": { "field": field } }))
        });

        let aggs = session
            .compile_aggregations(&[AggregationDescriptor::field("sig", "significant_terms", "title")])
            .unwrap();
        assert_eq!(
            aggs["sig"],
            json!({ "significant_terms": { "field": "title.keyword" } })
        );
    }
}
