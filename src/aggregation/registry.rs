//! Aggregation compiler registry
//!
//! Maps an aggregation type tag to the function that compiles it. The
//! built-in set is registered at construction; hosts add their own types with
//! [`AggregationRegistry::register`]. Types registered as metrics are leaves
//! and may not carry sub-aggregations.

use super::compiler::AggregationCompiler;
use super::descriptor::AggregationDescriptor;
use crate::Result;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Compiles one descriptor to its aggregation body, without `aggs`
pub type AggregationFn =
    Arc<dyn Fn(&AggregationCompiler<'_>, &AggregationDescriptor) -> Result<Value> + Send + Sync>;

/// Single-field metrics sharing one builder
pub const SIMPLE_METRICS: &[&str] = &[
    "avg",
    "sum",
    "min",
    "max",
    "cardinality",
    "stats",
    "extended_stats",
    "value_count",
    "percentiles",
    "percentile_ranks",
    "median_absolute_deviation",
    "string_stats",
];

#[derive(Clone, Default)]
pub struct AggregationRegistry {
    compilers: HashMap<String, AggregationFn>,
    metrics: HashSet<String>,
}

impl AggregationRegistry {
    /// Registry with no types
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in type
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for metric in SIMPLE_METRICS {
            registry.register_metric(*metric, |c, d| c.compile_simple_metric(d));
        }
        registry.register_metric("count", |c, d| c.compile_count(d));
        registry.register_metric("top_hits", |c, d| c.compile_top_hits(d));

        registry.register("terms", |c, d| c.compile_terms(d));
        registry.register("date_histogram", |c, d| c.compile_date_histogram(d));
        registry.register("histogram", |c, d| c.compile_histogram(d));
        registry.register("filter", |c, d| c.compile_filter(d));
        registry.register("nested", |c, d| c.compile_nested(d));
        registry.register("reverse_nested", |c, d| c.compile_reverse_nested(d));
        registry.register("composite", |c, d| c.compile_composite(d));
        registry.register("range", |c, d| c.compile_range(d));
        registry.register("date_range", |c, d| c.compile_range(d));
        registry.register("missing", |c, d| c.compile_missing(d));
        registry.register("raw", |c, d| c.compile_raw(d));

        registry
    }

    /// Register a bucket aggregation type, replacing any previous compiler
    pub fn register<F>(&mut self, agg_type: impl Into<String>, compiler: F)
    where
        F: Fn(&AggregationCompiler<'_>, &AggregationDescriptor) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        let agg_type = agg_type.into();
        self.metrics.remove(&agg_type);
        self.compilers.insert(agg_type, Arc::new(compiler));
    }

    /// Register a metric aggregation type
    pub fn register_metric<F>(&mut self, agg_type: impl Into<String>, compiler: F)
    where
        F: Fn(&AggregationCompiler<'_>, &AggregationDescriptor) -> Result<Value>
            + Send
            + Sync
            + 'static,
    {
        let agg_type = agg_type.into();
        self.metrics.insert(agg_type.clone());
        self.compilers.insert(agg_type, Arc::new(compiler));
    }

    pub fn get(&self, agg_type: &str) -> Option<&AggregationFn> {
        self.compilers.get(agg_type)
    }

    pub fn contains(&self, agg_type: &str) -> bool {
        self.compilers.contains_key(agg_type)
    }

    pub fn is_metric(&self, agg_type: &str) -> bool {
        self.metrics.contains(agg_type)
    }

    /// Registered type tags, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.compilers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl fmt::Debug for AggregationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationRegistry")
            .field("types", &self.types())
            .finish()
    }
}
