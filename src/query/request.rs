//! Search request assembly
//!
//! Compiles a full query-builder descriptor set into one request body:
//! `query`, `post_filter`, `aggs`, `sort`, `highlight`, `from`, `size` and
//! `_source`.

use crate::aggregation::{AggregationCompiler, AggregationDescriptor, AggregationRegistry, DistinctSpec};
use crate::config::CompilerSettings;
use crate::error::DslError;
use crate::query::clause::ClauseCompiler;
use crate::query::compiled::{BoolGroup, CompiledQuery};
use crate::query::descriptor::{AdHocSort, ClauseDescriptor, HighlightRequest, OrderSpec};
use crate::query::order::OrderCompiler;
use crate::query::resolver::FieldResolver;
use crate::Result;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Everything the query builder collected for one search
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDescriptor {
    pub wheres: Vec<ClauseDescriptor>,
    /// Non-scoring clauses, compiled into the query's `filter` group
    pub filters: Vec<ClauseDescriptor>,
    /// Applied after aggregations
    pub post_filters: Vec<ClauseDescriptor>,
    pub orders: Vec<OrderSpec>,
    pub sorts: Vec<AdHocSort>,
    pub highlight: Option<HighlightRequest>,
    pub aggregations: Vec<AggregationDescriptor>,
    pub distinct: Option<DistinctSpec>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub source: Option<Vec<String>>,
    /// Logical -> concrete field names for this search only
    pub field_overrides: HashMap<String, String>,
}

impl SearchDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_clause(mut self, clause: ClauseDescriptor) -> Self {
        self.wheres.push(clause);
        self
    }

    pub fn filter(mut self, clause: ClauseDescriptor) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn post_filter(mut self, clause: ClauseDescriptor) -> Self {
        self.post_filters.push(clause);
        self
    }

    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.orders.push(order);
        self
    }

    pub fn sort(mut self, sort: AdHocSort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn highlight(mut self, highlight: HighlightRequest) -> Self {
        self.highlight = Some(highlight);
        self
    }

    pub fn aggregate(mut self, aggregation: AggregationDescriptor) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn distinct(mut self, distinct: DistinctSpec) -> Self {
        self.distinct = Some(distinct);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict returned `_source` fields
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn override_field(mut self, logical: impl Into<String>, concrete: impl Into<String>) -> Self {
        self.field_overrides.insert(logical.into(), concrete.into());
        self
    }
}

/// Compiled search request
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledRequest {
    pub query: CompiledQuery,
    pub post_filter: Option<CompiledQuery>,
    pub aggs: Map<String, Value>,
    pub sort: Vec<Value>,
    pub highlight: Option<Value>,
    pub from: Option<usize>,
    pub size: Option<usize>,
    pub source: Option<Vec<String>>,
}

impl CompiledRequest {
    /// Request body; empty sections are omitted
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".to_string(), self.query.to_value());
        if let Some(post_filter) = &self.post_filter {
            body.insert("post_filter".to_string(), post_filter.to_value());
        }
        if !self.aggs.is_empty() {
            body.insert("aggs".to_string(), Value::Object(self.aggs.clone()));
        }
        if !self.sort.is_empty() {
            body.insert("sort".to_string(), Value::Array(self.sort.clone()));
        }
        if let Some(highlight) = &self.highlight {
            body.insert("highlight".to_string(), highlight.clone());
        }
        if let Some(from) = self.from {
            body.insert("from".to_string(), Value::from(from));
        }
        if let Some(size) = self.size {
            body.insert("size".to_string(), Value::from(size));
        }
        if let Some(source) = &self.source {
            body.insert("_source".to_string(), Value::from(source.clone()));
        }
        Value::Object(body)
    }
}

impl Serialize for CompiledRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_body().serialize(serializer)
    }
}

/// Assembles search requests from the clause, order and aggregation compilers
pub struct RequestCompiler<'a> {
    resolver: &'a FieldResolver,
    settings: &'a CompilerSettings,
    registry: &'a AggregationRegistry,
}

impl<'a> RequestCompiler<'a> {
    pub fn new(
        resolver: &'a FieldResolver,
        settings: &'a CompilerSettings,
        registry: &'a AggregationRegistry,
    ) -> Self {
        Self {
            resolver,
            settings,
            registry,
        }
    }

    pub fn compile(&self, search: &SearchDescriptor) -> Result<CompiledRequest> {
        let resolver = self.resolver.for_query(search.field_overrides.clone());
        let clauses = ClauseCompiler::new(&resolver, self.settings);
        let orders = OrderCompiler::new(&resolver, self.settings);
        let aggregations = AggregationCompiler::new(&resolver, self.settings, self.registry);

        let query = clauses.compile(&search.wheres)?;
        let query = if search.filters.is_empty() {
            query
        } else {
            let filter = clauses.compile(&search.filters)?;
            let must = if query.is_match_all() {
                Vec::new()
            } else {
                vec![query.into_value()]
            };
            CompiledQuery::Bool(BoolGroup {
                must,
                filter: vec![filter.into_value()],
                ..BoolGroup::default()
            })
        };

        let post_filter = if search.post_filters.is_empty() {
            None
        } else {
            Some(clauses.compile(&search.post_filters)?)
        };

        let mut aggs = aggregations.compile(&search.aggregations)?;
        if let Some(distinct) = &search.distinct {
            for (key, level) in aggregations.compile_distinct(distinct)? {
                if aggs.contains_key(&key) {
                    return Err(DslError::InvalidDescriptor(format!(
                        "distinct field '{}' collides with an aggregation key",
                        key
                    )));
                }
                aggs.insert(key, level);
            }
        }

        let sort = orders.merge_sorts(orders.compile_orders(&search.orders)?, &search.sorts)?;
        let highlight = search
            .highlight
            .as_ref()
            .map(|request| orders.compile_highlight(request));

        // distinct results live in the buckets, not the hits
        let (from, size) = if search.distinct.is_some() {
            (None, Some(0))
        } else {
            (search.offset, search.limit)
        };

        debug!(
            index = resolver.index(),
            wheres = search.wheres.len(),
            aggregations = aggs.len(),
            "compiled search request"
        );

        Ok(CompiledRequest {
            query,
            post_filter,
            aggs,
            sort,
            highlight,
            from,
            size,
            source: search.source.clone(),
        })
    }
}
