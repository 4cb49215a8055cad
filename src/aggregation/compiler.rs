//! Aggregation compiler
//!
//! Dispatches each descriptor through the registry and nests compiled
//! sub-aggregations under `aggs`. Distinct / group-by requests become one
//! `terms` level per field with the metrics at the innermost level.

use super::descriptor::{
    AggregationArgs, AggregationDescriptor, DateHistogramArgs, DistinctSpec, IntervalKind,
};
use super::registry::AggregationRegistry;
use crate::config::CompilerSettings;
use crate::error::DslError;
use crate::query::clause::ClauseCompiler;
use crate::query::date::to_epoch_millis;
use crate::query::descriptor::OrderSpec;
use crate::query::nodes;
use crate::query::resolver::FieldResolver;
use crate::query::types::Options;
use crate::Result;
use serde_json::{Map, Value};
use tracing::trace;

/// Intervals only expressible as calendar units
const CALENDAR_INTERVALS: &[&str] = &[
    "minute", "1m", "hour", "1h", "day", "1d", "week", "1w", "month", "1M", "quarter", "1q",
    "year", "1y",
];

/// Pseudo-column ordering distinct buckets by document count
const COUNT_COLUMN: &str = "_count";

/// Interval flavour a date histogram interval needs
pub fn interval_kind(interval: &str) -> IntervalKind {
    if CALENDAR_INTERVALS.contains(&interval) {
        IntervalKind::Calendar
    } else {
        IntervalKind::Fixed
    }
}

pub struct AggregationCompiler<'a> {
    resolver: &'a FieldResolver,
    settings: &'a CompilerSettings,
    registry: &'a AggregationRegistry,
}

impl<'a> AggregationCompiler<'a> {
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

    pub fn resolver(&self) -> &FieldResolver {
        self.resolver
    }

    pub fn settings(&self) -> &CompilerSettings {
        self.settings
    }

    /// Compile sibling aggregations into a `name -> fragment` map
    pub fn compile(&self, aggregations: &[AggregationDescriptor]) -> Result<Map<String, Value>> {
        let mut compiled = Map::new();
        for desc in aggregations {
            if compiled.contains_key(&desc.key) {
                return Err(DslError::InvalidDescriptor(format!(
                    "duplicate aggregation key '{}'",
                    desc.key
                )));
            }
            let fragment = self.compile_one(desc)?;
            compiled.insert(desc.key.clone(), fragment);
        }
        Ok(compiled)
    }

    /// Compile one aggregation including its sub-aggregations
    pub fn compile_one(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let compiler = self
            .registry
            .get(&desc.agg_type)
            .ok_or_else(|| DslError::UnsupportedAggregation(desc.agg_type.clone()))?;

        if !desc.sub_aggregations.is_empty() && self.registry.is_metric(&desc.agg_type) {
            return Err(DslError::InvalidDescriptor(format!(
                "metric aggregation '{}' ({}) cannot have sub-aggregations",
                desc.key, desc.agg_type
            )));
        }

        let mut fragment = compiler(self, desc)?;

        if !desc.sub_aggregations.is_empty() {
            let subs = self.compile(&desc.sub_aggregations)?;
            let body = fragment.as_object_mut().ok_or_else(|| {
                DslError::InvalidDescriptor(format!(
                    "aggregation '{}' did not compile to an object",
                    desc.key
                ))
            })?;
            body.insert("aggs".to_string(), Value::Object(subs));
        }

        trace!(key = %desc.key, agg_type = %desc.agg_type, "compiled aggregation");
        Ok(fragment)
    }

    /// Compile a distinct / group-by request
    ///
    /// Produces one `terms` level per field, keyed by the field name, with the
    /// metrics under the innermost level's `aggs`.
    pub fn compile_distinct(&self, spec: &DistinctSpec) -> Result<Map<String, Value>> {
        if spec.fields.is_empty() {
            return Err(DslError::InvalidDescriptor(
                "distinct needs at least one field".to_string(),
            ));
        }
        if let Some(bucket) = spec
            .metrics
            .iter()
            .find(|metric| !self.registry.is_metric(&metric.agg_type))
        {
            return Err(DslError::InvalidDescriptor(format!(
                "distinct metric '{}' is a '{}' aggregation",
                bucket.key, bucket.agg_type
            )));
        }

        let size = spec.size.unwrap_or(self.settings.default_distinct_size);
        let metrics = self.compile(&spec.metrics)?;
        let mut inner = if metrics.is_empty() { None } else { Some(metrics) };

        for field in spec.fields.iter().rev() {
            let resolved = self.resolver.resolve(field)?;
            let mut options = Options::new();
            if let Some(order) = level_order(field, &spec.orders) {
                options.insert("order".to_string(), order);
            }

            let mut level = nodes::terms_agg(&resolved, size, &options);
            if let (Some(children), Some(body)) = (inner.take(), level.as_object_mut()) {
                body.insert("aggs".to_string(), Value::Object(children));
            }

            let mut wrapper = Map::new();
            wrapper.insert(field.clone(), level);
            inner = Some(wrapper);
        }

        Ok(inner.unwrap_or_default())
    }

    fn resolved_field(&self, desc: &AggregationDescriptor) -> Result<String> {
        match &desc.args {
            AggregationArgs::Field(field) => self.resolver.resolve(field),
            _ => Err(requires(desc, "a field")),
        }
    }

    pub(crate) fn compile_simple_metric(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let field = match &desc.args {
            AggregationArgs::Field(field) => Some(self.resolver.resolve(field)?),
            AggregationArgs::None if desc.options.contains_key("script") => None,
            _ => return Err(requires(desc, "a field or a script")),
        };
        Ok(nodes::metric(&desc.agg_type, field.as_deref(), &desc.options))
    }

    pub(crate) fn compile_count(&self, desc: &AggregationDescriptor) -> Result<Value> {
        Ok(nodes::null_safe_value_count(&self.resolved_field(desc)?))
    }

    pub(crate) fn compile_top_hits(&self, desc: &AggregationDescriptor) -> Result<Value> {
        Ok(nodes::top_hits(&desc.options))
    }

    pub(crate) fn compile_terms(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let field = self.resolved_field(desc)?;
        Ok(nodes::terms_agg(
            &field,
            self.settings.default_terms_size,
            &desc.options,
        ))
    }

    pub(crate) fn compile_date_histogram(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let DateHistogramArgs {
            field,
            interval,
            interval_kind: kind,
            extended_bounds,
        } = match &desc.args {
            AggregationArgs::DateHistogram(args) => args,
            _ => return Err(requires(desc, "date histogram arguments")),
        };

        let interval_key = match kind.unwrap_or_else(|| interval_kind(interval)) {
            IntervalKind::Calendar => "calendar_interval",
            IntervalKind::Fixed => "fixed_interval",
        };
        let bounds = extended_bounds
            .as_ref()
            .map(|[min, max]| -> Result<(i64, i64)> {
                Ok((to_epoch_millis(min)?, to_epoch_millis(max)?))
            })
            .transpose()?;

        let field = self.resolver.resolve(field)?;
        Ok(nodes::date_histogram(
            &field,
            interval_key,
            interval,
            bounds,
            &desc.options,
        ))
    }

    pub(crate) fn compile_histogram(&self, desc: &AggregationDescriptor) -> Result<Value> {
        if !desc.options.contains_key("interval") {
            return Err(requires(desc, "an 'interval' option"));
        }
        Ok(nodes::histogram(&self.resolved_field(desc)?, &desc.options))
    }

    pub(crate) fn compile_filter(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let clauses = match &desc.args {
            AggregationArgs::Filter(clauses) => clauses,
            _ => return Err(requires(desc, "filter clauses")),
        };
        let query = ClauseCompiler::new(self.resolver, self.settings).compile(clauses)?;
        Ok(nodes::filter_agg(query.into_value()))
    }

    pub(crate) fn compile_nested(&self, desc: &AggregationDescriptor) -> Result<Value> {
        match &desc.args {
            AggregationArgs::Path(path) => Ok(nodes::nested_agg(path)),
            _ => Err(requires(desc, "a nested path")),
        }
    }

    pub(crate) fn compile_reverse_nested(&self, desc: &AggregationDescriptor) -> Result<Value> {
        match &desc.args {
            AggregationArgs::Path(path) => Ok(nodes::reverse_nested_agg(Some(path))),
            AggregationArgs::None => Ok(nodes::reverse_nested_agg(None)),
            _ => Err(requires(desc, "a path or no arguments")),
        }
    }

    pub(crate) fn compile_composite(&self, desc: &AggregationDescriptor) -> Result<Value> {
        let fields = match &desc.args {
            AggregationArgs::Fields(fields) if !fields.is_empty() => fields,
            _ => return Err(requires(desc, "at least one source field")),
        };
        let sources = fields
            .iter()
            .map(|field| Ok((field.clone(), self.resolver.resolve(field)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(nodes::composite(&sources, &desc.options))
    }

    /// `range` and `date_range`
    pub(crate) fn compile_range(&self, desc: &AggregationDescriptor) -> Result<Value> {
        match &desc.args {
            AggregationArgs::Ranges { field, ranges } if !ranges.is_empty() => {
                let field = self.resolver.resolve(field)?;
                Ok(nodes::range_agg(&desc.agg_type, &field, ranges, &desc.options))
            }
            _ => Err(requires(desc, "a field and at least one range")),
        }
    }

    pub(crate) fn compile_missing(&self, desc: &AggregationDescriptor) -> Result<Value> {
        Ok(nodes::missing_agg(&self.resolved_field(desc)?))
    }

    pub(crate) fn compile_raw(&self, desc: &AggregationDescriptor) -> Result<Value> {
        match &desc.args {
            AggregationArgs::Raw(body) => Ok(body.clone()),
            _ => Err(requires(desc, "a raw body")),
        }
    }
}

fn requires(desc: &AggregationDescriptor, what: &str) -> DslError {
    DslError::InvalidDescriptor(format!(
        "aggregation '{}' ({}) requires {}",
        desc.key, desc.agg_type, what
    ))
}

/// Bucket order of one distinct level: by key when that field is ordered, else by count
fn level_order(field: &str, orders: &[OrderSpec]) -> Option<Value> {
    let entry = |key: &str, order: &OrderSpec| {
        let mut map = Map::new();
        map.insert(key.to_string(), Value::from(order.direction.as_str()));
        Value::Object(map)
    };

    if let Some(order) = orders.iter().find(|order| order.column == field) {
        return Some(entry("_key", order));
    }
    orders
        .iter()
        .find(|order| order.column == COUNT_COLUMN)
        .map(|order| entry("_count", order))
}
