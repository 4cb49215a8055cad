//! Aggregation descriptors

use crate::query::descriptor::{ClauseDescriptor, OrderSpec};
use crate::query::types::Options;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One aggregation node
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationDescriptor {
    /// Output name of the bucket or metric
    pub key: String,
    #[serde(rename = "type")]
    pub agg_type: String,
    #[serde(default)]
    pub args: AggregationArgs,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_aggregations: Vec<AggregationDescriptor>,
}

/// Type-specific payload of an aggregation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationArgs {
    #[default]
    None,
    Field(String),
    /// Composite sources, one per field
    Fields(Vec<String>),
    /// Nested scope path
    Path(String),
    /// Where-clauses of a `filter` aggregation
    Filter(Vec<ClauseDescriptor>),
    Ranges {
        field: String,
        ranges: Vec<Value>,
    },
    DateHistogram(DateHistogramArgs),
    /// Body inserted verbatim
    Raw(Value),
}

/// Interval flavour of a date histogram
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalKind {
    /// Calendar-aware units: `1d`, `month`, `1y`, ...
    Calendar,
    /// Fixed durations: `30m`, `12h`, `90d`, ...
    Fixed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateHistogramArgs {
    pub field: String,
    pub interval: String,
    /// Detected from `interval` when absent
    #[serde(default)]
    pub interval_kind: Option<IntervalKind>,
    /// `[min, max]` as dates or epoch millis
    #[serde(default)]
    pub extended_bounds: Option<[Value; 2]>,
}

impl AggregationDescriptor {
    pub fn new(key: impl Into<String>, agg_type: impl Into<String>, args: AggregationArgs) -> Self {
        Self {
            key: key.into(),
            agg_type: agg_type.into(),
            args,
            options: Options::new(),
            sub_aggregations: Vec::new(),
        }
    }

    /// Aggregation over a single field
    pub fn field(key: impl Into<String>, agg_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(key, agg_type, AggregationArgs::Field(field.into()))
    }

    pub fn terms(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::field(key, "terms", field)
    }

    pub fn filter(key: impl Into<String>, clauses: Vec<ClauseDescriptor>) -> Self {
        Self::new(key, "filter", AggregationArgs::Filter(clauses))
    }

    pub fn date_histogram(
        key: impl Into<String>,
        field: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self::new(
            key,
            "date_histogram",
            AggregationArgs::DateHistogram(DateHistogramArgs {
                field: field.into(),
                interval: interval.into(),
                interval_kind: None,
                extended_bounds: None,
            }),
        )
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add a child aggregation
    pub fn with_sub(mut self, sub: AggregationDescriptor) -> Self {
        self.sub_aggregations.push(sub);
        self
    }
}

/// Distinct / group-by request over one or more fields
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistinctSpec {
    /// Grouping fields, outermost first
    pub fields: Vec<String>,
    /// Metrics computed per innermost bucket
    #[serde(default)]
    pub metrics: Vec<AggregationDescriptor>,
    /// `_count` or a grouping field; drives each level's bucket order
    #[serde(default)]
    pub orders: Vec<OrderSpec>,
    /// Buckets per level, the session default when absent
    #[serde(default)]
    pub size: Option<usize>,
}

impl DistinctSpec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, metric: AggregationDescriptor) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}
