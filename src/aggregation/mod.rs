//! Aggregation compilation
//!
//! This module provides:
//! - Aggregation descriptors and distinct / group-by requests
//! - The type registry mapping type tags to compiler functions
//! - The recursive aggregation compiler
//! - Reshaping of aggregation responses into rows

mod compiler;
mod descriptor;
mod registry;
mod reshape;

pub use compiler::{interval_kind, AggregationCompiler};
pub use descriptor::{
    AggregationArgs, AggregationDescriptor, DateHistogramArgs, DistinctSpec, IntervalKind,
};
pub use registry::{AggregationFn, AggregationRegistry, SIMPLE_METRICS};
pub use reshape::{extract_metrics, flatten_distinct, COUNT_KEY};
