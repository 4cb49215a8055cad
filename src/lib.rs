pub mod aggregation;
pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod session;

pub use aggregation::{
    AggregationArgs, AggregationCompiler, AggregationDescriptor, AggregationRegistry, DistinctSpec,
};
pub use config::{CompilerSettings, SettingsProfile};
pub use error::{DslError, Result};
pub use query::{
    AdHocSort, ClauseDescriptor, ClauseKind, Combinator, CompiledQuery, CompiledRequest,
    Direction, FieldResolver, GeoPoint, HighlightRequest, MappingCache, Operator, OrderSpec,
    SearchDescriptor,
};
pub use schema::{FieldMap, FieldType, IndexMapping, MappingProvider, StaticMappingProvider};
pub use session::CompileSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
