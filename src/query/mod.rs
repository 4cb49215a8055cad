//! Query compilation
//!
//! This module turns query-builder descriptors into Elasticsearch-style DSL:
//! - Boolean clause composition (`must`, `must_not`, `should`, `filter`)
//! - Leaf queries (term, terms, range, match, wildcard, geo, ...)
//! - Nested and parent/child scopes
//! - Sort, highlight and inner hits fragments
//! - Full request assembly
//!
//! # Example
//!
//! A where list `[status = 1, or title like "rust%"]` compiles to:
//!
//! ```json
//! {
//!   "bool": {
//!     "should": [
//!       { "term": { "status": 1 } },
//!       { "wildcard": { "title.keyword": { "value": "rust*" } } }
//!     ]
//!   }
//! }
//! ```

pub mod clause;
pub mod compiled;
pub mod date;
pub mod descriptor;
pub mod nodes;
pub mod order;
pub mod request;
pub mod resolver;
pub mod types;

pub use clause::ClauseCompiler;
pub use compiled::{BoolGroup, CompiledQuery};
pub use descriptor::{
    AdHocSort, ClauseDescriptor, ClauseKind, HighlightField, HighlightRequest, OrderKind, OrderSpec,
};
pub use order::OrderCompiler;
pub use request::{CompiledRequest, RequestCompiler, SearchDescriptor};
pub use resolver::{FieldResolver, MappingCache};
pub use types::*;
