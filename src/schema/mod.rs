//! Schema and field type system
//!
//! This module defines:
//! - Declared field types (text, keyword, long, date, ...)
//! - Index mappings and their flattened dotted-path form
//! - The mapping provider contract used by the field resolver

mod field_type;
mod mapping;
mod provider;

pub use field_type::FieldType;
pub use mapping::{FieldMap, FieldMapping, IndexMapping};
pub use provider::{MappingProvider, StaticMappingProvider};
