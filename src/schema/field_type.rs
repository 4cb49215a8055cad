//! Field type definitions
//!
//! Declared engine types as they appear in an index mapping, and the query
//! capabilities each one implies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared field data type
///
/// Determines whether a field can be used for exact match, sorting and aggregations
/// or only for full-text queries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Analyzed full-text field
    ///
    /// Text fields are tokenized before indexing and cannot be sorted or
    /// aggregated on directly.
    Text,
    /// Match-only text, same restrictions as `Text`
    MatchOnlyText,
    /// Exact match keyword field
    Keyword,
    ConstantKeyword,
    Wildcard,
    Long,
    Integer,
    Short,
    Byte,
    Double,
    Float,
    HalfFloat,
    ScaledFloat,
    UnsignedLong,
    Boolean,
    Date,
    DateNanos,
    Ip,
    Binary,
    GeoPoint,
    GeoShape,
    /// Object container, sub-fields carry the data
    Object,
    /// Nested document container
    Nested,
    Flattened,
    /// Any type this crate has no special handling for
    Other(String),
}

impl FieldType {
    /// Parse a declared type name from a mapping
    pub fn from_declared(name: &str) -> Self {
        match name {
            "text" => FieldType::Text,
            "match_only_text" => FieldType::MatchOnlyText,
            "keyword" => FieldType::Keyword,
            "constant_keyword" => FieldType::ConstantKeyword,
            "wildcard" => FieldType::Wildcard,
            "long" => FieldType::Long,
            "integer" => FieldType::Integer,
            "short" => FieldType::Short,
            "byte" => FieldType::Byte,
            "double" => FieldType::Double,
            "float" => FieldType::Float,
            "half_float" => FieldType::HalfFloat,
            "scaled_float" => FieldType::ScaledFloat,
            "unsigned_long" => FieldType::UnsignedLong,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "date_nanos" => FieldType::DateNanos,
            "ip" => FieldType::Ip,
            "binary" => FieldType::Binary,
            "geo_point" => FieldType::GeoPoint,
            "geo_shape" => FieldType::GeoShape,
            "object" => FieldType::Object,
            "nested" => FieldType::Nested,
            "flattened" => FieldType::Flattened,
            other => FieldType::Other(other.to_string()),
        }
    }

    /// Get the declared type name
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::MatchOnlyText => "match_only_text",
            FieldType::Keyword => "keyword",
            FieldType::ConstantKeyword => "constant_keyword",
            FieldType::Wildcard => "wildcard",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::HalfFloat => "half_float",
            FieldType::ScaledFloat => "scaled_float",
            FieldType::UnsignedLong => "unsigned_long",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateNanos => "date_nanos",
            FieldType::Ip => "ip",
            FieldType::Binary => "binary",
            FieldType::GeoPoint => "geo_point",
            FieldType::GeoShape => "geo_shape",
            FieldType::Object => "object",
            FieldType::Nested => "nested",
            FieldType::Flattened => "flattened",
            FieldType::Other(name) => name,
        }
    }

    /// Check if this is an analyzed (free-text) type
    ///
    /// Binary is grouped here since it cannot be matched exactly either.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::MatchOnlyText | FieldType::Binary
        )
    }

    /// Check if this type only groups sub-fields
    pub fn is_container(&self) -> bool {
        matches!(self, FieldType::Object | FieldType::Nested)
    }

    /// Check if this field can serve exact match, sorting and aggregations
    pub fn is_indexable(&self) -> bool {
        !self.is_free_text() && !self.is_container()
    }

    /// Check if this field type holds numeric values
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Long
                | FieldType::Integer
                | FieldType::Short
                | FieldType::Byte
                | FieldType::Double
                | FieldType::Float
                | FieldType::HalfFloat
                | FieldType::ScaledFloat
                | FieldType::UnsignedLong
        )
    }

    /// Check if this field type holds dates
    pub fn is_date(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::DateNanos)
    }

    /// Check if this field type holds geo data
    pub fn is_geo(&self) -> bool {
        matches!(self, FieldType::GeoPoint | FieldType::GeoShape)
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::from_declared(&name)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
