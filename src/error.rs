use thiserror::Error;

/// Main error type for DSL compilation
#[derive(Error, Debug)]
pub enum DslError {
    #[error("Field '{field}' has no exact-match counterpart in index '{index}'")]
    FieldResolution { field: String, index: String },

    #[error("Unsupported clause kind: {0}")]
    UnsupportedClause(String),

    #[error("Unsupported aggregation type: {0}")]
    UnsupportedAggregation(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Malformed relationship clause: {0}")]
    MalformedRelationship(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid date value: {0}")]
    InvalidDate(String),

    #[error("Mapping lookup failed for index '{index}': {reason}")]
    MappingLookup { index: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for compilation
pub type Result<T> = std::result::Result<T, DslError>;

impl DslError {
    /// The field name a resolution error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            DslError::FieldResolution { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Check if this error comes from a malformed descriptor rather than the index mapping
    ///
    /// Caller errors are programming errors in the layer that builds descriptors and
    /// will fail the same way every time.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DslError::UnsupportedClause(_)
                | DslError::UnsupportedAggregation(_)
                | DslError::UnsupportedOperator(_)
                | DslError::MalformedRelationship(_)
                | DslError::InvalidDescriptor(_)
                | DslError::InvalidDate(_)
        )
    }
}
