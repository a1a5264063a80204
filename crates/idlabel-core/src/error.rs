//! Error types for idlabel-core
//!
//! Provides error handling for:
//! - Identifier parsing (canonical 12-digit form)
//! - Mapping validation at the import boundary
//! - Store operations

/// Errors parsing a canonical identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// Input is not exactly 12 ASCII digits
    #[error("identifier must be exactly 12 digits, got '{0}'")]
    NotCanonical(String),
}

/// Errors validating a label mapping
///
/// Raised at the boundary where a mapping enters the system (import, set).
/// Never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Payload is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Payload (or its `aliases` member) is not a JSON object
    #[error("expected a JSON object of identifier to label, got {0}")]
    NotAnObject(&'static str),

    /// A key is not a canonical 12-digit identifier
    #[error("invalid identifier key '{key}': must be exactly 12 digits")]
    InvalidKey {
        /// Offending key
        key: String,
    },

    /// A label value is empty or not a string
    #[error("invalid label for '{key}': {reason}")]
    InvalidLabel {
        /// Identifier the label belongs to
        key: String,
        /// Why the value was rejected
        reason: &'static str,
    },
}

/// Errors from a label store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Import or set payload failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Export serialization failed
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Backend unavailable or failed
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = ValidationError::InvalidKey {
            key: "1234".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid identifier key '1234': must be exactly 12 digits"
        );
    }

    #[test]
    fn store_error_from_validation() {
        let err: StoreError = ValidationError::NotAnObject("array").into();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(err.to_string().contains("array"));
    }
}
