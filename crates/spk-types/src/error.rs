use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid property directive {property:?}: {reason}")]
    InvalidDirective { property: String, reason: String },

    #[error("malformed reference: {0}")]
    MalformedReference(String),
}
