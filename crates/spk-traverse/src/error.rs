use spk_crypto::HasherError;
use spk_store::StoreError;
use spk_types::TypeError;

/// Errors from object graph traversal.
///
/// Any error aborts the whole serialize call; objects already written to the
/// store by that call must not be treated as a valid result.
#[derive(Debug, thiserror::Error)]
pub enum TraverseError {
    /// The traversal root is not a map with a string `speckle_type`.
    #[error("root is not a base object: {0}")]
    NotABaseObject(String),

    /// A value the object model cannot represent.
    #[error("unsupported value in property {property:?}: {kind}")]
    UnsupportedValue { property: String, kind: String },

    /// A property name with a malformed marker.
    #[error("invalid property: {0}")]
    Directive(#[from] TypeError),

    /// A `reference`-typed map without a usable target.
    #[error("malformed reference in property {property:?}: {source}")]
    MalformedReference {
        property: String,
        #[source]
        source: TypeError,
    },

    /// Nesting deeper than the configured guard.
    #[error("nesting depth {depth} exceeds the limit of {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// Configuration that cannot drive a traversal.
    #[error("invalid traversal config: {0}")]
    InvalidConfig(String),

    /// Lineage, detach-lineage or family-tree state out of step.
    #[error("traversal bookkeeping error: {0}")]
    Bookkeeping(String),

    #[error("hash error: {0}")]
    Hash(#[from] HasherError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for traversal operations.
pub type TraverseResult<T> = Result<T, TraverseError>;
