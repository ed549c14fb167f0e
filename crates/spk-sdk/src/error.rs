use spk_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("traversal error: {0}")]
    Traverse(#[from] spk_traverse::TraverseError),

    #[error("batch error: {0}")]
    Batch(#[from] spk_batch::BatchError),

    #[error("store error: {0}")]
    Store(#[from] spk_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
