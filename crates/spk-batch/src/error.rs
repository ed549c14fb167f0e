use spk_store::StoreError;
use spk_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch limit: {0} bytes")]
    InvalidLimit(usize),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed batch: {0}")]
    Malformed(String),

    #[error("batch object {id} does not hash to its id (computed {computed})")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BatchResult<T> = Result<T, BatchError>;
