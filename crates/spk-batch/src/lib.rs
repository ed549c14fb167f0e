//! Transmission batches for spk.
//!
//! A serialize call leaves its objects in an object store; this crate turns
//! them into JSON array texts no larger than a byte limit, in store order so
//! children precede the objects that reference them.
//!
//! - **BatchWriter**: greedy, size-bounded grouping
//! - **parse_batch**: splits a batch back into verified objects

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{BatchError, BatchResult};
pub use reader::parse_batch;
pub use writer::{write_batches, Batch, BatchWriter, DEFAULT_MAX_BATCH_BYTES};
