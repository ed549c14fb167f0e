//! High-level SDK for spk.
//!
//! [`Serializer`] is the entry point for applications: it traverses base
//! object graphs, accumulates the resulting objects across calls, and cuts
//! them into transmission batches.

pub mod config;
pub mod error;
pub mod serializer;

pub use config::SerializerConfig;
pub use error::{SdkError, SdkResult};
pub use serializer::Serializer;

// Re-export key types
pub use spk_batch::{Batch, DEFAULT_MAX_BATCH_BYTES};
pub use spk_store::{InMemoryObjectStore, ObjectStore, TraversedObject};
pub use spk_traverse::{TraversalStrategy, TraverseConfig};
pub use spk_types::{Base, Closure, ObjectId, ObjectReference};
