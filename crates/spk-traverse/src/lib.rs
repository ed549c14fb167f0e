//! Object graph traversal for spk.
//!
//! Walks a base object graph depth-first and turns it into traversed objects:
//! primitives are copied, `@`-marked values are detached into their own
//! stored objects and replaced by references, `@(N)`-marked arrays are split
//! into detached data chunks, and every object gets a content id and a
//! closure of the detached descendants below it.
//!
//! # Architecture
//!
//! - **TraversalContext**: lineage, detach lineage and family tree of one call
//! - **plan**: per-property decisions shared by both strategies
//! - **Recursive** / **work stack**: the two interchangeable walkers
//! - **ObjectFrame**: closure, hashing and storage when an object closes

pub mod chunk;
pub mod config;
pub mod context;
pub mod error;
mod frame;
mod plan;
mod recursive;
pub mod traverser;
mod work_stack;

pub use chunk::split_chunks;
pub use config::{TraversalStrategy, TraverseConfig};
pub use context::TraversalContext;
pub use error::{TraverseError, TraverseResult};
pub use traverser::Traverser;
