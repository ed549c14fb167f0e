//! Content-addressed store of traversed objects.
//!
//! A serialize call fills an [`ObjectStore`] with the traversal root and every
//! detached object, keyed by content hash. The store is the only state that
//! outlives the call; callers keep it to batch objects for upload and may
//! merge stores from several calls to reuse objects across commits.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes recompute the hash and reject objects whose id does not match.
//! 3. Writing an id that is already present is a no-op.
//! 4. Iteration follows insertion order, so children precede the parents that
//!    reference them.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::TraversedObject;
pub use traits::{DanglingReference, ObjectStore};
