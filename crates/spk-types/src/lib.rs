//! Foundation types for the spk object model.
//!
//! This crate provides the identity and structural types shared by every
//! other `spk` crate: content-addressed ids, the typed form of property name
//! markers, reference stubs and closures.
//!
//! # Key Types
//!
//! - [`ObjectId`]: 128-bit content hash of a traversed object
//! - [`PropertyDirective`]: parsed property name (`_`, `@`, `@@`, `@(N)`, `@()`)
//! - [`Closure`]: detached descendants with their minimum depth
//! - [`Reference`]: lightweight stub that replaces a detached value
//! - [`ObjectReference`]: reusable handle to an object sent by a prior call
//! - [`DataChunk`]: synthetic holder of one slice of a chunked array
//! - [`Base`]: builder for base objects

pub mod base;
pub mod closure;
pub mod directive;
pub mod error;
pub mod object;
pub mod reference;

pub use base::{Base, DataChunk};
pub use closure::Closure;
pub use directive::{ChunkSize, PropertyDirective};
pub use error::TypeError;
pub use object::ObjectId;
pub use reference::{ObjectReference, Reference};
