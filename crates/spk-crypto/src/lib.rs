//! Hashing primitives for the spk object model.
//!
//! Provides domain-separated BLAKE3 content hashing over a canonical JSON
//! encoding of traversed objects, and the random tokens that identify
//! traversal frames.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod hasher;
pub mod token;

pub use hasher::{canonical_text, ContentHasher, HasherError};
pub use token::LineageToken;
