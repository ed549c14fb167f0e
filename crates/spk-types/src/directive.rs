//! Property name markers.
//!
//! Base objects encode per-property traversal instructions as name prefixes:
//!
//! - `_name`: excluded from traversal and hashing
//! - `id`: excluded; the traverser assigns the id
//! - `@name` or `@@name`: detach the value into its own object
//! - `@(N)name`: split a flat array into chunks of at most `N` elements and
//!   detach every chunk
//! - `@()name`: as above with the configured default chunk size
//!
//! [`PropertyDirective::parse`] turns a raw property name into its typed form
//! once, so the traverser never inspects name strings again.

use serde::{Deserialize, Serialize};

use crate::base::{ID, SPECKLE_TYPE};
use crate::error::TypeError;

/// Prefix marking a property as detached.
pub const DETACH_MARKER: char = '@';

/// Prefix marking a property as private (never traversed or hashed).
pub const IGNORE_MARKER: char = '_';

/// How large each chunk of a chunk-marked array is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkSize {
    /// `@()name`: use the traversal's configured default.
    Default,
    /// `@(N)name`: use exactly `N` elements per chunk.
    Explicit(u32),
}

impl ChunkSize {
    /// Resolve to a concrete element count.
    pub fn resolve(self, default: u32) -> u32 {
        match self {
            Self::Default => default,
            Self::Explicit(n) => n,
        }
    }
}

/// Typed form of a property name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyDirective {
    /// Property name with every marker stripped.
    pub name: String,
    /// Whether the value is stored as its own object.
    pub detach: bool,
    /// Chunking instruction, if the name carried a chunk marker.
    pub chunk: Option<ChunkSize>,
}

impl PropertyDirective {
    /// A plain property: inlined, never chunked.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detach: false,
            chunk: None,
        }
    }

    /// Parse a raw property name.
    ///
    /// Returns `Ok(None)` for properties excluded from traversal (`_`-prefixed
    /// names and `id`), whether or not they carry markers. A marker on
    /// `speckle_type` is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use spk_types::{ChunkSize, PropertyDirective};
    ///
    /// let d = PropertyDirective::parse("@(100)vertices").unwrap().unwrap();
    /// assert_eq!(d.name, "vertices");
    /// assert!(d.detach);
    /// assert_eq!(d.chunk, Some(ChunkSize::Explicit(100)));
    ///
    /// assert!(PropertyDirective::parse("_cache").unwrap().is_none());
    /// ```
    pub fn parse(raw: &str) -> Result<Option<Self>, TypeError> {
        if is_excluded(raw) {
            return Ok(None);
        }

        let Some(rest) = raw.strip_prefix(DETACH_MARKER) else {
            return Ok(Some(Self::plain(raw)));
        };
        let rest = rest.strip_prefix(DETACH_MARKER).unwrap_or(rest);

        let (chunk, name) = match rest.strip_prefix('(') {
            Some(sized) => {
                let (size, name) = sized.split_once(')').ok_or_else(|| invalid(raw, "unterminated chunk marker"))?;
                (Some(parse_chunk_size(raw, size)?), name)
            }
            None => (None, rest),
        };

        if name.is_empty() {
            return Err(invalid(raw, "property name is empty after markers"));
        }
        if is_excluded(name) {
            return Ok(None);
        }
        if name == SPECKLE_TYPE {
            return Err(invalid(raw, "speckle_type cannot carry a marker"));
        }

        Ok(Some(Self {
            name: name.to_string(),
            detach: true,
            chunk,
        }))
    }
}

fn is_excluded(name: &str) -> bool {
    name.starts_with(IGNORE_MARKER) || name == ID
}

fn parse_chunk_size(raw: &str, size: &str) -> Result<ChunkSize, TypeError> {
    if size.is_empty() {
        return Ok(ChunkSize::Default);
    }
    if !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(raw, &format!("chunk size {size:?} is not a number")));
    }
    match size.parse::<u32>() {
        Ok(0) => Err(invalid(raw, "chunk size must be positive")),
        Ok(n) => Ok(ChunkSize::Explicit(n)),
        Err(e) => Err(invalid(raw, &e.to_string())),
    }
}

fn invalid(raw: &str, reason: &str) -> TypeError {
    TypeError::InvalidDirective {
        property: raw.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> PropertyDirective {
        PropertyDirective::parse(raw).unwrap().unwrap()
    }

    #[test]
    fn plain_property() {
        assert_eq!(parse("name"), PropertyDirective::plain("name"));
    }

    #[test]
    fn ignored_properties() {
        assert!(PropertyDirective::parse("_private").unwrap().is_none());
        assert!(PropertyDirective::parse("__closure").unwrap().is_none());
        assert!(PropertyDirective::parse("id").unwrap().is_none());
    }

    #[test]
    fn id_lookalikes_are_plain() {
        assert_eq!(parse("ids").name, "ids");
        assert_eq!(parse("applicationId").name, "applicationId");
    }

    #[test]
    fn detach_marker() {
        let d = parse("@child");
        assert_eq!(d.name, "child");
        assert!(d.detach);
        assert!(d.chunk.is_none());
    }

    #[test]
    fn dynamic_detach_marker() {
        let d = parse("@@layer");
        assert_eq!(d.name, "layer");
        assert!(d.detach);
        assert!(d.chunk.is_none());
    }

    #[test]
    fn explicit_chunk_marker() {
        let d = parse("@(31250)faces");
        assert_eq!(d.name, "faces");
        assert!(d.detach);
        assert_eq!(d.chunk, Some(ChunkSize::Explicit(31250)));
    }

    #[test]
    fn default_chunk_marker() {
        let d = parse("@()vertices");
        assert_eq!(d.name, "vertices");
        assert_eq!(d.chunk, Some(ChunkSize::Default));
        assert_eq!(d.chunk.unwrap().resolve(1000), 1000);
    }

    #[test]
    fn explicit_size_wins_over_default() {
        assert_eq!(ChunkSize::Explicit(7).resolve(1000), 7);
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let err = PropertyDirective::parse("@(0)faces").unwrap_err();
        assert!(matches!(err, TypeError::InvalidDirective { .. }));
    }

    #[test]
    fn non_numeric_chunk_size_rejected() {
        assert!(PropertyDirective::parse("@(ten)faces").is_err());
        assert!(PropertyDirective::parse("@(-1)faces").is_err());
    }

    #[test]
    fn unterminated_chunk_marker_rejected() {
        assert!(PropertyDirective::parse("@(12faces").is_err());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(PropertyDirective::parse("@").is_err());
        assert!(PropertyDirective::parse("@@").is_err());
        assert!(PropertyDirective::parse("@(5)").is_err());
    }

    #[test]
    fn markers_do_not_unhide_excluded_names() {
        for raw in ["@__closure", "@_x", "@@_cache", "@(10)_points", "@id", "@@id", "@()id"] {
            assert!(PropertyDirective::parse(raw).unwrap().is_none(), "{raw} should be excluded");
        }
    }

    #[test]
    fn marker_on_speckle_type_rejected() {
        for raw in ["@speckle_type", "@@speckle_type", "@(2)speckle_type"] {
            let err = PropertyDirective::parse(raw).unwrap_err();
            assert!(matches!(err, TypeError::InvalidDirective { .. }), "{raw} should be rejected");
        }
    }

    #[test]
    fn at_sign_inside_name_is_literal() {
        let d = parse("user@host");
        assert_eq!(d.name, "user@host");
        assert!(!d.detach);
    }
}
