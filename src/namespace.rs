//! Namespace - Hierarchical Memory Scoping
//!
//! `TigerStyle`: Namespaces are validated at construction; stores never
//! see a blank segment.
//!
//! A namespace is an ordered list of non-empty segments that scopes every
//! long-term record. Stores treat namespaces as opaque exact-match keys:
//! `user/alice` never matches `user/alice/work`. Callers that want subtree
//! queries fan out explicitly using [`Namespace::starts_with`].

use serde::{Deserialize, Serialize};

use crate::constants::{NAMESPACE_SEGMENTS_COUNT_MAX, NAMESPACE_SEGMENT_BYTES_MAX};

/// Path delimiter for string round-trips.
const DELIMITER: char = '/';

/// Sentinel segment for the shared global scope.
const GLOBAL_SEGMENT: &str = "__global__";

// =============================================================================
// Namespace
// =============================================================================

/// Hierarchical scope for memory records.
///
/// # Example
///
/// ```rust
/// use engram::Namespace;
///
/// let ns = Namespace::of(["org-abc", "user-123"]);
/// assert_eq!(ns.to_path(), "org-abc/user-123");
/// assert_eq!(Namespace::from_path("org-abc/user-123"), ns);
/// assert!(ns.starts_with(&Namespace::of(["org-abc"])));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    segments: Vec<String>,
}

impl Namespace {
    /// Create a namespace from segments.
    ///
    /// An empty segment list yields the global namespace.
    ///
    /// # Panics
    /// Panics if any segment is blank or oversized, or if there are too
    /// many segments.
    #[must_use]
    pub fn of<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Self::global();
        }

        // Preconditions
        assert!(
            segments.len() <= NAMESPACE_SEGMENTS_COUNT_MAX,
            "namespace must have <= {NAMESPACE_SEGMENTS_COUNT_MAX} segments"
        );
        for segment in &segments {
            assert!(!segment.trim().is_empty(), "namespace segments cannot be blank");
            assert!(
                segment.len() <= NAMESPACE_SEGMENT_BYTES_MAX,
                "namespace segment must be <= {NAMESPACE_SEGMENT_BYTES_MAX} bytes"
            );
        }

        Self { segments }
    }

    /// Get the global shared namespace.
    #[must_use]
    pub fn global() -> Self {
        Self {
            segments: vec![GLOBAL_SEGMENT.to_string()],
        }
    }

    /// Create a user-scoped namespace (`user/<id>`).
    #[must_use]
    pub fn for_user(user_id: &str) -> Self {
        Self::of(["user", user_id])
    }

    /// Create a session-scoped namespace (`session/<id>`).
    #[must_use]
    pub fn for_session(session_id: &str) -> Self {
        Self::of(["session", session_id])
    }

    /// Parse a namespace from a `/`-joined path.
    ///
    /// A blank path yields the global namespace.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        if path.trim().is_empty() {
            return Self::global();
        }
        Self::of(path.split(DELIMITER))
    }

    /// Render as a `/`-joined path. Round-trips through [`Self::from_path`].
    #[must_use]
    pub fn to_path(&self) -> String {
        self.segments.join("/")
    }

    /// All segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment (usually the top-level identifier).
    #[must_use]
    pub fn first(&self) -> &str {
        // Invariant: segments is never empty
        &self.segments[0]
    }

    /// The last segment (usually the most specific identifier).
    #[must_use]
    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Number of levels in the hierarchy.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Check whether this is the global namespace.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == GLOBAL_SEGMENT
    }

    /// Create a child namespace by appending one segment.
    ///
    /// # Panics
    /// Panics if the segment is blank.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self::of(segments)
    }

    /// Parent namespace (all segments except the last), or global at root.
    #[must_use]
    pub fn parent(&self) -> Self {
        if self.segments.len() <= 1 {
            return Self::global();
        }
        Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Check whether this namespace starts with the given prefix.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        if prefix.segments.len() > self.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&prefix.segments)
            .all(|(a, b)| a == b)
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

// =============================================================================
// Tests
// =============================================================================
