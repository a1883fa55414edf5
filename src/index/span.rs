//! CharSpan - half-open character range
//!
//! Offsets count Unicode scalar values, not bytes. The same type is used for
//! original and transformed coordinates; which space a span lives in is
//! carried by the field or method that holds it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open `[start, end)` range of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CharSpan {
    /// First character offset (inclusive)
    pub start: usize,
    /// One past the last character offset (exclusive)
    pub end: usize,
}

impl CharSpan {
    /// Create a new span. Inverted spans are representable and rejected by
    /// the operations that consume them.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a zero-length span positioned at `offset`
    #[inline]
    pub const fn at(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    /// Number of characters covered
    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `offset` falls inside the span
    #[inline]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Whether `other` lies entirely inside this span
    #[inline]
    pub const fn contains_span(&self, other: &CharSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether two non-empty spans share at least one character.
    /// Zero-length spans never overlap anything.
    #[inline]
    pub const fn overlaps(&self, other: &CharSpan) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Intersection test that also gives zero-length spans a position:
    /// an empty span at `p` intersects any span containing `p`, and two
    /// empty spans intersect when they sit at the same offset.
    pub const fn intersects(&self, other: &CharSpan) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (false, false) => self.overlaps(other),
            (true, false) => other.contains(self.start),
            (false, true) => self.contains(other.start),
            (true, true) => self.start == other.start,
        }
    }
}

impl fmt::Display for CharSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
