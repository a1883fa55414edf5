//! Span Attribute Index
//!
//! Attribute sets keyed by original character span. Spans are recorded in
//! whatever order the caller closes them and read back in start order, or
//! projected onto transformed coordinates through a `StringTransformation`.

use super::span::CharSpan;
use crate::error::{EditError, OverlapError};
use crate::transform::StringTransformation;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Attribute name to value, sorted by name
pub type Attributes = BTreeMap<String, String>;

/// Attributes of one markup element, positioned on its original content span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpan {
    pub span: CharSpan,
    /// Nesting depth of the element, root element at 1
    pub depth: usize,
    pub tag_name: String,
    pub attributes: Attributes,
}

/// An attribute span re-expressed in transformed coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedSpan {
    pub transformed: CharSpan,
    /// Where the span came from, kept for audit
    pub original: CharSpan,
    pub depth: usize,
    pub tag_name: String,
    pub attributes: Attributes,
}

/// Per-depth lookup used for overlap checks
#[derive(Debug, Clone, Default)]
struct DepthLevel {
    /// (start, insertion sequence)
    by_start: BTreeSet<(usize, usize)>,
    /// Longest span recorded at this depth, bounds the backwards scan
    max_len: usize,
}

/// Original-coordinate index of attribute spans.
#[derive(Debug, Clone, Default)]
pub struct SpanAttributeIndex {
    /// Insertion order; the position is the insertion sequence number
    spans: Vec<AttributeSpan>,
    by_start: BTreeSet<(usize, usize)>,
    depths: HashMap<usize, DepthLevel>,
}

impl SpanAttributeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the attributes of a tag over `span`.
    ///
    /// Nested tags over the same text are fine because they sit at different
    /// depths.
    ///
    /// # Errors
    ///
    /// `OverlapError` if `span` overlaps a span already recorded at the same
    /// depth under a different tag name.
    pub fn record(
        &mut self,
        span: CharSpan,
        depth: usize,
        tag_name: impl Into<String>,
        attributes: Attributes,
    ) -> Result<(), OverlapError> {
        let tag_name = tag_name.into();

        if let Some(level) = self.depths.get(&depth) {
            if let Some(existing) = self.find_conflict(level, span, &tag_name) {
                return Err(OverlapError {
                    span,
                    tag_name,
                    existing_span: existing.span,
                    existing_tag: existing.tag_name.clone(),
                    depth,
                });
            }
        }

        let seq = self.spans.len();
        let level = self.depths.entry(depth).or_default();
        level.by_start.insert((span.start, seq));
        level.max_len = level.max_len.max(span.len());
        self.by_start.insert((span.start, seq));
        self.spans.push(AttributeSpan {
            span,
            depth,
            tag_name,
            attributes,
        });
        Ok(())
    }

    fn find_conflict(&self, level: &DepthLevel, span: CharSpan, tag_name: &str) -> Option<&AttributeSpan> {
        if span.is_empty() {
            return None;
        }
        // Walk candidates that start before `span` ends, nearest first. Once a
        // candidate starts more than `max_len` before `span`, none further
        // back can reach it.
        for &(start, seq) in level.by_start.range(..(span.end, 0)).rev() {
            if start + level.max_len <= span.start {
                break;
            }
            let existing = &self.spans[seq];
            if existing.tag_name != tag_name && existing.span.overlaps(&span) {
                return Some(existing);
            }
        }
        None
    }

    /// All spans intersecting `query`, ordered by start then insertion order.
    pub fn spans_for(&self, query: CharSpan) -> Vec<&AttributeSpan> {
        let candidates = if query.is_empty() {
            self.by_start.range(..=(query.start, usize::MAX))
        } else {
            self.by_start.range(..(query.end, 0))
        };
        candidates
            .map(|&(_, seq)| &self.spans[seq])
            .filter(|s| s.span.intersects(&query))
            .collect()
    }

    /// Spans recorded over exactly `span`
    pub fn exact(&self, span: CharSpan) -> Vec<&AttributeSpan> {
        self.by_start
            .range((span.start, 0)..=(span.start, usize::MAX))
            .map(|&(_, seq)| &self.spans[seq])
            .filter(|s| s.span == span)
            .collect()
    }

    /// Spans that fully contain `span`
    pub fn containing(&self, span: CharSpan) -> Vec<&AttributeSpan> {
        self.by_start
            .range(..=(span.start, usize::MAX))
            .map(|&(_, seq)| &self.spans[seq])
            .filter(|s| s.span.contains_span(&span))
            .collect()
    }

    /// Spans in start order, ties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &AttributeSpan> + '_ {
        self.by_start.iter().map(|&(_, seq)| &self.spans[seq])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Re-express every span in transformed coordinates.
    ///
    /// Spans whose body was deleted collapse to zero length and are left out
    /// of the result; they stay in this index. The result is ordered by
    /// transformed start, which follows from the offset map being monotonic.
    pub fn project(&self, transformation: &StringTransformation) -> Result<Vec<ProjectedSpan>, EditError> {
        let mut projected = Vec::with_capacity(self.spans.len());
        for span in self.iter() {
            let transformed = transformation.original_span_to_transformed(span.span)?;
            if transformed.is_empty() {
                continue;
            }
            projected.push(ProjectedSpan {
                transformed,
                original: span.span,
                depth: span.depth,
                tag_name: span.tag_name.clone(),
                attributes: span.attributes.clone(),
            });
        }
        Ok(projected)
    }
}
