//! Cleaned document
//!
//! The result of cleaning one input: the transformation from markup to text,
//! the attribute index in original coordinates and its projection onto the
//! cleaned text. Immutable once built.

use crate::error::EditError;
use crate::index::{CharSpan, ProjectedSpan, SpanAttributeIndex};
use crate::transform::StringTransformation;

#[derive(Debug, Clone)]
pub struct CleanedDocument {
    transformation: StringTransformation,
    attributes: SpanAttributeIndex,
    projected: Vec<ProjectedSpan>,
}

impl CleanedDocument {
    pub(crate) fn new(
        transformation: StringTransformation,
        attributes: SpanAttributeIndex,
        projected: Vec<ProjectedSpan>,
    ) -> Self {
        CleanedDocument {
            transformation,
            attributes,
            projected,
        }
    }

    pub fn transformation(&self) -> &StringTransformation {
        &self.transformation
    }

    pub fn transformed_text(&self) -> &str {
        self.transformation.transformed_text()
    }

    pub fn original_text(&self) -> &str {
        self.transformation.original_text()
    }

    /// Attribute spans in original coordinates, including those whose
    /// content was removed entirely
    pub fn attributes(&self) -> &SpanAttributeIndex {
        &self.attributes
    }

    /// Attribute spans in transformed coordinates, ordered by start
    pub fn projected_spans(&self) -> &[ProjectedSpan] {
        &self.projected
    }

    /// Projected spans intersecting a transformed-coordinate range
    pub fn projected_spans_for(&self, query: CharSpan) -> impl Iterator<Item = &ProjectedSpan> + '_ {
        // Projected spans are sorted by start, so everything from the first
        // span starting at or after the query end can be skipped.
        let limit = if query.is_empty() {
            self.projected.partition_point(|s| s.transformed.start <= query.start)
        } else {
            self.projected.partition_point(|s| s.transformed.start < query.end)
        };
        self.projected[..limit]
            .iter()
            .filter(move |s| s.transformed.intersects(&query))
    }

    pub fn original_to_transformed(&self, offset: usize) -> Result<usize, EditError> {
        self.transformation.original_to_transformed(offset)
    }

    pub fn transformed_to_original(&self, offset: usize) -> Result<usize, EditError> {
        self.transformation.transformed_to_original(offset)
    }

    pub fn into_parts(self) -> (StringTransformation, SpanAttributeIndex, Vec<ProjectedSpan>) {
        (self.transformation, self.attributes, self.projected)
    }
}
