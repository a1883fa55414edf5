//! Span types and the span attribute index
//!
//! - `CharSpan`: half-open character range used in both coordinate spaces
//! - `SpanAttributeIndex`: tag attributes keyed by original span

mod attributes;
mod span;

pub use attributes::{AttributeSpan, Attributes, ProjectedSpan, SpanAttributeIndex};
pub use span::CharSpan;
