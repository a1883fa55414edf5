//! Error types
//!
//! Every failure is scoped to one document and is fatal for it: once an
//! edit sequence or the markup structure is inconsistent, offset
//! correspondence can no longer be trusted, so nothing is retried or
//! skipped. Callers working through a corpus match on [`CleanError`] at the
//! document boundary and move on.

use crate::index::CharSpan;
use thiserror::Error;

/// Rejected edit or offset query against a `StringTransformation`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The edit starts before the end of the previously applied edit.
    #[error("edit starting at {start} precedes the end of the previous edit at {previous_end}")]
    RangeOrder { start: usize, previous_end: usize },
    /// The range is inverted or reaches past the end of the text it indexes.
    #[error("range {start}..{end} is outside 0..{len}")]
    RangeBounds { start: usize, end: usize, len: usize },
}

/// Two spans with different tags at the same nesting depth overlap.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("<{tag_name}> span {span} overlaps <{existing_tag}> span {existing_span} at depth {depth}")]
pub struct OverlapError {
    pub span: CharSpan,
    pub tag_name: String,
    pub existing_span: CharSpan,
    pub existing_tag: String,
    pub depth: usize,
}

/// What went wrong with the markup structure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    /// The tokenizer could not read a construct (unterminated tag, comment, ...).
    #[error("{0}")]
    Syntax(String),
    /// An element was still open at end of input.
    #[error("element <{name}> is never closed")]
    Unclosed { name: String },
    /// A close tag does not match the innermost open element.
    #[error("close tag </{found}> does not match open element <{expected}>")]
    Mismatched { expected: String, found: String },
    /// A close tag appeared with no element open.
    #[error("close tag </{name}> has no open element")]
    Stray { name: String },
}

/// Malformed input markup. `offset` is a character offset into the original.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed markup at offset {offset}: {issue}")]
pub struct MarkupStructureError {
    pub offset: usize,
    pub issue: StructureIssue,
}

/// Any failure while cleaning one document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CleanError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Overlap(#[from] OverlapError),
    #[error(transparent)]
    MarkupStructure(#[from] MarkupStructureError),
}

impl CleanError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CleanError::Edit(EditError::RangeOrder { .. }) => "range_order",
            CleanError::Edit(EditError::RangeBounds { .. }) => "range_bounds",
            CleanError::Overlap(_) => "overlap",
            CleanError::MarkupStructure(_) => "markup_structure",
        }
    }

    /// Original offset the error points at, when it has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            CleanError::Edit(EditError::RangeOrder { start, .. }) => Some(*start),
            CleanError::Edit(EditError::RangeBounds { start, .. }) => Some(*start),
            CleanError::Overlap(err) => Some(err.span.start),
            CleanError::MarkupStructure(err) => Some(err.offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_error_message() {
        let err = MarkupStructureError {
            offset: 3,
            issue: StructureIssue::Unclosed { name: "p".into() },
        };
        assert_eq!(err.to_string(), "malformed markup at offset 3: element <p> is never closed");
    }

    #[test]
    fn test_clean_error_kind_and_offset() {
        let err: CleanError = EditError::RangeOrder { start: 4, previous_end: 9 }.into();
        assert_eq!(err.kind(), "range_order");
        assert_eq!(err.offset(), Some(4));

        let err: CleanError = MarkupStructureError {
            offset: 12,
            issue: StructureIssue::Stray { name: "b".into() },
        }
        .into();
        assert_eq!(err.kind(), "markup_structure");
        assert_eq!(err.offset(), Some(12));
    }
}
