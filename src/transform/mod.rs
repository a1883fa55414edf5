//! Transformation Core
//!
//! `StringTransformation` keeps an immutable original string and an
//! append-only log of edits against it. From that log it derives the
//! transformed text (lazily, cached until the next edit) and answers offset
//! queries in both directions.
//!
//! ## Edit ordering
//!
//! Edits must arrive in original order: each one starts at or after the end
//! of the previous one. This is what lets every applied edit carry its
//! transformed position, computed once at append time, and what keeps both
//! offset maps a binary search over the edit table.
//!
//! ## Collapse-to-left
//!
//! Offsets that have no one-to-one counterpart resolve to the left edge of
//! the edit that swallowed them:
//!
//! ```text
//! original     "ab<x>cd"          Delete [2, 5)
//! transformed  "abcd"
//!
//! original_to_transformed(3) == 2     (inside the deletion)
//! transformed_to_original(2) == 5     ('c' is untouched)
//! ```
//!
//! Consequently `transformed_to_original(original_to_transformed(x)) == x`
//! holds only for offsets outside every edited range.

mod chars;
mod edit;

pub use chars::CharIndex;
pub use edit::{AppliedEdit, Edit};

use crate::error::EditError;
use crate::index::CharSpan;
use std::sync::OnceLock;

/// An original string plus the ordered edits applied to it.
#[derive(Debug, Clone)]
pub struct StringTransformation {
    original: String,
    chars: CharIndex,
    edits: Vec<AppliedEdit>,
    transformed_len: usize,
    /// Rendered on first request, reset by `apply_edit`
    transformed: OnceLock<String>,
}

impl StringTransformation {
    /// Start from the identity transformation of `original`
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let chars = CharIndex::new(&original);
        let transformed_len = chars.char_len();
        StringTransformation {
            original,
            chars,
            edits: Vec::new(),
            transformed_len,
            transformed: OnceLock::new(),
        }
    }

    /// Append an edit.
    ///
    /// # Errors
    ///
    /// `RangeBounds` if the span is inverted or ends past the original text,
    /// `RangeOrder` if it starts before the end of the previous edit.
    pub fn apply_edit(&mut self, edit: Edit) -> Result<(), EditError> {
        let (span, text) = edit.into_parts();
        let len = self.chars.char_len();
        if span.start > span.end || span.end > len {
            return Err(EditError::RangeBounds {
                start: span.start,
                end: span.end,
                len,
            });
        }

        let (previous_original_end, previous_transformed_end) = self
            .edits
            .last()
            .map_or((0, 0), |e| (e.original.end, e.transformed.end));
        if span.start < previous_original_end {
            return Err(EditError::RangeOrder {
                start: span.start,
                previous_end: previous_original_end,
            });
        }

        if span.is_empty() && text.is_empty() {
            return Ok(());
        }

        // Text between the previous edit and this one is untouched, so it
        // shifts by a constant.
        let transformed_start = previous_transformed_end + (span.start - previous_original_end);
        let inserted = text.chars().count();

        self.transformed_len = self.transformed_len - span.len() + inserted;
        self.transformed.take();
        self.edits.push(AppliedEdit {
            original: span,
            transformed: CharSpan::new(transformed_start, transformed_start + inserted),
            text,
        });
        Ok(())
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<(), EditError> {
        self.apply_edit(Edit::delete(start, end))
    }

    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.apply_edit(Edit::replace(start, end, text))
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) -> Result<(), EditError> {
        self.apply_edit(Edit::insert(at, text))
    }

    /// The text after all edits. Rendered once and cached until the next edit.
    pub fn transformed_text(&self) -> &str {
        self.transformed.get_or_init(|| self.render())
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.original.len());
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(self.original_slice(cursor, edit.original.start));
            out.push_str(&edit.text);
            cursor = edit.original.end;
        }
        out.push_str(self.original_slice(cursor, self.chars.char_len()));
        out
    }

    /// Original text between two character offsets
    pub fn original_slice(&self, start: usize, end: usize) -> &str {
        let from = self.chars.byte_offset(start);
        let to = self.chars.byte_offset(end).max(from);
        &self.original[from..to]
    }

    /// Map an original offset to the transformed text.
    ///
    /// Untouched characters map exactly. An offset inside (or at the start
    /// of) a deleted or replaced range maps to the transformed position where
    /// that edit begins. Text inserted at an offset comes before the original
    /// character at that offset. `offset == original_len()` is valid.
    pub fn original_to_transformed(&self, offset: usize) -> Result<usize, EditError> {
        let len = self.chars.char_len();
        if offset > len {
            return Err(EditError::RangeBounds { start: offset, end: offset, len });
        }

        let idx = self.edits.partition_point(|e| e.original.start <= offset);
        Ok(match idx.checked_sub(1).map(|i| &self.edits[i]) {
            None => offset,
            Some(edit) if offset < edit.original.end => edit.transformed.start,
            Some(edit) => offset - edit.original.end + edit.transformed.end,
        })
    }

    /// Map a transformed offset back to the original text.
    ///
    /// Untouched characters map exactly. An offset inside inserted or
    /// replacement text maps to the original start of that edit. This is a
    /// many-to-one mapping: it does not undo `original_to_transformed` inside
    /// edited regions.
    pub fn transformed_to_original(&self, offset: usize) -> Result<usize, EditError> {
        let len = self.transformed_len;
        if offset > len {
            return Err(EditError::RangeBounds { start: offset, end: offset, len });
        }

        let idx = self.edits.partition_point(|e| e.transformed.start <= offset);
        Ok(match idx.checked_sub(1).map(|i| &self.edits[i]) {
            None => offset,
            Some(edit) if offset < edit.transformed.end => edit.original.start,
            Some(edit) => offset - edit.transformed.end + edit.original.end,
        })
    }

    /// Map both boundaries of an original span
    pub fn original_span_to_transformed(&self, span: CharSpan) -> Result<CharSpan, EditError> {
        if span.start > span.end {
            return Err(EditError::RangeBounds {
                start: span.start,
                end: span.end,
                len: self.chars.char_len(),
            });
        }
        Ok(CharSpan::new(
            self.original_to_transformed(span.start)?,
            self.original_to_transformed(span.end)?,
        ))
    }

    /// Map both boundaries of a transformed span
    pub fn transformed_span_to_original(&self, span: CharSpan) -> Result<CharSpan, EditError> {
        if span.start > span.end {
            return Err(EditError::RangeBounds {
                start: span.start,
                end: span.end,
                len: self.transformed_len,
            });
        }
        Ok(CharSpan::new(
            self.transformed_to_original(span.start)?,
            self.transformed_to_original(span.end)?,
        ))
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// Length of the original text in characters
    pub fn original_len(&self) -> usize {
        self.chars.char_len()
    }

    /// Length of the transformed text in characters, without rendering it
    pub fn transformed_len(&self) -> usize {
        self.transformed_len
    }

    pub fn edits(&self) -> &[AppliedEdit] {
        &self.edits
    }

    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// True while no edit has been applied
    pub fn is_identity(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn char_index(&self) -> &CharIndex {
        &self.chars
    }
}
