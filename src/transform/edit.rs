//! Edit operations over original character ranges

use crate::index::CharSpan;

/// One change to the original text. Spans are in original coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Remove the characters in `span`
    Delete(CharSpan),
    /// Substitute the characters in `span` with `text`
    Replace(CharSpan, String),
    /// Insert `text` before the original character at the offset
    Insert(usize, String),
}

impl Edit {
    pub fn delete(start: usize, end: usize) -> Self {
        Edit::Delete(CharSpan::new(start, end))
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Edit::Replace(CharSpan::new(start, end), text.into())
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Edit::Insert(at, text.into())
    }

    /// Original range the edit covers (empty for inserts)
    pub fn span(&self) -> CharSpan {
        match self {
            Edit::Delete(span) | Edit::Replace(span, _) => *span,
            Edit::Insert(at, _) => CharSpan::at(*at),
        }
    }

    /// Text the edit puts in place of its span
    pub fn text(&self) -> &str {
        match self {
            Edit::Delete(_) => "",
            Edit::Replace(_, text) | Edit::Insert(_, text) => text,
        }
    }

    pub(crate) fn into_parts(self) -> (CharSpan, String) {
        match self {
            Edit::Delete(span) => (span, String::new()),
            Edit::Replace(span, text) => (span, text),
            Edit::Insert(at, text) => (CharSpan::at(at), text),
        }
    }
}

/// An edit as recorded by the transformation, with its position in both
/// coordinate spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    /// Range of the original text that was removed (empty for inserts)
    pub original: CharSpan,
    /// Range of the transformed text that holds `text` (empty for deletes)
    pub transformed: CharSpan,
    /// Text that took the place of `original`
    pub text: String,
}

impl AppliedEdit {
    /// Characters removed from the original
    pub fn removed_len(&self) -> usize {
        self.original.len()
    }

    /// Characters added to the transformed text
    pub fn inserted_len(&self) -> usize {
        self.transformed.len()
    }
}
