//! Character index
//!
//! Converts between character offsets (the public coordinate system) and
//! byte offsets (what the tokenizer and `str` slicing use). ASCII input keeps
//! no table at all since both coordinate systems coincide.

/// Byte offset of every character boundary in a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharIndex {
    /// `boundaries[i]` is the byte offset of character `i`; the last entry is
    /// the byte length. `None` for ASCII text.
    boundaries: Option<Vec<usize>>,
    byte_len: usize,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let boundaries = if text.is_ascii() {
            None
        } else {
            let mut table = Vec::with_capacity(text.len() + 1);
            table.extend(text.char_indices().map(|(i, _)| i));
            table.push(text.len());
            Some(table)
        };
        CharIndex {
            boundaries,
            byte_len: text.len(),
        }
    }

    /// Number of characters in the indexed text
    #[inline]
    pub fn char_len(&self) -> usize {
        match &self.boundaries {
            Some(table) => table.len() - 1,
            None => self.byte_len,
        }
    }

    /// Byte offset of character `offset`. Offsets past the end clamp to the
    /// byte length.
    #[inline]
    pub fn byte_offset(&self, offset: usize) -> usize {
        match &self.boundaries {
            Some(table) => table.get(offset).copied().unwrap_or(self.byte_len),
            None => offset.min(self.byte_len),
        }
    }

    /// Character offset of byte `offset`. A byte inside a multi-byte
    /// character resolves to the next character boundary.
    #[inline]
    pub fn char_offset(&self, offset: usize) -> usize {
        match &self.boundaries {
            Some(table) => table.partition_point(|&b| b < offset),
            None => offset.min(self.byte_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_identity() {
        let index = CharIndex::new("hello");
        assert!(index.boundaries.is_none());
        assert_eq!(index.char_len(), 5);
        assert_eq!(index.byte_offset(3), 3);
        assert_eq!(index.char_offset(3), 3);
    }

    #[test]
    fn test_multibyte_offsets() {
        // 'é' is two bytes, '😀' is four
        let index = CharIndex::new("aé😀b");
        assert_eq!(index.char_len(), 4);
        assert_eq!(index.byte_offset(0), 0);
        assert_eq!(index.byte_offset(2), 3);
        assert_eq!(index.byte_offset(3), 7);
        assert_eq!(index.byte_offset(4), 8);
        assert_eq!(index.char_offset(7), 3);
        assert_eq!(index.char_offset(8), 4);
    }

    #[test]
    fn test_inner_byte_rounds_up() {
        let index = CharIndex::new("aé");
        assert_eq!(index.char_offset(2), 2);
    }

    #[test]
    fn test_empty_text() {
        let index = CharIndex::new("");
        assert_eq!(index.char_len(), 0);
        assert_eq!(index.byte_offset(0), 0);
    }
}
