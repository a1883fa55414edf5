//! Markup cleaner
//!
//! Turns markup into plain body text by recording edits against the
//! original, never by rebuilding a string. Two passes:
//!
//! 1. Structure walk over the event stream: a nesting stack decides which
//!    text is retained and which elements get their attributes recorded.
//! 2. Edit planning over the retained regions: everything between regions
//!    is deleted, whitespace is normalized and entity references are
//!    replaced, strictly left to right.

use super::config::CleanerConfig;
use super::document::CleanedDocument;
use crate::core::entities::match_reference;
use crate::error::{CleanError, MarkupStructureError, StructureIssue};
use crate::index::{Attributes, CharSpan, SpanAttributeIndex};
use crate::reader::{EventReader, MarkupEvent, StartElement};
use crate::transform::{CharIndex, Edit, StringTransformation};
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use tracing::{debug, debug_span, trace, warn};

/// What the cleaner does with one element name
#[derive(Debug, Clone, Default)]
struct TagRole {
    text: bool,
    void: bool,
    /// Attribute names to keep; `Some` means the element's span is recorded
    keep_attributes: Option<BTreeSet<String>>,
}

/// An element on the nesting stack
#[derive(Debug)]
struct OpenElement {
    /// Byte range of the name in the input
    name: Range<usize>,
    /// Byte offset just past the open tag
    content_start: usize,
    /// Nearest enclosing text element instance
    owner: Option<usize>,
    /// Filtered attributes, present when the span is recorded
    record: Option<Attributes>,
}

/// A run of retained text
#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    bytes: Range<usize>,
    owner: usize,
    /// CDATA content is kept verbatim
    decode: bool,
}

/// Reusable buffers for cleaning. Holds no document data between calls.
#[derive(Debug, Default)]
pub struct CleanScratch {
    stack: Vec<OpenElement>,
    regions: Vec<Region>,
    edits: Vec<Edit>,
}

impl CleanScratch {
    fn reset(&mut self) {
        self.stack.clear();
        self.regions.clear();
        self.edits.clear();
    }
}

/// Compiled cleaning profile. Cheap to share; cleaning takes `&self`.
#[derive(Debug, Clone)]
pub struct MarkupCleaner {
    config: CleanerConfig,
    roles: HashMap<String, TagRole>,
}

impl MarkupCleaner {
    pub fn new(config: CleanerConfig) -> Self {
        let mut roles: HashMap<String, TagRole> = HashMap::new();
        for tag in &config.tags_with_text {
            roles.entry(tag.clone()).or_default().text = true;
        }
        for tag in &config.void_tags {
            roles.entry(tag.clone()).or_default().void = true;
        }
        for (tag, names) in &config.tags_with_attributes {
            roles.entry(tag.clone()).or_default().keep_attributes = Some(names.clone());
        }
        MarkupCleaner { config, roles }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Clean one document.
    ///
    /// # Errors
    ///
    /// `MarkupStructure` for malformed markup, `Overlap` when two recorded
    /// elements with different names overlap at the same depth.
    pub fn clean(&self, text: &str) -> Result<CleanedDocument, CleanError> {
        self.clean_with(text, &mut CleanScratch::default())
    }

    /// Clean one document reusing `scratch` buffers
    pub fn clean_with(&self, text: &str, scratch: &mut CleanScratch) -> Result<CleanedDocument, CleanError> {
        let span = debug_span!("clean", bytes = text.len());
        let _guard = span.enter();

        scratch.reset();
        let mut transformation = StringTransformation::new(text);
        let mut index = SpanAttributeIndex::new();

        let result = self
            .walk(text, transformation.char_index(), scratch, &mut index)
            .and_then(|()| {
                let chars = transformation.char_index();
                let mut planner = EditPlanner::new(text, chars, &self.config, &mut scratch.edits);
                for region in &scratch.regions {
                    planner.region(region);
                }
                planner.finish();
                for edit in scratch.edits.drain(..) {
                    transformation.apply_edit(edit)?;
                }
                Ok(index.project(&transformation)?)
            });

        match result {
            Ok(projected) => {
                debug!(
                    edits = transformation.edit_count(),
                    spans = index.len(),
                    projected = projected.len(),
                    transformed_len = transformation.transformed_len(),
                    "cleaned document"
                );
                Ok(CleanedDocument::new(transformation, index, projected))
            }
            Err(err) => {
                warn!(kind = err.kind(), offset = err.offset(), error = %err, "failed to clean document");
                Err(err)
            }
        }
    }

    /// First pass: structure walk. Fills `scratch.regions` and `index`.
    fn walk(
        &self,
        text: &str,
        chars: &CharIndex,
        scratch: &mut CleanScratch,
        index: &mut SpanAttributeIndex,
    ) -> Result<(), CleanError> {
        let structure_error = |byte: usize, issue: StructureIssue| MarkupStructureError {
            offset: chars.char_offset(byte),
            issue,
        };
        let stack = &mut scratch.stack;
        let regions = &mut scratch.regions;
        let mut instances = 0usize;

        for event in EventReader::new(text) {
            let event = event.map_err(|e| structure_error(e.position, StructureIssue::Syntax(e.message)))?;
            match event {
                MarkupEvent::StartElement(e) => {
                    let role = self.roles.get(e.name);
                    if role.is_some_and(|r| r.void) {
                        self.record_empty(&e, stack.len() + 1, role, chars, index)?;
                        continue;
                    }
                    let parent_owner = stack.last().and_then(|f| f.owner);
                    let owner = if role.is_some_and(|r| r.text) {
                        instances += 1;
                        Some(instances)
                    } else {
                        parent_owner
                    };
                    let name_start = e.span.start + 1;
                    stack.push(OpenElement {
                        name: name_start..name_start + e.name.len(),
                        content_start: e.span.end,
                        owner,
                        record: role.and_then(|r| r.keep_attributes.as_ref()).map(|keep| filter_attributes(&e, keep)),
                    });
                }
                MarkupEvent::EmptyElement(e) => {
                    let role = self.roles.get(e.name);
                    self.record_empty(&e, stack.len() + 1, role, chars, index)?;
                }
                MarkupEvent::EndElement(e) => {
                    let is_void = self.roles.get(e.name).is_some_and(|r| r.void);
                    let Some(top) = stack.last() else {
                        if is_void {
                            continue;
                        }
                        return Err(structure_error(
                            e.span.start,
                            StructureIssue::Stray {
                                name: e.name.to_string(),
                            },
                        )
                        .into());
                    };
                    let open_name = &text[top.name.clone()];
                    if open_name != e.name {
                        if is_void {
                            continue;
                        }
                        return Err(structure_error(
                            e.span.start,
                            StructureIssue::Mismatched {
                                expected: open_name.to_string(),
                                found: e.name.to_string(),
                            },
                        )
                        .into());
                    }

                    let depth = stack.len();
                    let Some(frame) = stack.pop() else {
                        continue;
                    };
                    if let Some(attributes) = frame.record {
                        let span = CharSpan::new(chars.char_offset(frame.content_start), chars.char_offset(e.span.start));
                        trace!(tag = e.name, %span, depth, "recording attribute span");
                        index.record(span, depth, e.name, attributes)?;
                    }
                }
                MarkupEvent::Text { span, .. } => {
                    if let Some(owner) = stack.last().and_then(|f| f.owner) {
                        regions.push(Region {
                            bytes: span,
                            owner,
                            decode: true,
                        });
                    }
                }
                MarkupEvent::CData { content, .. } => {
                    if let Some(owner) = stack.last().and_then(|f| f.owner) {
                        regions.push(Region {
                            bytes: content,
                            owner,
                            decode: false,
                        });
                    }
                }
                MarkupEvent::Comment { .. }
                | MarkupEvent::ProcessingInstruction { .. }
                | MarkupEvent::XmlDeclaration { .. }
                | MarkupEvent::DocType { .. }
                | MarkupEvent::Declaration { .. } => {}
            }
        }

        if let Some(innermost) = stack.last() {
            return Err(structure_error(
                innermost.content_start,
                StructureIssue::Unclosed {
                    name: text[innermost.name.clone()].to_string(),
                },
            )
            .into());
        }
        Ok(())
    }

    /// Empty and void elements get a zero-length span at the tag end
    fn record_empty(
        &self,
        element: &StartElement<'_>,
        depth: usize,
        role: Option<&TagRole>,
        chars: &CharIndex,
        index: &mut SpanAttributeIndex,
    ) -> Result<(), CleanError> {
        if let Some(keep) = role.and_then(|r| r.keep_attributes.as_ref()) {
            let span = CharSpan::at(chars.char_offset(element.span.end));
            trace!(tag = element.name, %span, depth, "recording attribute span");
            index.record(span, depth, element.name, filter_attributes(element, keep))?;
        }
        Ok(())
    }
}

/// Keep only the configured attribute names; the first occurrence wins
fn filter_attributes(element: &StartElement<'_>, keep: &BTreeSet<String>) -> Attributes {
    keep.iter()
        .filter_map(|name| {
            element
                .get_attribute_value(name)
                .map(|value| (name.clone(), value.to_string()))
        })
        .collect()
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

/// Decoded references that normalize like literal whitespace. NBSP and other
/// Unicode spaces are kept as text.
#[inline]
fn is_whitespace_char(c: char) -> bool {
    u8::try_from(c).is_ok_and(is_whitespace)
}

/// Deleted markup and retained whitespace between two kept characters
#[derive(Debug, Clone, Copy)]
struct Stretch {
    start: usize,
    /// First retained whitespace byte inside the stretch
    whitespace: Option<usize>,
}

/// Second pass: turns retained regions into an ordered edit list.
///
/// Works in bytes and converts to characters when an edit is emitted.
struct EditPlanner<'a> {
    text: &'a str,
    chars: &'a CharIndex,
    normalize_whitespace: bool,
    decode_entities: bool,
    edits: &'a mut Vec<Edit>,
    /// Byte offset up to which input has been planned
    cursor: usize,
    stretch: Option<Stretch>,
    /// Owner of the last kept character, `None` before the first one
    last_owner: Option<usize>,
    last_is_whitespace: bool,
}

impl<'a> EditPlanner<'a> {
    fn new(text: &'a str, chars: &'a CharIndex, config: &CleanerConfig, edits: &'a mut Vec<Edit>) -> Self {
        EditPlanner {
            text,
            chars,
            normalize_whitespace: config.normalize_whitespace,
            decode_entities: config.decode_entities,
            edits,
            cursor: 0,
            stretch: None,
            last_owner: None,
            last_is_whitespace: false,
        }
    }

    fn region(&mut self, region: &Region) {
        let text = self.text;
        let bytes = text.as_bytes();
        let Range { start, end } = region.bytes;
        if self.cursor < start {
            self.extend_stretch(self.cursor, false);
        }

        let decode = self.decode_entities && region.decode;
        let mut pos = start;
        while pos < end {
            let b = bytes[pos];
            if self.normalize_whitespace && is_whitespace(b) {
                self.extend_stretch(pos, true);
                while pos < end && is_whitespace(bytes[pos]) {
                    pos += 1;
                }
                continue;
            }
            if decode && b == b'&' {
                if let Some((len, decoded)) = match_reference(&text[pos..end]) {
                    if self.normalize_whitespace && is_whitespace_char(decoded) {
                        // Collapses with the surrounding run like a literal space
                        self.extend_stretch(pos, true);
                    } else {
                        self.keep(pos, region.owner, decoded.is_whitespace(), decoded.is_whitespace());
                        self.edits.push(Edit::replace(
                            self.chars.char_offset(pos),
                            self.chars.char_offset(pos + len),
                            decoded.to_string(),
                        ));
                    }
                    pos += len;
                    continue;
                }
            }

            // Plain run up to the next whitespace or reference
            let run_start = pos;
            pos += 1;
            while pos < end {
                let b = bytes[pos];
                if (self.normalize_whitespace && is_whitespace(b)) || (decode && b == b'&') {
                    break;
                }
                pos += 1;
            }
            let run = &text[run_start..pos];
            let first_ws = run.chars().next().is_some_and(char::is_whitespace);
            let last_ws = run.chars().next_back().is_some_and(char::is_whitespace);
            self.keep(run_start, region.owner, first_ws, last_ws);
        }
        self.cursor = end;
    }

    /// Open or grow the pending stretch at byte `pos`
    fn extend_stretch(&mut self, pos: usize, whitespace: bool) {
        let stretch = self.stretch.get_or_insert(Stretch {
            start: pos,
            whitespace: None,
        });
        if whitespace && stretch.whitespace.is_none() {
            stretch.whitespace = Some(pos);
        }
    }

    /// A kept character at byte `pos`; resolves the pending stretch first
    fn keep(&mut self, pos: usize, owner: usize, first_is_whitespace: bool, last_is_whitespace: bool) {
        if let Some(stretch) = self.stretch.take() {
            self.resolve(stretch, pos, owner, first_is_whitespace);
        }
        self.last_owner = Some(owner);
        self.last_is_whitespace = last_is_whitespace;
    }

    fn resolve(&mut self, stretch: Stretch, end: usize, owner: usize, next_is_whitespace: bool) {
        let Some(last_owner) = self.last_owner else {
            self.delete(stretch.start, end);
            return;
        };
        match stretch.whitespace {
            // A kept neighbour already separates the two sides
            Some(_) if self.last_is_whitespace || next_is_whitespace => self.delete(stretch.start, end),
            Some(ws) if self.text.as_bytes()[ws] == b' ' => {
                self.delete(stretch.start, ws);
                self.delete(ws + 1, end);
            }
            Some(ws) => {
                self.delete(stretch.start, ws);
                self.edits
                    .push(Edit::replace(self.chars.char_offset(ws), self.chars.char_offset(end), " "));
            }
            None if last_owner != owner && !self.last_is_whitespace && !next_is_whitespace => {
                self.edits.push(Edit::replace(
                    self.chars.char_offset(stretch.start),
                    self.chars.char_offset(end),
                    " ",
                ));
            }
            None => self.delete(stretch.start, end),
        }
    }

    fn delete(&mut self, start: usize, end: usize) {
        if start < end {
            self.edits
                .push(Edit::delete(self.chars.char_offset(start), self.chars.char_offset(end)));
        }
    }

    /// Delete everything after the last region
    fn finish(&mut self) {
        let len = self.text.len();
        if self.cursor < len {
            self.extend_stretch(self.cursor, false);
        }
        if let Some(stretch) = self.stretch.take() {
            self.delete(stretch.start, len);
        }
        self.cursor = len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner(text_tags: &[&str]) -> MarkupCleaner {
        MarkupCleaner::new(CleanerConfig::new(text_tags.iter().copied(), Vec::<(String, Vec<String>)>::new()))
    }

    fn clean_text(cleaner: &MarkupCleaner, input: &str) -> String {
        cleaner.clean(input).unwrap().transformed_text().to_string()
    }

    #[test]
    fn test_inline_markup_removed() {
        let doc = cleaner(&["p"]).clean("<p>Hello <b>world</b>!</p>").unwrap();
        assert_eq!(doc.transformed_text(), "Hello world!");
        assert_eq!(doc.transformed_to_original(6).unwrap(), 12);
        assert_eq!(doc.original_to_transformed(12).unwrap(), 6);
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        let c = cleaner(&["p"]);
        assert_eq!(clean_text(&c, "<p>\n  Hello \t\n world  \n</p>"), "Hello world");
        assert_eq!(clean_text(&c, "<p>a\n<br/>\nb</p>"), "a b");
    }

    #[test]
    fn test_existing_space_kept_in_place() {
        let doc = cleaner(&["p"]).clean("<p>a b</p>").unwrap();
        assert_eq!(doc.transformed_text(), "a b");
        // Only the two tags were edited; the space is untouched
        assert_eq!(doc.transformation().edit_count(), 2);
        assert_eq!(doc.transformed_to_original(1).unwrap(), 4);
    }

    #[test]
    fn test_separate_text_elements_get_a_space() {
        let c = cleaner(&["post", "quote"]);
        assert_eq!(clean_text(&c, "<doc><post>one</post><post>two</post></doc>"), "one two");
        assert_eq!(clean_text(&c, "<post>Hi<quote>x</quote>there</post>"), "Hi x there");
    }

    #[test]
    fn test_same_element_markup_only_joins() {
        let c = cleaner(&["p"]);
        assert_eq!(clean_text(&c, "<p>un<i>believ</i>able</p>"), "unbelievable");
    }

    #[test]
    fn test_non_text_content_dropped() {
        let c = cleaner(&["post"]);
        let input = "<?xml version=\"1.0\"?><!DOCTYPE doc><doc><headline>skip</headline><!-- c --><post>keep</post></doc>";
        assert_eq!(clean_text(&c, input), "keep");
    }

    #[test]
    fn test_entities_decoded() {
        let c = cleaner(&["p"]);
        let doc = c.clean("<p>a &amp; b&nbsp;c</p>").unwrap();
        assert_eq!(doc.transformed_text(), "a & b\u{00A0}c");
        // '&' in the output maps back to the start of "&amp;"
        assert_eq!(doc.transformed_to_original(2).unwrap(), 5);
    }

    #[test]
    fn test_whitespace_references_normalized() {
        let c = cleaner(&["p"]);
        assert_eq!(clean_text(&c, "<p>a &#32; b</p>"), "a b");
        assert_eq!(clean_text(&c, "<p>&#32;a&#x20;</p>"), "a");
        assert_eq!(clean_text(&c, "<p>a&#10;&#10;b</p>"), "a b");
        assert_eq!(clean_text(&c, "<p>a&#9;<b>b</b></p>"), "a b");

        // The replacement space sits where the first reference was
        let doc = c.clean("<p>a&#10;&#10;b</p>").unwrap();
        assert_eq!(doc.transformed_to_original(1).unwrap(), 4);
        assert_eq!(doc.transformed_to_original(2).unwrap(), 14);
    }

    #[test]
    fn test_whitespace_next_to_kept_space_dropped() {
        let c = cleaner(&["p"]);
        assert_eq!(clean_text(&c, "<p>a&nbsp; b</p>"), "a\u{00A0}b");
        assert_eq!(clean_text(&c, "<p>a \n&nbsp;b</p>"), "a\u{00A0}b");
    }

    #[test]
    fn test_whitespace_references_kept_when_normalization_disabled() {
        let c = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p").with_normalize_whitespace(false));
        assert_eq!(clean_text(&c, "<p>a&#10;b</p>"), "a\nb");
    }

    #[test]
    fn test_entities_left_alone_when_disabled() {
        let c = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p").with_decode_entities(false));
        assert_eq!(clean_text(&c, "<p>a &amp; b</p>"), "a &amp; b");
    }

    #[test]
    fn test_whitespace_kept_when_normalization_disabled() {
        let c = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p").with_normalize_whitespace(false));
        assert_eq!(clean_text(&c, "<p> a\n b </p>"), " a\n b ");
    }

    #[test]
    fn test_cdata_kept_verbatim() {
        let c = cleaner(&["p"]);
        assert_eq!(clean_text(&c, "<p>x <![CDATA[<b>&amp;</b>]]></p>"), "x <b>&amp;</b>");
    }

    #[test]
    fn test_attribute_spans_recorded_and_projected() {
        let config = CleanerConfig::default()
            .with_text_tag("post")
            .with_attribute_tag("post", ["author"])
            .with_attribute_tag("a", ["href"]);
        let input = "<post author=\"kim\" id=\"1\">see <a href=\"u\" rel=\"x\">this</a></post>";
        let doc = MarkupCleaner::new(config).clean(input).unwrap();
        assert_eq!(doc.transformed_text(), "see this");

        let original: Vec<_> = doc.attributes().iter().map(|s| (s.tag_name.as_str(), s.depth)).collect();
        assert_eq!(original, vec![("post", 1), ("a", 2)]);

        let projected = doc.projected_spans();
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].transformed, CharSpan::new(0, 8));
        assert_eq!(projected[0].attributes.len(), 1);
        assert_eq!(projected[0].attributes["author"], "kim");
        assert_eq!(projected[1].transformed, CharSpan::new(4, 8));
        assert_eq!(projected[1].attributes["href"], "u");
    }

    #[test]
    fn test_empty_element_span_at_tag_end() {
        let config = CleanerConfig::discussion_forum();
        let input = "<post>a<img src=\"x.png\"/>b</post>";
        let doc = MarkupCleaner::new(config).clean(input).unwrap();
        assert_eq!(doc.transformed_text(), "ab");
        let img = doc.attributes().iter().find(|s| s.tag_name == "img").unwrap();
        assert_eq!(img.span, CharSpan::at(25));
        assert_eq!(img.depth, 2);
        // Zero-length projections are left out
        assert!(doc.projected_spans().iter().all(|s| s.tag_name != "img"));
    }

    #[test]
    fn test_void_tags_without_close() {
        let c = MarkupCleaner::new(CleanerConfig::discussion_forum());
        assert_eq!(clean_text(&c, "<post>line<br>\nnext</br></post>"), "line next");
        assert_eq!(clean_text(&c, "<post>a<br>b</post>"), "ab");
    }

    #[test]
    fn test_unclosed_element() {
        let err = cleaner(&["p"]).clean("<p>text").unwrap_err();
        let CleanError::MarkupStructure(err) = err else {
            panic!("expected structure error");
        };
        assert_eq!(err.offset, 3);
        assert_eq!(err.issue, StructureIssue::Unclosed { name: "p".into() });
    }

    #[test]
    fn test_mismatched_and_stray_close() {
        let err = cleaner(&["p"]).clean("<p><b>x</p>").unwrap_err();
        assert_eq!(err.kind(), "markup_structure");
        assert_eq!(err.offset(), Some(7));

        let err = cleaner(&["p"]).clean("<p>x</p></q>").unwrap_err();
        assert_eq!(err.offset(), Some(8));
    }

    #[test]
    fn test_syntax_error_offset_in_characters() {
        let err = cleaner(&["p"]).clean("<p>ünï<!-- open</p>").unwrap_err();
        assert_eq!(err.offset(), Some(6));
    }

    #[test]
    fn test_siblings_at_same_depth_do_not_overlap() {
        let config = CleanerConfig::default()
            .with_attribute_tag("a", ["href"])
            .with_attribute_tag("b", Vec::<String>::new());
        let c = MarkupCleaner::new(config);
        // Siblings at the same depth never overlap
        assert!(c.clean("<r><a href=\"1\">x</a><b>y</b></r>").is_ok());
    }

    #[test]
    fn test_multibyte_offsets() {
        let doc = cleaner(&["p"]).clean("<p>größe <b>café</b></p>").unwrap();
        assert_eq!(doc.transformed_text(), "größe café");
        assert_eq!(doc.transformed_to_original(6).unwrap(), 12);
    }

    #[test]
    fn test_scratch_reuse() {
        let c = cleaner(&["p"]);
        let mut scratch = CleanScratch::default();
        assert!(c.clean_with("<p>oops", &mut scratch).is_err());
        let doc = c.clean_with("<p>fine</p>", &mut scratch).unwrap();
        assert_eq!(doc.transformed_text(), "fine");
    }
}
