//! End-to-end cleaning scenarios through the public API.

use rustyclean::strategy::clean_batch;
use rustyclean::{
    AnnotateError, CharSpan, CleanError, CleanerConfig, EditError, MarkupCleaner, SpanAttributeIndex,
    StringTransformation, StructureIssue, TextAnnotationBuilder, XmlTextAnnotationMaker,
};
use std::collections::BTreeMap;
use std::convert::Infallible;

const FORUM_THREAD: &str = r#"<doc id="d1">
<headline>Title</headline>
<post author="ann" datetime="2020-01-01" id="p1">
Hi <a href="http://x.org">there</a>!
<quote orig_author="bob">Old text</quote>
Bye
</post>
</doc>"#;

fn forum_cleaner() -> MarkupCleaner {
    MarkupCleaner::new(CleanerConfig::discussion_forum())
}

// ============================================================================
// Offset mapping
// ============================================================================

#[test]
fn inline_markup_maps_back_to_source() {
    let cleaner = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p"));
    let doc = cleaner.clean("<p>Hello <b>world</b>!</p>").unwrap();

    assert_eq!(doc.transformed_text(), "Hello world!");
    assert_eq!(doc.transformed_to_original(6).unwrap(), 12);
    assert_eq!(doc.original_to_transformed(12).unwrap(), 6);
    // Markup collapses onto the position where its deletion starts
    assert_eq!(doc.original_to_transformed(1).unwrap(), 0);
    assert_eq!(doc.original_to_transformed(26).unwrap(), 12);
}

#[test]
fn offsets_past_either_end_are_rejected() {
    let cleaner = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p"));
    let doc = cleaner.clean("<p>abc</p>").unwrap();

    assert_eq!(
        doc.original_to_transformed(11),
        Err(EditError::RangeBounds { start: 11, end: 11, len: 10 })
    );
    assert!(doc.transformed_to_original(4).is_err());
    assert_eq!(doc.transformed_to_original(3).unwrap(), 10);
}

#[test]
fn transformed_text_is_stable() {
    let doc = forum_cleaner().clean(FORUM_THREAD).unwrap();
    let first = doc.transformed_text().to_string();
    assert_eq!(doc.transformed_text(), first);
    assert_eq!(doc.transformation().transformed_len(), first.chars().count());
}

#[test]
fn manual_edits_follow_offset_rules() {
    let mut st = StringTransformation::new("naïve café");
    st.replace(2, 3, "i").unwrap();
    st.insert(6, "the ").unwrap();
    st.delete(9, 10).unwrap();

    assert_eq!(st.transformed_text(), "naive the caf");
    assert_eq!(st.original_to_transformed(6).unwrap(), 10);
    assert_eq!(st.transformed_to_original(6).unwrap(), 6);
    assert_eq!(st.original_to_transformed(9).unwrap(), 13);

    assert_eq!(
        st.delete(4, 5),
        Err(EditError::RangeOrder { start: 4, previous_end: 10 })
    );
    assert!(matches!(st.delete(10, 11), Err(EditError::RangeBounds { .. })));
    // Rejected edits leave the transformation untouched
    assert_eq!(st.edit_count(), 3);
}

// ============================================================================
// Attribute spans
// ============================================================================

#[test]
fn forum_thread_spans_project_onto_cleaned_text() {
    let doc = forum_cleaner().clean(FORUM_THREAD).unwrap();
    let text = doc.transformed_text();
    assert_eq!(text, "Hi there! Old text Bye");

    let projected: Vec<_> = doc
        .projected_spans()
        .iter()
        .map(|s| (s.tag_name.as_str(), s.depth, s.transformed))
        .collect();
    assert_eq!(
        projected,
        vec![
            ("post", 2, CharSpan::new(0, 22)),
            ("a", 3, CharSpan::new(3, 8)),
            ("quote", 3, CharSpan::new(10, 18)),
        ]
    );
    assert_eq!(&text[3..8], "there");
    assert_eq!(&text[10..18], "Old text");

    let post = &doc.projected_spans()[0];
    let expected: BTreeMap<String, String> = [("author", "ann"), ("datetime", "2020-01-01"), ("id", "p1")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(post.attributes, expected);
    assert_eq!(doc.projected_spans()[1].attributes["href"], "http://x.org");
    assert_eq!(doc.projected_spans()[2].attributes["orig_author"], "bob");
}

#[test]
fn original_spans_cover_element_content() {
    let doc = forum_cleaner().clean(FORUM_THREAD).unwrap();
    let st = doc.transformation();

    let quote = doc.attributes().iter().find(|s| s.tag_name == "quote").unwrap();
    assert_eq!(st.original_slice(quote.span.start, quote.span.end), "Old text");

    let a = doc.attributes().iter().find(|s| s.tag_name == "a").unwrap();
    assert_eq!(st.original_slice(a.span.start, a.span.end), "there");

    // Untagged elements are not recorded
    assert_eq!(doc.attributes().len(), 3);
}

#[test]
fn projected_span_queries() {
    let doc = forum_cleaner().clean(FORUM_THREAD).unwrap();

    let tags: Vec<_> = doc
        .projected_spans_for(CharSpan::new(4, 5))
        .map(|s| s.tag_name.as_str())
        .collect();
    assert_eq!(tags, vec!["post", "a"]);

    let tags: Vec<_> = doc
        .projected_spans_for(CharSpan::at(12))
        .map(|s| s.tag_name.as_str())
        .collect();
    assert_eq!(tags, vec!["post", "quote"]);
}

#[test]
fn overlapping_spans_at_one_depth_conflict() {
    let mut index = SpanAttributeIndex::new();
    index.record(CharSpan::new(0, 5), 1, "b", BTreeMap::new()).unwrap();
    // Deeper nesting over the same text is fine
    index.record(CharSpan::new(0, 5), 2, "i", BTreeMap::new()).unwrap();

    let err = index
        .record(CharSpan::new(0, 5), 1, "i", BTreeMap::new())
        .unwrap_err();
    assert_eq!(err.existing_tag, "b");
    assert_eq!(err.existing_span, CharSpan::new(0, 5));
    assert_eq!(err.depth, 1);
    assert!(index.record(CharSpan::new(3, 8), 1, "i", BTreeMap::new()).is_err());
    assert_eq!(index.len(), 2);

    // Touching spans do not overlap
    index.record(CharSpan::new(5, 8), 1, "i", BTreeMap::new()).unwrap();
}

// ============================================================================
// Malformed markup
// ============================================================================

#[test]
fn unclosed_element_is_reported() {
    let cleaner = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p"));
    let err = cleaner.clean("<p>text").unwrap_err();

    assert_eq!(err.kind(), "markup_structure");
    assert_eq!(err.offset(), Some(3));
    match err {
        CleanError::MarkupStructure(e) => assert_eq!(e.issue, StructureIssue::Unclosed { name: "p".into() }),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn batch_errors_stay_with_their_document() {
    let cleaner = forum_cleaner();
    let docs = [FORUM_THREAD, "<post>fine</post>", "<post><quote>x</post>"];
    let results = clean_batch(&cleaner, &docs);

    assert_eq!(results[0].as_ref().unwrap().transformed_text(), "Hi there! Old text Bye");
    assert_eq!(results[1].as_ref().unwrap().transformed_text(), "fine");
    let err = results[2].as_ref().unwrap_err();
    assert_eq!(err.kind(), "markup_structure");
    assert_eq!(err.offset(), Some(14));
}

// ============================================================================
// Configuration and annotation
// ============================================================================

#[test]
fn config_loads_from_json() {
    let json = r#"{
        "tags_with_text": ["post"],
        "tags_with_attributes": {"post": ["author"]}
    }"#;
    let config: CleanerConfig = serde_json::from_str(json).unwrap();
    assert!(config.normalize_whitespace);
    assert!(config.decode_entities);

    let doc = MarkupCleaner::new(config)
        .clean("<post author=\"kim\" id=\"7\">a &amp; b</post>")
        .unwrap();
    assert_eq!(doc.transformed_text(), "a & b");
    assert_eq!(doc.projected_spans()[0].attributes.len(), 1);
}

struct WordCount;

impl TextAnnotationBuilder for WordCount {
    type Annotation = usize;
    type Error = Infallible;

    fn build(&self, _corpus_id: &str, _doc_id: &str, text: &str) -> Result<usize, Infallible> {
        Ok(text.split_whitespace().count())
    }
}

#[test]
fn annotation_maker_combines_results() {
    let maker = XmlTextAnnotationMaker::new(WordCount, CleanerConfig::discussion_forum());
    let result = maker.create_text_annotation(FORUM_THREAD, "forum", "d1").unwrap();

    assert_eq!(result.annotation, 5);
    assert_eq!(result.transformed_text(), "Hi there! Old text Bye");
    assert_eq!(result.spans.len(), 3);
    assert_eq!(result.original_spans.len(), 3);
    assert_eq!(result.transformation.transformed_to_original(0).unwrap(), 91);

    let err = maker.create_text_annotation("<post>", "forum", "d2").unwrap_err();
    assert!(matches!(err, AnnotateError::Clean(_)));
}
