//! Parallel batch cleaning
//!
//! Uses Rayon to clean many independent documents at once. Each worker
//! keeps one `CleanScratch` for all documents it processes; results stay in
//! input order and errors stay with their document.

use crate::annotation::{AnnotateError, CombinedResult, TextAnnotationBuilder, XmlTextAnnotationMaker};
use crate::clean::{CleanScratch, CleanedDocument, MarkupCleaner};
use crate::error::CleanError;
use rayon::prelude::*;
use std::str::Utf8Error;
use tracing::debug;

/// One document to annotate
#[derive(Debug, Clone, Copy)]
pub struct DocumentInput<'a> {
    pub corpus_id: &'a str,
    pub doc_id: &'a str,
    pub text: &'a str,
}

/// Clean documents in parallel
pub fn clean_batch<S>(cleaner: &MarkupCleaner, docs: &[S]) -> Vec<Result<CleanedDocument, CleanError>>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<_> = docs
        .par_iter()
        .map_init(CleanScratch::default, |scratch, doc| cleaner.clean_with(doc.as_ref(), scratch))
        .collect();
    debug!(
        documents = results.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        "cleaned batch"
    );
    results
}

/// Clean raw byte documents in parallel.
/// Inputs that are not UTF-8 keep their decode error and are never cleaned.
pub fn clean_batch_utf8<B>(cleaner: &MarkupCleaner, docs: &[B]) -> Vec<Result<Result<CleanedDocument, CleanError>, Utf8Error>>
where
    B: AsRef<[u8]> + Sync,
{
    let results: Vec<_> = docs
        .par_iter()
        .map_init(CleanScratch::default, |scratch, doc| {
            std::str::from_utf8(doc.as_ref()).map(|text| cleaner.clean_with(text, scratch))
        })
        .collect();
    debug!(
        documents = results.len(),
        undecodable = results.iter().filter(|r| r.is_err()).count(),
        "cleaned byte batch"
    );
    results
}

/// Clean and annotate documents in parallel
pub fn annotate_batch<B>(
    maker: &XmlTextAnnotationMaker<B>,
    docs: &[DocumentInput<'_>],
) -> Vec<Result<CombinedResult<B::Annotation>, AnnotateError<B::Error>>>
where
    B: TextAnnotationBuilder + Sync,
    B::Annotation: Send,
{
    docs.par_iter()
        .map_init(CleanScratch::default, |scratch, doc| {
            maker.create_text_annotation_with(doc.text, doc.corpus_id, doc.doc_id, scratch)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::CleanerConfig;
    use std::convert::Infallible;
    use std::sync::Arc;

    struct CharCount;

    impl TextAnnotationBuilder for CharCount {
        type Annotation = usize;
        type Error = Infallible;

        fn build(&self, _corpus_id: &str, _doc_id: &str, text: &str) -> Result<usize, Infallible> {
            Ok(text.chars().count())
        }
    }

    #[test]
    fn test_clean_batch_keeps_order_and_errors() {
        let cleaner = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p"));
        let docs = vec!["<p>one</p>", "<p>broken", "<p>three <i>3</i></p>"];
        let results = clean_batch(&cleaner, &docs);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().transformed_text(), "one");
        assert_eq!(results[1].as_ref().unwrap_err().kind(), "markup_structure");
        assert_eq!(results[2].as_ref().unwrap().transformed_text(), "three 3");
    }

    #[test]
    fn test_clean_batch_many_documents() {
        let cleaner = MarkupCleaner::new(CleanerConfig::discussion_forum());
        let docs: Vec<String> = (0..200)
            .map(|i| format!("<post author=\"u{i}\">message {i}</post>"))
            .collect();
        let results = clean_batch(&cleaner, &docs);
        for (i, result) in results.iter().enumerate() {
            let doc = result.as_ref().unwrap();
            assert_eq!(doc.transformed_text(), format!("message {i}"));
            assert_eq!(doc.projected_spans()[0].attributes["author"], format!("u{i}"));
        }
    }

    #[test]
    fn test_clean_batch_utf8_skips_undecodable() {
        let cleaner = MarkupCleaner::new(CleanerConfig::default().with_text_tag("p"));
        let docs: [&[u8]; 3] = [b"<p>ok</p>", b"<p>\xFF</p>", b"<p>x"];
        let results = clean_batch_utf8(&cleaner, &docs);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().as_ref().unwrap().transformed_text(), "ok");
        assert_eq!(results[1].as_ref().unwrap_err().valid_up_to(), 3);
        assert_eq!(results[2].as_ref().unwrap().as_ref().unwrap_err().offset(), Some(3));
    }

    #[test]
    fn test_annotate_batch() {
        let cleaner = Arc::new(MarkupCleaner::new(CleanerConfig::discussion_forum()));
        let maker = XmlTextAnnotationMaker::with_cleaner(CharCount, cleaner);
        let docs = [
            DocumentInput { corpus_id: "c", doc_id: "1", text: "<post>abc</post>" },
            DocumentInput { corpus_id: "c", doc_id: "2", text: "<post>" },
        ];
        let results = annotate_batch(&maker, &docs);
        assert_eq!(results[0].as_ref().unwrap().annotation, 3);
        assert!(matches!(results[1], Err(AnnotateError::Clean(_))));
    }
}
