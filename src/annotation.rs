//! Annotation maker
//!
//! Cleans markup, hands the cleaned text to a downstream annotation builder
//! and returns everything needed to map the annotation back to the source:
//! the transformation and the attribute spans in both coordinate systems.

use crate::cache::ProfileCache;
use crate::clean::{CleanScratch, CleanedDocument, CleanerConfig, MarkupCleaner};
use crate::error::CleanError;
use crate::index::{ProjectedSpan, SpanAttributeIndex};
use crate::transform::StringTransformation;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Downstream consumer of cleaned text (tokenizer, sentence splitter, ...).
/// The annotation it produces is opaque here.
pub trait TextAnnotationBuilder {
    type Annotation;
    type Error: std::error::Error + Send + Sync + 'static;

    fn build(&self, corpus_id: &str, doc_id: &str, text: &str) -> Result<Self::Annotation, Self::Error>;
}

/// Failure while annotating one document
#[derive(Debug, Error)]
pub enum AnnotateError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to clean document: {0}")]
    Clean(#[from] CleanError),
    #[error("annotation builder failed: {0}")]
    Build(#[source] E),
}

/// Cleaned text, its annotation and the attribute spans that go with it
#[derive(Debug, Clone)]
pub struct CombinedResult<A> {
    pub transformation: StringTransformation,
    pub annotation: A,
    /// Attribute spans in transformed coordinates
    pub spans: Vec<ProjectedSpan>,
    /// Attribute spans in original coordinates, including dropped ones
    pub original_spans: SpanAttributeIndex,
}

impl<A> CombinedResult<A> {
    fn new(document: CleanedDocument, annotation: A) -> Self {
        let (transformation, original_spans, spans) = document.into_parts();
        CombinedResult {
            transformation,
            annotation,
            spans,
            original_spans,
        }
    }

    pub fn transformed_text(&self) -> &str {
        self.transformation.transformed_text()
    }
}

/// Turns markup documents into annotated text
pub struct XmlTextAnnotationMaker<B> {
    builder: B,
    cleaner: Arc<MarkupCleaner>,
}

impl<B: TextAnnotationBuilder> XmlTextAnnotationMaker<B> {
    /// Use the shared cleaner for `config` from the global profile cache
    pub fn new(builder: B, config: CleanerConfig) -> Self {
        let cleaner = ProfileCache::global().get_or_create(&config);
        XmlTextAnnotationMaker { builder, cleaner }
    }

    pub fn with_cleaner(builder: B, cleaner: Arc<MarkupCleaner>) -> Self {
        XmlTextAnnotationMaker { builder, cleaner }
    }

    pub fn cleaner(&self) -> &MarkupCleaner {
        &self.cleaner
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn create_text_annotation(
        &self,
        xml: &str,
        corpus_id: &str,
        doc_id: &str,
    ) -> Result<CombinedResult<B::Annotation>, AnnotateError<B::Error>> {
        self.create_text_annotation_with(xml, corpus_id, doc_id, &mut CleanScratch::default())
    }

    pub fn create_text_annotation_with(
        &self,
        xml: &str,
        corpus_id: &str,
        doc_id: &str,
        scratch: &mut CleanScratch,
    ) -> Result<CombinedResult<B::Annotation>, AnnotateError<B::Error>> {
        let document = self.cleaner.clean_with(xml, scratch)?;
        let annotation = self
            .builder
            .build(corpus_id, doc_id, document.transformed_text())
            .map_err(AnnotateError::Build)?;
        debug!(corpus_id, doc_id, spans = document.projected_spans().len(), "annotated document");
        Ok(CombinedResult::new(document, annotation))
    }
}
