//! RustyClean - reversible markup-to-text cleaning
//!
//! Cleans markup documents into plain body text while keeping an exact,
//! queryable map between every character of the cleaned text and the
//! original source, plus the attributes of selected elements on both sides.
//!
//! Layers:
//! - `transform`: original text, ordered edit log, offset maps
//! - `index`: attribute spans in original coordinates, projection
//! - `clean`: markup walker driving the two above
//! - `core`/`reader`: markup tokenizer and event reader
//! - `annotation`, `cache`, `strategy`: downstream builders, shared
//!   profiles, parallel batches
//!
//! The NIF functions below expose cleaning to Elixir as
//! `RustyClean.Native`.

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};
use std::collections::HashMap;

pub mod annotation;
pub mod cache;
pub mod clean;
pub mod core;
pub mod error;
pub mod index;
pub mod reader;
pub mod strategy;
pub mod transform;

mod resource;
mod term;

pub use annotation::{AnnotateError, CombinedResult, TextAnnotationBuilder, XmlTextAnnotationMaker};
pub use cache::ProfileCache;
pub use clean::{CleanScratch, CleanedDocument, CleanerConfig, MarkupCleaner};
pub use error::{CleanError, EditError, MarkupStructureError, OverlapError, StructureIssue};
pub use index::{AttributeSpan, Attributes, CharSpan, ProjectedSpan, SpanAttributeIndex};
pub use transform::{Edit, StringTransformation};

use resource::{CleanedDocumentRef, CleanedDocumentResource};
use term::{
    attribute_spans_to_term, clean_error_to_term, edit_error_to_term, projected_spans_to_term, str_to_binary,
    utf8_error_to_term,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Cleaning
// ============================================================================

fn profile(tags_with_text: Vec<String>, tags_with_attributes: HashMap<String, Vec<String>>) -> std::sync::Arc<MarkupCleaner> {
    let config = CleanerConfig::new(tags_with_text, tags_with_attributes);
    ProfileCache::global().get_or_create(&config)
}

/// Clean one document.
/// Returns {:ok, ref} or {:error, {kind, offset, message}}
#[rustler::nif(name = "clean")]
fn clean_document<'a>(
    env: Env<'a>,
    xml: Binary<'a>,
    tags_with_text: Vec<String>,
    tags_with_attributes: HashMap<String, Vec<String>>,
) -> NifResult<Term<'a>> {
    let text = match std::str::from_utf8(xml.as_slice()) {
        Ok(text) => text,
        Err(e) => return Ok(utf8_error_to_term(env, &e)),
    };

    let cleaner = profile(tags_with_text, tags_with_attributes);
    Ok(match cleaner.clean(text) {
        Ok(doc) => {
            let arc = ResourceArc::new(CleanedDocumentResource::new(doc));
            (term::ok(), arc).encode(env)
        }
        Err(e) => clean_error_to_term(env, &e),
    })
}

/// Clean many documents in parallel.
/// Returns one {:ok, ref} or {:error, ...} per input, in input order.
#[rustler::nif(schedule = "DirtyCpu")]
fn clean_batch<'a>(
    env: Env<'a>,
    xmls: Vec<Binary<'a>>,
    tags_with_text: Vec<String>,
    tags_with_attributes: HashMap<String, Vec<String>>,
) -> NifResult<Term<'a>> {
    let inputs: Vec<&[u8]> = xmls.iter().map(|b| b.as_slice()).collect();
    let cleaner = profile(tags_with_text, tags_with_attributes);

    let terms: Vec<Term<'a>> = strategy::clean_batch_utf8(&cleaner, &inputs)
        .into_iter()
        .map(|result| match result {
            Ok(Ok(doc)) => (term::ok(), ResourceArc::new(CleanedDocumentResource::new(doc))).encode(env),
            Ok(Err(e)) => clean_error_to_term(env, &e),
            Err(e) => utf8_error_to_term(env, &e),
        })
        .collect();
    Ok(terms.encode(env))
}

// ============================================================================
// Document Queries
// ============================================================================

/// Cleaned text as a binary
#[rustler::nif]
fn transformed_text<'a>(env: Env<'a>, doc_ref: CleanedDocumentRef) -> Term<'a> {
    str_to_binary(env, doc_ref.doc.transformed_text())
}

/// Map a character offset in the original to the cleaned text.
/// Returns {:ok, offset} or {:error, {:range_bounds, offset, message}}
#[rustler::nif]
fn original_to_transformed<'a>(env: Env<'a>, doc_ref: CleanedDocumentRef, offset: usize) -> Term<'a> {
    match doc_ref.doc.original_to_transformed(offset) {
        Ok(mapped) => (term::ok(), mapped).encode(env),
        Err(e) => edit_error_to_term(env, e),
    }
}

/// Map a character offset in the cleaned text back to the original.
#[rustler::nif]
fn transformed_to_original<'a>(env: Env<'a>, doc_ref: CleanedDocumentRef, offset: usize) -> Term<'a> {
    match doc_ref.doc.transformed_to_original(offset) {
        Ok(mapped) => (term::ok(), mapped).encode(env),
        Err(e) => edit_error_to_term(env, e),
    }
}

/// Attribute spans in cleaned-text coordinates
#[rustler::nif]
fn attribute_spans<'a>(env: Env<'a>, doc_ref: CleanedDocumentRef) -> NifResult<Term<'a>> {
    projected_spans_to_term(env, doc_ref.doc.projected_spans())
}

/// Attribute spans in original coordinates, including fully removed ones
#[rustler::nif]
fn original_attribute_spans<'a>(env: Env<'a>, doc_ref: CleanedDocumentRef) -> NifResult<Term<'a>> {
    let spans: Vec<&AttributeSpan> = doc_ref.doc.attributes().iter().collect();
    attribute_spans_to_term(env, &spans)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.RustyClean.Native");
