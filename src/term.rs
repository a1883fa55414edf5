//! Elixir Term Conversion Utilities
//!
//! Converts cleaning results and errors to Elixir terms.

use crate::error::{CleanError, EditError};
use crate::index::{AttributeSpan, Attributes, ProjectedSpan};
use rustler::types::atom::nil;
use rustler::{Atom, Encoder, Env, NewBinary, NifResult, Term};
use std::str::Utf8Error;

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    range_order,
    range_bounds,
    overlap,
    markup_structure,
    invalid_utf8,
    start,
    end,
    original_start,
    original_end,
    depth,
    tag,
    attributes,
}

/// Atom naming an error kind
fn kind_atom(err: &CleanError) -> Atom {
    match err {
        CleanError::Edit(EditError::RangeOrder { .. }) => range_order(),
        CleanError::Edit(EditError::RangeBounds { .. }) => range_bounds(),
        CleanError::Overlap(_) => overlap(),
        CleanError::MarkupStructure(_) => markup_structure(),
    }
}

/// `{:error, {kind, offset | nil, message}}`
pub fn clean_error_to_term<'a>(env: Env<'a>, err: &CleanError) -> Term<'a> {
    let offset = match err.offset() {
        Some(offset) => offset.encode(env),
        None => nil().encode(env),
    };
    (error(), (kind_atom(err), offset, err.to_string())).encode(env)
}

/// `{:error, {:range_bounds, offset, message}}` for a rejected offset query
pub fn edit_error_to_term<'a>(env: Env<'a>, err: EditError) -> Term<'a> {
    clean_error_to_term(env, &CleanError::Edit(err))
}

/// `{:error, {:invalid_utf8, byte_offset, message}}`
pub fn utf8_error_to_term<'a>(env: Env<'a>, err: &Utf8Error) -> Term<'a> {
    (error(), (invalid_utf8(), err.valid_up_to(), err.to_string())).encode(env)
}

/// Attribute names and values as an Elixir map of binaries
fn attributes_to_term<'a>(env: Env<'a>, attrs: &Attributes) -> NifResult<Term<'a>> {
    let pairs: Vec<(Term<'a>, Term<'a>)> = attrs
        .iter()
        .map(|(name, value)| (str_to_binary(env, name), str_to_binary(env, value)))
        .collect();
    Term::map_from_pairs(env, &pairs)
}

/// Projected spans as a list of maps:
/// `%{start, end, original_start, original_end, depth, tag, attributes}`
pub fn projected_spans_to_term<'a>(env: Env<'a>, spans: &[ProjectedSpan]) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for span in spans.iter().rev() {
        let pairs = [
            (start(), span.transformed.start.encode(env)),
            (end(), span.transformed.end.encode(env)),
            (original_start(), span.original.start.encode(env)),
            (original_end(), span.original.end.encode(env)),
            (depth(), span.depth.encode(env)),
            (tag(), str_to_binary(env, &span.tag_name)),
            (attributes(), attributes_to_term(env, &span.attributes)?),
        ];
        list = list.list_prepend(Term::map_from_pairs(env, &pairs)?);
    }
    Ok(list)
}

/// Original-coordinate spans as a list of maps:
/// `%{start, end, depth, tag, attributes}`
pub fn attribute_spans_to_term<'a>(env: Env<'a>, spans: &[&AttributeSpan]) -> NifResult<Term<'a>> {
    let mut list = Term::list_new_empty(env);
    for span in spans.iter().rev() {
        let pairs = [
            (start(), span.span.start.encode(env)),
            (end(), span.span.end.encode(env)),
            (depth(), span.depth.encode(env)),
            (tag(), str_to_binary(env, &span.tag_name)),
            (attributes(), attributes_to_term(env, &span.attributes)?),
        ];
        list = list.list_prepend(Term::map_from_pairs(env, &pairs)?);
    }
    Ok(list)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    let bytes = s.as_bytes();
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
