//! Attribute Parsing
//!
//! Parses attributes from tag content. Lenient: quoted and unquoted values,
//! boolean attributes and stray characters are all accepted.

use super::entities::decode_text;
use super::scanner::{is_name_char, is_name_start_char};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Attribute value (entities decoded)
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    pub fn new(name: &'a str, value: Cow<'a, str>) -> Self {
        Attribute { name, value }
    }
}

/// Parse attributes from raw tag content (after the element name)
///
/// Input should be the content between element name and '>' or '/>'.
/// Every byte the loop stops on is ASCII, so all slices stay on character
/// boundaries.
pub fn parse_attributes(input: &str) -> Vec<Attribute<'_>> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // Skip whitespace
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() || bytes[pos] == b'/' || bytes[pos] == b'>' {
            break;
        }

        if !is_name_start_char(bytes[pos]) {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // Skip whitespace around '='
        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() || bytes[pos] != b'=' {
            // Attribute without value (like HTML boolean attributes)
            attrs.push(Attribute::new(name, Cow::Borrowed("")));
            continue;
        }

        pos += 1; // Skip '='

        while pos < bytes.len() && is_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() {
            attrs.push(Attribute::new(name, Cow::Borrowed("")));
            break;
        }

        let quote = bytes[pos];
        if quote != b'"' && quote != b'\'' {
            // Unquoted value (non-standard but handle it)
            let value_start = pos;
            while pos < bytes.len() && !is_whitespace(bytes[pos]) && bytes[pos] != b'>' {
                if bytes[pos] == b'/' && pos + 1 == bytes.len() {
                    break;
                }
                pos += 1;
            }
            attrs.push(Attribute::new(name, decode_text(&input[value_start..pos])));
            continue;
        }

        pos += 1; // Skip opening quote
        let value_start = pos;
        let value_end = memchr(quote, &bytes[pos..]).map_or(bytes.len(), |i| pos + i);
        attrs.push(Attribute::new(name, decode_text(&input[value_start..value_end])));
        pos = (value_end + 1).min(bytes.len());
    }

    attrs
}

/// Check if byte is whitespace
#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
