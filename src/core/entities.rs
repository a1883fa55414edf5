//! Entity Decoding
//!
//! Handles decoding of entity references in markup text:
//! - Built-in XML entities: &lt; &gt; &amp; &quot; &apos;
//! - Common HTML entities: &nbsp; &copy; &mdash; ...
//! - Numeric character references: &#123; &#x7B;
//!
//! Unknown references are left as literal text. Uses Cow for zero-copy when
//! no entities are present.

use memchr::memchr;
use std::borrow::Cow;
use std::ops::Range;

/// Longest reference we look for a ';' in, counted from the '&'
const MAX_REFERENCE_LEN: usize = 32;

/// A decodable reference found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    /// Byte range of the whole reference, '&' through ';'
    pub range: Range<usize>,
    pub decoded: char,
}

/// Decode a single entity name (without & and ;)
pub fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric);
    }

    let c = match entity {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "quot" => '"',
        "apos" => '\'',
        // HTML5 named entities (common ones)
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "hellip" => '\u{2026}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "euro" => '\u{20AC}',
        _ => return None,
    };
    Some(c)
}

/// Decode a numeric character reference body (after '#')
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !entity.is_empty() && entity.bytes().all(|b| b.is_ascii_digit()) => entity.parse::<u32>().ok()?,
        None => return None,
    };
    char::from_u32(codepoint).filter(|&c| c != '\0')
}

/// Match a reference at the start of `input`, which must begin with '&'.
/// Returns the byte length of the reference and its decoded character.
pub fn match_reference(input: &str) -> Option<(usize, char)> {
    let bytes = input.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let window = &bytes[1..bytes.len().min(MAX_REFERENCE_LEN)];
    let semi = memchr(b';', window)?;
    let decoded = decode_entity(&input[1..1 + semi])?;
    Some((semi + 2, decoded))
}

/// Iterator over decodable references in a piece of text
pub struct EntityRefs<'a> {
    input: &'a str,
    pos: usize,
}

impl Iterator for EntityRefs<'_> {
    type Item = EntityRef;

    fn next(&mut self) -> Option<EntityRef> {
        while self.pos < self.input.len() {
            let amp = self.pos + memchr(b'&', &self.input.as_bytes()[self.pos..])?;
            match match_reference(&self.input[amp..]) {
                Some((len, decoded)) => {
                    self.pos = amp + len;
                    return Some(EntityRef {
                        range: amp..amp + len,
                        decoded,
                    });
                }
                None => self.pos = amp + 1,
            }
        }
        None
    }
}

/// Locate every decodable reference in `input`, in order
pub fn find_entities(input: &str) -> EntityRefs<'_> {
    EntityRefs { input, pos: 0 }
}

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy),
/// returns Owned if entities were decoded.
pub fn decode_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut last = 0;
    for entity in find_entities(input) {
        result.push_str(&input[last..entity.range.start]);
        result.push(entity.decoded);
        last = entity.range.end;
    }
    if last == 0 {
        return Cow::Borrowed(input);
    }
    result.push_str(&input[last..]);
    Cow::Owned(result)
}
