//! Cleaner configuration
//!
//! Which elements hold body text, which elements have their attributes
//! recorded, and how retained text is normalized. Loadable from JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// HTML elements that never take a close tag
pub const HTML_VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// Markup cleaning profile.
///
/// Ordered collections keep the config hashable, so it can key the
/// profile cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    /// Elements whose contents are body text
    pub tags_with_text: BTreeSet<String>,
    /// Elements whose content span is recorded, with the attribute names to keep
    pub tags_with_attributes: BTreeMap<String, BTreeSet<String>>,
    /// Elements that never take a close tag; treated as empty elements
    pub void_tags: BTreeSet<String>,
    /// Collapse whitespace runs in retained text to one space and trim the ends
    pub normalize_whitespace: bool,
    /// Replace entity and character references in retained text
    pub decode_entities: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        CleanerConfig {
            tags_with_text: BTreeSet::new(),
            tags_with_attributes: BTreeMap::new(),
            void_tags: BTreeSet::new(),
            normalize_whitespace: true,
            decode_entities: true,
        }
    }
}

impl CleanerConfig {
    pub fn new<T, A, N>(tags_with_text: T, tags_with_attributes: A) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        A: IntoIterator<Item = (String, N)>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        CleanerConfig {
            tags_with_text: tags_with_text.into_iter().map(Into::into).collect(),
            tags_with_attributes: tags_with_attributes
                .into_iter()
                .map(|(tag, names)| (tag, names.into_iter().map(Into::into).collect()))
                .collect(),
            ..Self::default()
        }
    }

    /// Preset for discussion forum dumps: `post` and `quote` bodies are text,
    /// post metadata and link/image targets are kept.
    pub fn discussion_forum() -> Self {
        Self::default()
            .with_text_tag("post")
            .with_text_tag("quote")
            .with_attribute_tag("post", ["author", "datetime", "id"])
            .with_attribute_tag("quote", ["orig_author"])
            .with_attribute_tag("a", ["href"])
            .with_attribute_tag("img", ["src"])
            .with_void_tags(HTML_VOID_TAGS.iter().copied())
    }

    pub fn with_text_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags_with_text.insert(tag.into());
        self
    }

    /// Record `tag` spans keeping only `names`; merges with earlier calls
    pub fn with_attribute_tag<I>(mut self, tag: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.tags_with_attributes
            .entry(tag.into())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_void_tags<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.void_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_normalize_whitespace(mut self, enabled: bool) -> Self {
        self.normalize_whitespace = enabled;
        self
    }

    pub fn with_decode_entities(mut self, enabled: bool) -> Self {
        self.decode_entities = enabled;
        self
    }
}
