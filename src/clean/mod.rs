//! Markup cleaning
//!
//! - `CleanerConfig`: which elements hold text and which attributes to keep
//! - `MarkupCleaner`: compiled profile that cleans documents
//! - `CleanedDocument`: transformation plus attribute spans in both coordinates

mod cleaner;
mod config;
mod document;

pub use cleaner::{CleanScratch, MarkupCleaner};
pub use config::{CleanerConfig, HTML_VOID_TAGS};
pub use document::CleanedDocument;
