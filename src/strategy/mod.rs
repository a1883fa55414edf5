//! Processing Strategy Module
//!
//! - Single document: `MarkupCleaner::clean` on the calling thread
//! - Batch: Rayon parallel map over independent documents

pub mod parallel;

pub use parallel::{annotate_batch, clean_batch, clean_batch_utf8, DocumentInput};
