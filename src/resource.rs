//! ResourceArc Wrappers
//!
//! Cleaned documents handed to the BEAM. A `CleanedDocument` never changes
//! after cleaning, so the resource holds it without a lock and every query
//! NIF reads it directly.

use crate::clean::CleanedDocument;
use rustler::ResourceArc;

/// Wrapper for a cleaned document that can be stored in a ResourceArc
pub struct CleanedDocumentResource {
    pub doc: CleanedDocument,
}

impl CleanedDocumentResource {
    pub fn new(doc: CleanedDocument) -> Self {
        CleanedDocumentResource { doc }
    }
}

#[rustler::resource_impl]
impl rustler::Resource for CleanedDocumentResource {}

/// Type alias for cleaned document ResourceArc
pub type CleanedDocumentRef = ResourceArc<CleanedDocumentResource>;
