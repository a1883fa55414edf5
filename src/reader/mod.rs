//! Markup Reader Module
//!
//! - EventReader: zero-copy event reader over a string slice
//! - Events: markup event types with byte spans

pub mod events;
pub mod slice;

pub use events::{EndElement, MarkupEvent, StartElement};
pub use slice::EventReader;
