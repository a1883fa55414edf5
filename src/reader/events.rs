//! Markup Event Types
//!
//! Event types for pull-parser style markup processing. Every event keeps
//! the byte range it occupies in the input, since downstream consumers edit
//! the input in place rather than rebuild it.

use crate::core::attributes::Attribute;
use std::ops::Range;

/// Markup parsing event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags, entities undecoded
    Text { text: &'a str, span: Range<usize> },
    /// CDATA section; `content` is the range between the delimiters
    CData { span: Range<usize>, content: Range<usize> },
    /// Comment
    Comment { span: Range<usize> },
    /// Processing instruction: <?target data?>
    ProcessingInstruction { target: Option<&'a str>, span: Range<usize> },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration { span: Range<usize> },
    /// DOCTYPE declaration
    DocType { span: Range<usize> },
    /// Other <!...> declaration
    Declaration { span: Range<usize> },
}

impl MarkupEvent<'_> {
    /// Byte range the event occupies in the input
    pub fn span(&self) -> Range<usize> {
        match self {
            MarkupEvent::StartElement(e) | MarkupEvent::EmptyElement(e) => e.span.clone(),
            MarkupEvent::EndElement(e) => e.span.clone(),
            MarkupEvent::Text { span, .. }
            | MarkupEvent::CData { span, .. }
            | MarkupEvent::Comment { span }
            | MarkupEvent::ProcessingInstruction { span, .. }
            | MarkupEvent::XmlDeclaration { span }
            | MarkupEvent::DocType { span }
            | MarkupEvent::Declaration { span } => span.clone(),
        }
    }
}

/// Start element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Element attributes, in document order
    pub attributes: Vec<Attribute<'a>>,
    pub span: Range<usize>,
}

impl<'a> StartElement<'a> {
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>, span: Range<usize>) -> Self {
        StartElement { name, attributes, span }
    }

    /// Get an attribute value by name; the first occurrence wins
    pub fn get_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.value.as_ref())
    }
}

/// End element event data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a str,
    pub span: Range<usize>,
}

impl<'a> EndElement<'a> {
    pub fn new(name: &'a str, span: Range<usize>) -> Self {
        EndElement { name, span }
    }
}
