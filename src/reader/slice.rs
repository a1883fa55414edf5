//! Zero-Copy Slice Reader
//!
//! Turns tokenizer output into markup events borrowing from the input string.

use super::events::{EndElement, MarkupEvent, StartElement};
use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{ParseError, Token, TokenKind, Tokenizer};

/// Zero-copy event reader over a string slice
pub struct EventReader<'a> {
    input: &'a str,
    tokenizer: Tokenizer<'a>,
}

impl<'a> EventReader<'a> {
    pub fn new(input: &'a str) -> Self {
        EventReader {
            input,
            tokenizer: Tokenizer::new(input),
        }
    }

    /// Get the next markup event, `Ok(None)` at end of input
    pub fn next_event(&mut self) -> Result<Option<MarkupEvent<'a>>, ParseError> {
        let Some(token) = self.tokenizer.next_token()? else {
            return Ok(None);
        };
        let span = token.span.0..token.span.1;

        let event = match token.kind {
            TokenKind::StartTag => MarkupEvent::StartElement(self.start_element(&token)?),
            TokenKind::EmptyTag => MarkupEvent::EmptyElement(self.start_element(&token)?),
            TokenKind::EndTag => {
                let name = tag_name(&token)?;
                MarkupEvent::EndElement(EndElement::new(name, span))
            }
            TokenKind::Text => MarkupEvent::Text {
                text: &self.input[span.clone()],
                span,
            },
            TokenKind::CData => MarkupEvent::CData {
                span,
                content: token.content.0..token.content.1,
            },
            TokenKind::Comment => MarkupEvent::Comment { span },
            TokenKind::ProcessingInstruction => MarkupEvent::ProcessingInstruction {
                target: token.name,
                span,
            },
            TokenKind::XmlDeclaration => MarkupEvent::XmlDeclaration { span },
            TokenKind::DocType => MarkupEvent::DocType { span },
            TokenKind::Declaration => MarkupEvent::Declaration { span },
        };
        Ok(Some(event))
    }

    fn start_element(&self, token: &Token<'a>) -> Result<StartElement<'a>, ParseError> {
        let name = tag_name(token)?;
        let (attrs_start, attrs_end) = token.content;
        let attributes = parse_attributes(&self.input[attrs_start..attrs_end]);
        Ok(StartElement::new(name, attributes, token.span.0..token.span.1))
    }
}

/// Tag tokens always carry a name; a missing one is reported rather than
/// trusted.
fn tag_name<'a>(token: &Token<'a>) -> Result<&'a str, ParseError> {
    token
        .name
        .ok_or_else(|| ParseError::new("Tag without a name", token.span.0))
}

impl<'a> Iterator for EventReader<'a> {
    type Item = Result<MarkupEvent<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_events(input: &str) -> Result<Vec<MarkupEvent<'_>>, ParseError> {
        EventReader::new(input).collect()
    }

    #[test]
    fn test_simple_element() {
        let events = parse_events("<root>hello</root>").unwrap();
        assert_eq!(events.len(), 3);

        assert!(matches!(&events[0], MarkupEvent::StartElement(e) if e.name == "root" && e.span == (0..6)));
        assert!(matches!(&events[1], MarkupEvent::Text { text: "hello", span } if *span == (6..11)));
        assert!(matches!(&events[2], MarkupEvent::EndElement(e) if e.name == "root"));
    }

    #[test]
    fn test_empty_element() {
        let events = parse_events("<br/>").unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], MarkupEvent::EmptyElement(e) if e.name == "br"));
    }

    #[test]
    fn test_attributes() {
        let events = parse_events("<post author=\"kim\" datetime='2014-01-01' id=p1>").unwrap();
        let MarkupEvent::StartElement(e) = &events[0] else {
            panic!("Expected StartElement");
        };
        assert_eq!(e.get_attribute_value("author"), Some("kim"));
        assert_eq!(e.get_attribute_value("datetime"), Some("2014-01-01"));
        assert_eq!(e.get_attribute_value("id"), Some("p1"));
    }

    #[test]
    fn test_cdata() {
        let input = "<script><![CDATA[alert('hi')]]></script>";
        let events = parse_events(input).unwrap();
        assert_eq!(events.len(), 3);
        let MarkupEvent::CData { content, .. } = &events[1] else {
            panic!("Expected CData");
        };
        assert_eq!(&input[content.clone()], "alert('hi')");
    }

    #[test]
    fn test_comment_and_declarations() {
        let events = parse_events("<?xml version=\"1.0\"?><!DOCTYPE a><a><!-- c --></a>").unwrap();
        assert!(matches!(events[0], MarkupEvent::XmlDeclaration { .. }));
        assert!(matches!(events[1], MarkupEvent::DocType { .. }));
        assert!(events.iter().any(|e| matches!(e, MarkupEvent::Comment { .. })));
    }

    #[test]
    fn test_error_stops_reader() {
        let mut reader = EventReader::new("<a>text<!-- open");
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_ok());
        let err = reader.next().unwrap().unwrap_err();
        assert_eq!(err.position, 7);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_spans_tile_input() {
        let input = "  <a x='1'>t &amp; u<b/></a>\n";
        let events = parse_events(input).unwrap();
        let mut pos = 0;
        for event in &events {
            let span = event.span();
            assert_eq!(span.start, pos);
            pos = span.end;
        }
        assert_eq!(pos, input.len());
    }
}
