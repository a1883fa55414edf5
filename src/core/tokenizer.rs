//! Markup Tokenizer - pull-style token extraction
//!
//! Extracts markup tokens with their byte spans:
//! - Element start/end/empty tags
//! - Text content (entities left undecoded, positions matter downstream)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE and other `<!...>` declarations
//!
//! A `<` that cannot start markup (`a < b`) is text. Unterminated constructs
//! and unreadable end tags are errors; after the first error the tokenizer
//! yields nothing more.

use super::scanner::{is_name_start_char, Scanner};
use std::fmt;

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between tokens
    Ready,
    /// End of input reached or an error was reported
    Done,
}

/// Type of markup token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration, internal subset included
    DocType,
    /// Any other <!...> declaration
    Declaration,
}

/// A markup token. All positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags: the element name. For PIs: the target.
    pub name: Option<&'a str>,
    /// Inner region: attribute text for tags, body for text/CDATA/comments,
    /// data for PIs, everything after the keyword for declarations
    pub content: (usize, usize),
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize), content: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content,
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }
}

/// Tokenizer failure; `position` is the byte offset where the construct starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.message, self.position)
    }
}

impl std::error::Error for ParseError {}

/// Markup tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    state: ParseState,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input.as_bytes()),
            state: ParseState::Ready,
        }
    }

    /// Get the next token, `Ok(None)` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, ParseError> {
        if self.state == ParseState::Done || self.scanner.is_eof() {
            self.state = ParseState::Done;
            return Ok(None);
        }

        let result = if self.at_markup(self.scanner.position()) {
            self.parse_markup()
        } else {
            Ok(self.parse_text())
        };

        if result.is_err() {
            self.state = ParseState::Done;
        }
        result.map(Some)
    }

    /// Whether a '<' at `pos` opens a markup construct
    fn at_markup(&self, pos: usize) -> bool {
        let bytes = self.input.as_bytes();
        bytes.get(pos) == Some(&b'<')
            && bytes
                .get(pos + 1)
                .is_some_and(|&b| matches!(b, b'/' | b'!' | b'?') || is_name_start_char(b))
    }

    /// Parse text up to the next markup construct or end of input
    fn parse_text(&mut self) -> Token<'a> {
        let start = self.scanner.position();
        let mut from = start + 1;
        let end = loop {
            match self.scanner.find_tag_start_from(from) {
                Some(lt) if self.at_markup(lt) => break lt,
                Some(lt) => from = lt + 1,
                None => break self.scanner.len(),
            }
        };
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, (start, end), (start, end))
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self) -> Result<Token<'a>, ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1); // Skip '<'

        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            _ => self.parse_start_tag(start),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        let name = self.read_name().ok_or_else(|| ParseError::new("Invalid element name", start))?;
        let attrs_start = self.scanner.position();

        // Find the end of the tag, handling quoted attributes
        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| ParseError::new(format!("Unterminated start tag <{}>", name), start))?;

        let is_empty = end > attrs_start && self.input.as_bytes()[end - 1] == b'/';
        let attrs_end = if is_empty { end - 1 } else { end };

        self.scanner.set_position(end + 1);
        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, (start, end + 1), (attrs_start, attrs_end)).with_name(name))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '/'

        let name = self
            .read_name()
            .ok_or_else(|| ParseError::new("Invalid element name in end tag", start))?;
        let rest = self.scanner.position();

        let end = self
            .scanner
            .find_byte(b'>')
            .ok_or_else(|| ParseError::new(format!("Unterminated end tag </{}>", name), start))?;

        self.scanner.set_position(end + 1);
        Ok(Token::new(TokenKind::EndTag, (start, end + 1), (rest, end)).with_name(name))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE, declaration)
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with(b"--") {
            self.parse_delimited(start, 2, b"-->", TokenKind::Comment, "Unterminated comment")
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.parse_delimited(start, 7, b"]]>", TokenKind::CData, "Unterminated CDATA section")
        } else if self.scanner.starts_with_ignore_case(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            let content_start = self.scanner.position();
            let end = self
                .scanner
                .find_tag_end_quoted()
                .ok_or_else(|| ParseError::new("Unterminated declaration", start))?;
            self.scanner.set_position(end + 1);
            Ok(Token::new(TokenKind::Declaration, (start, end + 1), (content_start, end)))
        }
    }

    /// Parse a construct closed by a fixed terminator (comment, CDATA)
    fn parse_delimited(
        &mut self,
        start: usize,
        opener: usize,
        terminator: &[u8],
        kind: TokenKind,
        message: &str,
    ) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(opener);
        let content_start = self.scanner.position();

        let close = self
            .scanner
            .find_sequence(terminator)
            .ok_or_else(|| ParseError::new(message, start))?;

        let end = close + terminator.len();
        self.scanner.set_position(end);
        Ok(Token::new(kind, (start, end), (content_start, close)))
    }

    /// Parse a DOCTYPE declaration, skipping over an internal subset
    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(7); // Skip 'DOCTYPE'
        let content_start = self.scanner.position();
        let unterminated = || ParseError::new("Unterminated DOCTYPE", start);

        let mut end = self.scanner.find_byte2(b'[', b'>').ok_or_else(unterminated)?;
        if self.input.as_bytes()[end] == b'[' {
            self.scanner.set_position(end + 1);
            // Declarations in the subset may quote a ']'
            let subset_end = self.scanner.find_unquoted(b']').ok_or_else(unterminated)?;
            self.scanner.set_position(subset_end + 1);
            end = self.scanner.find_byte(b'>').ok_or_else(unterminated)?;
        }

        self.scanner.set_position(end + 1);
        Ok(Token::new(TokenKind::DocType, (start, end + 1), (content_start, end)))
    }

    /// Parse a processing instruction <?target ...?>
    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, ParseError> {
        self.scanner.advance(1); // Skip '?'
        let target = self.read_name();
        let data_start = self.scanner.position();

        let close = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| ParseError::new("Unterminated processing instruction", start))?;

        self.scanner.set_position(close + 2);
        let kind = match target {
            Some(t) if t.eq_ignore_ascii_case("xml") => TokenKind::XmlDeclaration,
            _ => TokenKind::ProcessingInstruction,
        };
        let token = Token::new(kind, (start, close + 2), (data_start.min(close), close));
        Ok(match target {
            Some(t) => token.with_name(t),
            None => token,
        })
    }

    /// Read a name at the current position. Names end on an ASCII byte or at
    /// end of input, so the slice is always on a character boundary.
    fn read_name(&mut self) -> Option<&'a str> {
        let start = self.scanner.position();
        let len = self.scanner.read_name()?.len();
        self.input.get(start..start + len)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
