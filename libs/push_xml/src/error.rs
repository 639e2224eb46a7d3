use core::fmt;

use crate::position::Position;

/// Lexical faults: the bytes do not spell out an XML construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexicalError {
    InvalidUtf8,
    /// A code point outside the XML `Char` production.
    InvalidChar,
    InvalidName,
    MalformedTag,
    /// `<!` or `<` followed by something that is not markup.
    MalformedMarkup,
    LtInAttributeValue,
    /// `&` not followed by a syntactically valid reference.
    BadReference,
    UndefinedEntity,
    /// A character reference to a code point that is not an XML `Char`.
    BadCharRef,
    /// `--` inside a comment.
    InvalidComment,
    /// `]]>` in character data.
    CdataEndInText,
    MalformedDeclaration,
    UnsupportedEncoding,
    /// End of input inside a construct.
    UnexpectedEof,
}

impl LexicalError {
    pub fn description(&self) -> &'static str {
        match self {
            LexicalError::InvalidUtf8 => "invalid UTF-8",
            LexicalError::InvalidChar => "not an XML character",
            LexicalError::InvalidName => "invalid name",
            LexicalError::MalformedTag => "malformed tag",
            LexicalError::MalformedMarkup => "malformed markup",
            LexicalError::LtInAttributeValue => "'<' in attribute value",
            LexicalError::BadReference => "malformed entity reference",
            LexicalError::UndefinedEntity => "undefined entity",
            LexicalError::BadCharRef => "reference to invalid character number",
            LexicalError::InvalidComment => "'--' in comment",
            LexicalError::CdataEndInText => "']]>' in character data",
            LexicalError::MalformedDeclaration => "malformed XML declaration",
            LexicalError::UnsupportedEncoding => "unsupported encoding",
            LexicalError::UnexpectedEof => "unclosed token",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical(LexicalError),
    TagMismatch,
    DuplicateAttribute,
    /// End of input with elements still open.
    UnclosedElements,
    /// Character data outside the root element.
    UnexpectedCharacterData,
    /// A second top-level element.
    JunkAfterRoot,
    /// End of input before any element.
    NoElements,
    /// XML or document type declaration out of place.
    MisplacedDeclaration,
    /// A single token outgrew [`Options::max_buffered`](crate::Options::max_buffered).
    BufferLimit,
    /// More bytes after the document already ended. Leaves the session as it was.
    Finished,
}

impl ErrorKind {
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Lexical(lexical) => lexical.description(),
            ErrorKind::TagMismatch => "mismatched tag",
            ErrorKind::DuplicateAttribute => "duplicate attribute",
            ErrorKind::UnclosedElements => "unclosed elements at end of input",
            ErrorKind::UnexpectedCharacterData => "character data outside the root element",
            ErrorKind::JunkAfterRoot => "junk after document element",
            ErrorKind::NoElements => "no element found",
            ErrorKind::MisplacedDeclaration => "misplaced declaration",
            ErrorKind::BufferLimit => "token exceeds the buffer limit",
            ErrorKind::Finished => "input after the end of the document",
        }
    }
}

impl From<LexicalError> for ErrorKind {
    fn from(err: LexicalError) -> Self {
        ErrorKind::Lexical(err)
    }
}

/// A well-formedness error. Terminal for the session that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    kind: ErrorKind,
    position: Position,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, position: Position) -> Self {
        ParseError { kind, position }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Where the first offending byte sits in the stream.
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn offset(&self) -> usize {
        self.position.offset
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {} (byte {})",
            self.kind.description(),
            self.position.line,
            self.position.column,
            self.position.offset
        )
    }
}

impl core::error::Error for ParseError {}
