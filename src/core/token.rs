//! Lexical tokens

/// Type of token. The discriminant is reported in syntax errors.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenKind {
    #[default]
    Undefined = 0x00,
    /// `<`
    TagOpen = 0x01,
    /// `>`
    TagClose = 0x02,
    /// `/`
    Slash = 0x03,
    /// `?`
    Question = 0x04,
    /// `=`
    Equals = 0x05,
    /// Quoted attribute value
    String = 0x06,
    Identifier = 0x07,
    /// Non-blank character data between tags
    Text = 0x08,
    /// The reserved word `xml`
    KwXml = 0x09,
    Eof = 0x0A,
}

impl TokenKind {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A token: its kind, the string-table slot of its lexeme (identifiers,
/// strings and text only), and the line it started on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token {
    pub kind: TokenKind,
    pub index: u32,
    pub line: u32,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Token {
            kind,
            index: 0,
            line,
        }
    }

    #[inline]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }
}
