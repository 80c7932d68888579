//! XML Lexer
//!
//! Two modes:
//! - markup (default): `<`, `>`, `/`, `?`, `=`, quoted strings,
//!   identifiers and the `xml` keyword. `<!...>` constructs are skipped.
//! - text: entered after `>`. Collects everything up to the next `<` as one
//!   run, decodes references, and emits it unless it is blank.

use super::entities::decode_text;
use super::scanner::{count_lines, is_name_start_char, Scanner};
use super::strings::StringTable;
use super::token::{Token, TokenKind};
use crate::error::{Result, XmlError};

pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    strings: StringTable,
    line: u32,
    in_markup: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Lexer {
            scanner: Scanner::new(input),
            strings: StringTable::new(),
            line: 1,
            in_markup: true,
        }
    }

    /// Line the scanner is currently on
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Resolve the lexeme of an identifier, string or text token
    pub fn string(&self, index: u32) -> Result<&str> {
        self.strings.get(index)
    }

    /// Scan the next token. Once the input is exhausted this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            if !self.in_markup {
                if let Some(token) = self.scan_text() {
                    return Ok(token);
                }
                continue;
            }

            let line = self.line;
            let Some(b) = self.scanner.next_byte() else {
                return Ok(Token::new(TokenKind::Eof, line));
            };

            let kind = match b {
                b'<' if self.scanner.peek() == Some(b'!') => {
                    self.skip_comment()?;
                    continue;
                }
                b'<' => TokenKind::TagOpen,
                b'>' => {
                    self.in_markup = false;
                    TokenKind::TagClose
                }
                b'/' => TokenKind::Slash,
                b'?' => TokenKind::Question,
                b'=' => TokenKind::Equals,
                b'"' | b'\'' => return self.scan_string(b),
                b if is_name_start_char(b) => {
                    self.scanner.putback(1);
                    return Ok(self.scan_symbol());
                }
                b'\r' => {
                    if self.scanner.peek() == Some(b'\n') {
                        self.scanner.advance(1);
                    }
                    self.line += 1;
                    continue;
                }
                b'\n' => {
                    self.line += 1;
                    continue;
                }
                b' ' | b'\t' => {
                    self.scanner.skip_blanks();
                    continue;
                }
                other => {
                    return Err(XmlError::lexical(
                        line,
                        format!("unknown character parsed #x{other:02X}"),
                    ));
                }
            };
            return Ok(Token::new(kind, line));
        }
    }

    /// Text mode: one run up to the next '<'. Blank runs produce no token.
    fn scan_text(&mut self) -> Option<Token> {
        let line = self.line;
        let run = self.scanner.take_until_tag_start();
        self.in_markup = true;
        self.line += count_lines(run);

        if run
            .iter()
            .all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        {
            return None;
        }

        let decoded = decode_text(run);
        let index = self
            .strings
            .push(String::from_utf8_lossy(&decoded).into_owned());
        Some(Token::new(TokenKind::Text, line).with_index(index))
    }

    /// Quoted value; the opening quote is already consumed and must be matched
    fn scan_string(&mut self, quote: u8) -> Result<Token> {
        let line = self.line;
        let body = self
            .scanner
            .read_until(quote)
            .ok_or_else(|| XmlError::lexical(line, "unterminated string, unexpected end of file"))?;
        self.line += count_lines(body);

        let decoded = decode_text(body);
        let index = self.strings.intern(&String::from_utf8_lossy(&decoded));
        Ok(Token::new(TokenKind::String, line).with_index(index))
    }

    fn scan_symbol(&mut self) -> Token {
        let line = self.line;
        let Some(name) = self.scanner.read_name() else {
            return Token::new(TokenKind::Undefined, line);
        };

        if name == b"xml" {
            return Token::new(TokenKind::KwXml, line);
        }
        // Identifiers are ASCII by construction
        let index = self.strings.intern(&String::from_utf8_lossy(name));
        Token::new(TokenKind::Identifier, line).with_index(index)
    }

    /// Skip `<!-- ... -->` or any other `<! ... >` construct. The '<' is consumed.
    ///
    /// The construct behaves like a closed tag: scanning resumes in text mode.
    fn skip_comment(&mut self) -> Result<()> {
        let line = self.line;
        let body = if self.scanner.starts_with(b"!--") {
            self.scanner.advance(3);
            self.scanner.read_until_seq(b"-->")
        } else {
            self.scanner.read_until(b'>')
        };
        let body = body.ok_or_else(|| XmlError::lexical(line, "unterminated comment, unexpected end of file"))?;
        self.line += count_lines(body);
        self.in_markup = false;
        Ok(())
    }
}
