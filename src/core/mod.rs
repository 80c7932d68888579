//! Core XML parsing primitives
//!
//! - Scanner: byte cursor with memchr-accelerated delimiter search
//! - Entities: decoding of the five predefined references
//! - Strings: lexeme table referenced by token index
//! - Lexer: markup/text mode tokenizer

pub mod entities;
pub mod lexer;
pub mod scanner;
pub mod strings;
pub mod token;

pub use lexer::Lexer;
pub use token::{Token, TokenKind};
