//! Error taxonomy
//!
//! Every failure surfaced by the scanner, parser, tree accessors and writer
//! is one of the variants below. Parse failures are hard failures: there is
//! no partial result.

use thiserror::Error;

/// Which resource ceiling was crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Element nesting exceeded the configured depth
    Depth(u16),
    /// Element + text node count exceeded the configured maximum
    Tags(u16),
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Limit::Depth(max) => write!(f, "maximum recursion depth exceeded ({max})"),
            Limit::Tags(max) => write!(f, "maximum tag limit exceeded ({max})"),
        }
    }
}

#[derive(Debug, Error)]
pub enum XmlError {
    /// Unrecognized byte, unterminated string or comment
    #[error("lexical error on line {line}: {message}")]
    Lexical { line: u32, message: String },

    /// Wrong token sequence, mismatched tags, duplicate attributes
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: u32, message: String },

    /// Depth or tag-count ceiling crossed
    #[error("line {line}: {limit}")]
    ResourceLimit { line: u32, limit: Limit },

    /// A required attribute/child is missing, or an index is out of range
    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XmlError {
    pub fn lexical(line: u32, message: impl Into<String>) -> Self {
        XmlError::Lexical {
            line,
            message: message.into(),
        }
    }

    pub fn syntax(line: u32, message: impl Into<String>) -> Self {
        XmlError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn lookup(message: impl Into<String>) -> Self {
        XmlError::Lookup(message.into())
    }

    /// Source line the error was raised on, when known
    pub fn line(&self) -> Option<u32> {
        match self {
            XmlError::Lexical { line, .. }
            | XmlError::Syntax { line, .. }
            | XmlError::ResourceLimit { line, .. } => Some(*line),
            XmlError::Lookup(_) | XmlError::Io(_) => None,
        }
    }
}

pub type Result<T, E = XmlError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_messages() {
        let err = XmlError::ResourceLimit {
            line: 3,
            limit: Limit::Depth(16),
        };
        assert_eq!(
            err.to_string(),
            "line 3: maximum recursion depth exceeded (16)"
        );

        let err = XmlError::ResourceLimit {
            line: 1,
            limit: Limit::Tags(4),
        };
        assert!(err.to_string().contains("maximum tag limit exceeded"));
    }

    #[test]
    fn test_line() {
        assert_eq!(XmlError::syntax(7, "boom").line(), Some(7));
        assert_eq!(XmlError::lookup("missing").line(), None);
    }
}
