//! Byte cursor over the input with SIMD delimiter search (memchr)

use memchr::memchr;

/// Cursor over a byte slice with one-step lookahead and put-back
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume and return the current byte
    #[inline]
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Return the last `n` consumed bytes to the input
    #[inline]
    pub fn putback(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    /// Skip blanks (space and tab). Line breaks are left for the caller to count.
    #[inline]
    pub fn skip_blanks(&mut self) {
        while let Some(b' ' | b'\t') = self.peek() {
            self.pos += 1;
        }
    }

    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Take everything up to (not including) the next '<', or to end of input
    pub fn take_until_tag_start(&mut self) -> &'a [u8] {
        let rest = self.remaining();
        let len = memchr(b'<', rest).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Read bytes until a delimiter, returning the slice and advancing past delimiter
    pub fn read_until(&mut self, delimiter: u8) -> Option<&'a [u8]> {
        let rest = self.remaining();
        let end = memchr(delimiter, rest)?;
        self.pos += end + 1;
        Some(&rest[..end])
    }

    /// Read bytes up to and including `needle`, returning the part before it
    pub fn read_until_seq(&mut self, needle: &[u8]) -> Option<&'a [u8]> {
        let rest = self.remaining();
        let first = *needle.first()?;
        let mut from = 0;
        while let Some(i) = memchr(first, &rest[from..]) {
            let at = from + i;
            if rest[at..].starts_with(needle) {
                self.pos += at + needle.len();
                return Some(&rest[..at]);
            }
            from = at + 1;
        }
        None
    }

    /// Read an identifier: a letter followed by letters, digits, '_', ':' or '-'
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }
        self.pos += 1;

        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }

        Some(&self.input[start..self.pos])
    }
}

#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

#[inline]
pub fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'-')
}

/// Count line breaks, treating "\r\n" as a single break
pub fn count_lines(bytes: &[u8]) -> u32 {
    let mut lines = 0;
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        match b {
            b'\n' => lines += 1,
            b'\r' => {
                if iter.peek() == Some(&&b'\n') {
                    iter.next();
                }
                lines += 1;
            }
            _ => {}
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_until_tag_start() {
        let mut scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.take_until_tag_start(), b"hello ");
        assert_eq!(scanner.peek(), Some(b'<'));

        let mut scanner = Scanner::new(b"no tag");
        assert_eq!(scanner.take_until_tag_start(), b"no tag");
        assert!(scanner.is_eof());
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new(b"ns:element-name_2>");
        assert_eq!(scanner.read_name(), Some(b"ns:element-name_2" as &[u8]));
        assert_eq!(scanner.peek(), Some(b'>'));

        let mut scanner = Scanner::new(b"_private");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_putback() {
        let mut scanner = Scanner::new(b"abc");
        scanner.next_byte();
        scanner.next_byte();
        scanner.putback(2);
        assert_eq!(scanner.position(), 0);
        scanner.putback(5);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_read_until() {
        let mut scanner = Scanner::new(b"value\" rest");
        assert_eq!(scanner.read_until(b'"'), Some(b"value" as &[u8]));
        assert_eq!(scanner.remaining(), b" rest");
        assert_eq!(scanner.read_until(b'"'), None);
    }

    #[test]
    fn test_read_until_seq() {
        let mut scanner = Scanner::new(b" a - b -- c -->after");
        assert_eq!(scanner.read_until_seq(b"-->"), Some(b" a - b -- c " as &[u8]));
        assert_eq!(scanner.remaining(), b"after");
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(b"a\nb\r\nc\rd"), 3);
        assert_eq!(count_lines(b"none"), 0);
    }
}
