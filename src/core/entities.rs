//! XML Entity Decoding
//!
//! Resolves the five predefined references: &lt; &gt; &amp; &quot; &apos;
//!
//! Matching reads ahead one byte at a time, narrowing by the set of bytes
//! that can appear at each position of any reference. Anything short of a
//! complete match leaves the lookahead untouched and yields a literal `&`.
//!
//! Uses Cow for zero-copy when no `&` is present.

use memchr::memchr;
use std::borrow::Cow;

/// Bytes allowed at each position after the `&`, across all references
///
/// ```text
/// l t ;
/// g t ;
/// a m p ;
/// q u o t ;
/// a p o s ;
/// ```
const CANDIDATES: [&[u8]; 5] = [b"lgaq", b"tmup", b";po", b";ts", b";"];

/// Reference bodies (without the leading `&`) and their replacement
const REFERENCES: [(&[u8], u8); 5] = [
    (b"lt;", b'<'),
    (b"gt;", b'>'),
    (b"amp;", b'&'),
    (b"quot;", b'"'),
    (b"apos;", b'\''),
];

/// Try to resolve a reference whose `&` has already been consumed.
///
/// `rest` is the input immediately following the `&`. Returns the
/// replacement byte and the number of bytes of `rest` the match consumed,
/// or `None` when the lookahead must be left in place.
pub fn match_reference(rest: &[u8]) -> Option<(u8, usize)> {
    for (pos, allowed) in CANDIDATES.iter().enumerate() {
        let b = *rest.get(pos)?;
        if !allowed.contains(&b) {
            return None;
        }
        let read = &rest[..=pos];
        if let Some(&(_, replacement)) = REFERENCES.iter().find(|(body, _)| *body == read) {
            return Some((replacement, read.len()));
        }
    }
    None
}

/// Decode references in a run of text or a string literal body.
///
/// Returns Borrowed if no `&` is present (zero-copy),
/// returns Owned if the input had to be rewritten.
#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    // Fast path: check if there are any references using SIMD
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_references(input))
}

fn decode_references(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp]);
        pos += amp + 1;

        match match_reference(&input[pos..]) {
            Some((replacement, used)) => {
                result.push(replacement);
                pos += used;
            }
            // Unresolved: emit the ampersand, rescan what followed it
            None => result.push(b'&'),
        }
    }
    result.extend_from_slice(&input[pos..]);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &str) -> String {
        String::from_utf8(decode_text(input.as_bytes()).into_owned()).unwrap()
    }

    #[test]
    fn test_no_entities() {
        let input = b"Hello, World!";
        let result = decode_text(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), b"Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(decode("&lt;&gt;&amp;&quot;&apos;"), "<>&\"'");
        assert_eq!(decode("substitute&lt;sequence&gt;"), "substitute<sequence>");
        assert_eq!(decode("&amp;sequence&amp;"), "&sequence&");
    }

    #[test]
    fn test_partial_matches_are_put_back() {
        assert_eq!(decode("&gt&amp&apos&quot&lt;"), "&gt&amp&apos&quot<");
        assert_eq!(decode("&gt;&amp&apos&quot&lt;"), ">&amp&apos&quot<");
        assert_eq!(decode("&gt;&amp&apos;&quot&lt;"), ">&amp'&quot<");
        assert_eq!(
            decode("n&gt&amp&apos&quot&lto s&gt&amp&apos&quot&ltubst"),
            "n&gt&amp&apos&quot&lto s&gt&amp&apos&quot&ltubst"
        );
    }

    #[test]
    fn test_unknown_and_truncated() {
        assert_eq!(decode("&unknown;"), "&unknown;");
        assert_eq!(decode("&#65;"), "&#65;");
        assert_eq!(decode("tail &"), "tail &");
        assert_eq!(decode("&ap;s;"), "&ap;s;");
    }

    #[test]
    fn test_match_reference() {
        assert_eq!(match_reference(b"lt;rest"), Some((b'<', 3)));
        assert_eq!(match_reference(b"quot;"), Some((b'"', 5)));
        assert_eq!(match_reference(b"gt"), None);
        assert_eq!(match_reference(b"x"), None);
        assert_eq!(match_reference(b""), None);
    }
}
