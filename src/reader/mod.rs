//! Input acquisition
//!
//! The parser works on one contiguous byte slice, so streams are drained
//! up front.

use std::io::Read;

/// Initial capacity for draining a stream
const DEFAULT_BUFFER_SIZE: usize = 8192;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read an entire document from a Read source
pub fn read_all<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(DEFAULT_BUFFER_SIZE);
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Skip a leading UTF-8 byte order mark
#[inline]
pub fn strip_bom(input: &[u8]) -> &[u8] {
    input.strip_prefix(UTF8_BOM).unwrap_or(input)
}
