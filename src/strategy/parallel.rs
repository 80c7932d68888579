//! Parallel batch parsing and writing
//!
//! Every input gets its own parser and tree, so nothing is shared between
//! workers beyond the read-only filter table.

use rayon::prelude::*;
use tracing::debug;

use crate::dom::{Tree, TypeFilter};
use crate::error::Result;
use crate::parser::{ParserOptions, XmlFile};
use crate::writer::{write_document, WriteFormat};

/// Parse each input independently. Results keep the order of `inputs`;
/// each is the detached tree and its tag count.
pub fn parse_batch<I>(
    inputs: &[I],
    filter: &[TypeFilter<'_>],
    options: ParserOptions,
) -> Vec<Result<(Tree, u32)>>
where
    I: AsRef<[u8]> + Sync,
{
    debug!(documents = inputs.len(), "parsing batch");
    inputs
        .par_iter()
        .map(|input| XmlFile::detach_read(input.as_ref(), filter, options))
        .collect()
}

/// Serialize the document element of each tree
pub fn write_batch(trees: &[Tree], format: WriteFormat) -> Vec<Result<String>> {
    trees
        .par_iter()
        .map(|tree| -> Result<String> {
            let mut out = Vec::new();
            write_document(tree, &mut out, format)?;
            Ok(String::from_utf8_lossy(&out).into_owned())
        })
        .collect()
}
