//! MiniXml - small XML parser and serializer
//!
//! Pipeline:
//! - Lexer: bytes -> tokens (markup and text modes, entity decoding)
//! - Parser: tokens -> arena `Tree`, with depth/tag ceilings and an optional
//!   name -> type-code filter
//! - Writer: `Tree` -> markup, minified or indented
//!
//! Batch parsing over Rayon lives in [`strategy`]; Erlang bindings are
//! behind the `nif` feature.

pub mod core;
pub mod dom;
pub mod error;
pub mod parser;
pub mod reader;
pub mod strategy;
pub mod writer;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod resource;
#[cfg(feature = "nif")]
mod term;

pub use dom::{NodeId, NodeRef, Tree, TypeFilter, XmlNode, TEXT_NODE_NAME, UNSET_TYPE};
pub use error::{Limit, Result, XmlError};
pub use parser::{ParserOptions, XmlFile};
pub use writer::{WriteFormat, Writer};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;
