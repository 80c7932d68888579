//! DOM Module - Arena-based XML tree
//!
//! - `Tree` arena with `NodeId` (u32) indices
//! - `NodeRef` borrowed handles for lookup and navigation
//! - `TypeFilter` tables mapping tag names to type codes

pub mod filter;
pub mod node;
pub mod tree;

pub use filter::{TypeFilter, TypeFilterMap};
pub use node::{
    AttributeMap, Children, Descendants, NodeId, NodeRef, XmlNode, TEXT_NODE_NAME, UNSET_TYPE,
    XML_NODE_NAME,
};
pub use tree::Tree;
