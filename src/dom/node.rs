//! XML Node representation
//!
//! Nodes live in a [`Tree`] arena and refer to each other by [`NodeId`].
//! [`NodeRef`] is the borrowed read handle used for lookups and navigation.

use std::collections::HashMap;

use super::tree::Tree;
use crate::error::{Result, XmlError};

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Attribute name -> value. Iteration order is unspecified.
pub type AttributeMap = HashMap<String, String>;

/// Name given to nodes synthesized for text runs
pub const TEXT_NODE_NAME: &str = "_text_node";

/// Name of the placeholder built for the `<?xml ...?>` prolog
pub const XML_NODE_NAME: &str = "xml";

/// Type code of a node no filter has stamped
pub const UNSET_TYPE: i64 = -1;

/// A node stored in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    pub(crate) type_code: i64,
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) attributes: AttributeMap,
    /// Owned children in document order
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// Following sibling under the same parent
    pub(crate) next: Option<NodeId>,
    /// When set, releasing this node orphans its children instead of releasing them
    pub(crate) children_detached: bool,
}

impl XmlNode {
    pub fn new(name: impl Into<String>, type_code: i64) -> Self {
        XmlNode {
            type_code,
            name: name.into(),
            text: String::new(),
            attributes: AttributeMap::new(),
            children: Vec::new(),
            parent: None,
            next: None,
            children_detached: false,
        }
    }

    /// An element with no type code
    pub fn element(name: impl Into<String>) -> Self {
        Self::new(name, UNSET_TYPE)
    }

    /// A synthetic text node carrying `text`
    pub fn text_node(text: impl Into<String>) -> Self {
        let mut node = Self::element(TEXT_NODE_NAME);
        node.text = text.into();
        node
    }

    #[inline]
    pub fn is_text_node(&self) -> bool {
        self.name == TEXT_NODE_NAME
    }
}

/// Borrowed handle to a node inside a [`Tree`]
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    id: NodeId,
    node: &'a XmlNode,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("name", &self.node.name)
            .field("type_code", &self.node.type_code)
            .finish()
    }
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(tree: &'a Tree, id: NodeId, node: &'a XmlNode) -> Self {
        NodeRef { tree, id, node }
    }

    fn wrap(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.and_then(|id| self.tree.node(id))
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    /// Inline text of this node (for elements: the last text run seen inside it)
    #[inline]
    pub fn text(&self) -> &'a str {
        &self.node.text
    }

    #[inline]
    pub fn type_code(&self) -> i64 {
        self.node.type_code
    }

    #[inline]
    pub fn is_text_node(&self) -> bool {
        self.node.is_text_node()
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    #[inline]
    pub fn attributes(&self) -> &'a AttributeMap {
        &self.node.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, or `default` when absent
    pub fn attribute_or<'d>(&self, name: &str, default: &'d str) -> &'d str
    where
        'a: 'd,
    {
        self.attribute(name).unwrap_or(default)
    }

    /// Attribute value that must be present
    pub fn get(&self, name: &str) -> Result<&'a str> {
        self.attribute(name).ok_or_else(|| {
            XmlError::lookup(format!(
                "attribute '{}' not found on <{}>",
                name, self.node.name
            ))
        })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.node.attributes.contains_key(name)
    }

    /// Integer attribute; absent, empty or unparsable values give `default`
    pub fn integer(&self, name: &str, default: i64) -> i64 {
        self.parse_attribute(name).unwrap_or(default)
    }

    pub fn int64(&self, name: &str, default: i64) -> i64 {
        self.integer(name, default)
    }

    /// Values outside the `i32` range give `default`; they are never truncated
    pub fn int32(&self, name: &str, default: i32) -> i32 {
        self.parse_attribute::<i64>(name)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    /// Values outside the `i16` range give `default`
    pub fn int16(&self, name: &str, default: i16) -> i16 {
        self.parse_attribute::<i64>(name)
            .and_then(|v| i16::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn float32(&self, name: &str, default: f32) -> f32 {
        self.parse_attribute(name).unwrap_or(default)
    }

    pub fn float64(&self, name: &str, default: f64) -> f64 {
        self.parse_attribute(name).unwrap_or(default)
    }

    fn parse_attribute<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.attribute(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| v.parse().ok())
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.node.name == name
    }

    #[inline]
    pub fn is_type_of(&self, code: i64) -> bool {
        self.node.type_code == code
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.node.children.is_empty()
    }

    #[inline]
    pub fn has_parent(&self) -> bool {
        self.node.parent.is_some()
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children().any(|c| c.is_named(name))
    }

    #[inline]
    pub fn has_text(&self) -> bool {
        !self.node.text.is_empty()
    }

    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.node.attributes.is_empty()
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Number of direct children
    #[inline]
    pub fn len(&self) -> usize {
        self.node.children.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.node.children.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<NodeRef<'a>> {
        self.wrap(self.node.children.get(index).copied())
    }

    pub fn children(&self) -> Children<'a> {
        Children {
            tree: self.tree,
            next: self.node.children.first().copied(),
        }
    }

    /// All nodes below this one in document order (pre-order, excluding self)
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            tree: self.tree,
            stack: self.node.children.iter().rev().copied().collect(),
        }
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.at(0)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.node.parent)
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.node.next)
    }

    /// First child, which must exist and (when `name` is non-empty) carry `name`
    pub fn require_first_child(&self, name: &str) -> Result<NodeRef<'a>> {
        let first = self
            .first_child()
            .ok_or_else(|| XmlError::lookup("missing required child nodes"))?;
        if !name.is_empty() && !first.is_named(name) {
            return Err(XmlError::lookup(format!(
                "the first child node's type does not match the required type name: {name}"
            )));
        }
        Ok(first)
    }

    /// First child, which must exist and carry type code `code`
    pub fn require_first_child_of_type(&self, code: i64) -> Result<NodeRef<'a>> {
        let first = self
            .first_child()
            .ok_or_else(|| XmlError::lookup("missing required child nodes"))?;
        if !first.is_type_of(code) {
            return Err(XmlError::lookup(format!(
                "the first child node's type does not match the required type code: {code}"
            )));
        }
        Ok(first)
    }

    pub fn first_child_of(&self, name: &str) -> Option<NodeRef<'a>> {
        self.children().find(|c| c.is_named(name))
    }

    pub fn first_child_of_type(&self, code: i64) -> Option<NodeRef<'a>> {
        self.children().find(|c| c.is_type_of(code))
    }

    pub fn children_named(&self, name: &str) -> Vec<NodeRef<'a>> {
        self.children().filter(|c| c.is_named(name)).collect()
    }

    pub fn children_of_type(&self, code: i64) -> Vec<NodeRef<'a>> {
        self.children().filter(|c| c.is_type_of(code)).collect()
    }

    /// Nearest node named `name`, starting with this one and walking up
    pub fn first_parent_of(&self, name: &str) -> Option<NodeRef<'a>> {
        self.ancestors_or_self().find(|n| n.is_named(name))
    }

    pub fn first_parent_of_type(&self, code: i64) -> Option<NodeRef<'a>> {
        self.ancestors_or_self().find(|n| n.is_type_of(code))
    }

    /// Next following sibling named `name`
    pub fn next_sibling_of(&self, name: &str) -> Option<NodeRef<'a>> {
        self.following_siblings().find(|n| n.is_named(name))
    }

    pub fn next_sibling_of_type(&self, code: i64) -> Option<NodeRef<'a>> {
        self.following_siblings().find(|n| n.is_type_of(code))
    }

    fn ancestors_or_self(&self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(Some(*self), |n| n.parent())
    }

    fn following_siblings(&self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.next_sibling(), |n| n.next_sibling())
    }
}

/// Iterator over direct children, following `next` links
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.tree.node(self.next?)?;
        self.next = current.node.next;
        Some(current)
    }
}

/// Pre-order iterator over descendants
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.stack.pop()?;
            if let Some(node) = self.tree.node(id) {
                self.stack.extend(node.node.children.iter().rev().copied());
                return Some(node);
            }
        }
    }
}
