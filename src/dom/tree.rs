//! XML Tree - Arena-based node graph
//!
//! - Slots addressed by `NodeId`, reused after release
//! - Children owned by their parent's id list, in document order
//! - `parent` / `next` back-links kept in step with every append, unlink and sort
//! - A synthetic root whose children are the top-level parsed nodes

use std::cmp::Ordering;

use super::node::{NodeId, NodeRef, XmlNode, UNSET_TYPE};
use crate::error::{Result, XmlError};

#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<XmlNode>>,
    free: Vec<NodeId>,
    root: NodeId,
    live: usize,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Tree holding only an unnamed synthetic root
    pub fn new() -> Self {
        Self::with_root(XmlNode::element(""))
    }

    pub fn with_root(root: XmlNode) -> Self {
        Tree {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: 0,
            live: 1,
        }
    }

    #[inline]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// The synthetic root; `release` and `detach` refuse to remove it
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.node(self.root)
    }

    /// First top-level node; the document element of a parsed tree
    pub fn document_element(&self) -> Option<NodeRef<'_>> {
        self.root()?.first_child()
    }

    /// Number of live nodes, root included
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// True when only the root remains
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&XmlNode> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.get(id).map(|node| NodeRef::new(self, id, node))
    }

    pub fn require(&self, id: NodeId) -> Result<NodeRef<'_>> {
        self.node(id)
            .ok_or_else(|| XmlError::lookup(format!("invalid node id {id}")))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut XmlNode> {
        self.slots
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| XmlError::lookup(format!("invalid node id {id}")))
    }

    fn alloc(&mut self, node: XmlNode) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(id) => {
                self.slots[id as usize] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                (self.slots.len() - 1) as NodeId
            }
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create an unattached node
    pub fn create(&mut self, name: impl Into<String>, type_code: i64) -> NodeId {
        self.alloc(XmlNode::new(name, type_code))
    }

    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.create(name, UNSET_TYPE)
    }

    pub fn create_text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(XmlNode::text_node(text))
    }

    /// Append `child` to `parent`, taking ownership of it.
    ///
    /// Fails if `child` already has a parent, is the root, or is an
    /// ancestor of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require(parent)?;
        let attached = self.require(child)?.has_parent();
        if child == self.root || attached {
            return Err(XmlError::lookup(format!(
                "node {child} is already attached"
            )));
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(XmlError::lookup(format!(
                    "node {child} is an ancestor of node {parent}"
                )));
            }
            cursor = self.get(id).and_then(|n| n.parent);
        }

        self.link_child(parent, child);
        Ok(())
    }

    /// Append without checks; both ids are known live and `child` is free
    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        let last = self.get(parent).and_then(|p| p.children.last().copied());
        if let Some(last) = last.and_then(|id| self.slots[id as usize].as_mut()) {
            last.next = Some(child);
        }
        if let Some(node) = self.slots[child as usize].as_mut() {
            node.parent = Some(parent);
            node.next = None;
        }
        if let Some(node) = self.slots[parent as usize].as_mut() {
            node.children.push(child);
        }
    }

    /// Remove `id` from its parent's children, repairing sibling links
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.slots[parent as usize].as_mut() {
            node.children.retain(|&c| c != id);
            let children = node.children.clone();
            self.relink(&children);
        }
        if let Some(node) = self.slots[id as usize].as_mut() {
            node.parent = None;
            node.next = None;
        }
    }

    /// Rewrite `next` links to follow the order of `children`
    fn relink(&mut self, children: &[NodeId]) {
        for (i, &id) in children.iter().enumerate() {
            let next = children.get(i + 1).copied();
            if let Some(node) = self.slots[id as usize].as_mut() {
                node.next = next;
            }
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<()> {
        self.slot_mut(id)?.text = text.into();
        Ok(())
    }

    pub fn set_type_code(&mut self, id: NodeId, code: i64) -> Result<()> {
        self.slot_mut(id)?.type_code = code;
        Ok(())
    }

    /// Insert an attribute. Returns `false` (and keeps the old value) if the key exists.
    pub fn insert_attribute(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<bool> {
        let node = self.slot_mut(id)?;
        let key = key.into();
        if node.attributes.contains_key(&key) {
            return Ok(false);
        }
        node.attributes.insert(key, value.into());
        Ok(true)
    }

    pub fn insert_int(&mut self, id: NodeId, key: &str, value: i64) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }
        self.insert_attribute(id, key, value.to_string())
    }

    pub fn insert_float(&mut self, id: NodeId, key: &str, value: f64) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }
        self.insert_attribute(id, key, value.to_string())
    }

    /// Stable sort of the direct children of `id`; equal elements keep their order
    pub fn sort_children<F>(&mut self, id: NodeId, mut compare: F) -> Result<()>
    where
        F: FnMut(NodeRef<'_>, NodeRef<'_>) -> Ordering,
    {
        let mut children = std::mem::take(&mut self.slot_mut(id)?.children);
        {
            let tree = &*self;
            children.sort_by(|&a, &b| match (tree.node(a), tree.node(b)) {
                (Some(a), Some(b)) => compare(a, b),
                _ => Ordering::Equal,
            });
        }
        self.relink(&children);
        self.slot_mut(id)?.children = children;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------

    /// Mark whether releasing `id` should leave its children alive
    pub fn set_detached_state(&mut self, id: NodeId, detached: bool) -> Result<()> {
        self.slot_mut(id)?.children_detached = detached;
        Ok(())
    }

    /// Destroy `id` and, unless its children are detached, its whole subtree.
    ///
    /// Detached children survive as parentless nodes. Returns the number of
    /// nodes released.
    pub fn release(&mut self, id: NodeId) -> Result<usize> {
        if id == self.root {
            return Err(XmlError::lookup("the tree root cannot be released"));
        }
        self.require(id)?;
        self.unlink(id);
        Ok(self.free_subtree(id))
    }

    /// Release every child of `id` (children of a detached node are only orphaned)
    pub fn clear_children(&mut self, id: NodeId) -> Result<usize> {
        let node = self.slot_mut(id)?;
        let detached = node.children_detached;
        let children = std::mem::take(&mut node.children);

        let mut released = 0;
        for child in children {
            if detached {
                self.orphan(child);
            } else {
                released += self.free_subtree(child);
            }
        }
        Ok(released)
    }

    fn orphan(&mut self, id: NodeId) {
        if let Some(node) = self.slots.get_mut(id as usize).and_then(Option::as_mut) {
            node.parent = None;
            node.next = None;
        }
    }

    fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut released = 0;
        let mut pending = vec![id];

        while let Some(id) = pending.pop() {
            let Some(node) = self.slots.get_mut(id as usize).and_then(Option::take) else {
                continue;
            };
            self.free.push(id);
            self.live -= 1;
            released += 1;

            if node.children_detached {
                for child in node.children {
                    self.orphan(child);
                }
            } else {
                pending.extend(node.children);
            }
        }
        released
    }

    /// Move the subtree at `id` out of this tree. The node becomes the root
    /// of the returned tree.
    pub fn detach(&mut self, id: NodeId) -> Result<Tree> {
        if id == self.root {
            return Err(XmlError::lookup("the tree root cannot be detached"));
        }
        self.require(id)?;
        self.unlink(id);

        let mut out = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: 0,
            live: 0,
        };
        let mut pending: Vec<(NodeId, Option<NodeId>)> = vec![(id, None)];

        while let Some((old, new_parent)) = pending.pop() {
            let Some(mut node) = self.slots.get_mut(old as usize).and_then(Option::take) else {
                continue;
            };
            self.free.push(old);
            self.live -= 1;

            let children = std::mem::take(&mut node.children);
            node.parent = None;
            node.next = None;

            let new_id = out.alloc(node);
            match new_parent {
                Some(parent) => out.link_child(parent, new_id),
                None => out.root = new_id,
            }
            pending.extend(children.into_iter().rev().map(|c| (c, Some(new_id))));
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Visit `from` and everything below it in pre-order
    pub fn traverse<F>(&self, from: NodeId, mut visit: F)
    where
        F: FnMut(NodeRef<'_>),
    {
        if let Some(start) = self.node(from) {
            visit(start);
            start.descendants().for_each(visit);
        }
    }

    /// Visit `from` and everything below it, calling `pre` on entry and
    /// `post` once all of a node's children have been visited.
    pub fn stack_traverse<Pre, Post>(&self, from: NodeId, mut pre: Pre, mut post: Post)
    where
        Pre: FnMut(NodeRef<'_>),
        Post: FnMut(NodeRef<'_>),
    {
        enum StackEntry {
            Enter(NodeId),
            Exit(NodeId),
        }

        let mut stack = vec![StackEntry::Enter(from)];
        while let Some(entry) = stack.pop() {
            match entry {
                StackEntry::Enter(id) => {
                    let Some(node) = self.node(id) else { continue };
                    pre(node);
                    stack.push(StackEntry::Exit(id));
                    if let Some(n) = self.get(id) {
                        stack.extend(n.children.iter().rev().map(|&c| StackEntry::Enter(c)));
                    }
                }
                StackEntry::Exit(id) => {
                    if let Some(node) = self.node(id) {
                        post(node);
                    }
                }
            }
        }
    }
}
