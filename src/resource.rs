//! ResourceArc Wrappers
//!
//! Keeps a parsed tree alive on the Rust side between NIF calls.

use std::sync::Mutex;

use rustler::ResourceArc;

use crate::dom::Tree;

/// A parsed document held by the BEAM
pub struct DocumentResource {
    pub tree: Mutex<Option<Tree>>,
    pub tag_count: u32,
}

impl DocumentResource {
    pub fn new(tree: Tree, tag_count: u32) -> Self {
        DocumentResource {
            tree: Mutex::new(Some(tree)),
            tag_count,
        }
    }

    /// Run `f` against the stored tree.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if the tree mutex is poisoned,
    /// or `"no_document"` if no tree is present.
    pub fn with_tree<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(&Tree) -> R,
    {
        let guard = self.tree.lock().map_err(|_| "mutex_poisoned")?;
        let tree = guard.as_ref().ok_or("no_document")?;
        Ok(f(tree))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
