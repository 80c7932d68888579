//! String table for lexemes
//!
//! Tokens carry a `u32` slot into this table instead of a copy of their
//! text. Identifiers and attribute values are interned (equal lexemes share
//! a slot); text runs are appended as-is.
//!
//! Slot 0 is reserved for the empty string.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::error::{Result, XmlError};

#[derive(Debug)]
pub struct StringTable {
    /// Strings indexed by slot
    entries: Vec<String>,
    /// Hash of string content -> slots with that hash
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        StringTable {
            entries: vec![String::new()],
            hash_index: HashMap::new(),
        }
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Store `s`, returning the slot of an existing equal entry if any
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            if let Some(&id) = ids.iter().find(|&&id| self.entries[id as usize] == s) {
                return id;
            }
        }

        let id = self.push(s.to_owned());
        self.hash_index.entry(hash).or_default().push(id);
        id
    }

    /// Append without deduplication
    pub fn push(&mut self, s: String) -> u32 {
        let id = self.entries.len() as u32;
        self.entries.push(s);
        id
    }

    pub fn get(&self, id: u32) -> Result<&str> {
        self.entries
            .get(id as usize)
            .map(String::as_str)
            .ok_or_else(|| XmlError::lookup(format!("code index {id} out of bounds")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1 // Slot 0 is reserved
    }
}
