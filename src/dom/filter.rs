//! Name -> type-code whitelist applied while reducing parsed nodes

use std::collections::HashMap;

/// One filter entry: nodes named `name` are kept and stamped with `code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFilter<'a> {
    pub name: &'a str,
    pub code: i64,
}

impl<'a> TypeFilter<'a> {
    pub const fn new(name: &'a str, code: i64) -> Self {
        TypeFilter { name, code }
    }
}

/// Lookup table built from a `TypeFilter` slice. Empty means "keep everything".
#[derive(Debug, Clone, Default)]
pub struct TypeFilterMap {
    codes: HashMap<String, i64>,
}

impl TypeFilterMap {
    pub fn from_entries(entries: &[TypeFilter<'_>]) -> Self {
        let mut map = TypeFilterMap::default();
        map.extend(entries);
        map
    }

    /// Add entries; a later entry for the same name replaces the earlier code
    pub fn extend(&mut self, entries: &[TypeFilter<'_>]) {
        self.codes
            .extend(entries.iter().map(|e| (e.name.to_owned(), e.code)));
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.codes.get(name).copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRIES: &[TypeFilter<'static>] = &[
        TypeFilter::new("keep", 1),
        TypeFilter::new("also", 2),
    ];

    #[test]
    fn test_lookup() {
        let map = TypeFilterMap::from_entries(ENTRIES);
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup("keep"), Some(1));
        assert_eq!(map.lookup("drop"), None);
    }

    #[test]
    fn test_later_entry_wins() {
        let mut map = TypeFilterMap::from_entries(ENTRIES);
        map.extend(&[TypeFilter::new("keep", 9)]);
        assert_eq!(map.lookup("keep"), Some(9));
        map.clear();
        assert!(map.is_empty());
    }
}
