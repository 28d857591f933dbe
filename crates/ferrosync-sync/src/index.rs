//! Path to fingerprint snapshots of a directory tree

use crate::fingerprint::Fingerprint;
use std::collections::hash_map;
use std::collections::HashMap;

/// Mapping from relative file path (`/` separated) to content fingerprint.
///
/// Ordering carries no meaning; use [`ContentIndex::sorted`] when a stable
/// order is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentIndex {
    entries: HashMap<String, Fingerprint>,
}

impl ContentIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the fingerprint for `path`, returning the previous one if any
    pub fn insert<S: Into<String>>(&mut self, path: S, fingerprint: Fingerprint) -> Option<Fingerprint> {
        self.entries.insert(path.into(), fingerprint)
    }

    /// Fingerprint recorded for `path`
    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    /// Whether `path` is present
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no files
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(path, fingerprint)` pairs in arbitrary order
    pub fn iter(&self) -> hash_map::Iter<'_, String, Fingerprint> {
        self.entries.iter()
    }

    /// Entries sorted by path
    pub fn sorted(&self) -> Vec<(&str, &Fingerprint)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(path, fingerprint)| (path.as_str(), fingerprint))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<'a> IntoIterator for &'a ContentIndex {
    type Item = (&'a String, &'a Fingerprint);
    type IntoIter = hash_map::Iter<'a, String, Fingerprint>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Extend<(String, Fingerprint)> for ContentIndex {
    fn extend<T: IntoIterator<Item = (String, Fingerprint)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl FromIterator<(String, Fingerprint)> for ContentIndex {
    fn from_iter<T: IntoIterator<Item = (String, Fingerprint)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut index = ContentIndex::new();
        assert!(index.is_empty());

        assert!(index.insert("a.txt", Fingerprint::new("1")).is_none());
        let previous = index.insert("a.txt", Fingerprint::new("2"));

        assert_eq!(previous, Some(Fingerprint::new("1")));
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.txt"), Some(&Fingerprint::new("2")));
        assert!(!index.contains("b.txt"));
    }

    #[test]
    fn test_sorted_entries() {
        let index: ContentIndex = [
            ("dir/b.txt".to_string(), Fingerprint::new("2")),
            ("a.txt".to_string(), Fingerprint::new("1")),
            ("dir/a.txt".to_string(), Fingerprint::new("3")),
        ]
        .into_iter()
        .collect();

        let paths: Vec<&str> = index.sorted().into_iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["a.txt", "dir/a.txt", "dir/b.txt"]);
    }
}
