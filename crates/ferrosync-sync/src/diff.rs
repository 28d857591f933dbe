//! Difference detection between two index snapshots

use crate::index::ContentIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of change a path went through between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    /// Path is new
    Added,
    /// Path exists in both snapshots with different content
    Modified,
    /// Path no longer exists
    Deleted,
}

/// Outcome of comparing a baseline against a fresh scan.
///
/// `changed` and `deleted` never share a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Paths that must be uploaded
    pub changed: BTreeSet<String>,
    /// Paths that must be removed from the destination
    pub deleted: BTreeSet<String>,
    /// How many of `changed` are new paths
    pub added: usize,
    /// How many of `changed` existed before with other content
    pub modified: usize,
}

impl DiffResult {
    /// Nothing to upload and nothing to delete
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.deleted.is_empty()
    }

    /// Total number of remote operations required
    pub fn len(&self) -> usize {
        self.changed.len() + self.deleted.len()
    }

    /// All changes with their kind, changed paths first, each group sorted
    pub fn changes<'a>(
        &'a self,
        previous: &'a ContentIndex,
    ) -> impl Iterator<Item = (&'a str, ChangeType)> + 'a {
        self.changed
            .iter()
            .map(move |path| {
                let kind = if previous.contains(path) {
                    ChangeType::Modified
                } else {
                    ChangeType::Added
                };
                (path.as_str(), kind)
            })
            .chain(
                self.deleted
                    .iter()
                    .map(|path| (path.as_str(), ChangeType::Deleted)),
            )
    }
}

/// Compares two [`ContentIndex`] snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine;

impl DiffEngine {
    /// Create a new diff engine
    pub fn new() -> Self {
        Self
    }

    /// Paths whose content is new or different in `current`, and paths that
    /// disappeared from it. Runs in `O(|previous| + |current|)`.
    pub fn diff(&self, previous: &ContentIndex, current: &ContentIndex) -> DiffResult {
        let mut result = DiffResult::default();

        for (path, fingerprint) in current {
            match previous.get(path) {
                Some(old) if old == fingerprint => {}
                Some(_) => {
                    result.modified += 1;
                    result.changed.insert(path.clone());
                }
                None => {
                    result.added += 1;
                    result.changed.insert(path.clone());
                }
            }
        }

        for (path, _) in previous {
            if !current.contains(path) {
                result.deleted.insert(path.clone());
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use proptest::prelude::*;

    fn index_of(entries: &[(&str, &str)]) -> ContentIndex {
        entries
            .iter()
            .map(|(path, fp)| ((*path).to_string(), Fingerprint::new(*fp)))
            .collect()
    }

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|path| (*path).to_string()).collect()
    }

    #[test]
    fn test_identical_snapshots() {
        let index = index_of(&[("a", "1"), ("b", "2")]);
        let result = DiffEngine::new().diff(&index, &index);
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_added_and_deleted() {
        let previous = index_of(&[("a", "1"), ("b", "2")]);
        let current = index_of(&[("a", "1"), ("c", "3")]);

        let result = DiffEngine::new().diff(&previous, &current);

        assert_eq!(result.changed, set(&["c"]));
        assert_eq!(result.deleted, set(&["b"]));
        assert_eq!(result.added, 1);
        assert_eq!(result.modified, 0);
    }

    #[test]
    fn test_first_run_uploads_everything() {
        let current = index_of(&[("a.txt", "1"), ("dir/b.txt", "2")]);

        let result = DiffEngine::new().diff(&ContentIndex::new(), &current);

        assert_eq!(result.changed, set(&["a.txt", "dir/b.txt"]));
        assert!(result.deleted.is_empty());
    }

    #[test]
    fn test_modified_file_is_only_changed() {
        let previous = index_of(&[("a.txt", "1")]);
        let current = index_of(&[("a.txt", "2")]);

        let result = DiffEngine::new().diff(&previous, &current);

        assert_eq!(result.changed, set(&["a.txt"]));
        assert!(result.deleted.is_empty());
        assert_eq!(result.modified, 1);

        let kinds: Vec<_> = result.changes(&previous).collect();
        assert_eq!(kinds, vec![("a.txt", ChangeType::Modified)]);
    }

    #[test]
    fn test_changes_lists_every_kind() {
        let previous = index_of(&[("kept", "1"), ("edited", "1"), ("gone", "1")]);
        let current = index_of(&[("kept", "1"), ("edited", "2"), ("new", "1")]);

        let result = DiffEngine::new().diff(&previous, &current);
        let kinds: Vec<_> = result.changes(&previous).collect();

        assert_eq!(
            kinds,
            vec![
                ("edited", ChangeType::Modified),
                ("new", ChangeType::Added),
                ("gone", ChangeType::Deleted),
            ]
        );
    }

    fn arb_index() -> impl Strategy<Value = ContentIndex> {
        proptest::collection::hash_map("[a-e]{1,2}", "[0-3]", 0..12).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(path, fp)| (path, Fingerprint::new(fp)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_diff_partitions_paths(previous in arb_index(), current in arb_index()) {
            let result = DiffEngine::new().diff(&previous, &current);

            prop_assert!(result.changed.is_disjoint(&result.deleted));
            for path in &result.changed {
                prop_assert!(current.contains(path));
                prop_assert_ne!(previous.get(path), current.get(path));
            }
            for path in &result.deleted {
                prop_assert!(previous.contains(path));
                prop_assert!(!current.contains(path));
            }
            for (path, fingerprint) in &current {
                if !result.changed.contains(path) {
                    prop_assert_eq!(previous.get(path), Some(fingerprint));
                }
            }
            prop_assert_eq!(result.added + result.modified, result.changed.len());
        }

        #[test]
        fn test_diff_with_self_is_empty(index in arb_index()) {
            prop_assert!(DiffEngine::new().diff(&index, &index).is_empty());
        }
    }
}
