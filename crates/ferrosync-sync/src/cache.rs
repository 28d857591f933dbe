//! Remote directory existence cache
//!
//! Uploading `a/b/c/file.txt` needs `a`, `a/b` and `a/b/c` to exist on the
//! destination. The cache remembers every directory confirmed or created
//! during one session, so each directory costs at most one round trip no
//! matter how many files live below it.

use ferrosync_types::{Error, Result, TransferSession};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

/// Counters describing how the cache was used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryCacheStats {
    /// Directories known to exist
    pub known_directories: u64,
    /// `directory_exists` calls issued to the session
    pub queries: u64,
    /// `create_directory` calls issued to the session
    pub creations: u64,
    /// Directory checks answered without a round trip
    pub hits: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    known: HashSet<String>,
    stats: DirectoryCacheStats,
}

/// Set of remote directories known to exist, scoped to one transfer session.
///
/// The cache only grows. It is never persisted; a new session starts empty.
#[derive(Debug, Default)]
pub struct RemoteDirectoryCache {
    state: Mutex<CacheState>,
}

impl RemoteDirectoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every parent directory of `file_path` exists remotely,
    /// walking from the root down to the file's immediate parent.
    ///
    /// The whole check-then-create sequence runs under one lock, so
    /// concurrent callers never create the same directory twice.
    pub async fn ensure_directories(
        &self,
        session: &dyn TransferSession,
        file_path: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        for directory in parent_chain(file_path) {
            if state.known.contains(directory) {
                state.stats.hits += 1;
                continue;
            }

            let (parent, name) = match directory.rsplit_once('/') {
                Some((parent, name)) => (parent, name),
                None => ("", directory),
            };

            state.stats.queries += 1;
            if !session.directory_exists(parent, name).await? {
                debug!("Creating remote directory '{}'", directory);
                session
                    .create_directory(directory)
                    .await
                    .map_err(|e| match e {
                        Error::DirectoryCreation { .. } => e,
                        other => Error::directory_creation(directory, other.to_string()),
                    })?;
                state.stats.creations += 1;
            }

            state.known.insert(directory.to_string());
            state.stats.known_directories += 1;
        }

        Ok(())
    }

    /// Whether `directory` was confirmed during this session
    pub async fn contains(&self, directory: &str) -> bool {
        self.state.lock().await.known.contains(directory)
    }

    /// Usage counters
    pub async fn stats(&self) -> DirectoryCacheStats {
        self.state.lock().await.stats
    }
}

/// Ancestor directories of `file_path`, root first, excluding the file itself.
///
/// `"a/b/c.txt"` yields `"a"` then `"a/b"`.
fn parent_chain(file_path: &str) -> Vec<&str> {
    let parent = match file_path.rsplit_once('/') {
        Some((parent, _)) => parent,
        None => return Vec::new(),
    };

    parent
        .match_indices('/')
        .map(|(at, _)| &parent[..at])
        .chain(std::iter::once(parent))
        .filter(|directory| !directory.is_empty() && !directory.ends_with('/'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRemote, SessionCall};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_one_query_per_directory() {
        let remote = MemoryRemote::new();
        let session = remote.session();
        let cache = RemoteDirectoryCache::new();

        for path in ["dir/a.txt", "dir/b.txt", "dir/sub/c.txt", "dir/sub/d.txt", "e.txt"] {
            cache.ensure_directories(&session, path).await.unwrap();
        }

        assert_eq!(
            remote.calls(),
            vec![
                SessionCall::DirectoryExists {
                    parent: String::new(),
                    name: "dir".to_string()
                },
                SessionCall::CreateDirectory("dir".to_string()),
                SessionCall::DirectoryExists {
                    parent: "dir".to_string(),
                    name: "sub".to_string()
                },
                SessionCall::CreateDirectory("dir/sub".to_string()),
            ]
        );

        let stats = cache.stats().await;
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.creations, 2);
        assert_eq!(stats.hits, 4);
        assert!(cache.contains("dir/sub").await);
    }

    #[tokio::test]
    async fn test_existing_directories_are_not_created() {
        let remote = MemoryRemote::new();
        remote.add_directory("site/assets");
        let session = remote.session();
        let cache = RemoteDirectoryCache::new();

        cache
            .ensure_directories(&session, "site/assets/img/logo.png")
            .await
            .unwrap();

        assert_eq!(
            remote.calls(),
            vec![
                SessionCall::DirectoryExists {
                    parent: String::new(),
                    name: "site".to_string()
                },
                SessionCall::DirectoryExists {
                    parent: "site".to_string(),
                    name: "assets".to_string()
                },
                SessionCall::DirectoryExists {
                    parent: "site/assets".to_string(),
                    name: "img".to_string()
                },
                SessionCall::CreateDirectory("site/assets/img".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_creation_failure_is_fatal() {
        let remote = MemoryRemote::new();
        remote.fail_create_directory("locked");
        let session = remote.session();
        let cache = RemoteDirectoryCache::new();

        let result = cache.ensure_directories(&session, "locked/inner/a.txt").await;

        assert!(matches!(result, Err(Error::DirectoryCreation { ref path, .. }) if path == "locked"));
        assert!(!cache.contains("locked").await);
        assert!(!remote.has_directory("locked/inner"));
    }

    #[tokio::test]
    async fn test_concurrent_callers_create_once() {
        let remote = MemoryRemote::new();
        let session = Arc::new(remote.session());
        let cache = Arc::new(RemoteDirectoryCache::new());

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let session = Arc::clone(&session);
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache
                        .ensure_directories(session.as_ref(), &format!("shared/deep/file{}.txt", i))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let creations = remote
            .calls()
            .into_iter()
            .filter(|call| matches!(call, SessionCall::CreateDirectory(_)))
            .count();
        assert_eq!(creations, 2);
        assert_eq!(cache.stats().await.queries, 2);
    }

    #[test]
    fn test_parent_chain() {
        assert!(parent_chain("a.txt").is_empty());
        assert_eq!(parent_chain("dir/b.txt"), vec!["dir"]);
        assert_eq!(parent_chain("a/b/c/d.txt"), vec!["a", "a/b", "a/b/c"]);
    }
}
