//! In-memory transfer session for tests
//!
//! [`MemoryRemote`] models a destination as a set of directories and a map
//! of file contents, records every call made against it, and can be told to
//! fail specific operations.

use async_trait::async_trait;
use ferrosync_types::{ByteStream, Error, Result, SessionConnector, TransferSession};
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// One call observed by a [`MemorySession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    /// `directory_exists(parent, name)`
    DirectoryExists {
        /// Parent directory
        parent: String,
        /// Directory name
        name: String,
    },
    /// `create_directory(path)`
    CreateDirectory(String),
    /// `upload_file(path, ..)`
    Upload(String),
    /// `delete_file(path)`
    Delete(String),
    /// `close()`
    Close,
}

#[derive(Debug, Default)]
struct RemoteState {
    directories: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    calls: Vec<SessionCall>,
    connections: usize,
    refuse_connections: bool,
    failing_directories: BTreeSet<String>,
    failing_uploads: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
}

/// Shared state of an in-memory destination
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<RemoteState>>,
}

impl MemoryRemote {
    /// Create an empty destination
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Session operating on this destination
    pub fn session(&self) -> MemorySession {
        MemorySession {
            remote: self.clone(),
        }
    }

    /// Connector handing out sessions on this destination
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            remote: self.clone(),
        }
    }

    /// Pre-create `path` and all of its parents
    pub fn add_directory(&self, path: &str) {
        let mut state = self.lock();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            state.directories.insert(current.clone());
        }
    }

    /// Pre-populate a file, creating its parent directories
    pub fn add_file(&self, path: &str, content: &[u8]) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.add_directory(parent);
        }
        self.lock().files.insert(path.to_string(), content.to_vec());
    }

    /// Make connection attempts fail
    pub fn refuse_connections(&self) {
        self.lock().refuse_connections = true;
    }

    /// Make `create_directory(path)` fail
    pub fn fail_create_directory(&self, path: &str) {
        self.lock().failing_directories.insert(path.to_string());
    }

    /// Make `upload_file(path, ..)` fail
    pub fn fail_upload(&self, path: &str) {
        self.lock().failing_uploads.insert(path.to_string());
    }

    /// Make `delete_file(path)` fail
    pub fn fail_delete(&self, path: &str) {
        self.lock().failing_deletes.insert(path.to_string());
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<SessionCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of sessions opened
    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    /// Content of a remote file
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().files.get(path).cloned()
    }

    /// Paths of all remote files, sorted
    pub fn file_paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    /// Whether `path` exists as a directory
    pub fn has_directory(&self, path: &str) -> bool {
        path.is_empty() || self.lock().directories.contains(path)
    }
}

/// [`TransferSession`] backed by a [`MemoryRemote`]
#[derive(Debug, Clone)]
pub struct MemorySession {
    remote: MemoryRemote,
}

#[async_trait]
impl TransferSession for MemorySession {
    async fn directory_exists(&self, parent: &str, name: &str) -> Result<bool> {
        let mut state = self.remote.lock();
        state.calls.push(SessionCall::DirectoryExists {
            parent: parent.to_string(),
            name: name.to_string(),
        });
        let path = if parent.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", parent, name)
        };
        Ok(state.directories.contains(&path))
    }

    async fn create_directory(&self, path: &str) -> Result<()> {
        let mut state = self.remote.lock();
        state.calls.push(SessionCall::CreateDirectory(path.to_string()));

        if state.failing_directories.contains(path) {
            return Err(Error::directory_creation(path, "550 Permission denied"));
        }
        if let Some((parent, _)) = path.rsplit_once('/') {
            if !state.directories.contains(parent) {
                return Err(Error::directory_creation(path, "parent directory missing"));
            }
        }

        state.directories.insert(path.to_string());
        Ok(())
    }

    async fn upload_file(&self, path: &str, mut content: ByteStream) -> Result<u64> {
        {
            let mut state = self.remote.lock();
            state.calls.push(SessionCall::Upload(path.to_string()));
            if state.failing_uploads.contains(path) {
                return Err(Error::transfer(path, "connection reset"));
            }
            if let Some((parent, _)) = path.rsplit_once('/') {
                if !state.directories.contains(parent) {
                    return Err(Error::transfer(path, "parent directory missing"));
                }
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = content.next().await {
            data.extend_from_slice(&chunk?);
        }

        let written = data.len() as u64;
        self.remote.lock().files.insert(path.to_string(), data);
        Ok(written)
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        let mut state = self.remote.lock();
        state.calls.push(SessionCall::Delete(path.to_string()));
        if state.failing_deletes.contains(path) {
            return Err(Error::transfer(path, "550 delete refused"));
        }
        state.files.remove(path);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.remote.lock().calls.push(SessionCall::Close);
        Ok(())
    }
}

/// [`SessionConnector`] for a [`MemoryRemote`]
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    remote: MemoryRemote,
}

#[async_trait]
impl SessionConnector for MemoryConnector {
    async fn connect(&self) -> Result<Box<dyn TransferSession>> {
        let mut state = self.remote.lock();
        if state.refuse_connections {
            return Err(Error::connection(self.endpoint(), "connection refused"));
        }
        state.connections += 1;
        Ok(Box::new(self.remote.session()))
    }

    fn endpoint(&self) -> String {
        "memory://".to_string()
    }
}
