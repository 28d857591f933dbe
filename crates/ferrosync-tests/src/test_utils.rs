//! Unified fixtures for ferrosync integration tests

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use walkdir::WalkDir;

/// Baseline file name used by the default configuration
pub const INDEX_FILE: &str = ".ferrosync";

/// A source directory and a local destination directory
pub struct SyncFixture {
    source: TempDir,
    destination: TempDir,
}

impl SyncFixture {
    /// Create two empty directories
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            source: TempDir::new()?,
            destination: TempDir::new()?,
        })
    }

    /// Source directory
    pub fn source(&self) -> &Path {
        self.source.path()
    }

    /// Destination directory
    pub fn destination(&self) -> &Path {
        self.destination.path()
    }

    /// `file://` address of the destination directory
    pub fn destination_url(&self) -> String {
        Url::from_directory_path(self.destination()).map_or_else(
            |()| format!("file://{}", self.destination().display()),
            |url| url.to_string(),
        )
    }

    /// Write a source file, creating parent directories
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> io::Result<()> {
        write_file(self.source(), relative, content.as_ref())
    }

    /// Write a file directly at the destination
    pub fn write_remote(&self, relative: &str, content: impl AsRef<[u8]>) -> io::Result<()> {
        write_file(self.destination(), relative, content.as_ref())
    }

    /// Remove a source file
    pub fn remove(&self, relative: &str) -> io::Result<()> {
        fs::remove_file(self.source().join(relative))
    }

    /// Baseline file content, `None` when it was never written
    pub fn baseline(&self) -> Option<String> {
        fs::read_to_string(self.source().join(INDEX_FILE)).ok()
    }

    /// Every destination file keyed by `/`-separated relative path
    pub fn destination_files(&self) -> BTreeMap<String, Vec<u8>> {
        tree_files(self.destination(), &[])
    }

    /// Every source file except the baseline, keyed like [`Self::destination_files`]
    pub fn source_files(&self) -> BTreeMap<String, Vec<u8>> {
        tree_files(self.source(), &[INDEX_FILE])
    }
}

fn write_file(root: &Path, relative: &str, content: &[u8]) -> io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn tree_files(root: &Path, skip: &[&str]) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            if skip.contains(&key.as_str()) {
                return None;
            }
            let content = fs::read(entry.path()).ok()?;
            Some((key, content))
        })
        .collect()
}

/// Deterministic content of `size` bytes, different for each `seed`
pub fn generate_content(size: usize, seed: u8) -> Vec<u8> {
    (0..size)
        .map(|i| ((i * 7 + 13) % 256) as u8 ^ seed)
        .collect()
}
