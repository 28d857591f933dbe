//! Directory tree scanning
//!
//! Every run rebuilds the [`ContentIndex`] from scratch: the tree is walked,
//! each regular file is hashed in full, and nothing is taken from file
//! timestamps. Hashing of distinct files runs on the blocking thread pool,
//! bounded by the configured concurrency.

use crate::fingerprint::{fingerprint_file, Fingerprint};
use crate::index::ContentIndex;
use crate::store::{temp_file_name, FIELD_SEPARATOR};
use ferrosync_types::{ChunkSize, Concurrency, Error, Result};
use futures::{stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Settings for [`DirectoryScanner`]
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Baseline file name at the root, never indexed along with its
    /// temporary sibling
    pub index_file: String,
    /// Ignore list file name at the root
    pub ignore_file: String,
    /// Read chunk size for hashing
    pub chunk_size: ChunkSize,
    /// Files hashed at once
    pub concurrency: Concurrency,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            index_file: ".ferrosync".to_string(),
            ignore_file: ".ferrosyncignore".to_string(),
            chunk_size: ChunkSize::default(),
            concurrency: Concurrency::optimal(),
        }
    }
}

/// Builds a [`ContentIndex`] reflecting the current state of a directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryScanner {
    options: ScanOptions,
}

impl DirectoryScanner {
    /// Create a scanner with the given options
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Walk `root` and fingerprint every regular file below it.
    ///
    /// Any walk or read failure aborts the scan with [`Error::Scan`].
    pub async fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ContentIndex> {
        let root = root.as_ref().to_path_buf();

        let metadata = fs::metadata(&root)
            .await
            .map_err(|e| Error::scan(&root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(Error::scan(&root, "not a directory"));
        }

        let ignored = self.load_ignore_list(&root).await?;
        let index_file = self.options.index_file.clone();
        let walk_root = root.clone();
        let files = tokio::task::spawn_blocking(move || {
            collect_files(&walk_root, &index_file, &ignored)
        })
        .await
        .map_err(|e| Error::scan(&root, format!("walk task failed: {}", e)))??;

        debug!(
            "Hashing {} files under '{}' with concurrency {}",
            files.len(),
            root.display(),
            self.options.concurrency.get()
        );

        let chunk_size = self.options.chunk_size.get();
        let index: ContentIndex = stream::iter(files)
            .map(|(key, path)| hash_entry(key, path, chunk_size))
            .buffer_unordered(self.options.concurrency.get())
            .try_collect()
            .await?;

        info!("Scanned {} files in '{}'", index.len(), root.display());
        Ok(index)
    }

    async fn load_ignore_list(&self, root: &Path) -> Result<HashSet<String>> {
        let path = root.join(&self.options.ignore_file);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(Error::scan(&path, e.to_string())),
        };

        let ignored: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.trim_start_matches("./").to_string())
            .collect();

        debug!("Loaded {} ignore entries from '{}'", ignored.len(), path.display());
        Ok(ignored)
    }
}

async fn hash_entry(key: String, path: PathBuf, chunk_size: usize) -> Result<(String, Fingerprint)> {
    let task_path = path.clone();
    let fingerprint =
        tokio::task::spawn_blocking(move || fingerprint_file(&task_path, chunk_size))
            .await
            .map_err(|e| Error::scan(&path, format!("hash task failed: {}", e)))??;
    Ok((key, fingerprint))
}

fn collect_files(
    root: &Path,
    index_file: &str,
    ignored: &HashSet<String>,
) -> Result<Vec<(String, PathBuf)>> {
    let index_temp = temp_file_name(index_file);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::scan(path, e.to_string())
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let key = relative_key(root, entry.path())?;
        if key == index_file || key == index_temp {
            continue;
        }
        if ignored.contains(&key) {
            debug!("Ignoring '{}'", key);
            continue;
        }

        files.push((key, entry.into_path()));
    }

    Ok(files)
}

/// Index key for `path`: relative to `root`, `/` separated, valid UTF-8
/// and free of characters the baseline format cannot represent.
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| Error::scan(path, "path is outside the scanned root"))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| Error::scan(path, "path is not valid UTF-8"))?;
                segments.push(segment);
            }
            _ => return Err(Error::scan(path, "unexpected path component")),
        }
    }

    let key = segments.join("/");
    if key.contains(FIELD_SEPARATOR) || key.contains('\n') || key.contains('\r') {
        return Err(Error::scan(
            path,
            format!(
                "file names containing '{}' or line breaks cannot be recorded in the baseline",
                FIELD_SEPARATOR
            ),
        ));
    }

    Ok(key)
}
