//! Persisted baseline of the last successful run
//!
//! The baseline is a flat text file with one `path:fingerprint` line per
//! file. Lines are split on the first `:`, so paths must not contain one.

use crate::fingerprint::Fingerprint;
use crate::index::ContentIndex;
use ferrosync_types::{Error, Result};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Separator between path and fingerprint on a baseline line
pub const FIELD_SEPARATOR: char = ':';

/// Reads and writes a [`ContentIndex`] at a fixed file location
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Store backed by the file at `path`
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Store for the baseline file `file_name` inside the synchronized `root`
    pub fn for_root<P: AsRef<Path>>(root: P, file_name: &str) -> Self {
        Self::new(root.as_ref().join(file_name))
    }

    /// Location of the baseline file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline. A missing or empty file yields an empty index.
    pub async fn load(&self) -> Result<ContentIndex> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No baseline at '{}', starting empty", self.path.display());
                return Ok(ContentIndex::new());
            }
            Err(e) => {
                return Err(Error::Io {
                    message: format!(
                        "Failed to read baseline '{}': {}",
                        self.path.display(),
                        e
                    ),
                })
            }
        };

        let content = String::from_utf8(bytes).map_err(|e| {
            let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
            let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
            Error::parse(&self.path, line, "baseline is not valid UTF-8")
        })?;

        let index = parse_index(&self.path, &content)?;
        info!(
            "Loaded baseline '{}' with {} entries",
            self.path.display(),
            index.len()
        );
        Ok(index)
    }

    /// Overwrite the baseline with `index`.
    ///
    /// The content is written to a sibling temporary file first and then
    /// renamed into place.
    pub async fn save(&self, index: &ContentIndex) -> Result<()> {
        let content = render_index(index)?;
        let temp_path = self.temp_path();

        fs::write(&temp_path, content).await.map_err(|e| Error::Io {
            message: format!(
                "Failed to write baseline '{}': {}",
                temp_path.display(),
                e
            ),
        })?;

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Error::Io {
                message: format!(
                    "Failed to replace baseline '{}': {}",
                    self.path.display(),
                    e
                ),
            });
        }

        info!(
            "Saved baseline '{}' with {} entries",
            self.path.display(),
            index.len()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(temp_file_name(&name))
    }
}

/// Name of the scratch file [`IndexStore::save`] writes next to `index_file`
/// before renaming it into place
pub fn temp_file_name(index_file: &str) -> String {
    format!("{}.tmp", index_file)
}

/// Parse baseline text. `source` only labels errors.
pub fn parse_index(source: &Path, content: &str) -> Result<ContentIndex> {
    let mut index = ContentIndex::new();

    for (number, raw) in content.lines().enumerate() {
        let line_number = number + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }

        let (path, fingerprint) = line.split_once(FIELD_SEPARATOR).ok_or_else(|| {
            Error::parse(source, line_number, format!("missing '{}' separator", FIELD_SEPARATOR))
        })?;

        if path.is_empty() {
            return Err(Error::parse(source, line_number, "empty path"));
        }
        if fingerprint.is_empty() {
            return Err(Error::parse(source, line_number, "empty fingerprint"));
        }
        if index
            .insert(path, Fingerprint::new(fingerprint))
            .is_some()
        {
            return Err(Error::parse(
                source,
                line_number,
                format!("duplicate entry for '{}'", path),
            ));
        }
    }

    Ok(index)
}

/// Render an index as baseline text, one line per entry sorted by path
pub fn render_index(index: &ContentIndex) -> Result<String> {
    let mut content = String::new();

    for (path, fingerprint) in index.sorted() {
        if path.contains(FIELD_SEPARATOR) || path.contains('\n') {
            return Err(Error::other(format!(
                "Cannot persist '{}': baseline paths may not contain '{}' or line breaks",
                path, FIELD_SEPARATOR
            )));
        }
        let _ = writeln!(content, "{}{}{}", path, FIELD_SEPARATOR, fingerprint);
    }

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn index_of(entries: &[(&str, &str)]) -> ContentIndex {
        entries
            .iter()
            .map(|(path, fp)| ((*path).to_string(), Fingerprint::new(*fp)))
            .collect()
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");

        let index = store.load().await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_load_empty_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");
        std::fs::write(store.path(), "").unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_single_entry_without_trailing_newline() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");
        std::fs::write(store.path(), "test:5d41402abc4b2a76b9719d911017c592").unwrap();

        let index = store.load().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("test").map(Fingerprint::as_str),
            Some("5d41402abc4b2a76b9719d911017c592")
        );
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");
        let index = index_of(&[("b.txt", "2"), ("a.txt", "1"), ("dir/c.txt", "3")]);

        store.save(&index).await.unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(written, "a.txt:1\nb.txt:2\ndir/c.txt:3\n");
        assert_eq!(store.load().await.unwrap(), index);
        assert!(!temp_dir.path().join(temp_file_name(".ferrosync")).exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_baseline() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");

        store.save(&index_of(&[("a.txt", "1"), ("b.txt", "2")])).await.unwrap();
        store.save(&index_of(&[("c.txt", "3")])).await.unwrap();

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "c.txt:3\n");
    }

    #[tokio::test]
    async fn test_save_rejects_separator_in_path() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");

        let result = store.save(&index_of(&[("c:/boot.ini", "1")])).await;
        assert!(result.is_err());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = IndexStore::for_root(temp_dir.path(), ".ferrosync");
        std::fs::write(store.path(), b"a.txt:1\nb\xff.txt:2\n").unwrap();

        match store.load().await {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_splits_on_first_colon() {
        let index = parse_index(Path::new(".ferrosync"), "a.txt:ab:cd\r\n\nb.txt:ef\n").unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a.txt").map(Fingerprint::as_str), Some("ab:cd"));
        assert_eq!(index.get("b.txt").map(Fingerprint::as_str), Some("ef"));
    }

    #[rstest]
    #[case::missing_separator("a.txt:1\nbroken line\n", 2)]
    #[case::empty_path(":abc\n", 1)]
    #[case::empty_fingerprint("a.txt:1\nb.txt:\n", 2)]
    #[case::duplicate_path("a.txt:1\nb.txt:2\na.txt:3\n", 3)]
    fn test_parse_errors_carry_line_numbers(#[case] content: &str, #[case] expected_line: usize) {
        match parse_index(Path::new(".ferrosync"), content) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn test_render_parse_round_trip(
            entries in proptest::collection::hash_map("[a-z0-9_./-]{1,24}", "[0-9a-f]{64}", 0..32)
        ) {
            let index: ContentIndex = entries
                .into_iter()
                .map(|(path, fp)| (path, Fingerprint::new(fp)))
                .collect();

            let rendered = render_index(&index).unwrap();
            let parsed = parse_index(Path::new(".ferrosync"), &rendered).unwrap();
            prop_assert_eq!(parsed, index);
        }
    }
}
