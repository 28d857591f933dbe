//! Content fingerprints
//!
//! A fingerprint is the SHA-256 digest of a file's full content rendered as
//! 64 lowercase hex characters. Files are hashed in bounded chunks so memory
//! use does not depend on file size.

use ferrosync_types::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Hex encoded content hash of a single file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed hex digest
    pub fn new<S: Into<String>>(hex: S) -> Self {
        Self(hex.into())
    }

    /// Fingerprint an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Fingerprint everything `reader` yields, `chunk_size` bytes at a time
    pub fn from_reader<R: Read>(mut reader: R, chunk_size: usize) -> std::io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; chunk_size.max(1)];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a file on disk. Blocking; run it off the async executor.
pub fn fingerprint_file(path: &Path, chunk_size: usize) -> Result<Fingerprint> {
    let file = File::open(path).map_err(|e| Error::scan(path, e.to_string()))?;
    Fingerprint::from_reader(file, chunk_size).map_err(|e| Error::scan(path, e.to_string()))
}
