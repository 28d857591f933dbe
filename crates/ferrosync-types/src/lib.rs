//! Core type system and error handling for ferrosync
//!
//! This crate provides the foundational types shared by every ferrosync
//! crate:
//!
//! - **Error handling**: one error enum naming the sync step that failed
//! - **Core types**: run statistics and identifiers
//! - **Traits**: the async transfer session a destination has to provide
//! - **Configuration**: validated chunk size and concurrency values
//!
//! # Features
//!
//! - `std` (default): Enable standard library features
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_types::{Error, ErrorKind, Result, SyncStats};
//!
//! fn example_operation() -> Result<SyncStats> {
//!     let mut stats = SyncStats::new();
//!     stats.files_uploaded = 2;
//!     stats.bytes_uploaded = 10;
//!     Ok(stats)
//! }
//!
//! assert!(example_operation().is_ok());
//! assert_eq!(Error::transfer("a.txt", "reset").kind(), ErrorKind::Transfer);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{ChunkSize, Concurrency};
pub use error::{Error, ErrorKind, ErrorSeverity};
pub use result::Result;
pub use traits::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use std::sync::Mutex;

    struct NullSession {
        uploaded: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait::async_trait]
    impl TransferSession for NullSession {
        async fn directory_exists(&self, _parent: &str, _name: &str) -> Result<bool> {
            Ok(true)
        }

        async fn create_directory(&self, _path: &str) -> Result<()> {
            Ok(())
        }

        async fn upload_file(&self, path: &str, mut content: ByteStream) -> Result<u64> {
            let mut total = 0;
            while let Some(chunk) = content.next().await {
                total += chunk?.len();
            }
            self.uploaded.lock().unwrap().push((path.to_string(), total));
            Ok(total as u64)
        }

        async fn delete_file(&self, _path: &str) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_session_is_object_safe() {
        let session: Box<dyn TransferSession> = Box::new(NullSession {
            uploaded: Mutex::new(Vec::new()),
        });
        let chunks = vec![Ok(Bytes::from_static(b"hel")), Ok(Bytes::from_static(b"lo"))];

        let written = tokio_test::block_on(
            session.upload_file("a.txt", stream::iter(chunks).boxed()),
        )
        .unwrap();
        assert_eq!(written, 5);
    }

    #[test]
    fn test_upload_propagates_stream_errors() {
        let session = NullSession {
            uploaded: Mutex::new(Vec::new()),
        };
        let chunks = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(Error::scan("a.txt", "read failed")),
        ];

        let result = tokio_test::block_on(
            session.upload_file("a.txt", stream::iter(chunks).boxed()),
        );
        assert!(matches!(result, Err(Error::Scan { .. })));
        assert!(session.uploaded.lock().unwrap().is_empty());
    }
}
