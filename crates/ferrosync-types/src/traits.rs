//! Core traits for ferrosync operations
//!
//! The synchronization engine only ever talks to a destination through
//! [`TransferSession`], so any remote store that can answer "does this
//! directory exist", create a directory, overwrite a file and delete a file
//! can be a sync target.

use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Stream of file content chunks handed to [`TransferSession::upload_file`]
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// An established connection to a sync destination.
///
/// All paths are relative to the destination root and use `/` separators.
/// The empty string denotes the root itself.
#[async_trait]
pub trait TransferSession: Send + Sync {
    /// Check whether `name` exists as a directory inside `parent`
    async fn directory_exists(&self, parent: &str, name: &str) -> Result<bool>;

    /// Create a single directory whose parent already exists
    async fn create_directory(&self, path: &str) -> Result<()>;

    /// Write `content` to `path`, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    async fn upload_file(&self, path: &str, content: ByteStream) -> Result<u64>;

    /// Remove the file at `path`. Removing a file that is already gone succeeds.
    async fn delete_file(&self, path: &str) -> Result<()>;

    /// Release the session
    async fn close(&self) -> Result<()>;
}

/// Factory that establishes [`TransferSession`]s for one destination
#[async_trait]
pub trait SessionConnector: Send + Sync {
    /// Open a new session, failing with a connection or timeout error
    async fn connect(&self) -> Result<Box<dyn TransferSession>>;

    /// Human readable destination, with credentials stripped
    fn endpoint(&self) -> String;
}
