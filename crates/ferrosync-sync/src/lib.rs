//! Incremental directory synchronization for ferrosync
//!
//! This crate keeps a remote file store in step with a local directory by
//! transferring only what changed since the last successful run:
//!
//! - **Fingerprinting**: SHA-256 of each file's full content, read in chunks
//! - **Content index**: relative path to fingerprint snapshots of a tree
//! - **Baseline store**: the index of the last successful run, persisted as text
//! - **Diffing**: changed and deleted sets from two snapshots
//! - **Remote directory cache**: at most one round trip per remote directory
//! - **Orchestration**: scan, diff, upload, delete, then persist the baseline
//! - **Progress tracking**: phase and per-file events over a channel
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferrosync_sync::{SyncEngine, SyncRequest};
//! use ferrosync_types::SessionConnector;
//!
//! # async fn example(connector: &dyn SessionConnector) -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::new();
//! let request = SyncRequest::new("public_html");
//! let result = engine.sync(&request, connector).await?;
//! println!(
//!     "Uploaded {} files, deleted {}",
//!     result.stats.files_uploaded, result.stats.files_deleted
//! );
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod diff;
pub mod engine;
pub mod fingerprint;
pub mod index;
pub mod progress;
pub mod scanner;
pub mod store;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cache::{DirectoryCacheStats, RemoteDirectoryCache};
pub use diff::{ChangeType, DiffEngine, DiffResult};
pub use engine::{SyncEngine, SyncOptions, SyncRequest, SyncResult};
pub use fingerprint::{fingerprint_file, Fingerprint};
pub use index::ContentIndex;
pub use progress::{FileAction, ProgressEvent, ProgressReporter, SyncPhase, SyncProgress};
pub use scanner::{DirectoryScanner, ScanOptions};
pub use store::IndexStore;
