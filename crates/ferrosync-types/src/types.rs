//! Core data types for ferrosync

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Unique identifier for a synchronization run
pub type OperationId = uuid::Uuid;

/// Counters collected over one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SyncStats {
    /// Number of regular files fingerprinted
    pub files_scanned: u64,
    /// Number of files uploaded to the destination
    pub files_uploaded: u64,
    /// Number of files removed from the destination
    pub files_deleted: u64,
    /// Total bytes uploaded
    pub bytes_uploaded: u64,
    /// Number of remote directories created
    pub directories_created: u64,
    /// Number of remote directory existence queries issued
    pub directory_queries: u64,
    /// Number of directory checks answered from the session cache
    pub directory_cache_hits: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl SyncStats {
    /// Create a new empty statistics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload throughput in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_uploaded as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Whether the run touched the destination at all
    pub fn has_remote_changes(&self) -> bool {
        self.files_uploaded > 0 || self.files_deleted > 0 || self.directories_created > 0
    }
}
