//! Configuration management system for ferrosync
//!
//! Configuration is layered: built-in defaults, then an optional YAML, TOML
//! or JSON file, then `FERROSYNC__SECTION__KEY` environment variables.
//! The merged result is validated before it is handed out.
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("ferrosync.yaml")
//!     .add_env_prefix("FERROSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Baseline file: {}", config.sync.index_file);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrosync_types::{ChunkSize, Concurrency};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for ferrosync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local scanning and baseline configuration
    pub sync: SyncConfig,
    /// Remote transfer configuration
    pub transfer: TransferConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Local scanning and baseline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Baseline file name, stored at the root of the synchronized directory
    pub index_file: String,
    /// Ignore list file name, stored at the root of the synchronized directory
    pub ignore_file: String,
    /// Read chunk size used for fingerprinting and uploads
    pub chunk_size: ChunkSize,
    /// Number of files fingerprinted at once
    pub scan_concurrency: Concurrency,
    /// Number of uploads (and deletes) in flight at once
    pub transfer_concurrency: Concurrency,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            index_file: ".ferrosync".to_string(),
            ignore_file: ".ferrosyncignore".to_string(),
            chunk_size: ChunkSize::default(),
            scan_concurrency: Concurrency::optimal(),
            transfer_concurrency: Concurrency::sequential(),
        }
    }
}

/// Remote transfer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Seconds allowed for establishing a session
    pub connect_timeout_secs: u64,
    /// Seconds allowed for a single remote operation
    pub operation_timeout_secs: u64,
    /// Seconds allowed between two chunks of a streamed transfer
    pub io_timeout_secs: u64,
}

impl TransferConfig {
    /// Connection timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Per-operation timeout as a [`Duration`]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Streaming I/O timeout as a [`Duration`]
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            operation_timeout_secs: 60,
            io_timeout_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Enable colored output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            colored_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.index_file, ".ferrosync");
        assert_eq!(config.sync.ignore_file, ".ferrosyncignore");
        assert_eq!(config.sync.chunk_size.get(), 64 * 1024);
        assert_eq!(config.sync.transfer_concurrency.get(), 1);
        assert_eq!(config.transfer.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "warn");
    }
}
