//! Error types and handling for ferrosync
//!
//! Every failure during a synchronization run is fatal: nothing is retried
//! inside the engine and the persisted baseline stays at its last known-good
//! state, so re-running the sync is the recovery mechanism. The variants below
//! name the step that failed so callers can report it precisely.

use std::path::PathBuf;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Low severity - informational, the run can still finish
    Low,
    /// Medium severity - the run failed, re-running may succeed as is
    Medium,
    /// High severity - the run failed and needs intervention before a re-run
    High,
    /// Critical severity - entire process should be terminated
    Critical,
}

/// Main error type for ferrosync operations
#[derive(thiserror::Error, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Walking or reading the source tree failed
    #[error("Scan error at {path}: {message}")]
    Scan {
        /// File or directory that could not be read
        path: PathBuf,
        /// Underlying cause
        message: String,
    },

    /// The persisted baseline could not be parsed
    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        /// Baseline file being parsed
        path: PathBuf,
        /// 1-based line number of the offending entry
        line: usize,
        /// What was wrong with the line
        message: String,
    },

    /// The transfer session could not be established
    #[error("Connection to {endpoint} failed: {message}")]
    Connection {
        /// Destination that was being contacted
        endpoint: String,
        /// Underlying cause
        message: String,
    },

    /// Session establishment did not finish in time
    #[error("Connection to {endpoint} timed out after {seconds} seconds")]
    Timeout {
        /// Destination that was being contacted
        endpoint: String,
        /// Number of seconds after which the attempt was abandoned
        seconds: u64,
    },

    /// A remote directory could not be created
    #[error("Failed to create remote directory {path}: {message}")]
    DirectoryCreation {
        /// Remote directory path
        path: String,
        /// Underlying cause
        message: String,
    },

    /// Uploading or deleting a remote file failed
    #[error("Transfer of {path} failed: {message}")]
    Transfer {
        /// Remote file path
        path: String,
        /// Underlying cause
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Source tree scanning errors
    Scan,
    /// Baseline parsing errors
    Parse,
    /// Session establishment errors, including timeouts
    Connection,
    /// Remote directory creation errors
    DirectoryCreation,
    /// Upload and delete errors
    Transfer,
    /// Configuration errors
    Config,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Scan { .. } => ErrorKind::Scan,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Connection { .. } | Self::Timeout { .. } => ErrorKind::Connection,
            Self::DirectoryCreation { .. } => ErrorKind::DirectoryCreation,
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Config { .. } => ErrorKind::Config,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Io { .. } => ErrorSeverity::Medium,
            Self::Scan { .. } => ErrorSeverity::High,
            Self::Parse { .. } => ErrorSeverity::High,
            Self::Connection { .. } | Self::Timeout { .. } => ErrorSeverity::Medium,
            Self::DirectoryCreation { .. } => ErrorSeverity::High,
            Self::Transfer { .. } => ErrorSeverity::Medium,
            Self::Config { .. } => ErrorSeverity::High,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Check whether simply re-running the sync may succeed.
    ///
    /// Network hiccups clear up on their own; a corrupt baseline, an
    /// unreadable source file or a bad configuration do not.
    pub fn is_recoverable(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }

    /// Create a new scan error
    pub fn scan<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Scan {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new baseline parse error
    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, message: S) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<E: Into<String>, S: Into<String>>(endpoint: E, message: S) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new directory creation error
    pub fn directory_creation<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new transfer error
    pub fn transfer<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Transfer {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}
