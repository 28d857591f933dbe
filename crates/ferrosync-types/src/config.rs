//! Validated configuration values shared across ferrosync crates

/// Read chunk size used while fingerprinting and uploading files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkSize(usize);

impl ChunkSize {
    /// Minimum chunk size (4KB)
    pub const MIN: usize = 4 * 1024;
    /// Maximum chunk size (64MB)
    pub const MAX: usize = 64 * 1024 * 1024;
    /// Default chunk size (64KB)
    pub const DEFAULT: usize = 64 * 1024;

    /// Create a new chunk size with validation
    pub fn new(size: usize) -> Result<Self, String> {
        if size < Self::MIN {
            Err(format!("Chunk size {} is below minimum {}", size, Self::MIN))
        } else if size > Self::MAX {
            Err(format!("Chunk size {} exceeds maximum {}", size, Self::MAX))
        } else {
            Ok(Self(size))
        }
    }

    /// Get the chunk size value
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Bound on how many independent tasks run at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concurrency(usize);

impl Concurrency {
    /// Minimum concurrency (sequential)
    pub const MIN: usize = 1;
    /// Maximum concurrency
    pub const MAX: usize = 256;

    /// Create a new concurrency bound with validation
    pub fn new(count: usize) -> Result<Self, String> {
        if count < Self::MIN {
            Err(format!("Concurrency {} is below minimum {}", count, Self::MIN))
        } else if count > Self::MAX {
            Err(format!("Concurrency {} exceeds maximum {}", count, Self::MAX))
        } else {
            Ok(Self(count))
        }
    }

    /// One task at a time
    pub const fn sequential() -> Self {
        Self(1)
    }

    /// Get the concurrency value
    pub fn get(self) -> usize {
        self.0
    }

    /// Get the number of CPUs available to this process
    pub fn optimal() -> Self {
        Self(num_cpus::get().clamp(Self::MIN, Self::MAX))
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::optimal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(4096, true)]
    #[case(65536, true)]
    #[case(100_000, true)]
    #[case(1024, false)]
    #[case(128 * 1024 * 1024, false)]
    fn test_chunk_size_validation(#[case] size: usize, #[case] valid: bool) {
        assert_eq!(ChunkSize::new(size).is_ok(), valid);
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(Concurrency::new(0).is_err());
        assert!(Concurrency::new(257).is_err());
        assert_eq!(Concurrency::new(8).map(Concurrency::get), Ok(8));
        assert_eq!(Concurrency::sequential().get(), 1);
        assert!(Concurrency::optimal().get() >= 1);
    }
}
