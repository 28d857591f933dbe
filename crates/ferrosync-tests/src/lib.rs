//! ferrosync integration testing support
//!
//! Fixtures shared by the cross-crate tests under `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Source and destination tree fixtures
///
/// Helpers for building a source directory, mutating it between runs and
/// reading back what ended up at a local destination.
pub mod test_utils;
