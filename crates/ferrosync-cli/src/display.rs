//! Display utilities for the ferrosync CLI

use console::style;
use ferrosync_sync::{SyncPhase, SyncResult};
use std::time::Duration;

/// Human readable description of a phase
pub fn phase_label(phase: SyncPhase) -> &'static str {
    match phase {
        SyncPhase::Scanning => "Scanning source directory...",
        SyncPhase::Diffing => "Comparing with last run...",
        SyncPhase::Uploading => "Uploading changes...",
        SyncPhase::Deleting => "Removing deleted files...",
        SyncPhase::Persisting => "Saving index...",
        SyncPhase::Done => "Done",
        SyncPhase::Failed => "Failed",
    }
}

/// Print the outcome of a synchronization run
pub fn print_sync_summary(result: &SyncResult) {
    let stats = &result.stats;

    if result.is_noop() {
        println!(
            "{} Nothing has changed ({} files checked)",
            style("✓").green(),
            stats.files_scanned
        );
        return;
    }

    println!();
    println!("{}", style("Sync Statistics:").bold().underlined());
    println!("  Files scanned: {}", style(stats.files_scanned).cyan());
    println!(
        "  Files uploaded: {} ({} new)",
        style(stats.files_uploaded).green(),
        result.added
    );
    println!("  Files deleted: {}", style(stats.files_deleted).yellow());
    println!(
        "  Directories created: {}",
        style(stats.directories_created).green()
    );
    println!(
        "  Bytes uploaded: {}",
        style(format_bytes(stats.bytes_uploaded)).green()
    );
    println!(
        "  Duration: {}",
        style(format_duration(stats.duration)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!("{}/s", format_bytes(stats.transfer_rate() as u64))).blue()
    );
    println!(
        "  Directory checks: {} queried, {} cached",
        style(stats.directory_queries).cyan(),
        style(stats.directory_cache_hits).cyan()
    );
}

/// Print the outcome of an index-only run
pub fn print_index_summary(result: &SyncResult, index_file: &str) {
    println!(
        "{} Indexed {} files into {} in {}",
        style("✓").green(),
        style(result.stats.files_scanned).green(),
        style(index_file).cyan(),
        format_duration(result.stats.duration)
    );
}

/// Format bytes in human readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0.00 B")]
    #[case(512, "512.00 B")]
    #[case(1536, "1.50 KB")]
    #[case(5 * 1024 * 1024, "5.00 MB")]
    fn test_format_bytes(#[case] bytes: u64, #[case] expected: &str) {
        assert_eq!(format_bytes(bytes), expected);
    }

    #[rstest]
    #[case(Duration::from_millis(1500), "1.50s")]
    #[case(Duration::from_secs(125), "2m 5s")]
    #[case(Duration::from_secs(3725), "1h 2m 5s")]
    fn test_format_duration(#[case] duration: Duration, #[case] expected: &str) {
        assert_eq!(format_duration(duration), expected);
    }

    #[test]
    fn test_phase_labels_are_distinct() {
        let phases = [
            SyncPhase::Scanning,
            SyncPhase::Diffing,
            SyncPhase::Uploading,
            SyncPhase::Deleting,
            SyncPhase::Persisting,
            SyncPhase::Done,
            SyncPhase::Failed,
        ];
        let labels: std::collections::HashSet<_> =
            phases.iter().map(|p| phase_label(*p)).collect();
        assert_eq!(labels.len(), phases.len());
    }
}
