//! Progress tracking for synchronization runs

use ferrosync_types::OperationId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Phases of a synchronization run.
///
/// A run moves forward through `Scanning`, `Diffing`, `Uploading`,
/// `Deleting` and `Persisting` to `Done`; `Failed` can follow any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    /// Loading the baseline and fingerprinting the source tree
    Scanning,
    /// Comparing the baseline with the fresh index
    Diffing,
    /// Uploading new and modified files
    Uploading,
    /// Removing files deleted locally
    Deleting,
    /// Writing the new baseline
    Persisting,
    /// Finished successfully
    Done,
    /// Aborted by a fatal error
    Failed,
}

impl SyncPhase {
    /// Whether the run is over
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Remote operation applied to a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileAction {
    /// File is uploaded
    Upload,
    /// File is deleted
    Delete,
}

/// Snapshot of a run's progress
#[derive(Debug, Clone)]
pub struct SyncProgress {
    /// Run identifier
    pub operation_id: OperationId,
    /// Current phase
    pub phase: SyncPhase,
    /// File currently being processed
    pub current_file: Option<String>,
    /// Remote file operations completed
    pub files_processed: u64,
    /// Remote file operations planned
    pub total_files: u64,
    /// Bytes uploaded so far
    pub bytes_processed: u64,
    /// Bytes planned for upload
    pub total_bytes: u64,
    /// When the run started
    pub start_time: Instant,
}

impl SyncProgress {
    /// Create a new progress snapshot
    pub fn new(operation_id: OperationId) -> Self {
        Self {
            operation_id,
            phase: SyncPhase::Scanning,
            current_file: None,
            files_processed: 0,
            total_files: 0,
            bytes_processed: 0,
            total_bytes: 0,
            start_time: Instant::now(),
        }
    }

    /// Upload throughput so far in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        let elapsed = self.elapsed_time().as_secs_f64();
        if elapsed > 0.0 {
            self.bytes_processed as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Share of planned file operations completed, in percent
    pub fn file_progress(&self) -> f64 {
        if self.total_files > 0 {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Time since the run started
    pub fn elapsed_time(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Progress event types
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Phase changed
    PhaseChanged(SyncPhase),
    /// Planned work became known
    TotalsKnown {
        /// Remote file operations planned
        files: u64,
        /// Bytes planned for upload
        bytes: u64,
    },
    /// File started processing
    FileStarted(String, FileAction),
    /// File completed processing
    FileCompleted(String, FileAction, u64),
    /// Run completed
    Completed(SyncProgress),
    /// Run failed
    Failed(String),
}

/// Publishes progress of a run over an unbounded channel
#[derive(Debug)]
pub struct ProgressReporter {
    progress: Arc<RwLock<SyncProgress>>,
    event_tx: mpsc::UnboundedSender<ProgressEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<ProgressEvent>>,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(operation_id: OperationId) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let progress = Arc::new(RwLock::new(SyncProgress::new(operation_id)));

        Self {
            progress,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Get the current progress
    pub async fn get_progress(&self) -> SyncProgress {
        self.progress.read().await.clone()
    }

    /// Take the event receiver (can only be called once)
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ProgressEvent>> {
        self.event_rx.take()
    }

    /// Update the current phase
    pub async fn set_phase(&self, phase: SyncPhase) {
        self.progress.write().await.phase = phase;
        debug!("Sync phase changed to: {:?}", phase);
        let _ = self.event_tx.send(ProgressEvent::PhaseChanged(phase));
    }

    /// Set total counts
    pub async fn set_totals(&self, files: u64, bytes: u64) {
        {
            let mut progress = self.progress.write().await;
            progress.total_files = files;
            progress.total_bytes = bytes;
        }
        let _ = self
            .event_tx
            .send(ProgressEvent::TotalsKnown { files, bytes });
    }

    /// Report file started
    pub async fn file_started(&self, path: &str, action: FileAction) {
        self.progress.write().await.current_file = Some(path.to_string());
        let _ = self
            .event_tx
            .send(ProgressEvent::FileStarted(path.to_string(), action));
    }

    /// Report file completed
    pub async fn file_completed(&self, path: &str, action: FileAction, bytes: u64) {
        {
            let mut progress = self.progress.write().await;
            progress.files_processed += 1;
            progress.bytes_processed += bytes;
            progress.current_file = None;
        }
        let _ = self
            .event_tx
            .send(ProgressEvent::FileCompleted(path.to_string(), action, bytes));
    }

    /// Report run completed
    pub async fn completed(&self) {
        let progress = {
            let mut progress = self.progress.write().await;
            progress.phase = SyncPhase::Done;
            progress.clone()
        };
        let _ = self.event_tx.send(ProgressEvent::PhaseChanged(SyncPhase::Done));
        let _ = self.event_tx.send(ProgressEvent::Completed(progress));
    }

    /// Report run failed
    pub async fn failed(&self, error: String) {
        self.progress.write().await.phase = SyncPhase::Failed;
        let _ = self
            .event_tx
            .send(ProgressEvent::PhaseChanged(SyncPhase::Failed));
        let _ = self.event_tx.send(ProgressEvent::Failed(error));
    }
}

impl Clone for ProgressReporter {
    fn clone(&self) -> Self {
        Self {
            progress: Arc::clone(&self.progress),
            event_tx: self.event_tx.clone(),
            event_rx: None, // Clone doesn't get the receiver
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reporter_events() {
        let mut reporter = ProgressReporter::new(OperationId::new_v4());
        let mut rx = reporter.take_event_receiver().unwrap();
        assert!(reporter.take_event_receiver().is_none());

        reporter.set_phase(SyncPhase::Uploading).await;
        reporter.set_totals(1, 5).await;
        reporter.file_started("a.txt", FileAction::Upload).await;
        reporter.file_completed("a.txt", FileAction::Upload, 5).await;
        reporter.completed().await;

        assert!(matches!(
            rx.recv().await,
            Some(ProgressEvent::PhaseChanged(SyncPhase::Uploading))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(ProgressEvent::TotalsKnown { files: 1, bytes: 5 })
        ));
        assert!(matches!(rx.recv().await, Some(ProgressEvent::FileStarted(ref p, FileAction::Upload)) if p == "a.txt"));
        assert!(matches!(
            rx.recv().await,
            Some(ProgressEvent::FileCompleted(_, FileAction::Upload, 5))
        ));
        assert!(matches!(
            rx.recv().await,
            Some(ProgressEvent::PhaseChanged(SyncPhase::Done))
        ));
        match rx.recv().await {
            Some(ProgressEvent::Completed(progress)) => {
                assert_eq!(progress.files_processed, 1);
                assert_eq!(progress.bytes_processed, 5);
                assert_eq!(progress.file_progress(), 100.0);
                assert!(progress.phase.is_terminal());
                assert!(progress.elapsed_time() < Duration::from_secs(60));
                assert!(progress.transfer_rate() >= 0.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_clone_shares_progress() {
        let operation_id = OperationId::new_v4();
        let reporter = ProgressReporter::new(operation_id);
        let clone = reporter.clone();

        clone.failed("boom".to_string()).await;
        let progress = reporter.get_progress().await;
        assert_eq!(progress.phase, SyncPhase::Failed);
        assert_eq!(progress.operation_id, operation_id);
    }
}
