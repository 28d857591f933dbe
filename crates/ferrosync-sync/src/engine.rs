//! Main synchronization engine
//!
//! A run loads the baseline, rescans the source tree, diffs the two and, if
//! anything changed, applies the diff through a freshly connected
//! [`TransferSession`] before writing the new baseline. The baseline is only
//! replaced after every upload and delete succeeded, so a failed run is
//! repaired by running again.

use crate::{
    cache::RemoteDirectoryCache,
    diff::{DiffEngine, DiffResult},
    progress::{FileAction, ProgressReporter, SyncPhase},
    scanner::{DirectoryScanner, ScanOptions},
    store::IndexStore,
};
use chrono::{DateTime, Utc};
use ferrosync_config::SyncConfig;
use ferrosync_types::{
    ChunkSize, Concurrency, Error, OperationId, Result, SessionConnector, SyncStats,
    TransferSession,
};
use futures::{stream, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Synchronization request
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Source directory path
    pub source: PathBuf,
    /// Sync options
    pub options: SyncOptions,
    /// Request ID for tracking
    pub request_id: OperationId,
}

impl SyncRequest {
    /// Create a new sync request
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            options: SyncOptions::default(),
            request_id: OperationId::new_v4(),
        }
    }

    /// Set sync options
    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    fn store(&self) -> IndexStore {
        IndexStore::for_root(&self.source, &self.options.index_file)
    }

    fn scanner(&self) -> DirectoryScanner {
        DirectoryScanner::new(ScanOptions {
            index_file: self.options.index_file.clone(),
            ignore_file: self.options.ignore_file.clone(),
            chunk_size: self.options.chunk_size,
            concurrency: self.options.scan_concurrency,
        })
    }
}

/// Synchronization options
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Baseline file name inside the source directory
    pub index_file: String,
    /// Ignore list file name inside the source directory
    pub ignore_file: String,
    /// Read chunk size for hashing and uploads
    pub chunk_size: ChunkSize,
    /// Files hashed at once
    pub scan_concurrency: Concurrency,
    /// Uploads, and later deletes, in flight at once
    pub transfer_concurrency: Concurrency,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            index_file: config.index_file.clone(),
            ignore_file: config.ignore_file.clone(),
            chunk_size: config.chunk_size,
            scan_concurrency: config.scan_concurrency,
            transfer_concurrency: config.transfer_concurrency,
        }
    }
}

/// Synchronization result
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Request ID
    pub request_id: OperationId,
    /// Final phase, always [`SyncPhase::Done`] for a returned result
    pub phase: SyncPhase,
    /// Run statistics
    pub stats: SyncStats,
    /// Paths uploaded, sorted
    pub uploaded: Vec<String>,
    /// Paths deleted remotely, sorted
    pub deleted: Vec<String>,
    /// Number of uploaded paths that were new
    pub added: usize,
    /// Whether the baseline file was rewritten
    pub baseline_written: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
}

impl SyncResult {
    fn new(request_id: OperationId) -> Self {
        Self {
            request_id,
            phase: SyncPhase::Scanning,
            stats: SyncStats::new(),
            uploaded: Vec::new(),
            deleted: Vec::new(),
            added: 0,
            baseline_written: false,
            started_at: Utc::now(),
        }
    }

    /// Nothing had changed since the previous run
    pub fn is_noop(&self) -> bool {
        self.uploaded.is_empty() && self.deleted.is_empty()
    }
}

/// Main synchronization engine
#[derive(Debug, Default)]
pub struct SyncEngine {
    progress: Option<ProgressReporter>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish progress through `reporter`
    pub fn with_progress(mut self, reporter: ProgressReporter) -> Self {
        self.progress = Some(reporter);
        self
    }

    fn reporter_for(&self, request: &SyncRequest) -> ProgressReporter {
        self.progress
            .clone()
            .unwrap_or_else(|| ProgressReporter::new(request.request_id))
    }

    /// Synchronize `request.source` to the destination behind `connector`
    pub async fn sync(
        &self,
        request: &SyncRequest,
        connector: &dyn SessionConnector,
    ) -> Result<SyncResult> {
        let reporter = self.reporter_for(request);
        info!(
            "Starting sync: {} -> {}",
            request.source.display(),
            connector.endpoint()
        );

        match self.run_sync(request, connector, &reporter).await {
            Ok(result) => {
                reporter.completed().await;
                info!(
                    "Sync completed: {} uploaded, {} deleted, {} bytes in {:?}",
                    result.stats.files_uploaded,
                    result.stats.files_deleted,
                    result.stats.bytes_uploaded,
                    result.stats.duration
                );
                Ok(result)
            }
            Err(e) => {
                error!("Sync failed: {}", e);
                reporter.failed(e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Scan `request.source` and write the baseline without contacting any
    /// destination, marking the current tree as already synchronized
    pub async fn build_index(&self, request: &SyncRequest) -> Result<SyncResult> {
        let reporter = self.reporter_for(request);

        match self.run_build_index(request, &reporter).await {
            Ok(result) => {
                reporter.completed().await;
                Ok(result)
            }
            Err(e) => {
                error!("Index generation failed: {}", e);
                reporter.failed(e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn run_build_index(
        &self,
        request: &SyncRequest,
        reporter: &ProgressReporter,
    ) -> Result<SyncResult> {
        let start_time = Instant::now();
        let mut result = SyncResult::new(request.request_id);

        reporter.set_phase(SyncPhase::Scanning).await;
        let current = request.scanner().scan(&request.source).await?;
        result.stats.files_scanned = current.len() as u64;

        reporter.set_phase(SyncPhase::Persisting).await;
        request.store().save(&current).await?;
        result.baseline_written = true;

        result.phase = SyncPhase::Done;
        result.stats.duration = start_time.elapsed();
        info!("Indexed {} files without uploading", current.len());
        Ok(result)
    }

    async fn run_sync(
        &self,
        request: &SyncRequest,
        connector: &dyn SessionConnector,
        reporter: &ProgressReporter,
    ) -> Result<SyncResult> {
        let start_time = Instant::now();
        let mut result = SyncResult::new(request.request_id);
        let store = request.store();

        // Phase 1: baseline and fresh scan
        reporter.set_phase(SyncPhase::Scanning).await;
        let previous = store.load().await?;
        let current = request.scanner().scan(&request.source).await?;
        result.stats.files_scanned = current.len() as u64;

        // Phase 2: diff
        reporter.set_phase(SyncPhase::Diffing).await;
        let diff = DiffEngine::new().diff(&previous, &current);
        info!(
            "Detected {} changed ({} new) and {} deleted files",
            diff.changed.len(),
            diff.added,
            diff.deleted.len()
        );

        if diff.is_empty() {
            info!("Nothing has changed");
            result.phase = SyncPhase::Done;
            result.stats.duration = start_time.elapsed();
            return Ok(result);
        }

        let total_bytes = planned_upload_bytes(&request.source, &diff).await;
        reporter.set_totals(diff.len() as u64, total_bytes).await;

        // Phases 3 and 4 run inside one session that is always closed
        let session = connector.connect().await?;
        debug!("Connected to {}", connector.endpoint());
        let cache = RemoteDirectoryCache::new();

        let applied = self
            .apply_diff(request, &diff, session.as_ref(), &cache, reporter, &mut result.stats)
            .await;

        if let Err(e) = session.close().await {
            warn!("Failed to close session to {}: {}", connector.endpoint(), e);
        }

        let cache_stats = cache.stats().await;
        result.stats.directories_created = cache_stats.creations;
        result.stats.directory_queries = cache_stats.queries;
        result.stats.directory_cache_hits = cache_stats.hits;
        applied?;

        // Phase 5: persist the index that now matches the destination
        reporter.set_phase(SyncPhase::Persisting).await;
        store.save(&current).await?;
        result.baseline_written = true;

        result.uploaded = diff.changed.iter().cloned().collect();
        result.deleted = diff.deleted.iter().cloned().collect();
        result.added = diff.added;
        result.phase = SyncPhase::Done;
        result.stats.duration = start_time.elapsed();
        Ok(result)
    }

    async fn apply_diff(
        &self,
        request: &SyncRequest,
        diff: &DiffResult,
        session: &dyn TransferSession,
        cache: &RemoteDirectoryCache,
        reporter: &ProgressReporter,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let concurrency = request.options.transfer_concurrency.get();
        let chunk_size = request.options.chunk_size.get();

        reporter.set_phase(SyncPhase::Uploading).await;
        let uploaded: Vec<u64> = stream::iter(&diff.changed)
            .map(|path| {
                upload_one(&request.source, path, session, cache, reporter, chunk_size)
            })
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;
        stats.files_uploaded = uploaded.len() as u64;
        stats.bytes_uploaded = uploaded.iter().sum();

        reporter.set_phase(SyncPhase::Deleting).await;
        let deleted: Vec<()> = stream::iter(&diff.deleted)
            .map(|path| delete_one(path, session, reporter))
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;
        stats.files_deleted = deleted.len() as u64;

        Ok(())
    }
}

async fn upload_one(
    root: &Path,
    path: &str,
    session: &dyn TransferSession,
    cache: &RemoteDirectoryCache,
    reporter: &ProgressReporter,
    chunk_size: usize,
) -> Result<u64> {
    reporter.file_started(path, FileAction::Upload).await;
    cache.ensure_directories(session, path).await?;

    let local = root.join(path);
    let file = File::open(&local)
        .await
        .map_err(|e| Error::scan(&local, e.to_string()))?;
    let content = ReaderStream::with_capacity(file, chunk_size)
        .map_err(move |e| Error::scan(&local, e.to_string()))
        .boxed();

    let bytes = session.upload_file(path, content).await?;
    info!("[+] {}", path);
    reporter.file_completed(path, FileAction::Upload, bytes).await;
    Ok(bytes)
}

async fn delete_one(
    path: &str,
    session: &dyn TransferSession,
    reporter: &ProgressReporter,
) -> Result<()> {
    reporter.file_started(path, FileAction::Delete).await;
    session.delete_file(path).await?;
    info!("[-] {}", path);
    reporter.file_completed(path, FileAction::Delete, 0).await;
    Ok(())
}

/// Best-effort byte total for progress display; files that cannot be
/// inspected count as zero and fail properly when uploaded
async fn planned_upload_bytes(root: &Path, diff: &DiffResult) -> u64 {
    let mut total = 0;
    for path in &diff.changed {
        if let Ok(metadata) = tokio::fs::metadata(root.join(path)).await {
            total += metadata.len();
        }
    }
    total
}
