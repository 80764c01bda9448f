//! Sync engine for one-way remote-to-local synchronization.
//!
//! Drives catalog traversal, change detection and downloads sequentially:
//! one object is listed, decided and (if needed) fetched before the next.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::fs::{ObjectStore, RemoteObject, StoreError};
use crate::sync::catalog::Catalog;
use crate::sync::detect::{decide, DownloadReason, SkipReason, SyncDecision};
use crate::sync::executor::DownloadExecutor;
use crate::sync::paths::local_path_for;

/// Everything a run needs, constructed up front.
#[derive(Clone)]
pub struct SyncContext {
    pub store: Arc<dyn ObjectStore>,
    pub prefix: String,
    pub local_dir: PathBuf,
    /// Decide only; never write to the local tree.
    pub dry_run: bool,
}

impl SyncContext {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            local_dir: local_dir.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Terminal state of one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectOutcome {
    Skipped(SkipReason),
    Downloaded { bytes: u64 },
    /// Dry run: a download was decided but not performed.
    WouldDownload(DownloadReason),
    Failed(String),
}

/// An object that could not be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedObject {
    pub key: String,
    pub message: String,
}

/// Sync statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Listing pages received.
    pub pages: usize,
    /// Content objects listed.
    pub files_scanned: usize,
    /// Directory markers ignored.
    pub markers_skipped: usize,
    pub files_skipped: usize,
    pub files_downloaded: usize,
    /// Dry-run downloads that were decided but not performed.
    pub files_pending: usize,
    pub files_failed: usize,
    pub bytes_transferred: u64,
    pub duration_ms: u64,
}

/// How a run ended, when it was not aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No content object under the prefix.
    NothingFound,
    Completed,
    CompletedWithFailures,
}

/// Result of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub stats: SyncStats,
    pub failures: Vec<FailedObject>,
    pub dry_run: bool,
}

impl SyncReport {
    pub fn outcome(&self) -> SyncOutcome {
        if self.stats.files_scanned == 0 {
            SyncOutcome::NothingFound
        } else if self.failures.is_empty() {
            SyncOutcome::Completed
        } else {
            SyncOutcome::CompletedWithFailures
        }
    }

    fn record(&mut self, key: &str, outcome: &ObjectOutcome) {
        match outcome {
            ObjectOutcome::Skipped(_) => self.stats.files_skipped += 1,
            ObjectOutcome::Downloaded { bytes } => {
                self.stats.files_downloaded += 1;
                self.stats.bytes_transferred += bytes;
            }
            ObjectOutcome::WouldDownload(_) => self.stats.files_pending += 1,
            ObjectOutcome::Failed(message) => {
                self.stats.files_failed += 1;
                self.failures.push(FailedObject {
                    key: key.to_string(),
                    message: message.clone(),
                });
            }
        }
    }
}

/// Sync engine for orchestrating a run over one prefix.
pub struct SyncEngine {
    context: SyncContext,
    executor: DownloadExecutor,
}

impl SyncEngine {
    pub fn new(context: SyncContext) -> Self {
        let executor = DownloadExecutor::new(Arc::clone(&context.store));
        Self { context, executor }
    }

    /// Walk the prefix and bring every object up to date.
    ///
    /// Per-object failures are recorded in the report. A listing failure aborts
    /// the run; rejected credentials surface as [`SyncError::Credential`].
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let ctx = &self.context;
        info!(
            "Starting download from {}, prefix: '{}' -> {}",
            ctx.store.describe(),
            ctx.prefix,
            ctx.local_dir.display()
        );

        let mut report = SyncReport {
            dry_run: ctx.dry_run,
            ..Default::default()
        };

        let mut catalog = Catalog::open(ctx.store.as_ref(), &ctx.prefix)
            .await
            .map_err(|e| self.listing_error(e))?;

        while let Some(remote) = catalog.next().await.map_err(|e| self.listing_error(e))? {
            let outcome = self.process(&remote).await;
            report.record(&remote.key, &outcome);
        }

        let listed = catalog.stats();
        report.stats.pages = listed.pages;
        report.stats.files_scanned = listed.objects;
        report.stats.markers_skipped = listed.markers_skipped;
        report.stats.duration_ms = started.elapsed().as_millis() as u64;

        if report.outcome() == SyncOutcome::NothingFound {
            warn!("No downloadable files found under '{}'", ctx.prefix);
        }
        Ok(report)
    }

    /// Decide and, if needed, download a single object.
    pub async fn process(&self, remote: &RemoteObject) -> ObjectOutcome {
        let local_path = match local_path_for(&self.context.local_dir, &self.context.prefix, &remote.key) {
            Ok(path) => path,
            Err(e) => {
                warn!("{}", e);
                return ObjectOutcome::Failed(e.to_string());
            }
        };

        match decide(remote, &local_path) {
            SyncDecision::Skip(reason) => {
                debug!(
                    "Already up to date ({}): {}",
                    SyncDecision::Skip(reason),
                    remote.key
                );
                ObjectOutcome::Skipped(reason)
            }
            SyncDecision::Download(reason) if self.context.dry_run => {
                info!(
                    "Would download ({}): {} -> {}",
                    SyncDecision::Download(reason),
                    remote.key,
                    local_path.display()
                );
                ObjectOutcome::WouldDownload(reason)
            }
            SyncDecision::Download(reason) => self.download(remote, &local_path, reason).await,
        }
    }

    async fn download(&self, remote: &RemoteObject, local_path: &Path, reason: DownloadReason) -> ObjectOutcome {
        info!(
            "Downloading ({}): {} -> {}",
            SyncDecision::Download(reason),
            remote.key,
            local_path.display()
        );

        match self.executor.execute(remote, local_path).await {
            Ok(bytes) => ObjectOutcome::Downloaded { bytes },
            Err(e) => {
                warn!("{}", e);
                ObjectOutcome::Failed(e.to_string())
            }
        }
    }

    fn listing_error(&self, source: StoreError) -> SyncError {
        if source.is_unauthorized() {
            SyncError::Credential {
                store: self.context.store.describe(),
                source,
            }
        } else {
            SyncError::Listing {
                prefix: self.context.prefix.clone(),
                source,
            }
        }
    }
}
