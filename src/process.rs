//! Batch reduction of a photo directory.
//!
//! [`run_with_backend`] drives one batch from start to finish:
//!
//! ```text
//! scan source dir → create destination → per file:
//!     decode → correct orientation → quality search → write
//! → terminal status
//! ```
//!
//! ## Output Layout
//!
//! ```text
//! photos/
//! ├── IMG_0001.jpg
//! ├── IMG_0002.PNG
//! └── reduced_photos/
//!     ├── IMG_0001.jpg      # JPEG, at most target_max_bytes
//!     └── IMG_0002.PNG      # JPEG bytes, original name kept
//! ```
//!
//! Outputs always hold JPEG data and always keep the source basename, so a PNG
//! source produces a JPEG file whose name still ends in `.PNG`. An existing
//! file with the same name is overwritten.
//!
//! ## Failure Policy
//!
//! Per-file problems are reported and skipped, and the batch moves on:
//! - no quality in 1..=96 fits the budget ([`FileStatus::NoAcceptableQuality`])
//! - the file cannot be decoded ([`FileStatus::DecodeFailed`])
//! - the encoder rejects the pixels ([`FileStatus::EncodeFailed`])
//!
//! Filesystem failures abort the batch with a [`ProcessError`]: an unreadable
//! source directory, a destination that cannot be created, or an output file
//! that cannot be written. Files written before the failure stay on disk.
//!
//! ## Progress
//!
//! A [`ProgressSink`] receives one `"Converting file: ..."` status per file,
//! exactly one progress event per attempted file (skips included), and a
//! terminal `"Done!"` (or `"Cancelled."`) after the last file.
//!
//! ## Parallel Processing
//!
//! With `workers > 1` files are processed on a dedicated
//! [rayon](https://docs.rs/rayon) pool. Progress counting and the progress
//! callback share one lock, so the reported count still rises by one per event
//! and reaches `total` last. Outcomes are returned in enumeration order.

use crate::imaging::{
    BackendError, EncodingOutcome, ImageBackend, Quality, RustBackend, encode_under_limit,
    orientation,
};
use crate::scan::{ExtensionSet, ScanError, scan_directory};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the directory created inside the source directory.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "reduced_photos";

pub const DONE_STATUS: &str = "Done!";
pub const CANCELLED_STATUS: &str = "Cancelled.";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Target size must be at least one byte")]
    InvalidTarget,
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Everything one batch needs to know, fixed before the first file is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub target_max_bytes: u64,
    pub extensions: ExtensionSet,
}

impl BatchJob {
    /// A job writing into `<source_dir>/reduced_photos`.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_max_bytes: u64,
        extensions: ExtensionSet,
    ) -> Result<Self, ProcessError> {
        if target_max_bytes == 0 {
            return Err(ProcessError::InvalidTarget);
        }
        let source_dir = source_dir.into();
        Ok(Self {
            destination_dir: source_dir.join(DEFAULT_OUTPUT_DIR_NAME),
            source_dir,
            target_max_bytes,
            extensions,
        })
    }

    /// Use a different output directory name under the source directory.
    pub fn with_output_dir_name(mut self, name: &str) -> Self {
        self.destination_dir = self.source_dir.join(name);
        self
    }

    /// Output path for `source`: its basename inside the destination directory.
    fn destination_for(&self, source: &Path) -> Result<PathBuf, ProcessError> {
        let name = source.file_name().ok_or_else(|| ProcessError::Write {
            path: source.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "source path has no file name",
            ),
        })?;
        Ok(self.destination_dir.join(name))
    }
}

/// How a batch is executed, as opposed to what it does.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of files processed at once. `1` runs on the calling thread.
    pub workers: usize,
    pub cancel: CancellationToken,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            cancel: CancellationToken::new(),
        }
    }
}

/// Shared flag checked before each file is started.
///
/// A file already in progress is always finished; cancellation never leaves a
/// partially written output behind.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receiver of progress and status notifications.
///
/// Called from worker threads when the batch runs in parallel.
pub trait ProgressSink: Sync {
    /// `current` files of `total` have been attempted.
    fn on_progress(&self, current: usize, total: usize);
    /// A human-readable status line.
    fn on_status(&self, message: &str);
}

/// Sink that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _current: usize, _total: usize) {}
    fn on_status(&self, _message: &str) {}
}

/// A notification, as sent over a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress { current: usize, total: usize },
    Status(String),
}

/// Forwards notifications to a channel. A hung-up receiver is ignored.
impl ProgressSink for Sender<ProgressEvent> {
    fn on_progress(&self, current: usize, total: usize) {
        let _ = self.send(ProgressEvent::Progress { current, total });
    }

    fn on_status(&self, message: &str) {
        let _ = self.send(ProgressEvent::Status(message.to_string()));
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Written {
        destination: PathBuf,
        quality: Quality,
        original_bytes: u64,
        written_bytes: u64,
    },
    NoAcceptableQuality {
        /// Smallest output any probe produced.
        smallest_size: u64,
    },
    DecodeFailed {
        reason: String,
    },
    EncodeFailed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Result of one batch, serializable as a JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub target_max_bytes: u64,
    /// Eligible files found by the scan.
    pub total: usize,
    /// True when the batch stopped before attempting every file.
    pub cancelled: bool,
    /// One entry per attempted file, in enumeration order.
    pub files: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn attempted(&self) -> usize {
        self.files.len()
    }

    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Written { .. }))
    }

    pub fn skipped_for_size(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::NoAcceptableQuality { .. }))
    }

    /// Files skipped because they could not be decoded or encoded.
    pub fn failed(&self) -> usize {
        self.count(|s| {
            matches!(
                s,
                FileStatus::DecodeFailed { .. } | FileStatus::EncodeFailed { .. }
            )
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.files
            .iter()
            .map(|f| match f.status {
                FileStatus::Written { written_bytes, .. } => written_bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }
}

/// Run a batch with the production backend.
pub fn run(
    job: &BatchJob,
    sink: &impl ProgressSink,
    options: &RunOptions,
) -> Result<BatchSummary, ProcessError> {
    let backend = RustBackend::new();
    run_with_backend(&backend, job, sink, options)
}

/// Run a batch using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    job: &BatchJob,
    sink: &impl ProgressSink,
    options: &RunOptions,
) -> Result<BatchSummary, ProcessError> {
    if job.target_max_bytes == 0 {
        return Err(ProcessError::InvalidTarget);
    }

    let files = scan_directory(&job.source_dir, &job.extensions)?;
    let total = files.len();
    info!(
        "Reducing {} photos from {} into {} (max {} bytes)",
        total,
        job.source_dir.display(),
        job.destination_dir.display(),
        job.target_max_bytes
    );

    std::fs::create_dir_all(&job.destination_dir).map_err(|source| ProcessError::CreateDir {
        path: job.destination_dir.clone(),
        source,
    })?;

    let attempted = Mutex::new(0usize);
    let write_lock = Mutex::new(());

    let process_one = |path: &PathBuf| -> Result<Option<FileOutcome>, ProcessError> {
        if options.cancel.is_cancelled() {
            return Ok(None);
        }
        let status = reduce_file(backend, job, path, sink, &write_lock)?;

        let mut done = attempted.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        sink.on_progress(*done, total);

        Ok(Some(FileOutcome {
            source: path.clone(),
            status,
        }))
    };

    let results: Vec<Option<FileOutcome>> = if options.workers > 1 {
        debug!("processing with {} workers", options.workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()?;
        pool.install(|| files.par_iter().map(process_one).collect::<Result<_, _>>())?
    } else {
        files.iter().map(process_one).collect::<Result<_, _>>()?
    };

    let outcomes: Vec<FileOutcome> = results.into_iter().flatten().collect();
    let cancelled = outcomes.len() < total;
    if cancelled {
        info!("Cancelled after {} of {} files", outcomes.len(), total);
        sink.on_status(CANCELLED_STATUS);
    } else {
        sink.on_status(DONE_STATUS);
    }

    Ok(BatchSummary {
        source_dir: job.source_dir.clone(),
        destination_dir: job.destination_dir.clone(),
        target_max_bytes: job.target_max_bytes,
        total,
        cancelled,
        files: outcomes,
    })
}

/// Reduce a single file. Only filesystem write failures are returned as errors.
fn reduce_file(
    backend: &impl ImageBackend,
    job: &BatchJob,
    path: &Path,
    sink: &impl ProgressSink,
    write_lock: &Mutex<()>,
) -> Result<FileStatus, ProcessError> {
    sink.on_status(&format!("Converting file: {}...", path.display()));
    let name = display_name(path);

    let asset = match backend.decode(path) {
        Ok(asset) => asset,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            sink.on_status(&format!("ERROR: Cannot decode {}: {}", name, e));
            return Ok(FileStatus::DecodeFailed {
                reason: e.to_string(),
            });
        }
    };

    if asset.orientation.is_none() {
        info!("Cannot read orientation metadata for {}", path.display());
    } else if orientation::rotates(asset.orientation) {
        debug!(
            "rotating {} for orientation {:?}",
            path.display(),
            asset.orientation
        );
    }
    let original_bytes = asset.original_bytes;
    let image = orientation::correct(asset.image, asset.orientation);

    let attempt = match encode_under_limit(backend, &image, job.target_max_bytes) {
        Ok(EncodingOutcome::Fits(attempt)) => attempt,
        Ok(EncodingOutcome::NoAcceptableQuality { smallest_size }) => {
            warn!(
                "No acceptable quality for {} (smallest {} bytes, limit {})",
                path.display(),
                smallest_size,
                job.target_max_bytes
            );
            sink.on_status(&format!(
                "ERROR: No acceptable quality factor found for {}",
                name
            ));
            return Ok(FileStatus::NoAcceptableQuality { smallest_size });
        }
        Err(e) => return Ok(encode_failed(path, &name, sink, e)),
    };

    let destination = job.destination_for(path)?;
    {
        let _guard = write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        std::fs::write(&destination, &attempt.bytes).map_err(|source| ProcessError::Write {
            path: destination.clone(),
            source,
        })?;
    }
    info!(
        "Saving to: {} (quality {}, {} bytes)",
        destination.display(),
        attempt.quality,
        attempt.size()
    );

    Ok(FileStatus::Written {
        destination,
        quality: attempt.quality,
        original_bytes,
        written_bytes: attempt.size(),
    })
}

fn encode_failed(
    path: &Path,
    name: &str,
    sink: &impl ProgressSink,
    error: BackendError,
) -> FileStatus {
    warn!("Skipping {}: {}", path.display(), error);
    sink.on_status(&format!("ERROR: Cannot encode {}: {}", name, error));
    FileStatus::EncodeFailed {
        reason: error.to_string(),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
