//! # Runner
//!
//! Processes a set of manifest files on a bounded pool of blocking tasks.
//!
//! Files are independent units of work. At most `workers` files are in flight
//! at once; each one runs on tokio's blocking pool because transformation is
//! CPU and file-system work. Cancellation is cooperative: once the token is
//! cancelled no queued file is started, and files already in flight finish.
//!
//! Under the fail-fast policy the first failed file cancels the token. Files
//! written before that point stay written.

use crate::config::RunConfig;
use crate::error::TransformError;
use crate::manifest::ManifestTransformer;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What happened to one input file
#[derive(Debug)]
pub enum FileOutcome {
    /// Secured output was written to this path
    Written(PathBuf),
    /// No processable document; nothing written
    Skipped,
    Failed(TransformError),
    /// Never started because the run was cancelled
    Cancelled,
}

#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

/// Per-file results of a run, in input order
#[derive(Debug, Default)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Written(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed(_)))
    }

    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Cancelled))
    }

    /// Check if every file was either written or skipped
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.cancelled() == 0
    }

    /// Failed files with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &TransformError)> {
        self.files.iter().filter_map(|report| match &report.outcome {
            FileOutcome::Failed(e) => Some((report.input.as_path(), e)),
            _ => None,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} skipped, {} failed, {} cancelled",
            self.written(),
            self.skipped(),
            self.failed(),
            self.cancelled()
        )
    }
}

async fn process_one(
    transformer: Arc<ManifestTransformer>,
    input: PathBuf,
    output_dir: Option<PathBuf>,
    fail_fast: bool,
    cancel: CancellationToken,
) -> FileReport {
    if cancel.is_cancelled() {
        return FileReport {
            input,
            outcome: FileOutcome::Cancelled,
        };
    }

    let task_input = input.clone();
    let result = tokio::task::spawn_blocking(move || {
        transformer.process_file(&task_input, output_dir.as_deref())
    })
    .await;

    let outcome = match result {
        Ok(Ok(Some(written))) => FileOutcome::Written(written),
        Ok(Ok(None)) => FileOutcome::Skipped,
        Ok(Err(e)) => FileOutcome::Failed(e),
        Err(join_error) => FileOutcome::Failed(TransformError::Worker(join_error.to_string())),
    };

    if let FileOutcome::Failed(e) = &outcome {
        error!("Failed to process {}: {}", input.display(), e);
        if fail_fast && !cancel.is_cancelled() {
            warn!("Stopping after first failure; remaining files will not be processed");
            cancel.cancel();
        }
    }

    FileReport { input, outcome }
}

/// Process `files` and report the outcome of each one
///
/// Never returns early: every input appears in the report, in input order.
pub async fn run(
    transformer: Arc<ManifestTransformer>,
    files: Vec<PathBuf>,
    config: &RunConfig,
    cancel: CancellationToken,
) -> RunReport {
    let workers = config.workers.max(1);
    info!("Processing {} file(s) with {} worker(s)", files.len(), workers);

    let mut indexed: Vec<(usize, FileReport)> = stream::iter(files.into_iter().enumerate())
        .map(|(index, input)| {
            let report = process_one(
                Arc::clone(&transformer),
                input,
                config.output_dir.clone(),
                config.fail_fast,
                cancel.clone(),
            );
            async move { (index, report.await) }
        })
        .buffer_unordered(workers)
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);

    let report = RunReport {
        files: indexed.into_iter().map(|(_, report)| report).collect(),
    };
    info!("Run finished: {}", report);
    report
}
