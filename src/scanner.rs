//! One-shot sweep of descriptors already sitting in the watch directory.

use std::path::{Path, PathBuf};

use crate::processor::{FileProcessor, ProcessOutcome};
use crate::watcher::WatchError;

/// Counts from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub found: usize,
    pub submitted: usize,
    pub failed: usize,
}

/// Process every descriptor directly inside `directory`, one at a time.
///
/// Non-recursive. Files are handled in path order and each is finished
/// before the next starts.
pub async fn scan_once(
    directory: &Path,
    processor: &FileProcessor,
) -> Result<ScanSummary, WatchError> {
    crate::log_event!("scanner", "checking", "{}", directory.display());

    let matches = list_descriptors(directory, processor).await?;
    let mut summary = ScanSummary {
        found: matches.len(),
        ..ScanSummary::default()
    };

    for path in matches {
        match processor.process(&path).await {
            ProcessOutcome::Submitted => summary.submitted += 1,
            ProcessOutcome::Rejected | ProcessOutcome::Failed => summary.failed += 1,
        }
    }

    crate::log_event!(
        "scanner",
        "done",
        "{} found, {} submitted, {} failed",
        summary.found,
        summary.submitted,
        summary.failed
    );
    Ok(summary)
}

async fn list_descriptors(
    directory: &Path,
    processor: &FileProcessor,
) -> Result<Vec<PathBuf>, WatchError> {
    let unreadable = |e: std::io::Error| WatchError::PathWatchFailed {
        path: directory.to_path_buf(),
        reason: e.to_string(),
    };

    let mut entries = tokio::fs::read_dir(directory).await.map_err(unreadable)?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        if !processor.filter().matches(&path) {
            continue;
        }
        // Follows symlinks; directories named *.torrent are skipped
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => matches.push(path),
            Ok(_) => crate::debug_event!("scanner", "not a file", "{}", path.display()),
            Err(e) => tracing::warn!("[scanner] cannot stat {}: {e}", path.display()),
        }
    }

    matches.sort();
    Ok(matches)
}
