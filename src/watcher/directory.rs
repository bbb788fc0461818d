//! Filesystem watcher for the watch directory.

use std::path::{Path, PathBuf};

use notify::{Event, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Duration;

use super::error::WatchError;
use super::queue::{QueueStats, WatchQueue};
use crate::processor::FileProcessor;

/// Capacity of the notify -> queue channel. The notify thread blocks when
/// it is full, which only happens while a drain is stuck.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A `notify::RecommendedWatcher` on one directory feeding a [`WatchQueue`].
pub struct DirectoryWatcher {
    directory: PathBuf,
    queue: WatchQueue,
    /// Kept alive for the lifetime of the queue; dropping it stops events.
    _watcher: notify::RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Subscribe to changes directly inside `directory`.
    pub fn new(directory: &Path, debounce: Duration) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        watcher
            .watch(directory, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            })?;
        crate::debug_event!("watcher", "subscribed", "{}", directory.display());

        Ok(Self {
            directory: directory.to_path_buf(),
            queue: WatchQueue::new(rx, debounce),
            _watcher: watcher,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Run until the event stream fails.
    pub async fn watch(&mut self, processor: &FileProcessor) -> Result<(), WatchError> {
        crate::log_event!("watcher", "watching", "{}", self.directory.display());
        self.queue.run(processor).await
    }
}
