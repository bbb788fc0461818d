//! Startup sweep followed by continuous watching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::Duration;

use crate::client::SubmissionClient;
use crate::config::Settings;
use crate::descriptor::DescriptorFilter;
use crate::paths::resolve_watch_dir;
use crate::processor::FileProcessor;
use crate::scanner::scan_once;
use crate::watcher::{DirectoryWatcher, WatchError};

/// Everything needed to watch one directory.
pub struct WatchService {
    directory: PathBuf,
    processor: FileProcessor,
    debounce: Duration,
}

impl WatchService {
    pub fn new(directory: PathBuf, processor: FileProcessor, debounce: Duration) -> Self {
        Self {
            directory,
            processor,
            debounce,
        }
    }

    /// Resolve the watch directory and delays from settings.
    pub fn from_settings(settings: &Settings, client: Arc<dyn SubmissionClient>) -> Self {
        let directory = resolve_watch_dir(settings.watch_dir.as_deref());
        let processor = FileProcessor::new(
            client,
            DescriptorFilter::from_config(&settings.descriptor),
            settings.timing.settle_delay(),
        );
        Self::new(directory, processor, settings.timing.debounce_delay())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Sweep existing files, then watch for new ones.
    ///
    /// The sweep finishes before the watcher subscribes. Only returns on a
    /// watcher error or if the event stream ends.
    pub async fn run(self) -> Result<(), WatchError> {
        scan_once(&self.directory, &self.processor).await?;

        let mut watcher = DirectoryWatcher::new(&self.directory, self.debounce)?;
        watcher.watch(&self.processor).await
    }
}
