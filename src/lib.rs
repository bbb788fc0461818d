//! Watch a directory for `.torrent` files and hand them to qBittorrent.
//!
//! Files already present are swept once at startup; after that a
//! filesystem watcher feeds a debounced queue that is drained by a single
//! task. Submitted files are deleted, failed ones are renamed with a
//! `.failed` suffix.

pub mod client;
pub mod config;
pub mod descriptor;
pub mod logging;
pub mod paths;
pub mod processor;
pub mod scanner;
pub mod service;
pub mod watcher;

pub use client::{MockClient, QbittorrentClient, SubmissionClient, SubmitError, SubmitOutcome};
pub use config::Settings;
pub use descriptor::DescriptorFilter;
pub use processor::{FileProcessor, ProcessOutcome};
pub use scanner::{ScanSummary, scan_once};
pub use service::WatchService;
pub use watcher::{DebounceTimer, DirectoryWatcher, QueueState, QueueStats, WatchError, WatchQueue};
