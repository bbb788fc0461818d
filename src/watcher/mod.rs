//! Directory watching with a debounced work queue.
//!
//! # Architecture
//!
//! ```text
//! notify thread --(mpsc)--> WatchQueue task
//!                             - PendingSet (dedup)
//!                             - DebounceTimer (re-armed per event)
//!                             - drain: one FileProcessor call at a time
//! ```

mod debouncer;
mod directory;
mod error;
mod queue;

pub use debouncer::DebounceTimer;
pub use directory::DirectoryWatcher;
pub use error::WatchError;
pub use queue::{EventReceiver, QueueState, QueueStats, WatchQueue};
