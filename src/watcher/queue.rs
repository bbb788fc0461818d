//! Debounced, deduplicating work queue drained by a single task.
//!
//! `WatchQueue` owns the pending set, the debounce timer and the event
//! receiver. Nothing else touches them, so no locking is needed: the notify
//! thread only ever talks to the queue through the channel.
//!
//! ```text
//!   Idle --event--> Collecting --timer--> Draining --empty--> Idle
//!                     ^    |                  |
//!                     +----+ (event re-arms)  +--event--> Collecting
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use notify::Event;
use tokio::sync::mpsc;
use tokio::time::Duration;

use super::debouncer::DebounceTimer;
use super::error::WatchError;
use crate::processor::FileProcessor;

/// Raw events as delivered by the notify callback.
pub type EventReceiver = mpsc::Receiver<notify::Result<Event>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing pending, timer unarmed.
    Idle,
    /// Items pending, timer armed.
    Collecting,
    /// Timer fired, drain in progress.
    Draining,
}

/// Running totals since the queue was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub drain_passes: u64,
    pub processed: u64,
    /// Pending paths that were gone by the time their turn came.
    pub skipped: u64,
}

pub struct WatchQueue {
    pending: HashSet<PathBuf>,
    timer: DebounceTimer,
    state: QueueState,
    stats: QueueStats,
    events: EventReceiver,
}

impl WatchQueue {
    pub fn new(events: EventReceiver, debounce: Duration) -> Self {
        Self {
            pending: HashSet::new(),
            timer: DebounceTimer::new(debounce),
            state: QueueState::Idle,
            stats: QueueStats::default(),
            events,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, path: &std::path::Path) -> bool {
        self.pending.contains(path)
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Record a descriptor path and restart the debounce delay.
    ///
    /// Re-adding a pending path is a no-op apart from the re-arm.
    pub fn enqueue(&mut self, path: PathBuf) {
        if self.pending.insert(path.clone()) {
            crate::debug_event!("queue", "pending", "{}", path.display());
        }
        self.timer.arm();
        if self.state == QueueState::Idle {
            self.state = QueueState::Collecting;
        }
    }

    /// Enqueue every descriptor path in `event`. Returns how many matched.
    pub fn handle_event(&mut self, event: &Event, processor: &FileProcessor) -> usize {
        let mut matched = 0;
        for path in &event.paths {
            if processor.filter().matches(path) {
                self.enqueue(path.clone());
                matched += 1;
            } else {
                crate::debug_event!(
                    "queue",
                    "unmatched",
                    "{:?} {}",
                    event.kind,
                    path.display()
                );
            }
        }
        matched
    }

    /// Process every pending path until none remain.
    ///
    /// Events already delivered are absorbed between files, so paths that
    /// show up mid-drain are handled by this pass too.
    pub async fn drain(&mut self, processor: &FileProcessor) -> Result<(), WatchError> {
        self.state = QueueState::Draining;
        self.stats.drain_passes += 1;
        crate::debug_event!("queue", "draining", "{} pending", self.pending.len());

        loop {
            self.absorb_events(processor)?;

            let Some(path) = self.pending.iter().next().cloned() else {
                break;
            };

            // It may have been removed since it was queued
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                processor.process(&path).await;
                self.stats.processed += 1;
            } else {
                crate::debug_event!("queue", "gone, skipping", "{}", path.display());
                self.stats.skipped += 1;
            }
            self.pending.remove(&path);
        }

        self.state = if self.timer.is_armed() {
            QueueState::Collecting
        } else {
            QueueState::Idle
        };
        Ok(())
    }

    fn absorb_events(&mut self, processor: &FileProcessor) -> Result<(), WatchError> {
        while let Ok(received) = self.events.try_recv() {
            let event = received.map_err(|e| WatchError::EventError {
                details: e.to_string(),
            })?;
            self.handle_event(&event, processor);
        }
        Ok(())
    }

    /// Route events into the queue and drain whenever the timer fires.
    ///
    /// Returns `Ok` once the event channel closes, or the first event
    /// stream error.
    pub async fn run(&mut self, processor: &FileProcessor) -> Result<(), WatchError> {
        loop {
            tokio::select! {
                received = self.events.recv() => match received {
                    Some(Ok(event)) => {
                        self.handle_event(&event, processor);
                    }
                    Some(Err(e)) => {
                        return Err(WatchError::EventError { details: e.to_string() });
                    }
                    None => {
                        crate::debug_event!("queue", "event stream closed");
                        return Ok(());
                    }
                },

                () = self.timer.fired() => {
                    self.drain(processor).await?;
                }
            }
        }
    }
}
