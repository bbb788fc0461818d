//! Single-shot, re-armable debounce timer.
//!
//! Arming an already armed timer pushes its deadline out instead of
//! scheduling a second firing, so a burst of events collapses into one
//! trigger after the last of them.

use std::future::pending;
use std::pin::Pin;

use tokio::time::{Duration, Instant, Sleep, sleep};

/// At most one pending deadline at a time.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Fire `delay` from now, replacing any earlier deadline.
    pub fn arm(&mut self) {
        let at = Instant::now() + self.delay;
        if let Some(armed) = self.deadline.as_mut() {
            armed.as_mut().reset(at);
        } else {
            self.deadline = Some(Box::pin(sleep(self.delay)));
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves when the armed deadline passes, disarming the timer.
    ///
    /// Never resolves while unarmed. Cancel-safe: dropping the future
    /// leaves the deadline in place.
    pub async fn fired(&mut self) {
        match self.deadline.as_mut() {
            Some(armed) => armed.as_mut().await,
            None => pending::<()>().await,
        }
        self.deadline = None;
    }
}
