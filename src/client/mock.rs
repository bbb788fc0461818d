//! Scripted in-memory client for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{SubmissionClient, SubmitError, SubmitOutcome};

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Accept,
    Reject(String),
    Fail(String),
}

/// Answers submissions from a script, then from a default reply.
///
/// Every call is recorded with its file name and payload.
#[derive(Debug)]
pub struct MockClient {
    script: Mutex<VecDeque<MockReply>>,
    default: MockReply,
    submissions: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockClient {
    pub fn new(default: MockReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(MockReply::Accept)
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockReply::Fail(message.into()))
    }

    /// Queue a reply for the next unanswered call.
    pub fn push(&self, reply: MockReply) -> &Self {
        self.script.lock().push_back(reply);
        self
    }

    /// File names in submission order.
    pub fn submitted_names(&self) -> Vec<String> {
        self.submissions
            .lock()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn submissions(&self) -> Vec<(String, Vec<u8>)> {
        self.submissions.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

#[async_trait]
impl SubmissionClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(
        &self,
        file_name: &str,
        torrent: Vec<u8>,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.submissions
            .lock()
            .push((file_name.to_string(), torrent));

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());

        match reply {
            MockReply::Accept => Ok(SubmitOutcome::Accepted),
            MockReply::Reject(reason) => Ok(SubmitOutcome::Rejected { reason }),
            MockReply::Fail(message) => Err(SubmitError::Other(message)),
        }
    }
}
