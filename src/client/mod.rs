//! Submission of torrent descriptors to a remote client.
//!
//! The queue only needs one capability: hand over the bytes of a
//! `.torrent` file and learn whether the remote side took it. The result
//! is tri-state: accepted, rejected by the remote, or an error reaching it.

mod mock;
mod qbittorrent;

pub use mock::{MockClient, MockReply};
pub use qbittorrent::QbittorrentClient;

use async_trait::async_trait;

/// What the remote client said about a submitted descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A download job was registered.
    Accepted,
    /// The remote answered but refused the descriptor.
    Rejected { reason: String },
}

/// Errors talking to the remote client.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("qBittorrent URL is not configured (set QB_URL)")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("Unexpected response {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Capability to register a download from descriptor bytes.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &str;

    /// Submit one descriptor. `file_name` is informational.
    ///
    /// No timeout is applied here; a hung call stalls the caller.
    async fn submit(&self, file_name: &str, torrent: Vec<u8>)
    -> Result<SubmitOutcome, SubmitError>;
}
