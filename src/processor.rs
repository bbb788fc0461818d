//! Per-file processing: settle, read, submit, then delete or mark failed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::client::{SubmissionClient, SubmitError, SubmitOutcome};
use crate::descriptor::DescriptorFilter;

/// Why a descriptor could not be handed over.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),

    #[error("rejected: {reason}")]
    Rejected { reason: String },

    #[error("submitted but cannot delete {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Terminal result of one `process` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Accepted remotely and the source file deleted.
    Submitted,
    /// The remote refused the descriptor; marked failed.
    Rejected,
    /// Read, transport or delete error; marked failed.
    Failed,
}

/// Hands single descriptor files to a [`SubmissionClient`].
///
/// Errors never escape `process`: every failure ends in an attempt to
/// rename the file to its failure marker.
pub struct FileProcessor {
    client: Arc<dyn SubmissionClient>,
    filter: DescriptorFilter,
    settle_delay: Duration,
}

impl FileProcessor {
    pub fn new(
        client: Arc<dyn SubmissionClient>,
        filter: DescriptorFilter,
        settle_delay: Duration,
    ) -> Self {
        Self {
            client,
            filter,
            settle_delay,
        }
    }

    pub fn filter(&self) -> &DescriptorFilter {
        &self.filter
    }

    /// Process one descriptor file to a terminal state.
    pub async fn process(&self, path: &Path) -> ProcessOutcome {
        // Let the producer finish writing
        tokio::time::sleep(self.settle_delay).await;

        crate::log_event!("processor", "processing", "{}", display_name(path));

        match self.submit_and_remove(path).await {
            Ok(()) => {
                crate::log_event!(
                    "processor",
                    "submitted",
                    "{} to {}",
                    path.display(),
                    self.client.name()
                );
                ProcessOutcome::Submitted
            }
            Err(err) => {
                tracing::error!("[processor] error processing {}: {err}", path.display());
                self.mark_failed(path).await;
                match err {
                    ProcessError::Rejected { .. } => ProcessOutcome::Rejected,
                    _ => ProcessOutcome::Failed,
                }
            }
        }
    }

    async fn submit_and_remove(&self, path: &Path) -> Result<(), ProcessError> {
        let torrent = tokio::fs::read(path)
            .await
            .map_err(|source| ProcessError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        match self.client.submit(&display_name(path), torrent).await? {
            SubmitOutcome::Accepted => {}
            SubmitOutcome::Rejected { reason } => return Err(ProcessError::Rejected { reason }),
        }

        tokio::fs::remove_file(path)
            .await
            .map_err(|source| ProcessError::Delete {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Best effort: the source may already be gone.
    async fn mark_failed(&self, path: &Path) {
        let marker = self.filter.failure_marker(path);
        match tokio::fs::rename(path, &marker).await {
            Ok(()) => crate::log_event!("processor", "marked failed", "{}", marker.display()),
            Err(e) => tracing::warn!(
                "[processor] cannot mark {} as failed: {e}",
                path.display()
            ),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockClient, MockReply};
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    /// Accepts, but leaves a non-empty directory where the file was.
    struct ReplacingClient {
        path: PathBuf,
    }

    #[async_trait]
    impl SubmissionClient for ReplacingClient {
        fn name(&self) -> &str {
            "replacing"
        }

        async fn submit(
            &self,
            _file_name: &str,
            _torrent: Vec<u8>,
        ) -> Result<SubmitOutcome, SubmitError> {
            fs::remove_file(&self.path).unwrap();
            fs::create_dir(&self.path).unwrap();
            fs::write(self.path.join("inner"), b"x").unwrap();
            Ok(SubmitOutcome::Accepted)
        }
    }

    fn processor(client: Arc<MockClient>) -> FileProcessor {
        FileProcessor::new(client, DescriptorFilter::default(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_accepted_file_is_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.torrent");
        fs::write(&path, b"d8:announce").unwrap();

        let client = Arc::new(MockClient::accepting());
        let outcome = processor(client.clone()).process(&path).await;

        assert_eq!(outcome, ProcessOutcome::Submitted);
        assert!(!path.exists());
        assert!(!dir.path().join("a.torrent.failed").exists());
        assert_eq!(
            client.submissions(),
            vec![("a.torrent".to_string(), b"d8:announce".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_error_marks_file_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.torrent");
        fs::write(&path, b"x").unwrap();

        let client = Arc::new(MockClient::failing("connection refused"));
        let outcome = processor(client).process(&path).await;

        assert_eq!(outcome, ProcessOutcome::Failed);
        assert!(!path.exists());
        assert!(dir.path().join("c.torrent.failed").exists());
    }

    #[tokio::test]
    async fn test_rejection_marks_file_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.torrent");
        fs::write(&path, b"x").unwrap();

        let client = Arc::new(MockClient::new(MockReply::Reject("Fails.".to_string())));
        let outcome = processor(client).process(&path).await;

        assert_eq!(outcome, ProcessOutcome::Rejected);
        assert_eq!(fs::read(dir.path().join("r.torrent.failed")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_delete_failure_marks_failed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.torrent");
        fs::write(&path, b"x").unwrap();

        let client = Arc::new(ReplacingClient { path: path.clone() });
        let processor = FileProcessor::new(client, DescriptorFilter::default(), Duration::ZERO);

        assert!(matches!(
            processor.submit_and_remove(&path).await,
            Err(ProcessError::Delete { .. })
        ));

        // Second round through `process`: the leftover directory is renamed
        fs::remove_dir_all(&path).unwrap();
        fs::write(&path, b"x").unwrap();
        let outcome = processor.process(&path).await;

        assert_eq!(outcome, ProcessOutcome::Failed);
        assert!(!path.exists());
        let marker = dir.path().join("d.torrent.failed");
        assert!(marker.is_dir());
        assert!(marker.join("inner").exists());
    }

    #[tokio::test]
    async fn test_missing_file_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.torrent");

        let client = Arc::new(MockClient::accepting());
        let outcome = processor(client.clone()).process(&path).await;

        assert_eq!(outcome, ProcessOutcome::Failed);
        assert_eq!(client.call_count(), 0);
        assert!(!dir.path().join("gone.torrent.failed").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_precedes_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slow.torrent");
        fs::write(&path, b"x").unwrap();

        let client = Arc::new(MockClient::accepting());
        let processor = FileProcessor::new(
            client,
            DescriptorFilter::default(),
            Duration::from_millis(500),
        );

        let started = tokio::time::Instant::now();
        processor.process(&path).await;
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
