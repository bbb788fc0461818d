use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use torrent_watch::{
    DescriptorFilter, FileProcessor, MockClient, ScanSummary, WatchService, scan_once,
};

fn processor(client: Arc<MockClient>) -> FileProcessor {
    FileProcessor::new(client, DescriptorFilter::default(), Duration::ZERO)
}

async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    path.exists()
}

#[tokio::test]
async fn test_startup_sweep_submits_and_deletes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.torrent"), "a").unwrap();
    fs::write(dir.path().join("b.torrent"), "b").unwrap();

    let client = Arc::new(MockClient::accepting());
    let summary = scan_once(dir.path(), &processor(client.clone()))
        .await
        .unwrap();

    assert_eq!(
        summary,
        ScanSummary {
            found: 2,
            submitted: 2,
            failed: 0
        }
    );
    assert_eq!(client.submitted_names(), vec!["a.torrent", "b.torrent"]);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_runtime_file_failure_is_marked() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(MockClient::failing("qBittorrent unreachable"));
    let service = WatchService::new(
        dir.path().to_path_buf(),
        processor(client.clone()),
        Duration::from_millis(100),
    );

    let handle = tokio::spawn(service.run());

    // Give the sweep time to finish and the watcher time to subscribe
    tokio::time::sleep(Duration::from_millis(500)).await;
    let path = dir.path().join("c.torrent");
    fs::write(&path, "c").unwrap();

    let marker = dir.path().join("c.torrent.failed");
    assert!(wait_for(&marker, Duration::from_secs(10)).await);
    assert!(!path.exists());
    assert_eq!(client.submitted_names(), vec!["c.torrent"]);

    handle.abort();
}

#[tokio::test]
async fn test_runtime_text_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(MockClient::accepting());
    let service = WatchService::new(
        dir.path().to_path_buf(),
        processor(client.clone()),
        Duration::from_millis(100),
    );

    let handle = tokio::spawn(service.run());
    tokio::time::sleep(Duration::from_millis(500)).await;

    let readme = dir.path().join("readme.txt");
    fs::write(&readme, "notes").unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(readme.exists());
    assert_eq!(client.call_count(), 0);

    handle.abort();
}
