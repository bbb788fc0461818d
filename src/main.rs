use std::sync::Arc;

use anyhow::Context;
use torrent_watch::{QbittorrentClient, Settings, WatchService, logging};

#[tokio::main]
async fn main() {
    // A missing .env is fine; settings may come from the real environment
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("Warning: could not load .env: {e}"),
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });
    logging::init_with_config(&settings.logging);

    if let Err(e) = run(settings).await {
        tracing::error!("[main] {e:#}");
        std::process::exit(1);
    }
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    let client = QbittorrentClient::new(&settings.qbittorrent)
        .context("failed to build qBittorrent client")?;
    let service = WatchService::from_settings(&settings, Arc::new(client));

    log_startup(&settings, &service);

    tokio::select! {
        result = service.run() => {
            result.context("watcher stopped")?;
            tracing::info!("[main] event stream ended");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            tracing::info!("[main] interrupted, shutting down");
        }
    }

    Ok(())
}

fn log_startup(settings: &Settings, service: &WatchService) {
    tracing::info!(
        "[main] watch directory {} (settle {}ms, debounce {}ms)",
        service.directory().display(),
        settings.timing.settle_ms,
        settings.timing.debounce_ms
    );
    if settings.qbittorrent.url.is_none() {
        tracing::warn!("[main] QB_URL is not set; every file will be marked failed");
    }
}
