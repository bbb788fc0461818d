//! Layered configuration for the watcher.
//!
//! Sources, lowest precedence first:
//! - Compiled defaults
//! - TOML file (`torrent-watch.toml`, or the path in `TW_CONFIG`)
//! - `QB_URL`, `QB_USER`, `QB_PASS`, `WATCH_DIR`
//! - `TW_`-prefixed variables, double underscore separating nested levels:
//!   - `TW_TIMING__DEBOUNCE_MS=250` sets `timing.debounce_ms`
//!   - `TW_LOGGING__DEFAULT=debug` sets `logging.default`
//!
//! Credentials are not validated here. A missing or wrong URL only shows up
//! when the first file is submitted.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default settings file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "torrent-watch.toml";

/// Variable naming an explicit settings file.
pub const CONFIG_PATH_VAR: &str = "TW_CONFIG";

/// Flat variables carried over from the `.env` convention, with their keys.
const FLAT_ENV: [(&str, &str); 4] = [
    ("QB_URL", "qbittorrent.url"),
    ("QB_USER", "qbittorrent.username"),
    ("QB_PASS", "qbittorrent.password"),
    ("WATCH_DIR", "watch_dir"),
];

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Directory to watch. `~` expands to the home directory; unset means
    /// the platform downloads folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_dir: Option<String>,

    /// qBittorrent WebUI connection
    #[serde(default)]
    pub qbittorrent: QbittorrentConfig,

    /// Settle and debounce delays
    #[serde(default)]
    pub timing: TimingConfig,

    /// Which files count as descriptors and how failures are marked
    #[serde(default)]
    pub descriptor: DescriptorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct QbittorrentConfig {
    /// Base URL of the WebUI, e.g. `http://localhost:8080`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TimingConfig {
    /// Wait before reading a freshly detected file
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Quiet period after the last event before the queue drains
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DescriptorConfig {
    /// File extension matched case-insensitively, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Suffix appended to files that could not be submitted, without the dot
    #[serde(default = "default_failure_suffix")]
    pub failure_suffix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `torrent_watch::client = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_settle_ms() -> u64 {
    500
}
fn default_debounce_ms() -> u64 {
    1000
}
fn default_extension() -> String {
    "torrent".to_string()
}
fn default_failure_suffix() -> String {
    "failed".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            failure_suffix: default_failure_suffix(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        Self::load_from(config_path)
    }

    /// Load configuration using a specific settings file.
    ///
    /// Environment variables still apply on top of the file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()));

        // Read verbatim so numeric passwords stay strings
        for (var, key) in FLAT_ENV {
            if let Ok(value) = std::env::var(var) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        figment
            .merge(Env::prefixed("TW_").ignore(&["CONFIG"]).split("__"))
            .extract()
            .map_err(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.watch_dir.is_none());
        assert!(settings.qbittorrent.url.is_none());
        assert_eq!(settings.timing.settle_ms, 500);
        assert_eq!(settings.timing.debounce_ms, 1000);
        assert_eq!(settings.descriptor.extension, "torrent");
        assert_eq!(settings.descriptor.failure_suffix, "failed");
        assert_eq!(settings.logging.default, "info");
    }

    #[test]
    fn test_timing_durations() {
        let timing = TimingConfig {
            settle_ms: 0,
            debounce_ms: 250,
        };
        assert_eq!(timing.settle_delay(), Duration::ZERO);
        assert_eq!(timing.debounce_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("torrent-watch.toml");

        let toml_content = r#"
watch_dir = "~/incoming"

[qbittorrent]
url = "http://nas.local:8080"
username = "admin"
password = "secret"

[timing]
debounce_ms = 2000

[logging.modules]
"torrent_watch::client" = "debug"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.watch_dir.as_deref(), Some("~/incoming"));
        assert_eq!(
            settings.qbittorrent.url.as_deref(),
            Some("http://nas.local:8080")
        );
        assert_eq!(settings.qbittorrent.username.as_deref(), Some("admin"));
        assert_eq!(settings.timing.debounce_ms, 2000);
        // Untouched values keep their defaults
        assert_eq!(settings.timing.settle_ms, 500);
        assert_eq!(settings.descriptor.extension, "torrent");
        assert_eq!(
            settings.logging.modules["torrent_watch::client"],
            "debug".to_string()
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.timing.debounce_ms, 1000);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("torrent-watch.toml");
        fs::write(&config_path, "[timing]\nsettle_ms = \"soon\"\n").unwrap();

        assert!(Settings::load_from(&config_path).is_err());
    }
}
