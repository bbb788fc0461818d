//! Recognising torrent descriptor files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::DescriptorConfig;

/// Matches descriptor files by extension and names their failure markers.
#[derive(Debug, Clone)]
pub struct DescriptorFilter {
    extension: String,
    failure_suffix: String,
}

impl DescriptorFilter {
    pub fn new(extension: impl Into<String>, failure_suffix: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            failure_suffix: failure_suffix.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn from_config(config: &DescriptorConfig) -> Self {
        Self::new(&config.extension, &config.failure_suffix)
    }

    /// Whether `path` names a descriptor file. Case-insensitive.
    ///
    /// Looks at the name only; the file may no longer exist.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        // Suffix match so a bare `.torrent` counts too
        let name = name.as_encoded_bytes();
        let ext = self.extension.as_bytes();
        name.len() > ext.len()
            && name[name.len() - ext.len() - 1] == b'.'
            && name[name.len() - ext.len()..].eq_ignore_ascii_case(ext)
    }

    /// `<path>.failed`, next to the original.
    pub fn failure_marker(&self, path: &Path) -> PathBuf {
        let mut marked = OsString::from(path.as_os_str());
        marked.push(".");
        marked.push(&self.failure_suffix);
        PathBuf::from(marked)
    }
}

impl Default for DescriptorFilter {
    fn default() -> Self {
        Self::from_config(&DescriptorConfig::default())
    }
}
