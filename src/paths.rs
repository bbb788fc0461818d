//! Watch directory resolution.
//!
//! Turns the user-supplied directory spec into an absolute path. This runs
//! once before anything can recover from an error, so it never fails: a
//! malformed spec is normalized as far as possible and returned.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Used when neither the settings nor the platform name a downloads folder.
pub const DEFAULT_WATCH_DIR: &str = "~/Downloads";

/// Resolve the watch directory from an optional spec.
///
/// An empty or missing spec falls back to the platform downloads folder.
/// Relative results are anchored at the current directory.
pub fn resolve_watch_dir(spec: Option<&str>) -> PathBuf {
    let home = dirs::home_dir();
    let spec = spec.map(str::trim).filter(|s| !s.is_empty());

    let path = match spec {
        Some(spec) => expand(spec, home.as_deref()),
        None => dirs::download_dir().unwrap_or_else(|| expand(DEFAULT_WATCH_DIR, home.as_deref())),
    };

    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            tracing::warn!("[paths] cannot anchor {}: {e}", path.display());
            path
        }
    }
}

/// Expand a leading `~` and collapse repeated separators.
///
/// Only `~` on its own or followed by a separator is expanded; `~user`
/// forms are left alone. Without a home directory the `~` stays literal.
pub fn expand(spec: &str, home: Option<&Path>) -> PathBuf {
    let expanded = match (spec.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with(is_separator) => {
            format!("{}{MAIN_SEPARATOR}{rest}", home.display())
        }
        _ => spec.to_string(),
    };

    PathBuf::from(collapse_separators(&expanded))
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Replace every run of `/` or `\` with a single platform separator.
///
/// A trailing separator is dropped unless it is the whole path.
fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_was_separator = false;

    for c in path.chars() {
        if is_separator(c) {
            if !previous_was_separator {
                out.push(MAIN_SEPARATOR);
            }
            previous_was_separator = true;
        } else {
            out.push(c);
            previous_was_separator = false;
        }
    }

    if out.len() > 1 && out.ends_with(MAIN_SEPARATOR) {
        out.pop();
    }
    out
}
