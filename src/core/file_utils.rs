//! File helpers for durable JSON state and exported files
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// Atomic JSON persistence
// ============================================================================

/// Sibling path used to stage a write before it replaces `path`
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Serialize `value` to `path` so that readers only ever see the old or the
/// new contents, never a partial file.
///
/// The data is written and synced to a staging file, which is then renamed
/// over the canonical name.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let staging = staging_path(path);

    let result = (|| -> Result<()> {
        let file = File::create(&staging)
            .with_context(|| format!("Failed to create {}", staging.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;
        writer.flush()?;
        writer
            .get_ref()
            .sync_all()
            .with_context(|| format!("Failed to sync {}", staging.display()))?;
        fs::rename(&staging, path).with_context(|| {
            format!("Failed to move {} into place", staging.display())
        })?;
        Ok(())
    })();

    if result.is_err() {
        // Best effort: a stale staging file is harmless but untidy
        let _ = fs::remove_file(&staging);
    }
    result?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        // Persist the rename itself; not supported on every platform
        if let Ok(handle) = File::open(dir) {
            let _ = handle.sync_all();
        }
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Read JSON from `path`, returning `T::default()` when the file is absent
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let staging = staging_path(path);
    if staging.exists() {
        warn!(
            "Discarding unfinished write {} from a previous run",
            staging.display()
        );
        let _ = fs::remove_file(&staging);
    }

    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(T::default()),
        Ok(contents) => serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt state file {}", path.display())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Create the parent directory of `path` if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

// ============================================================================
// Export helpers
// ============================================================================

/// Sanitize a string for use as a filename.
///
/// Keeps alphanumerics, hyphens, underscores and dots; spaces become
/// underscores. At most 50 characters.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .take(50)
        .collect::<String>()
        .trim()
        .replace(' ', "_")
        .to_lowercase()
}

/// Format a byte count as a human-readable string (e.g. "1.5 KB").
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(Path::new("/data/reminders.json")),
            PathBuf::from("/data/reminders.json.tmp")
        );
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut map = BTreeMap::new();
        map.insert("42".to_string(), vec!["a".to_string()]);
        write_json_atomic(&path, &map).unwrap();

        let back: BTreeMap<String, Vec<String>> = read_json_or_default(&path).unwrap();
        assert_eq!(back, map);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let back: BTreeMap<String, Vec<String>> =
            read_json_or_default(&dir.path().join("absent.json")).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn test_failed_write_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();

        // A directory squatting on the staging name makes the write fail
        fs::create_dir(staging_path(&path)).unwrap();
        assert!(write_json_atomic(&path, &vec![9]).is_err());

        let back: Vec<i32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert!(read_json_or_default::<BTreeMap<String, String>>(&path).is_err());
    }

    #[test]
    fn test_leftover_staging_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &vec![1]).unwrap();
        fs::write(staging_path(&path), "[1, 2").unwrap();

        let back: Vec<i32> = read_json_or_default(&path).unwrap();
        assert_eq!(back, vec![1]);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Reminders for 42"), "reminders_for_42");
        assert_eq!(sanitize_filename("a/b\\c:d"), "abcd");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
    }
}
