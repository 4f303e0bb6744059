//! Utility functions for common operations.
//!
//! This module provides shared utilities used across the crate:
//! - Atomic file operations for data safety
//! - Display helpers for node identifiers

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ArborError, Result};

/// Atomically write content to a file.
///
/// This function ensures data integrity by:
/// 1. Writing to a temporary file in the same directory
/// 2. Syncing the data to disk
/// 3. Atomically renaming the temp file to the target path
///
/// If any step fails, the original file (if it exists) remains unchanged.
///
/// # Arguments
///
/// * `path` - The target file path
/// * `content` - The content to write as bytes
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be determined or doesn't exist
/// - The temporary file cannot be created
/// - Writing to the temporary file fails
/// - The atomic rename (persist) operation fails
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    // Get the parent directory for creating the temp file
    let parent = path.parent().ok_or_else(|| ArborError::IoError {
        context: format!("Cannot determine parent directory for: {}", path.display()),
        source: io::Error::new(io::ErrorKind::InvalidInput, "No parent directory"),
    })?;

    // Ensure parent directory exists
    if !parent.exists() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ArborError::io(
                format!("Failed to create directory: {}", parent.display()),
                e,
            )
        })?;
    }

    // Create temp file in the same directory (ensures same filesystem for atomic rename)
    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| {
        ArborError::io(
            format!("Failed to create temporary file in: {}", parent.display()),
            e,
        )
    })?;

    // Write content to temp file
    temp_file.write_all(content).map_err(|e| {
        ArborError::io(
            format!("Failed to write to temporary file for: {}", path.display()),
            e,
        )
    })?;

    // Sync to disk before rename
    temp_file.flush().map_err(|e| {
        ArborError::io(
            format!("Failed to flush temporary file for: {}", path.display()),
            e,
        )
    })?;

    // Atomically rename temp file to target
    temp_file.persist(path).map_err(|e| {
        ArborError::io(
            format!("Failed to atomically write file: {}", path.display()),
            e.error,
        )
    })?;

    Ok(())
}

/// Truncate a string for single-line display, appending an ellipsis.
///
/// Truncation happens on a character boundary so multi-byte content is safe.
#[must_use]
pub fn truncate_line(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut out: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_atomic_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        atomic_write(&path, b"hello").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.txt");

        atomic_write(&path, b"nested").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "nested");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("short", 10), "short");
        assert_eq!(truncate_line("multi\nline", 20), "multi line");
        assert_eq!(truncate_line("abcdefghij", 5), "abcd…");
    }
}
