//! Filesystem helpers.

use crate::debug;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Copy the contents of `src` into `dst`, creating directories as needed.
pub fn copy_dir_recursively(src: &Path, dst: &Path) -> Result<usize> {
    if !dst.exists() {
        fs::create_dir_all(dst)
            .with_context(|| format!("failed to create directory {}", dst.display()))?;
    }

    let mut copied = 0;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry.context("invalid directory entry")?;
        let entry_path = entry.path();
        let dest_path = dst.join(entry.file_name());

        if entry_path.is_dir() {
            copied += copy_dir_recursively(&entry_path, &dest_path)?;
        } else {
            fs::copy(&entry_path, &dest_path).with_context(|| {
                format!("failed to copy {} to {}", entry_path.display(), dest_path.display())
            })?;
            debug!("copy"; "{}", dest_path.display());
            copied += 1;
        }
    }

    Ok(copied)
}
