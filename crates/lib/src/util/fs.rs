//! Filesystem helpers for the build stages.
//!
//! Everything here is synchronous; the async stages call into it between
//! their external tool invocations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

/// Modification time of `path`, or `None` when it does not exist.
pub fn modified(path: &Path) -> Option<SystemTime> {
  fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Size of a file in whole kilobytes, rounded to the nearest KB.
pub fn size_kb(path: &Path) -> Option<u64> {
  let bytes = fs::metadata(path).ok()?.len();
  Some((bytes as f64 / 1024.0).round() as u64)
}

/// Milliseconds since the Unix epoch.
pub fn epoch_millis() -> u128 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis()
}

/// Write `content` to `path` in one step.
///
/// Missing parent directories are created. The content goes to a sibling temp
/// file first and is renamed over the target, so readers never observe a
/// partially written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)?;
  }

  let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  fs::write(&temp_path, content)?;
  fs::rename(&temp_path, path)
}

/// Copy a single file, creating intermediate directories of `dest`.
pub fn copy_file(src: &Path, dest: &Path) -> io::Result<u64> {
  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::copy(src, dest)
}

/// Recursively copy the directory `src` into `dest`.
///
/// Returns the number of files copied.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<usize> {
  let mut copied = 0;
  fs::create_dir_all(dest)?;

  for entry in WalkDir::new(src).min_depth(1) {
    let entry = entry.map_err(io::Error::other)?;
    let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      copy_file(entry.path(), &target)?;
      copied += 1;
    }
  }

  Ok(copied)
}

/// Remove everything inside `dir` but keep the directory itself.
///
/// The directory is created when it does not exist yet.
pub fn clear_dir(dir: &Path) -> io::Result<()> {
  if !dir.exists() {
    return fs::create_dir_all(dir);
  }

  for entry in fs::read_dir(dir)? {
    let path = entry?.path();
    if path.is_dir() {
      fs::remove_dir_all(&path)?;
    } else {
      fs::remove_file(&path)?;
    }
  }

  Ok(())
}

/// Render `path` relative to `root` with forward slashes, falling back to the
/// path itself when it is not under `root`.
pub fn display_relative(root: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(root).unwrap_or(path);
  relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

/// Resolve `path` against `root` unless it is already absolute.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    root.join(path)
  }
}
