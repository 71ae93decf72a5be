//! File concatenation into bundles.
//!
//! A bundle is one text file holding several sources in declared order:
//!
//! ```text
//! // created: 1700000000000
//! // file (start): src/a.js
//! <a.js verbatim>
//! // file (end)
//! // file (start): src/b.js
//! <b.js verbatim>
//! // file (end)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::build::types::BuildError;
use crate::consts::{CREATED_MARKER, FILE_END_MARKER, FILE_START_MARKER};
use crate::profile::BundleDescriptor;
use crate::util::fs::{display_relative, epoch_millis, resolve, write_atomic};

/// Append one marked entry for `name` holding `content`.
pub fn push_entry(out: &mut String, name: &str, content: &str) {
  out.push_str(FILE_START_MARKER);
  out.push(' ');
  out.push_str(name);
  out.push('\n');
  out.push_str(content);
  out.push('\n');
  out.push_str(FILE_END_MARKER);
  out.push('\n');
}

/// Render the bundle text for `files` (resolved against `root`).
///
/// Every source is read before anything is returned, so an unreadable file
/// fails the whole bundle.
pub fn render_bundle(root: &Path, files: &[PathBuf], created_ms: u128) -> Result<String, BuildError> {
  let mut out = format!("{} {}\n", CREATED_MARKER, created_ms);

  for file in files {
    let path = resolve(root, file);
    let content = fs::read_to_string(&path).map_err(BuildError::io(&path))?;
    push_entry(&mut out, &display_relative(root, &path), &content);
  }

  Ok(out)
}

/// Concatenate the bundle's files into its target and return the target path.
pub fn concat_files(root: &Path, bundle: &BundleDescriptor) -> Result<PathBuf, BuildError> {
  let target = resolve(root, &bundle.target);
  let content = render_bundle(root, &bundle.files, epoch_millis())?;

  write_atomic(&target, content.as_bytes()).map_err(BuildError::io(&target))?;
  debug!(target = ?target, files = bundle.files.len(), "bundle written");

  Ok(target)
}

/// Source names recorded in an existing bundle, in order. `None` when the
/// target cannot be read.
pub fn recorded_files(target: &Path) -> Option<Vec<String>> {
  let text = fs::read_to_string(target).ok()?;
  let prefix = format!("{} ", FILE_START_MARKER);
  Some(
    text
      .lines()
      .filter_map(|line| line.strip_prefix(prefix.as_str()))
      .map(String::from)
      .collect(),
  )
}

/// Whether the bundle's target already holds exactly its declared files in
/// declared order.
pub fn listing_matches(root: &Path, bundle: &BundleDescriptor) -> bool {
  let Some(recorded) = recorded_files(&resolve(root, &bundle.target)) else {
    return false;
  };
  let declared = bundle.files.iter().map(|file| display_relative(root, &resolve(root, file)));
  recorded.into_iter().eq(declared)
}
