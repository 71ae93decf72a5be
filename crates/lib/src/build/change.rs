//! Timestamp based change detection.
//!
//! The only caching the pipeline does: a step is skipped when its output
//! exists and is at least as new as its input. There is no content hashing,
//! so touching a file without changing it triggers a rebuild.

use std::path::Path;

use tracing::trace;

use crate::profile::BuildFlags;
use crate::util::fs::modified;

/// Decide whether the step producing `output` from `source` has to run.
///
/// Runs when a force flag is set, when `output` is missing, or when `source`
/// is strictly newer than `output`. A missing source also runs the step so
/// the step itself reports the read failure.
pub fn should_run(source: &Path, output: &Path, flags: &BuildFlags) -> bool {
  if flags.forced() {
    return true;
  }

  let Some(output_time) = modified(output) else {
    trace!(output = ?output, "output missing");
    return true;
  };

  match modified(source) {
    Some(source_time) => source_time > output_time,
    None => true,
  }
}

/// Like [`should_run`] for a step with several inputs: runs when any input
/// qualifies.
pub fn should_run_any<'a>(sources: impl IntoIterator<Item = &'a Path>, output: &Path, flags: &BuildFlags) -> bool {
  if flags.forced() || modified(output).is_none() {
    return true;
  }
  sources.into_iter().any(|source| should_run(source, output, flags))
}
