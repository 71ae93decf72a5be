//! Dependency installation.
//!
//! The canonical dependency manifest is mirrored into the profile
//! destination and the install command runs there, but only when something
//! could have changed: the mirror is missing, the dependency folder is gone,
//! a force flag is set, or the canonical manifest is newer than the mirror.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::build::types::{BuildError, StageLogger, stage};
use crate::exec::{CommandSpec, ProcessRunner, run_checked};
use crate::profile::{BuildFlags, DepsSpec};
use crate::util::fs::{copy_file, modified, resolve};

/// Why the installer ran or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
  /// No mirrored manifest in the destination yet.
  ManifestMissing,
  /// The dependency folder does not exist in the destination.
  FolderMissing,
  /// `clean` or `full_build` was requested.
  Forced,
  /// The canonical manifest is newer than the mirror.
  ManifestChanged,
  /// Nothing changed; install skipped.
  UpToDate,
}

impl InstallReason {
  pub fn installs(self) -> bool {
    !matches!(self, InstallReason::UpToDate)
  }

  fn describe(self) -> &'static str {
    match self {
      InstallReason::ManifestMissing => "manifest copied",
      InstallReason::FolderMissing => "dependency folder missing",
      InstallReason::Forced => "forced",
      InstallReason::ManifestChanged => "manifest changed",
      InstallReason::UpToDate => "no change",
    }
  }
}

/// Result of the dependency stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsOutcome {
  pub reason: InstallReason,
  /// The manifest was (re)copied into the destination.
  pub copied: bool,
  /// Dependencies declared by the manifest; only counted after an install.
  pub dependency_count: Option<usize>,
}

/// Decide whether to install. A missing dependency folder always installs,
/// whatever the timestamps say.
pub fn install_reason(canonical: &Path, mirror: &Path, folder: &Path, flags: &BuildFlags) -> InstallReason {
  if !mirror.exists() {
    return InstallReason::ManifestMissing;
  }
  if !folder.exists() {
    return InstallReason::FolderMissing;
  }
  if flags.forced() {
    return InstallReason::Forced;
  }
  if is_newer(canonical, mirror) {
    return InstallReason::ManifestChanged;
  }
  InstallReason::UpToDate
}

fn is_newer(a: &Path, b: &Path) -> bool {
  match (modified(a), modified(b)) {
    (Some(a), Some(b)) => a > b,
    _ => false,
  }
}

/// Number of entries in the manifest's `dependencies` object.
pub fn count_dependencies(manifest: &Path) -> Result<usize, BuildError> {
  let content = fs::read_to_string(manifest).map_err(BuildError::io(manifest))?;
  let value: Value = serde_json::from_str(&content).map_err(|e| BuildError::Manifest {
    path: manifest.to_path_buf(),
    message: e.to_string(),
  })?;

  Ok(value.get("dependencies").and_then(Value::as_object).map_or(0, |deps| deps.len()))
}

/// Mirror the manifest into `dest` and run the install command when needed.
pub async fn install_deps(
  root: &Path,
  dest: &Path,
  spec: &DepsSpec,
  flags: &BuildFlags,
  runner: &impl ProcessRunner,
  logger: &impl StageLogger,
) -> Result<DepsOutcome, BuildError> {
  let (index, name) = stage::DEPS;
  let canonical = resolve(root, &spec.manifest);
  if !canonical.exists() {
    return Err(BuildError::Io {
      path: canonical,
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "dependency manifest not found"),
    });
  }

  let file_name = canonical.file_name().unwrap_or_default();
  let mirror = dest.join(file_name);
  let folder = dest.join(&spec.folder);

  let reason = install_reason(&canonical, &mirror, &folder, flags);
  debug!(reason = ?reason, mirror = ?mirror, "dependency decision");

  if !reason.installs() {
    logger.log(index, name, reason.describe(), false);
    return Ok(DepsOutcome {
      reason,
      copied: false,
      dependency_count: None,
    });
  }

  let copied = !mirror.exists() || is_newer(&canonical, &mirror);
  if copied {
    copy_file(&canonical, &mirror).map_err(BuildError::io(&mirror))?;
  }

  let command = CommandSpec::from_line(&spec.command, dest).map_err(|e| BuildError::tool("install", dest, e))?;
  logger.log(index, name, &format!("{} ({})", command.display(), reason.describe()), false);
  run_checked(runner, &command)
    .await
    .map_err(|e| BuildError::tool(&command.program, dest, e))?;

  let count = count_dependencies(&mirror)?;
  logger.log(index, name, &format!("{} dependencies installed", count), false);

  Ok(DepsOutcome {
    reason,
    copied,
    dependency_count: Some(count),
  })
}
