//! Packaging.
//!
//! Wipes the staging directory, copies the declared files into it and runs
//! the packager against it. The packager is trusted only as far as its
//! output: the stage fails unless `<name>-v<version>.<ext>` exists afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::build::types::{BuildError, StageLogger, stage};
use crate::exec::{CommandSpec, ProcessRunner};
use crate::profile::{PackageEntry, PackageSpec};
use crate::util::fs::{clear_dir, copy_dir, copy_file, resolve};

/// Manifest read from the staging directory for the package identity.
const PACKAGE_MANIFEST: &str = "package.json";

/// Result of the packaging stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
  pub artifact: PathBuf,
  pub files_staged: usize,
}

/// Archive file name for a package. Scoped names (`@scope/pkg`) flatten to
/// `scope-pkg`.
pub fn artifact_name(name: &str, version: &str, extension: &str) -> String {
  let flat = name.trim_start_matches('@').replace('/', "-");
  format!("{}-v{}.{}", flat, version, extension)
}

const STAGE_PLACEHOLDER: &str = "{stage}";
const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

/// Expand the packager command line. Without placeholders the staging
/// directory is appended as the last argument.
fn pack_command(template: &[String], stage_dir: &Path, artifact: &Path) -> Vec<String> {
  let stage = stage_dir.to_string_lossy();
  let archive = artifact.to_string_lossy();
  let uses_placeholders = template
    .iter()
    .any(|arg| arg.contains(STAGE_PLACEHOLDER) || arg.contains(ARTIFACT_PLACEHOLDER));

  let mut line: Vec<String> = template
    .iter()
    .map(|arg| {
      arg
        .replace(STAGE_PLACEHOLDER, &stage)
        .replace(ARTIFACT_PLACEHOLDER, &archive)
    })
    .collect();
  if !uses_placeholders {
    line.push(stage.to_string());
  }
  line
}

/// Copy one entry into the staging directory. Returns the number of files.
fn stage_entry(root: &Path, stage_dir: &Path, entry: &PackageEntry) -> Result<usize, BuildError> {
  let src = resolve(root, &entry.src);
  let relative = match &entry.dest {
    Some(dest) => dest.clone(),
    None if entry.src.is_absolute() => PathBuf::from(src.file_name().unwrap_or_default()),
    None => entry.src.clone(),
  };
  let target = stage_dir.join(relative);

  if src.is_dir() {
    copy_dir(&src, &target).map_err(BuildError::io(&src))
  } else if src.is_file() {
    copy_file(&src, &target).map_err(BuildError::io(&src))?;
    Ok(1)
  } else {
    Err(BuildError::Io {
      path: src,
      source: std::io::Error::new(std::io::ErrorKind::NotFound, "package entry not found"),
    })
  }
}

/// Package name and version: explicit values win, otherwise the staged
/// manifest supplies them.
fn package_identity(stage_dir: &Path, spec: &PackageSpec) -> Result<(String, String), BuildError> {
  if let (Some(name), Some(version)) = (&spec.name, &spec.version) {
    return Ok((name.clone(), version.clone()));
  }

  let manifest = stage_dir.join(PACKAGE_MANIFEST);
  let content = fs::read_to_string(&manifest).map_err(BuildError::io(&manifest))?;
  let value: Value = serde_json::from_str(&content).map_err(|e| BuildError::Manifest {
    path: manifest.clone(),
    message: e.to_string(),
  })?;

  let field = |key: &str| -> Result<String, BuildError> {
    value
      .get(key)
      .and_then(Value::as_str)
      .map(String::from)
      .ok_or_else(|| BuildError::Manifest {
        path: manifest.clone(),
        message: format!("missing '{}'", key),
      })
  };

  let name = match &spec.name {
    Some(name) => name.clone(),
    None => field("name")?,
  };
  let version = match &spec.version {
    Some(version) => version.clone(),
    None => field("version")?,
  };
  Ok((name, version))
}

/// Stage the declared files and run the packager.
pub async fn package(
  root: &Path,
  spec: &PackageSpec,
  runner: &impl ProcessRunner,
  logger: &impl StageLogger,
) -> Result<PackageOutcome, BuildError> {
  let (index, name) = stage::PACKAGE;
  let stage_dir = resolve(root, &spec.stage);

  clear_dir(&stage_dir).map_err(BuildError::io(&stage_dir))?;
  let mut files_staged = 0;
  for entry in &spec.files {
    files_staged += stage_entry(root, &stage_dir, entry)?;
  }
  logger.log(index, name, &format!("staged {} file(s)", files_staged), false);

  let (package_name, version) = package_identity(&stage_dir, spec)?;
  let out_dir = match &spec.out_dir {
    Some(dir) => resolve(root, dir),
    None => root.to_path_buf(),
  };
  fs::create_dir_all(&out_dir).map_err(BuildError::io(&out_dir))?;
  let artifact = out_dir.join(artifact_name(&package_name, &version, &spec.extension));

  if artifact.exists() {
    debug!(artifact = ?artifact, "removing previous package");
    fs::remove_file(&artifact).map_err(BuildError::io(&artifact))?;
  }

  let line = pack_command(&spec.command, &stage_dir, &artifact);
  let command = CommandSpec::from_line(&line, &out_dir).map_err(|e| BuildError::tool("package", &stage_dir, e))?;
  logger.log(index, name, &command.display(), false);

  let command_error = match runner.run(&command).await {
    Ok(output) if output.success() => None,
    Ok(output) if output.stderr.is_empty() => Some(format!("exit code {:?}", output.code)),
    Ok(output) => Some(output.stderr),
    Err(e) => Some(e.to_string()),
  };

  if !artifact.exists() {
    return Err(BuildError::PackageMissing {
      artifact,
      command_error: command_error.unwrap_or_else(|| "no error reported".to_string()),
    });
  }
  if let Some(message) = command_error {
    warn!(artifact = ?artifact, error = %message, "packager reported an error");
    return Err(BuildError::tool(&command.program, &stage_dir, message));
  }

  logger.log(index, name, &format!("created {}", artifact.display()), false);
  Ok(PackageOutcome { artifact, files_staged })
}
