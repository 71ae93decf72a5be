//! Types shared by the build stages.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::profile::ProfileError;
use crate::template::TemplateError;

/// Errors that abort a build stage.
#[derive(Debug, Error)]
pub enum BuildError {
  /// The project file or a profile is unusable.
  #[error(transparent)]
  Config(#[from] ProfileError),

  /// Reading or writing a file failed.
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// An external tool (minifier, compressor, installer, packager) failed.
  #[error("{tool} failed on {path}: {message}")]
  Tool {
    tool: String,
    path: PathBuf,
    message: String,
  },

  /// A dependency or package manifest is missing required data.
  #[error("invalid manifest {path}: {message}")]
  Manifest { path: PathBuf, message: String },

  /// The packager finished but the expected archive is not there.
  #[error("package artifact {artifact} was not created (packager error: {command_error})")]
  PackageMissing { artifact: PathBuf, command_error: String },

  /// Assembly template expansion failed.
  #[error(transparent)]
  Template(#[from] TemplateError),
}

impl BuildError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| BuildError::Io { path, source }
  }

  pub(crate) fn tool(tool: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
    BuildError::Tool {
      tool: tool.to_string(),
      path: path.into(),
      message: message.to_string(),
    }
  }
}

/// Receives progress messages from the build stages.
pub trait StageLogger {
  /// Log `message` for stage `index`/`stage`. Headers announce a stage,
  /// everything else is detail within it.
  fn log(&self, index: usize, stage: &str, message: &str, header: bool);
}

/// Forwards stage messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StageLogger for TracingLogger {
  fn log(&self, index: usize, stage: &str, message: &str, header: bool) {
    if header {
      info!(stage_index = index, stage, "== {}", message);
    } else {
      info!(stage_index = index, stage, "{}", message);
    }
  }
}

/// Stage identifiers, in execution order.
pub mod stage {
  pub const ASSEMBLE: (usize, &str) = (1, "assemble");
  pub const BUNDLE: (usize, &str) = (2, "bundle");
  pub const MINIFY: (usize, &str) = (3, "minify");
  pub const DEPS: (usize, &str) = (4, "deps");
  pub const PACKAGE: (usize, &str) = (5, "package");
}

/// What a stage did with one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
  Ran,
  Skipped,
}

impl StepStatus {
  pub fn ran(self) -> bool {
    matches!(self, StepStatus::Ran)
  }
}
