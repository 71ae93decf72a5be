//! External process execution.
//!
//! Stages never spawn processes directly; they hand a [`CommandSpec`] to a
//! [`ProcessRunner`]. [`TokioRunner`] is the production implementation, tests
//! substitute recording runners.

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Errors raised while running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
  /// The command line was empty.
  #[error("empty command line")]
  EmptyCommand,

  /// The process could not be started.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The process ran but exited unsuccessfully.
  #[error("{program} failed with exit code {code:?}: {stderr}")]
  Failed {
    program: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// A command to run: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: PathBuf,
}

impl CommandSpec {
  /// Build a spec from a command line (`[program, args...]`).
  pub fn from_line(line: &[String], cwd: &Path) -> Result<Self, ExecError> {
    let (program, args) = line.split_first().ok_or(ExecError::EmptyCommand)?;
    Ok(Self {
      program: program.clone(),
      args: args.to_vec(),
      cwd: cwd.to_path_buf(),
    })
  }

  /// The command line as a single display string.
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ProcessOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Runs external commands on behalf of the build stages.
pub trait ProcessRunner {
  /// Run `spec` to completion and capture its output.
  ///
  /// A non-zero exit status is not an error at this level; callers decide
  /// through [`ProcessOutput::success`] or [`run_checked`].
  fn run(&self, spec: &CommandSpec) -> impl Future<Output = Result<ProcessOutput, ExecError>>;
}

/// Runs commands with `tokio::process`, inheriting the parent environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl ProcessRunner for TokioRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ExecError> {
    info!(cmd = %spec.display(), cwd = ?spec.cwd, "executing command");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).current_dir(&spec.cwd);

    let output = command.output().await.map_err(|source| ExecError::Spawn {
      program: spec.program.clone(),
      source,
    })?;

    let result = ProcessOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };

    if !result.stderr.is_empty() {
      debug!(stderr = %result.stderr, "command stderr");
    }
    if !result.stdout.is_empty() {
      debug!(stdout = %result.stdout, "command stdout");
    }

    Ok(result)
  }
}

/// Run `spec` and turn a non-zero exit status into [`ExecError::Failed`].
pub async fn run_checked(runner: &impl ProcessRunner, spec: &CommandSpec) -> Result<ProcessOutput, ExecError> {
  let output = runner.run(spec).await?;
  if !output.success() {
    return Err(ExecError::Failed {
      program: spec.program.clone(),
      code: output.code,
      stderr: output.stderr,
    });
  }
  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil;
  use tempfile::TempDir;

  #[tokio::test]
  async fn run_successful_command() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::from_line(&testutil::succeed(), temp.path()).unwrap();

    let output = TokioRunner.run(&spec).await.unwrap();

    assert!(output.success());
  }

  #[tokio::test]
  async fn run_checked_reports_exit_code() {
    let temp = TempDir::new().unwrap();
    let spec = CommandSpec::from_line(&testutil::fail_with(3), temp.path()).unwrap();

    let result = run_checked(&TokioRunner, &spec).await;

    assert!(matches!(result, Err(ExecError::Failed { code: Some(3), .. })));
  }

  #[tokio::test]
  async fn run_uses_working_directory() {
    let temp = TempDir::new().unwrap();
    let sub_dir = temp.path().join("subdir");
    std::fs::create_dir(&sub_dir).unwrap();
    let spec = CommandSpec::from_line(&testutil::touch_file("cwd_marker"), &sub_dir).unwrap();

    run_checked(&TokioRunner, &spec).await.unwrap();

    assert!(sub_dir.join("cwd_marker").exists());
  }

  #[tokio::test]
  async fn missing_program_is_spawn_error() {
    let temp = TempDir::new().unwrap();
    let line = vec!["weld-definitely-not-a-program".to_string()];
    let spec = CommandSpec::from_line(&line, temp.path()).unwrap();

    let result = TokioRunner.run(&spec).await;

    assert!(matches!(result, Err(ExecError::Spawn { .. })));
  }

  #[test]
  fn empty_command_line_rejected() {
    let result = CommandSpec::from_line(&[], Path::new("."));
    assert!(matches!(result, Err(ExecError::EmptyCommand)));
  }

  #[test]
  fn display_joins_program_and_args() {
    let line = vec!["npm".to_string(), "install".to_string(), "--silent".to_string()];
    let spec = CommandSpec::from_line(&line, Path::new(".")).unwrap();
    assert_eq!(spec.display(), "npm install --silent");
  }
}
