//! Shared helpers for library integration tests.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use weld_lib::build::minify::{Compressor, Minifier};
use weld_lib::build::{BuildError, StageLogger};
use weld_lib::exec::{CommandSpec, ExecError, ProcessOutput, ProcessRunner};

/// A temporary project directory.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn path(&self, relative: &str) -> PathBuf {
    self.temp.path().join(relative)
  }

  /// Write a file relative to the project root.
  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.path(relative);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
  }

  pub fn read(&self, relative: &str) -> String {
    fs::read_to_string(self.path(relative)).unwrap_or_else(|e| panic!("failed to read {}: {}", relative, e))
  }
}

/// Collects stage messages.
#[derive(Default)]
pub struct MemoryLogger {
  pub lines: RefCell<Vec<String>>,
}

impl StageLogger for MemoryLogger {
  fn log(&self, index: usize, stage: &str, message: &str, header: bool) {
    let marker = if header { "==" } else { "  " };
    self.lines.borrow_mut().push(format!("{} [{}:{}] {}", marker, index, stage, message));
  }
}

/// Runs nothing; reports a configurable exit code and stderr.
#[derive(Default)]
pub struct ScriptedRunner {
  pub code: i32,
  pub stderr: String,
  pub calls: RefCell<Vec<CommandSpec>>,
}

impl ProcessRunner for ScriptedRunner {
  async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput, ExecError> {
    self.calls.borrow_mut().push(spec.clone());
    Ok(ProcessOutput {
      code: Some(self.code),
      stdout: String::new(),
      stderr: self.stderr.clone(),
    })
  }
}

/// Uppercases instead of minifying.
pub struct UpperMinifier;

impl Minifier for UpperMinifier {
  async fn minify(&self, input: &Path, output: &Path, _config: &Value) -> Result<(), BuildError> {
    let content = fs::read_to_string(input).map_err(|source| BuildError::Io {
      path: input.to_path_buf(),
      source,
    })?;
    fs::write(output, content.to_uppercase()).map_err(|source| BuildError::Io {
      path: output.to_path_buf(),
      source,
    })
  }
}

/// Always fails.
pub struct BrokenCompressor;

impl Compressor for BrokenCompressor {
  async fn compress(&self, _input: &Path, output: &Path, _config: &Value) -> Result<(), BuildError> {
    Err(BuildError::Tool {
      tool: "gzip".to_string(),
      path: output.to_path_buf(),
      message: "disk full".to_string(),
    })
  }
}
