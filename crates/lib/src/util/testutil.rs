//! Test utilities for weld-lib.
//!
//! Cross-platform command lines for tests that drive the process runner.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Command line that exits successfully without output.
#[cfg(unix)]
pub fn succeed() -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), "exit 0".to_string()]
}

#[cfg(windows)]
pub fn succeed() -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), "exit 0".to_string()]
}

/// Command line that fails with the given exit code.
#[cfg(unix)]
pub fn fail_with(code: i32) -> Vec<String> {
  vec!["/bin/sh".to_string(), "-c".to_string(), format!("exit {}", code)]
}

#[cfg(windows)]
pub fn fail_with(code: i32) -> Vec<String> {
  vec!["cmd.exe".to_string(), "/C".to_string(), format!("exit {}", code)]
}

/// Command line that creates a file named `filename` in the working directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> Vec<String> {
  vec!["/usr/bin/touch".to_string(), filename.to_string()]
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> Vec<String> {
  vec![
    "powershell.exe".to_string(),
    "-NoProfile".to_string(),
    "-Command".to_string(),
    format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
  ]
}

/// Set the modification time of `path` relative to now.
pub fn set_age(path: &Path, age: Duration) {
  let file = std::fs::File::options().write(true).open(path).unwrap();
  file.set_modified(SystemTime::now() - age).unwrap();
}
