mod assemble;
mod build;
mod load;
mod profiles;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use weld_lib::profile::ProjectConfig;

pub use assemble::cmd_assemble;
pub use build::{BuildArgs, cmd_build};
pub use load::cmd_load;
pub use profiles::cmd_profiles;

/// Canonical path of the project file.
fn project_path(config: &Path) -> Result<PathBuf> {
  dunce::canonicalize(config).with_context(|| format!("Project file not found: {}", config.display()))
}

/// Load and validate the project file.
fn load_project(config: &Path) -> Result<ProjectConfig> {
  let path = project_path(config)?;
  ProjectConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}
