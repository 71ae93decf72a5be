//! Implementation of the `weld assemble` command.

use std::path::Path;

use anyhow::{Context, Result};

use weld_lib::template::{AssemblyManifest, Template, write_assembly};
use weld_lib::util::fs::epoch_millis;

use crate::output::{print_stat, print_success};

/// Expand the assembly at `src` into `out`.
pub fn cmd_assemble(src: &Path, out: &Path, template: Option<&Path>) -> Result<()> {
  let manifest =
    AssemblyManifest::load(src).with_context(|| format!("Failed to read assembly {}", src.display()))?;
  let template = match template {
    Some(path) => Template::load(path).with_context(|| format!("Failed to load template {}", path.display()))?,
    None => Template::builtin(),
  };

  let files = write_assembly(&manifest, &template, out, epoch_millis() as u64)
    .with_context(|| format!("Failed to assemble {}", manifest.name))?;

  print_success(&format!("Assembled {} v{}", manifest.name, manifest.version));
  print_stat("Artifact", &files.artifact.display().to_string());
  print_stat("Definition", &files.definition.display().to_string());
  print_stat("Components", &manifest.components.len().to_string());

  Ok(())
}
