//! Implementation of the `weld load` command.
//!
//! Loads assembly definitions into a fresh load context and prints what each
//! assembly resolved to.

use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::info;

use weld_lib::loader::{Assembly, JsonFileProvider, LoadContext, LoadHooks, ReloadPolicy};

use crate::output::{OutputFormat, print_json, print_stat, print_success};

fn built_at(assembly: &Assembly) -> Option<String> {
  (assembly.built() > 0).then(|| {
    let time = UNIX_EPOCH + Duration::from_millis(assembly.built());
    humantime::format_rfc3339_millis(time).to_string()
  })
}

fn print_assembly(assembly: &Assembly, built: Option<String>) {
  print_success(&format!("Loaded {} v{}", assembly.name(), assembly.version()));
  print_stat("Base path", &assembly.base_path().display().to_string());
  if let Some(built) = built {
    print_stat("Built", &built);
  }
  print_stat("Settings", &assembly.settings().as_value().to_string());
  print_stat("Config", &assembly.config().as_value().to_string());
  let names: Vec<&str> = assembly.components().iter().map(|c| c.name.as_str()).collect();
  print_stat("Components", &names.join(", "));
}

/// Execute the load command.
pub fn cmd_load(
  definitions: &[PathBuf],
  overrides: Option<&Path>,
  reject_reload: bool,
  output: OutputFormat,
) -> Result<()> {
  let policy = if reject_reload {
    ReloadPolicy::Reject
  } else {
    ReloadPolicy::ReturnExisting
  };
  let mut ctx = LoadContext::new().with_policy(policy);
  if let Some(path) = overrides {
    let provider =
      JsonFileProvider::load(path).with_context(|| format!("Failed to read overrides {}", path.display()))?;
    ctx = ctx.with_overrides(provider);
  }

  let hooks = LoadHooks::new()
    .before_load(|name| {
      info!(assembly = name, "loading");
      Ok(())
    })
    .after_load(|assembly| {
      info!(assembly = assembly.name(), "registered");
      Ok(())
    });

  let mut loaded = Vec::with_capacity(definitions.len());
  for definition in definitions {
    let assembly = ctx
      .load_file(definition, &hooks)
      .with_context(|| format!("Failed to load {}", definition.display()))?;
    let built = built_at(&assembly);
    loaded.push((assembly, built));
  }

  if output.is_json() {
    let items: Vec<_> = loaded
      .iter()
      .map(|(a, built)| {
        serde_json::json!({
          "name": a.name(),
          "version": a.version(),
          "base_path": a.base_path(),
          "built": built,
          "settings": a.settings().as_value(),
          "config": a.config().as_value(),
          "components": a.components().iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        })
      })
      .collect();
    print_json(&items)?;
  } else {
    for (assembly, built) in loaded {
      print_assembly(&assembly, built);
    }
  }

  Ok(())
}
