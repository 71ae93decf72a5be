//! Implementation of the `weld profiles` command.

use std::path::Path;

use anyhow::Result;

use super::load_project;
use crate::output::{OutputFormat, print_info, print_json, print_stat, symbols};

pub fn cmd_profiles(config: &Path, output: OutputFormat) -> Result<()> {
  let project = load_project(config)?;

  if output.is_json() {
    let items: Vec<_> = project
      .profiles
      .iter()
      .map(|(name, profile)| {
        serde_json::json!({
          "name": name,
          "dest": profile.dest,
          "assemblies": profile.assemblies.len(),
          "bundles": profile.bundles.len(),
          "minify": profile.minify.len(),
          "deps": profile.deps.is_some(),
          "package": profile.package.is_some(),
        })
      })
      .collect();
    return print_json(&items);
  }

  print_info(&format!("{} profile(s) in {}", project.profiles.len(), config.display()));
  for (name, profile) in &project.profiles {
    println!();
    println!("{} {}", symbols::ARROW, name);
    print_stat("Destination", &profile.dest.display().to_string());
    print_stat("Assemblies", &profile.assemblies.len().to_string());
    print_stat("Bundles", &profile.bundles.len().to_string());
    print_stat("Minify", &profile.minify.len().to_string());
    let mut extras = Vec::new();
    if profile.deps.is_some() {
      extras.push("deps");
    }
    if profile.package.is_some() {
      extras.push("package");
    }
    if !extras.is_empty() {
      print_stat("Stages", &extras.join(", "));
    }
  }

  Ok(())
}
