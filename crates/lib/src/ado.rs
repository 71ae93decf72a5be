//! Assembly Definition Objects.
//!
//! An ADO describes one assembled artifact: its identity, the fragments it
//! was built from and its embedded default settings and config. The
//! expander writes it next to the artifact as `<stem>.ado.json` (and embeds
//! it in the artifact); the loader reads it back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::ADO_EXT;

/// A fragment listed in a definition: local name plus source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRef {
  pub name: String,
  pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyDefinition {
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub description: String,
  /// Artifact file name, relative to the definition file.
  pub file: String,
  /// Build time in milliseconds since the Unix epoch.
  #[serde(default)]
  pub built: u64,
  #[serde(default)]
  pub components: Vec<FragmentRef>,
  #[serde(default)]
  pub resources: Vec<FragmentRef>,
  #[serde(default)]
  pub types: Vec<FragmentRef>,
  #[serde(default)]
  pub functions: Vec<FragmentRef>,
  /// Default settings as JSON text; parsed at load time.
  pub settings: String,
  /// Default config as JSON text; parsed at load time.
  pub config: String,
}

impl AssemblyDefinition {
  /// Definition file for an artifact: `dist/core.js` -> `dist/core.ado.json`.
  pub fn path_for(artifact: &Path) -> PathBuf {
    let stem = artifact.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    artifact.with_file_name(format!("{}.{}", stem, ADO_EXT))
  }

  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn definition_path_replaces_extension() {
    assert_eq!(
      AssemblyDefinition::path_for(Path::new("dist/core.js")),
      PathBuf::from("dist/core.ado.json")
    );
  }

  #[test]
  fn parses_minimal_definition() {
    let ado = AssemblyDefinition::from_json(
      r#"{ "name": "core", "version": "1.0.0", "file": "core.js", "settings": "{}", "config": "{}" }"#,
    )
    .unwrap();

    assert_eq!(ado.name, "core");
    assert!(ado.components.is_empty());
    assert_eq!(ado.built, 0);
  }
}
