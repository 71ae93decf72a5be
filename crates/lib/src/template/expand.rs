//! Expansion of an assembly manifest into one artifact.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::manifest::{AssemblyManifest, Fragment, FragmentKind};
use super::{Slot, Template, TemplateError};
use crate::ado::{AssemblyDefinition, FragmentRef};
use crate::build::concat::push_entry;
use crate::util::fs::{display_relative, write_atomic};

/// Text for every template slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotValues {
  pub name: String,
  pub version: String,
  pub description: String,
  pub file: String,
  pub built: String,
  pub keywords: String,
  pub globals: String,
  pub components: String,
  pub resources: String,
  pub types: String,
  pub functions: String,
  pub settings: String,
  pub config: String,
  pub ado: String,
}

impl SlotValues {
  pub fn get(&self, slot: Slot) -> &str {
    match slot {
      Slot::Name => &self.name,
      Slot::Version => &self.version,
      Slot::Description => &self.description,
      Slot::File => &self.file,
      Slot::Built => &self.built,
      Slot::Keywords => &self.keywords,
      Slot::Globals => &self.globals,
      Slot::Components => &self.components,
      Slot::Resources => &self.resources,
      Slot::Types => &self.types,
      Slot::Functions => &self.functions,
      Slot::Settings => &self.settings,
      Slot::Config => &self.config,
      Slot::Ado => &self.ado,
    }
  }
}

/// An expanded assembly, not yet written.
#[derive(Debug, Clone)]
pub struct ExpandedAssembly {
  pub source: String,
  pub definition: AssemblyDefinition,
}

/// Paths written by [`write_assembly`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFiles {
  pub name: String,
  pub artifact: PathBuf,
  pub definition: PathBuf,
}

/// Quote `text` as a JSON string literal.
fn string_literal(text: &str) -> String {
  Value::String(text.to_string()).to_string()
}

fn read_optional(manifest: &AssemblyManifest, path: Option<&PathBuf>, default: &str) -> Result<String, TemplateError> {
  match path {
    Some(path) => {
      let path = manifest.resolve(path);
      fs::read_to_string(&path).map_err(TemplateError::read(&path))
    }
    None => Ok(default.to_string()),
  }
}

/// Render the fragments of one kind as a marked block, rejecting duplicate
/// local names.
fn render_block(
  manifest: &AssemblyManifest,
  kind: FragmentKind,
  fragments: &[Fragment],
) -> Result<(String, Vec<FragmentRef>), TemplateError> {
  let mut block = String::new();
  let mut refs = Vec::with_capacity(fragments.len());
  let mut seen = HashSet::new();

  for fragment in fragments {
    if !seen.insert(fragment.name.as_str()) {
      return Err(TemplateError::DuplicateFragment {
        assembly: manifest.name.clone(),
        kind,
        name: fragment.name.clone(),
      });
    }

    let content = fs::read_to_string(&fragment.path).map_err(TemplateError::read(&fragment.path))?;
    let file = display_relative(&manifest.root, &fragment.path);
    push_entry(&mut block, &file, &content);
    refs.push(FragmentRef {
      name: fragment.name.clone(),
      file,
    });
  }

  Ok((block, refs))
}

/// Expand `manifest` through `template`.
pub fn expand_assembly(
  manifest: &AssemblyManifest,
  template: &Template,
  built_ms: u64,
) -> Result<ExpandedAssembly, TemplateError> {
  let block = |kind| render_block(manifest, kind, &manifest.fragments(kind));
  let (components, component_refs) = block(FragmentKind::Component)?;
  let (resources, resource_refs) = block(FragmentKind::Resource)?;
  let (types, type_refs) = block(FragmentKind::Type)?;
  let (functions, function_refs) = block(FragmentKind::Function)?;

  let settings = read_optional(manifest, manifest.settings.as_ref(), "{}")?;
  let config = read_optional(manifest, manifest.config.as_ref(), "{}")?;

  let definition = AssemblyDefinition {
    name: manifest.name.clone(),
    version: manifest.version.clone(),
    description: manifest.description.clone(),
    file: manifest.artifact_file(),
    built: built_ms,
    components: component_refs,
    resources: resource_refs,
    types: type_refs,
    functions: function_refs,
    settings: settings.clone(),
    config: config.clone(),
  };
  let ado = definition.to_json().map_err(|e| TemplateError::Manifest {
    path: manifest.root.clone(),
    message: e.to_string(),
  })?;

  let values = SlotValues {
    name: manifest.name.clone(),
    version: manifest.version.clone(),
    description: manifest.description.clone(),
    file: definition.file.clone(),
    built: built_ms.to_string(),
    keywords: read_optional(manifest, manifest.keywords.as_ref(), "")?,
    globals: read_optional(manifest, manifest.globals.as_ref(), "")?,
    components,
    resources,
    types,
    functions,
    settings: string_literal(&settings),
    config: string_literal(&config),
    ado: string_literal(&ado),
  };

  debug!(assembly = %manifest.name, components = definition.components.len(), "expanded assembly");

  Ok(ExpandedAssembly {
    source: template.expand(&values),
    definition,
  })
}

/// Expand `manifest` and write the artifact and its definition into `out_dir`.
pub fn write_assembly(
  manifest: &AssemblyManifest,
  template: &Template,
  out_dir: &Path,
  built_ms: u64,
) -> Result<AssembledFiles, TemplateError> {
  let expanded = expand_assembly(manifest, template, built_ms)?;

  let artifact = out_dir.join(&expanded.definition.file);
  let definition = AssemblyDefinition::path_for(&artifact);
  let write_err = |path: &Path| {
    let path = path.to_path_buf();
    move |e: std::io::Error| TemplateError::Write {
      path,
      message: e.to_string(),
    }
  };

  let ado_json = expanded.definition.to_json_pretty().map_err(|e| TemplateError::Manifest {
    path: manifest.root.clone(),
    message: e.to_string(),
  })?;
  write_atomic(&artifact, expanded.source.as_bytes()).map_err(write_err(&artifact))?;
  write_atomic(&definition, ado_json.as_bytes()).map_err(write_err(&definition))?;

  info!(assembly = %manifest.name, artifact = ?artifact, "assembly written");

  Ok(AssembledFiles {
    name: manifest.name.clone(),
    artifact,
    definition,
  })
}
