//! Assembly manifests.
//!
//! A manifest names an assembly and lists its fragment files. It is either
//! written by hand (`assembly.json`) or discovered from the conventional
//! folder layout:
//!
//! ```text
//! my-assembly/
//! ├── assembly.json       # optional: name, version, description, explicit lists
//! ├── components/         # one fragment per component
//! ├── resources/
//! ├── types/
//! ├── functions/
//! ├── keywords.js         # optional keyword bindings block
//! ├── globals.js          # optional injected globals block
//! ├── settings.json       # optional default settings
//! └── config.json         # optional default config
//! ```
//!
//! Lists left empty in `assembly.json` are filled by discovery, ordered by
//! relative path.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::TemplateError;
use crate::util::fs::display_relative;

/// File name of an explicit manifest inside an assembly folder.
pub const MANIFEST_FILE: &str = "assembly.json";

/// The ordered content blocks of an assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
  Component,
  Resource,
  Type,
  Function,
}

impl FragmentKind {
  pub const ALL: [FragmentKind; 4] = [
    FragmentKind::Component,
    FragmentKind::Resource,
    FragmentKind::Type,
    FragmentKind::Function,
  ];

  /// Conventional folder holding fragments of this kind.
  pub fn folder(self) -> &'static str {
    match self {
      FragmentKind::Component => "components",
      FragmentKind::Resource => "resources",
      FragmentKind::Type => "types",
      FragmentKind::Function => "functions",
    }
  }
}

impl fmt::Display for FragmentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      FragmentKind::Component => "component",
      FragmentKind::Resource => "resource",
      FragmentKind::Type => "type",
      FragmentKind::Function => "function",
    };
    f.write_str(name)
  }
}

/// One fragment file of an assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
  /// Local name: the path below the kind folder, without extension, with
  /// `.` separators (`components/ui/button.js` -> `ui.button`).
  pub name: String,
  pub path: PathBuf,
}

impl Fragment {
  fn from_path(root: &Path, kind: FragmentKind, path: &Path) -> Self {
    let base = root.join(kind.folder());
    let name = match path.strip_prefix(&base) {
      Ok(relative) => display_relative(Path::new(""), &relative.with_extension("")).replace('/', "."),
      Err(_) => path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default(),
    };
    Self {
      name,
      path: path.to_path_buf(),
    }
  }
}

fn default_version() -> String {
  "0.0.0".to_string()
}

/// Description of one assembly's sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyManifest {
  #[serde(default)]
  pub name: String,
  #[serde(default = "default_version")]
  pub version: String,
  #[serde(default)]
  pub description: String,
  /// Artifact file name; defaults to `<name>.js`.
  #[serde(default)]
  pub file: Option<String>,
  #[serde(default)]
  pub components: Vec<PathBuf>,
  #[serde(default)]
  pub resources: Vec<PathBuf>,
  #[serde(default)]
  pub types: Vec<PathBuf>,
  #[serde(default)]
  pub functions: Vec<PathBuf>,
  #[serde(default)]
  pub keywords: Option<PathBuf>,
  #[serde(default)]
  pub globals: Option<PathBuf>,
  #[serde(default)]
  pub settings: Option<PathBuf>,
  #[serde(default)]
  pub config: Option<PathBuf>,
  /// Directory the manifest's relative paths resolve against.
  #[serde(skip)]
  pub root: PathBuf,
}

impl AssemblyManifest {
  /// Load a manifest from an assembly folder or a manifest file.
  pub fn load(src: &Path) -> Result<Self, TemplateError> {
    if src.is_dir() {
      let explicit = src.join(MANIFEST_FILE);
      let mut manifest = if explicit.is_file() {
        Self::read(&explicit)?
      } else {
        Self::empty(src)
      };
      manifest.discover()?;
      Ok(manifest)
    } else {
      Self::read(src)
    }
  }

  fn empty(root: &Path) -> Self {
    Self {
      name: String::new(),
      version: default_version(),
      description: String::new(),
      file: None,
      components: Vec::new(),
      resources: Vec::new(),
      types: Vec::new(),
      functions: Vec::new(),
      keywords: None,
      globals: None,
      settings: None,
      config: None,
      root: root.to_path_buf(),
    }
  }

  fn read(path: &Path) -> Result<Self, TemplateError> {
    let content = fs::read_to_string(path).map_err(TemplateError::read(path))?;
    let mut manifest: Self = serde_json::from_str(&content).map_err(|e| TemplateError::Manifest {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    manifest.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(manifest)
  }

  /// Fill the name, empty fragment lists and optional blocks from the
  /// conventional layout under `root`.
  fn discover(&mut self) -> Result<(), TemplateError> {
    if self.name.is_empty() {
      self.name = self
        .root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    }

    for kind in FragmentKind::ALL {
      if self.list(kind).is_empty() {
        let found = discover_folder(&self.root, kind.folder())?;
        *self.list_mut(kind) = found;
      }
    }

    self.keywords = self.keywords.take().or_else(|| find_block(&self.root, "keywords"));
    self.globals = self.globals.take().or_else(|| find_block(&self.root, "globals"));
    self.settings = self.settings.take().or_else(|| existing(&self.root, "settings.json"));
    self.config = self.config.take().or_else(|| existing(&self.root, "config.json"));
    Ok(())
  }

  pub fn list(&self, kind: FragmentKind) -> &[PathBuf] {
    match kind {
      FragmentKind::Component => &self.components,
      FragmentKind::Resource => &self.resources,
      FragmentKind::Type => &self.types,
      FragmentKind::Function => &self.functions,
    }
  }

  fn list_mut(&mut self, kind: FragmentKind) -> &mut Vec<PathBuf> {
    match kind {
      FragmentKind::Component => &mut self.components,
      FragmentKind::Resource => &mut self.resources,
      FragmentKind::Type => &mut self.types,
      FragmentKind::Function => &mut self.functions,
    }
  }

  /// Fragments of `kind`, resolved against the manifest root.
  pub fn fragments(&self, kind: FragmentKind) -> Vec<Fragment> {
    self
      .list(kind)
      .iter()
      .map(|p| Fragment::from_path(&self.root, kind, &self.resolve(p)))
      .collect()
  }

  pub fn resolve(&self, path: &Path) -> PathBuf {
    crate::util::fs::resolve(&self.root, path)
  }

  /// File name of the generated artifact.
  pub fn artifact_file(&self) -> String {
    self.file.clone().unwrap_or_else(|| format!("{}.js", self.name))
  }
}

/// Files under `root/folder`, relative to `root`, sorted.
fn discover_folder(root: &Path, folder: &str) -> Result<Vec<PathBuf>, TemplateError> {
  let base = root.join(folder);
  if !base.is_dir() {
    return Ok(Vec::new());
  }

  let mut files = Vec::new();
  for entry in WalkDir::new(&base).sort_by_file_name() {
    let entry = entry.map_err(|e| TemplateError::Read {
      path: base.clone(),
      message: e.to_string(),
    })?;
    if entry.file_type().is_file() {
      let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
      files.push(relative.to_path_buf());
    }
  }
  Ok(files)
}

/// First `<stem>.*` file directly under `root`.
fn find_block(root: &Path, stem: &str) -> Option<PathBuf> {
  let mut matches: Vec<PathBuf> = fs::read_dir(root)
    .ok()?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| path.is_file() && path.file_stem().is_some_and(|s| s == stem))
    .collect();
  matches.sort();
  matches.into_iter().next().map(|p| PathBuf::from(p.file_name().unwrap_or_default()))
}

fn existing(root: &Path, name: &str) -> Option<PathBuf> {
  root.join(name).is_file().then(|| PathBuf::from(name))
}
