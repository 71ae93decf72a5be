//! Project file and build profile types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while loading or validating the project file.
#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to read project file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid project file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("project file declares no profiles")]
  NoProfiles,

  #[error("unknown profile: {0}")]
  UnknownProfile(String),

  #[error("invalid profile '{profile}': {message}")]
  Invalid { profile: String, message: String },
}

/// Switches for the minify and compress steps.
///
/// One instance lives in the project-wide settings, another in each profile.
/// A step runs only when both instances enable it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageToggles {
  pub minify: bool,
  pub minify_config: Option<Value>,
  pub gzip: bool,
  pub gzip_config: Option<Value>,
}

impl StageToggles {
  /// Minification is on for this side: flag set and a config present.
  pub fn minify_on(&self) -> bool {
    self.minify && self.minify_config.is_some()
  }

  /// Compression is on for this side: flag set and a config present.
  pub fn gzip_on(&self) -> bool {
    self.gzip && self.gzip_config.is_some()
  }
}

/// Flags shared by every stage of one build invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildFlags {
  /// Rebuild everything regardless of timestamps.
  pub clean: bool,
  /// Rebuild everything regardless of timestamps.
  pub full_build: bool,
  /// Skip the minify and compress steps.
  pub quick_build: bool,
}

impl BuildFlags {
  /// True when a force flag bypasses change detection.
  pub fn forced(&self) -> bool {
    self.clean || self.full_build
  }
}

/// A target file produced by concatenating `files` in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescriptor {
  pub target: PathBuf,
  pub files: Vec<PathBuf>,
}

/// An assembly to expand from a fragment folder or manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblySource {
  /// Assembly folder (conventional layout) or manifest JSON file.
  pub src: PathBuf,
  /// Output directory for the artifact; defaults to the profile's `dest`.
  #[serde(default)]
  pub out: Option<PathBuf>,
}

fn default_deps_manifest() -> PathBuf {
  PathBuf::from("package.json")
}

fn default_deps_folder() -> String {
  "node_modules".to_string()
}

fn default_install_command() -> Vec<String> {
  vec!["npm".to_string(), "install".to_string()]
}

/// Dependency manifest mirrored into the profile destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepsSpec {
  /// Canonical manifest, relative to the project root.
  #[serde(default = "default_deps_manifest")]
  pub manifest: PathBuf,
  /// Folder the install command populates inside the destination.
  #[serde(default = "default_deps_folder")]
  pub folder: String,
  #[serde(default = "default_install_command")]
  pub command: Vec<String>,
}

impl Default for DepsSpec {
  fn default() -> Self {
    Self {
      manifest: default_deps_manifest(),
      folder: default_deps_folder(),
      command: default_install_command(),
    }
  }
}

/// One entry copied into the packaging staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
  pub src: PathBuf,
  /// Location inside the staging directory; defaults to `src`.
  #[serde(default)]
  pub dest: Option<PathBuf>,
}

/// yarn (v1) names its archive `<name>-v<version>.tgz`, the name the
/// packaging stage checks for.
fn default_pack_command() -> Vec<String> {
  ["yarn", "--cwd", "{stage}", "pack", "--filename", "{artifact}"]
    .map(String::from)
    .to_vec()
}

fn default_archive_ext() -> String {
  "tgz".to_string()
}

/// Packaging stage description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
  /// Staging directory; its contents are wiped before every run.
  pub stage: PathBuf,
  #[serde(default)]
  pub files: Vec<PackageEntry>,
  /// Packager command line. `{stage}` and `{artifact}` expand to the staging
  /// directory and the expected archive path; a line using neither gets the
  /// staging directory appended.
  #[serde(default = "default_pack_command")]
  pub command: Vec<String>,
  /// Directory the packager writes into; defaults to the project root.
  #[serde(default)]
  pub out_dir: Option<PathBuf>,
  #[serde(default = "default_archive_ext")]
  pub extension: String,
  /// Package name; read from the staged `package.json` when absent.
  #[serde(default)]
  pub name: Option<String>,
  /// Package version; read from the staged `package.json` when absent.
  #[serde(default)]
  pub version: Option<String>,
}

/// A named build configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
  pub dest: PathBuf,
  pub assemblies: Vec<AssemblySource>,
  pub bundles: Vec<BundleDescriptor>,
  /// Files minified individually.
  pub minify: Vec<PathBuf>,
  pub deps: Option<DepsSpec>,
  pub package: Option<PackageSpec>,
  /// Per-profile half of the minify/compress opt-in.
  pub options: StageToggles,
  /// Template override for this profile's assemblies.
  pub template: Option<PathBuf>,
}

/// Contents of `weld.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
  /// Project-wide half of the minify/compress opt-in.
  pub settings: StageToggles,
  /// Template used for assemblies when a profile does not name one.
  pub template: Option<PathBuf>,
  pub profiles: BTreeMap<String, Profile>,
  /// Directory containing the project file; relative paths resolve here.
  #[serde(skip)]
  pub root: PathBuf,
}
