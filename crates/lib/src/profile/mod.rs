//! Project configuration.
//!
//! A project file (`weld.json`) declares the project-wide stage settings and
//! any number of named build profiles. Paths inside it are relative to the
//! directory holding the file.
//!
//! ```json
//! {
//!   "settings": { "minify": true, "minifyConfig": {}, "gzip": true, "gzipConfig": { "level": 9 } },
//!   "profiles": {
//!     "web": {
//!       "dest": "dist",
//!       "bundles": [{ "target": "dist/app.js", "files": ["src/a.js", "src/b.js"] }],
//!       "options": { "minify": true, "minifyConfig": {} }
//!     }
//!   }
//! }
//! ```

mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use tracing::debug;

impl ProjectConfig {
  /// Load and validate a project file.
  pub fn load(path: &Path) -> Result<Self, ProfileError> {
    let content = fs::read_to_string(path).map_err(|source| ProfileError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let mut config = Self::from_json(&content).map_err(|source| ProfileError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
    config.validate()?;

    debug!(path = ?path, profiles = config.profiles.len(), "loaded project file");
    Ok(config)
  }

  /// Parse a project file without touching the filesystem.
  pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(content)
  }

  /// Check every profile for missing required fields.
  pub fn validate(&self) -> Result<(), ProfileError> {
    if self.profiles.is_empty() {
      return Err(ProfileError::NoProfiles);
    }

    for (name, profile) in &self.profiles {
      let invalid = |message: &str| ProfileError::Invalid {
        profile: name.clone(),
        message: message.to_string(),
      };

      if profile.dest.as_os_str().is_empty() {
        return Err(invalid("missing 'dest'"));
      }
      for bundle in &profile.bundles {
        if bundle.files.is_empty() {
          return Err(invalid(&format!("bundle '{}' lists no files", bundle.target.display())));
        }
      }
      if let Some(deps) = &profile.deps
        && deps.command.is_empty()
      {
        return Err(invalid("empty dependency install command"));
      }
      if let Some(package) = &profile.package
        && package.command.is_empty()
      {
        return Err(invalid("empty package command"));
      }
    }

    Ok(())
  }

  /// Resolve profile names to profiles, keeping the requested order.
  ///
  /// An empty selection means every profile, in name order.
  pub fn select<'a>(&'a self, names: &[String]) -> Result<Vec<(&'a str, &'a Profile)>, ProfileError> {
    if names.is_empty() {
      return Ok(self.profiles.iter().map(|(k, v)| (k.as_str(), v)).collect());
    }

    names
      .iter()
      .map(|name| {
        self
          .profiles
          .get_key_value(name)
          .map(|(k, v)| (k.as_str(), v))
          .ok_or_else(|| ProfileError::UnknownProfile(name.clone()))
      })
      .collect()
  }
}
