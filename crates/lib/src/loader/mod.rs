//! Assembly Load Protocol.
//!
//! Loading turns an [`AssemblyDefinition`] into a finalized [`Assembly`]
//! registered in a [`LoadContext`]. Every load walks the same states:
//!
//! ```text
//! NotStarted -> SettingsResolved -> ConfigResolved -> Loading
//!            -> ComponentsRegistered -> Finalized
//! ```
//!
//! - settings: the embedded defaults deep-merged with provider overrides, then frozen
//! - config: the embedded defaults, frozen, no overrides
//! - loading: base path recorded, "currently loading" marker set, `before_load` hook
//! - components: registered by local name, duplicates rejected, registry frozen
//! - finalize: marker cleared, `on_load_complete` hook, registration, `after_load` hook
//!
//! [`LoadContext::load`] runs all steps and clears the marker on every exit
//! path. [`AssemblyLoad`] exposes the individual transitions.
//!
//! [`AssemblyDefinition`]: crate::ado::AssemblyDefinition

mod context;
mod frozen;
mod hooks;
mod settings;
mod state;

pub use context::{AssemblyLoad, LoadContext, ReloadPolicy};
pub use frozen::{Component, ComponentRegistry, Frozen};
pub use hooks::{HookError, HookResult, LoadHooks};
pub use settings::{JsonFileProvider, SettingsProvider};
pub use state::LoadState;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by the load protocol.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid assembly definition {path}: {message}")]
  Definition { path: PathBuf, message: String },

  #[error("assembly '{assembly}': invalid {field} JSON: {message}")]
  InvalidJson {
    assembly: String,
    field: &'static str,
    message: String,
  },

  #[error("assembly '{assembly}': {key} is frozen")]
  Frozen { assembly: String, key: String },

  #[error("assembly '{assembly}': component '{component}' registered twice")]
  DuplicateComponent { assembly: String, component: String },

  #[error("assembly '{assembly}': component registry is frozen, cannot register '{component}'")]
  RegistryFrozen { assembly: String, component: String },

  #[error("assembly '{assembly}': cannot move from {from} to {to}")]
  InvalidTransition {
    assembly: String,
    from: LoadState,
    to: LoadState,
  },

  #[error("cannot load '{assembly}' while '{current}' is loading")]
  Reentrant { assembly: String, current: String },

  #[error("assembly '{0}' is already loaded")]
  AlreadyLoaded(String),

  #[error("assembly '{assembly}': {hook} hook failed: {source}")]
  Hook {
    assembly: String,
    hook: &'static str,
    #[source]
    source: HookError,
  },
}

impl LoadError {
  pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
    move |source| LoadError::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// A finalized assembly. Shared through `Arc` by the registry; nothing in it
/// can change after registration.
#[derive(Debug)]
pub struct Assembly {
  name: String,
  version: String,
  built: u64,
  settings: Frozen,
  config: Frozen,
  components: ComponentRegistry,
  base_path: PathBuf,
}

impl Assembly {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  /// Build time recorded in the definition, in epoch milliseconds.
  pub fn built(&self) -> u64 {
    self.built
  }

  pub fn settings(&self) -> &Frozen {
    &self.settings
  }

  pub fn config(&self) -> &Frozen {
    &self.config
  }

  pub fn components(&self) -> &ComponentRegistry {
    &self.components
  }

  /// Directory the assembly was loaded from.
  pub fn base_path(&self) -> &Path {
    &self.base_path
  }
}
