//! Load context and the step-by-step load driver.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::frozen::{Component, ComponentRegistry, Frozen};
use super::hooks::LoadHooks;
use super::settings::{SettingsProvider, parse_object, resolve_settings};
use super::{Assembly, LoadError, LoadState};
use crate::ado::AssemblyDefinition;
use crate::util::fs::resolve;

/// What [`LoadContext::load`] does with a name that is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReloadPolicy {
  /// Return the registered assembly unchanged; no hooks run.
  #[default]
  ReturnExisting,
  /// Fail with [`LoadError::AlreadyLoaded`].
  Reject,
}

/// State of one execution environment: the assembly currently loading, the
/// registry of finalized assemblies and their base paths.
#[derive(Default)]
pub struct LoadContext {
  current: Option<String>,
  registry: HashMap<String, Arc<Assembly>>,
  paths: HashMap<String, PathBuf>,
  overrides: Option<Box<dyn SettingsProvider>>,
  policy: ReloadPolicy,
}

impl LoadContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_overrides(mut self, provider: impl SettingsProvider + 'static) -> Self {
    self.overrides = Some(Box::new(provider));
    self
  }

  pub fn with_policy(mut self, policy: ReloadPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Name of the assembly currently between `Loading` and `Finalized`.
  pub fn current(&self) -> Option<&str> {
    self.current.as_deref()
  }

  pub fn get(&self, name: &str) -> Option<Arc<Assembly>> {
    self.registry.get(name).cloned()
  }

  pub fn base_path(&self, name: &str) -> Option<&Path> {
    self.paths.get(name).map(PathBuf::as_path)
  }

  /// Registered assembly names, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.registry.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  /// Forget every assembly and clear the loading marker. Overrides and
  /// policy are kept.
  pub fn reset(&mut self) {
    self.current = None;
    self.registry.clear();
    self.paths.clear();
  }

  /// Load `definition` from `base_path` through every protocol step.
  ///
  /// The loading marker is cleared whether the load succeeds or fails.
  pub fn load(
    &mut self,
    definition: &AssemblyDefinition,
    base_path: &Path,
    hooks: &LoadHooks,
  ) -> Result<Arc<Assembly>, LoadError> {
    if let Some(existing) = self.registry.get(&definition.name) {
      match self.policy {
        ReloadPolicy::ReturnExisting => {
          warn!(assembly = %definition.name, "assembly already loaded, returning registered instance");
          return Ok(Arc::clone(existing));
        }
        ReloadPolicy::Reject => return Err(LoadError::AlreadyLoaded(definition.name.clone())),
      }
    }

    let mut load = AssemblyLoad::new(definition.clone(), base_path);
    let result = self.drive(&mut load, hooks);
    if result.is_err() {
      load.abort(self);
    }
    result
  }

  /// Read an assembly definition file and load it, using the file's
  /// directory as the base path.
  pub fn load_file(&mut self, path: &Path, hooks: &LoadHooks) -> Result<Arc<Assembly>, LoadError> {
    let content = fs::read_to_string(path).map_err(LoadError::io(path))?;
    let definition = AssemblyDefinition::from_json(&content).map_err(|e| LoadError::Definition {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;
    let base_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
    self.load(&definition, &base_path, hooks)
  }

  fn drive(&mut self, load: &mut AssemblyLoad, hooks: &LoadHooks) -> Result<Arc<Assembly>, LoadError> {
    load.resolve_settings(self)?;
    load.resolve_config()?;
    load.start(self, hooks)?;
    load.register_components()?;
    load.finalize(self, hooks)
  }
}

impl std::fmt::Debug for LoadContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoadContext")
      .field("current", &self.current)
      .field("assemblies", &self.names())
      .field("overrides", &self.overrides.is_some())
      .field("policy", &self.policy)
      .finish()
  }
}

/// One assembly moving through the load states.
///
/// Each method performs exactly one transition and fails with
/// [`LoadError::InvalidTransition`] when called out of order.
#[derive(Debug)]
pub struct AssemblyLoad {
  definition: AssemblyDefinition,
  base_path: PathBuf,
  state: LoadState,
  settings: Option<Frozen>,
  config: Option<Frozen>,
  components: ComponentRegistry,
  holds_marker: bool,
  /// Set while the context's base path entry exists only for this load.
  owns_path: bool,
}

impl AssemblyLoad {
  pub fn new(definition: AssemblyDefinition, base_path: &Path) -> Self {
    let components = ComponentRegistry::new(&definition.name);
    Self {
      definition,
      base_path: base_path.to_path_buf(),
      state: LoadState::NotStarted,
      settings: None,
      config: None,
      components,
      holds_marker: false,
      owns_path: false,
    }
  }

  pub fn state(&self) -> LoadState {
    self.state
  }

  pub fn name(&self) -> &str {
    &self.definition.name
  }

  fn advance(&mut self, to: LoadState) -> Result<(), LoadError> {
    if !self.state.can_advance_to(to) {
      return Err(LoadError::InvalidTransition {
        assembly: self.definition.name.clone(),
        from: self.state,
        to,
      });
    }
    debug!(assembly = %self.definition.name, from = %self.state, to = %to, "load transition");
    self.state = to;
    Ok(())
  }

  fn check(&self, to: LoadState) -> Result<(), LoadError> {
    if self.state.can_advance_to(to) {
      Ok(())
    } else {
      Err(LoadError::InvalidTransition {
        assembly: self.definition.name.clone(),
        from: self.state,
        to,
      })
    }
  }

  /// `NotStarted -> SettingsResolved`: parse the embedded settings, merge the
  /// context's overrides and freeze the result.
  pub fn resolve_settings(&mut self, context: &LoadContext) -> Result<(), LoadError> {
    self.check(LoadState::SettingsResolved)?;
    let name = &self.definition.name;
    let settings = resolve_settings(name, &self.definition.settings, context.overrides.as_deref())?;
    self.settings = Some(Frozen::new(name, settings));
    self.advance(LoadState::SettingsResolved)
  }

  /// `SettingsResolved -> ConfigResolved`: parse and freeze the embedded
  /// config.
  pub fn resolve_config(&mut self) -> Result<(), LoadError> {
    self.check(LoadState::ConfigResolved)?;
    let name = &self.definition.name;
    let config = parse_object(name, "config", &self.definition.config)?;
    self.config = Some(Frozen::new(name, config));
    self.advance(LoadState::ConfigResolved)
  }

  /// `ConfigResolved -> Loading`: record the base path, take the loading
  /// marker and run `before_load`.
  pub fn start(&mut self, context: &mut LoadContext, hooks: &LoadHooks) -> Result<(), LoadError> {
    self.check(LoadState::Loading)?;
    let name = self.definition.name.clone();

    if let Some(current) = &context.current {
      return Err(LoadError::Reentrant {
        assembly: name,
        current: current.clone(),
      });
    }
    if context.registry.contains_key(&name) {
      return Err(LoadError::AlreadyLoaded(name));
    }

    context.paths.insert(name.clone(), self.base_path.clone());
    self.owns_path = true;
    context.current = Some(name.clone());
    self.holds_marker = true;
    self.advance(LoadState::Loading)?;

    hooks.run_before_load(&name).map_err(|source| LoadError::Hook {
      assembly: name,
      hook: "before_load",
      source,
    })
  }

  /// `Loading -> ComponentsRegistered`: register every declared component
  /// and freeze the registry.
  pub fn register_components(&mut self) -> Result<(), LoadError> {
    self.check(LoadState::ComponentsRegistered)?;
    for fragment in &self.definition.components {
      self.components.register(Component {
        name: fragment.name.clone(),
        file: resolve(&self.base_path, Path::new(&fragment.file)),
      })?;
    }
    self.components.freeze();
    self.advance(LoadState::ComponentsRegistered)
  }

  /// `ComponentsRegistered -> Finalized`: release the marker, run
  /// `on_load_complete`, register the assembly and run `after_load`.
  pub fn finalize(&mut self, context: &mut LoadContext, hooks: &LoadHooks) -> Result<Arc<Assembly>, LoadError> {
    self.check(LoadState::Finalized)?;
    let name = self.definition.name.clone();

    self.release(context);
    hooks.run_on_load_complete(&name).map_err(|source| LoadError::Hook {
      assembly: name.clone(),
      hook: "on_load_complete",
      source,
    })?;

    let settings = self.settings.take();
    let config = self.config.take();
    let (Some(settings), Some(config)) = (settings, config) else {
      return Err(LoadError::InvalidTransition {
        assembly: name,
        from: self.state,
        to: LoadState::Finalized,
      });
    };

    let assembly = Arc::new(Assembly {
      name: name.clone(),
      version: self.definition.version.clone(),
      built: self.definition.built,
      settings,
      config,
      components: std::mem::take(&mut self.components),
      base_path: self.base_path.clone(),
    });
    context.registry.insert(name.clone(), Arc::clone(&assembly));
    self.owns_path = false;
    self.advance(LoadState::Finalized)?;

    info!(assembly = %name, version = %assembly.version, components = assembly.components.len(), "assembly loaded");

    hooks.run_after_load(&assembly).map_err(|source| LoadError::Hook {
      assembly: name,
      hook: "after_load",
      source,
    })?;

    Ok(assembly)
  }

  /// Give up on this load, clearing the marker if this load holds it and
  /// dropping the base path of an assembly that never got registered.
  pub fn abort(&mut self, context: &mut LoadContext) {
    if self.holds_marker {
      warn!(assembly = %self.definition.name, state = %self.state, "load aborted");
    }
    self.release(context);
    if self.owns_path {
      context.paths.remove(&self.definition.name);
      self.owns_path = false;
    }
  }

  fn release(&mut self, context: &mut LoadContext) {
    if self.holds_marker {
      context.current = None;
      self.holds_marker = false;
    }
  }
}
