use super::Assembly;

/// Error type returned by lifecycle hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

pub type HookResult = Result<(), HookError>;

type NameHook = Box<dyn Fn(&str) -> HookResult>;
type AssemblyHook = Box<dyn Fn(&Assembly) -> HookResult>;

/// Optional callbacks invoked during a load.
///
/// `before_load` runs before components register, `on_load_complete` after
/// the registry is frozen and the loading marker cleared, `after_load` once
/// the assembly is in the context registry.
#[derive(Default)]
pub struct LoadHooks {
  before_load: Option<NameHook>,
  on_load_complete: Option<NameHook>,
  after_load: Option<AssemblyHook>,
}

impl LoadHooks {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn before_load(mut self, hook: impl Fn(&str) -> HookResult + 'static) -> Self {
    self.before_load = Some(Box::new(hook));
    self
  }

  pub fn on_load_complete(mut self, hook: impl Fn(&str) -> HookResult + 'static) -> Self {
    self.on_load_complete = Some(Box::new(hook));
    self
  }

  pub fn after_load(mut self, hook: impl Fn(&Assembly) -> HookResult + 'static) -> Self {
    self.after_load = Some(Box::new(hook));
    self
  }

  pub(crate) fn run_before_load(&self, name: &str) -> HookResult {
    self.before_load.as_ref().map_or(Ok(()), |hook| hook(name))
  }

  pub(crate) fn run_on_load_complete(&self, name: &str) -> HookResult {
    self.on_load_complete.as_ref().map_or(Ok(()), |hook| hook(name))
  }

  pub(crate) fn run_after_load(&self, assembly: &Assembly) -> HookResult {
    self.after_load.as_ref().map_or(Ok(()), |hook| hook(assembly))
  }
}

impl std::fmt::Debug for LoadHooks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoadHooks")
      .field("before_load", &self.before_load.is_some())
      .field("on_load_complete", &self.on_load_complete.is_some())
      .field("after_load", &self.after_load.is_some())
      .finish()
  }
}
