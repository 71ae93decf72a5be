use std::fmt;

/// Position of one assembly in the load protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadState {
  NotStarted,
  SettingsResolved,
  ConfigResolved,
  Loading,
  ComponentsRegistered,
  Finalized,
}

impl LoadState {
  /// The only state reachable from `self`.
  pub fn next(self) -> Option<LoadState> {
    match self {
      LoadState::NotStarted => Some(LoadState::SettingsResolved),
      LoadState::SettingsResolved => Some(LoadState::ConfigResolved),
      LoadState::ConfigResolved => Some(LoadState::Loading),
      LoadState::Loading => Some(LoadState::ComponentsRegistered),
      LoadState::ComponentsRegistered => Some(LoadState::Finalized),
      LoadState::Finalized => None,
    }
  }

  pub fn can_advance_to(self, to: LoadState) -> bool {
    self.next() == Some(to)
  }
}

impl fmt::Display for LoadState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LoadState::NotStarted => "not-started",
      LoadState::SettingsResolved => "settings-resolved",
      LoadState::ConfigResolved => "config-resolved",
      LoadState::Loading => "loading",
      LoadState::ComponentsRegistered => "components-registered",
      LoadState::Finalized => "finalized",
    };
    f.write_str(name)
  }
}
