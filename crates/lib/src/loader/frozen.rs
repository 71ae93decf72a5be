use std::path::PathBuf;

use serde_json::Value;

use super::LoadError;

/// A read-only JSON object belonging to one assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Frozen {
  assembly: String,
  value: Value,
}

impl Frozen {
  pub(crate) fn new(assembly: &str, value: Value) -> Self {
    Self {
      assembly: assembly.to_string(),
      value,
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.value.get(key)
  }

  /// Look up a nested value by JSON pointer (`/retry/count`).
  pub fn pointer(&self, pointer: &str) -> Option<&Value> {
    self.value.pointer(pointer)
  }

  pub fn as_value(&self) -> &Value {
    &self.value
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.value.as_object().into_iter().flat_map(|map| map.keys().map(String::as_str))
  }

  /// Frozen values cannot change; this always fails.
  pub fn set(&self, key: &str, _value: Value) -> Result<(), LoadError> {
    Err(LoadError::Frozen {
      assembly: self.assembly.clone(),
      key: key.to_string(),
    })
  }
}

/// A component declared by an assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
  pub name: String,
  /// Source fragment, resolved against the assembly's base path.
  pub file: PathBuf,
}

/// Components of one assembly, keyed by local name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
  assembly: String,
  components: Vec<Component>,
  frozen: bool,
}

impl ComponentRegistry {
  pub fn new(assembly: &str) -> Self {
    Self {
      assembly: assembly.to_string(),
      components: Vec::new(),
      frozen: false,
    }
  }

  pub fn register(&mut self, component: Component) -> Result<(), LoadError> {
    if self.frozen {
      return Err(LoadError::RegistryFrozen {
        assembly: self.assembly.clone(),
        component: component.name,
      });
    }
    if self.get(&component.name).is_some() {
      return Err(LoadError::DuplicateComponent {
        assembly: self.assembly.clone(),
        component: component.name,
      });
    }
    self.components.push(component);
    Ok(())
  }

  pub fn freeze(&mut self) {
    self.frozen = true;
  }

  pub fn is_frozen(&self) -> bool {
    self.frozen
  }

  pub fn get(&self, name: &str) -> Option<&Component> {
    self.components.iter().find(|c| c.name == name)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Component> {
    self.components.iter()
  }

  pub fn len(&self) -> usize {
    self.components.len()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }
}
