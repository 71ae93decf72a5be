//! Settings resolution and override providers.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::LoadError;
use crate::util::json::deep_merge;

/// Supplies per-assembly settings overrides.
pub trait SettingsProvider {
  /// Overrides for `assembly`, if any.
  fn overrides(&self, assembly: &str) -> Option<Value>;
}

impl SettingsProvider for HashMap<String, Value> {
  fn overrides(&self, assembly: &str) -> Option<Value> {
    self.get(assembly).cloned()
  }
}

/// Overrides read from a JSON file holding one object per assembly name:
///
/// ```json
/// { "core": { "timeout": 20 }, "shop": { "currency": "EUR" } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonFileProvider {
  entries: serde_json::Map<String, Value>,
}

impl JsonFileProvider {
  pub fn load(path: &Path) -> Result<Self, LoadError> {
    let content = fs::read_to_string(path).map_err(LoadError::io(path))?;
    Self::from_json(&content).map_err(|message| LoadError::Definition {
      path: path.to_path_buf(),
      message,
    })
  }

  pub fn from_json(content: &str) -> Result<Self, String> {
    match serde_json::from_str(content).map_err(|e| e.to_string())? {
      Value::Object(entries) => Ok(Self { entries }),
      _ => Err("overrides must be a JSON object keyed by assembly name".to_string()),
    }
  }
}

impl SettingsProvider for JsonFileProvider {
  fn overrides(&self, assembly: &str) -> Option<Value> {
    self.entries.get(assembly).cloned()
  }
}

/// Parse embedded JSON text, requiring an object.
pub(crate) fn parse_object(assembly: &str, field: &'static str, text: &str) -> Result<Value, LoadError> {
  let invalid = |message: String| LoadError::InvalidJson {
    assembly: assembly.to_string(),
    field,
    message,
  };

  let value: Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
  if !value.is_object() {
    return Err(invalid("expected an object".to_string()));
  }
  Ok(value)
}

/// Embedded settings merged with the provider's overrides for `assembly`.
pub(crate) fn resolve_settings(
  assembly: &str,
  text: &str,
  provider: Option<&dyn SettingsProvider>,
) -> Result<Value, LoadError> {
  let mut settings = parse_object(assembly, "settings", text)?;
  if let Some(overrides) = provider.and_then(|p| p.overrides(assembly)) {
    if !overrides.is_object() {
      return Err(LoadError::InvalidJson {
        assembly: assembly.to_string(),
        field: "settings overrides",
        message: "expected an object".to_string(),
      });
    }
    deep_merge(&mut settings, &overrides);
  }
  Ok(settings)
}
