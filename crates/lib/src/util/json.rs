//! JSON value helpers.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge key by key, recursively. Every other value, arrays
/// included, is replaced wholesale by the overlay's value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
  match (base, overlay) {
    (Value::Object(base_map), Value::Object(overlay_map)) => {
      for (key, value) in overlay_map {
        match base_map.get_mut(key) {
          Some(existing) => deep_merge(existing, value),
          None => {
            base_map.insert(key.clone(), value.clone());
          }
        }
      }
    }
    (base, overlay) => *base = overlay.clone(),
  }
}
