//! Assembly template expansion.
//!
//! An assembly is expanded from a fixed template with named slots (see
//! [`slot`]) and a manifest of fragment files (see [`manifest`]). Expansion
//! is a single pass: every slot is replaced by its text verbatim and the
//! inserted text is never scanned for further slots.

mod expand;
pub mod manifest;
pub mod slot;

pub use expand::*;
pub use manifest::{AssemblyManifest, Fragment, FragmentKind};
pub use slot::{Segment, Slot, parse};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while parsing templates or expanding assemblies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unclosed slot at position {0}")]
  Unclosed(usize),

  #[error("unknown slot: {0}")]
  UnknownSlot(String),

  #[error("slot '{0}' appears more than once")]
  DuplicateSlot(Slot),

  #[error("slot '{later}' must come after '{earlier}'")]
  SlotOrder { earlier: Slot, later: Slot },

  #[error("failed to read {path}: {message}")]
  Read { path: PathBuf, message: String },

  #[error("failed to write {path}: {message}")]
  Write { path: PathBuf, message: String },

  #[error("invalid assembly manifest {path}: {message}")]
  Manifest { path: PathBuf, message: String },

  #[error("assembly '{assembly}' declares {kind} '{name}' twice")]
  DuplicateFragment {
    assembly: String,
    kind: FragmentKind,
    name: String,
  },
}

impl TemplateError {
  pub(crate) fn read(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
    move |e| TemplateError::Read {
      path: path.to_path_buf(),
      message: e.to_string(),
    }
  }
}

/// The template shipped with weld.
pub const DEFAULT_TEMPLATE: &str = r#"/**
 * $${name} v$${version}
 * $${description}
 *
 * file: $${file}
 * built: $${built}
 */
(function (weld) {
"use strict";

// keywords
$${keywords}

// globals
$${globals}

const settings = JSON.parse($${settings});
const config = JSON.parse($${config});

// components
$${components}

// resources
$${resources}

// types
$${types}

// functions
$${functions}

weld.register(JSON.parse($${ado}), settings, config);
})(typeof __weld !== "undefined" ? __weld : { register: function () {} });
"#;

/// A parsed, validated template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
  segments: Vec<Segment>,
}

impl Template {
  /// Parse template text and check its content block ordering.
  pub fn parse(text: &str) -> Result<Self, TemplateError> {
    let segments = parse(text)?;
    validate_order(&segments)?;
    Ok(Self { segments })
  }

  /// Read and parse a template file.
  pub fn load(path: &Path) -> Result<Self, TemplateError> {
    let text = fs::read_to_string(path).map_err(TemplateError::read(path))?;
    Self::parse(&text)
  }

  /// The built-in template.
  pub fn builtin() -> Self {
    // The built-in template is covered by `builtin_template_is_valid`.
    Self::parse(DEFAULT_TEMPLATE).unwrap_or_else(|e| panic!("built-in template invalid: {}", e))
  }

  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }

  /// Fill every slot from `values`.
  pub fn expand(&self, values: &SlotValues) -> String {
    let mut out = String::new();
    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => out.push_str(text),
        Segment::Slot(slot) => out.push_str(values.get(*slot)),
      }
    }
    out
  }
}

/// Content blocks must appear at most once each, as components, resources,
/// types, functions.
fn validate_order(segments: &[Segment]) -> Result<(), TemplateError> {
  let mut last: Option<Slot> = None;

  for segment in segments {
    let Segment::Slot(slot) = segment else { continue };
    let Some(rank) = slot.content_rank() else { continue };

    if let Some(previous) = last {
      let previous_rank = previous.content_rank().unwrap_or_default();
      if rank == previous_rank {
        return Err(TemplateError::DuplicateSlot(*slot));
      }
      if rank < previous_rank {
        return Err(TemplateError::SlotOrder {
          earlier: *slot,
          later: previous,
        });
      }
    }
    last = Some(*slot);
  }

  Ok(())
}
