//! Template slot parsing.
//!
//! Templates are plain text with named slots:
//!
//! - `$${name}` - a slot, replaced with the text supplied for it
//! - `$$${` - escape, produces a literal `$${`
//!
//! Single `$` characters pass through unchanged, so `${x}` string
//! interpolation and `$var` references in the template body need no escaping.
//!
//! # Example
//!
//! ```
//! use weld_lib::template::{parse, Segment, Slot};
//!
//! let segments = parse("// $${name} costs $5").unwrap();
//! assert_eq!(segments, vec![
//!     Segment::Literal("// ".to_string()),
//!     Segment::Slot(Slot::Name),
//!     Segment::Literal(" costs $5".to_string()),
//! ]);
//! ```

use std::fmt;
use std::str::FromStr;

use super::TemplateError;

/// A named insertion point in an assembly template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
  Name,
  Version,
  Description,
  File,
  Built,
  Keywords,
  Globals,
  Components,
  Resources,
  Types,
  Functions,
  Settings,
  Config,
  Ado,
}

impl Slot {
  pub const ALL: [Slot; 14] = [
    Slot::Name,
    Slot::Version,
    Slot::Description,
    Slot::File,
    Slot::Built,
    Slot::Keywords,
    Slot::Globals,
    Slot::Components,
    Slot::Resources,
    Slot::Types,
    Slot::Functions,
    Slot::Settings,
    Slot::Config,
    Slot::Ado,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Slot::Name => "name",
      Slot::Version => "version",
      Slot::Description => "description",
      Slot::File => "file",
      Slot::Built => "built",
      Slot::Keywords => "keywords",
      Slot::Globals => "globals",
      Slot::Components => "components",
      Slot::Resources => "resources",
      Slot::Types => "types",
      Slot::Functions => "functions",
      Slot::Settings => "settings",
      Slot::Config => "config",
      Slot::Ado => "ado",
    }
  }

  /// Position among the content blocks, which must appear in this order
  /// because later blocks may reference names declared by earlier ones.
  pub fn content_rank(self) -> Option<usize> {
    match self {
      Slot::Components => Some(0),
      Slot::Resources => Some(1),
      Slot::Types => Some(2),
      Slot::Functions => Some(3),
      _ => None,
    }
  }
}

impl fmt::Display for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Slot {
  type Err = TemplateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Slot::ALL
      .into_iter()
      .find(|slot| slot.as_str() == s)
      .ok_or_else(|| TemplateError::UnknownSlot(s.to_string()))
  }
}

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text copied as is.
  Literal(String),

  /// A slot to be filled.
  Slot(Slot),
}

/// Parse template text into segments.
///
/// # Errors
///
/// Returns an error for an unclosed slot or an unknown slot name.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices().peekable();

  while let Some((pos, ch)) = chars.next() {
    if ch != '$' {
      literal.push(ch);
      continue;
    }

    match chars.peek() {
      Some((_, '$')) => {
        chars.next();

        match chars.peek() {
          Some((_, '$')) => {
            chars.next();
            if let Some((_, '{')) = chars.peek() {
              // $$${ -> literal $${
              literal.push_str("$${");
              chars.next();
            } else {
              literal.push_str("$$$");
            }
          }
          Some((_, '{')) => {
            chars.next();

            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut name = String::new();
            let mut found_close = false;
            for (_, c) in chars.by_ref() {
              if c == '}' {
                found_close = true;
                break;
              }
              name.push(c);
            }

            if !found_close {
              return Err(TemplateError::Unclosed(pos));
            }

            segments.push(Segment::Slot(name.trim().parse()?));
          }
          _ => literal.push_str("$$"),
        }
      }
      _ => literal.push('$'),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_is_one_literal() {
    assert_eq!(parse("hello").unwrap(), vec![Segment::Literal("hello".to_string())]);
  }

  #[test]
  fn empty_input_has_no_segments() {
    assert!(parse("").unwrap().is_empty());
  }

  #[test]
  fn single_dollar_passes_through() {
    let segments = parse("const s = `${a}` + $b;").unwrap();
    assert_eq!(segments, vec![Segment::Literal("const s = `${a}` + $b;".to_string())]);
  }

  #[test]
  fn slots_between_literals() {
    let segments = parse("a$${components}b$${types}").unwrap();
    assert_eq!(
      segments,
      vec![
        Segment::Literal("a".to_string()),
        Segment::Slot(Slot::Components),
        Segment::Literal("b".to_string()),
        Segment::Slot(Slot::Types),
      ]
    );
  }

  #[test]
  fn escape_produces_literal_slot_syntax() {
    let segments = parse("$$${name}").unwrap();
    assert_eq!(segments, vec![Segment::Literal("$${name}".to_string())]);
  }

  #[test]
  fn double_dollar_without_brace_is_literal() {
    assert_eq!(parse("$$x").unwrap(), vec![Segment::Literal("$$x".to_string())]);
  }

  #[test]
  fn unclosed_slot_fails() {
    assert_eq!(parse("abc $${name").unwrap_err(), TemplateError::Unclosed(4));
  }

  #[test]
  fn unknown_slot_fails() {
    assert_eq!(
      parse("$${bogus}").unwrap_err(),
      TemplateError::UnknownSlot("bogus".to_string())
    );
  }

  #[test]
  fn slot_names_round_trip() {
    for slot in Slot::ALL {
      assert_eq!(slot.as_str().parse::<Slot>().unwrap(), slot);
    }
  }
}
