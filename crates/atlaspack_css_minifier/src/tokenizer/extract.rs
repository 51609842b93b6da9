use super::position::PositionTracker;
use crate::diagnostics::Diagnostics;
use crate::escape::placeholder::{Placeholder, PlaceholderKind, PLACEHOLDER_PREFIX};
use crate::token::{BodyItem, Declaration, Fragment, Metadata};

/// Accumulates the text of one declaration with insignificant whitespace
/// already dropped.
#[derive(Debug, Default)]
struct Buffer {
  text: String,
  start: Option<usize>,
  depth: u32,
}

impl Buffer {
  fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  fn begin(&mut self, offset: usize) {
    if self.start.is_none() {
      self.start = Some(offset);
    }
  }

  fn drop_trailing_space(&mut self) {
    if self.text.ends_with(' ') {
      self.text.pop();
    }
  }

  fn push_whitespace(&mut self) {
    match self.text.chars().last() {
      None | Some(' ' | ':' | ',' | '[' | '(') => {}
      Some(_) => self.text.push(' '),
    }
  }

  fn take(&mut self) -> Option<(usize, String)> {
    let start = self.start.take()?;
    let text = std::mem::take(&mut self.text);
    self.depth = 0;
    Some((start, text.trim_end().to_string()))
  }
}

/// Splits the body between `start` and `end` into declarations, keeping
/// comment placeholders that sit between declarations as their own items.
pub fn extract_properties(
  text: &str,
  start: usize,
  end: usize,
  tracker: &mut PositionTracker<'_>,
  diagnostics: &mut Diagnostics,
) -> Vec<BodyItem> {
  let mut items = Vec::new();
  let mut buffer = Buffer::default();
  let mut offset = start;

  while offset < end {
    if text[offset..].starts_with(PLACEHOLDER_PREFIX) {
      if let Some((placeholder, length)) = Placeholder::parse_at(text, offset) {
        let raw = &text[offset..offset + length];
        if placeholder.kind == PlaceholderKind::Comment && buffer.is_empty() {
          items.push(BodyItem::Comment(Fragment::with_metadata(
            raw,
            tracker.metadata_at(offset),
          )));
        } else {
          buffer.begin(offset);
          buffer.text.push_str(raw);
        }
        offset += length;
        continue;
      }
    }

    let Some(ch) = text[offset..end].chars().next() else {
      break;
    };

    match ch {
      ';' if buffer.depth == 0 => flush(&mut buffer, &mut items, tracker, diagnostics),
      // A space before `(` can separate two values (`solid rgb(...)`).
      '(' | '[' | '{' => {
        buffer.begin(offset);
        buffer.depth += 1;
        buffer.text.push(ch);
      }
      ')' | ']' | '}' => {
        buffer.begin(offset);
        buffer.depth = buffer.depth.saturating_sub(1);
        buffer.drop_trailing_space();
        buffer.text.push(ch);
      }
      ':' | ',' => {
        buffer.begin(offset);
        buffer.drop_trailing_space();
        buffer.text.push(ch);
      }
      _ if ch.is_whitespace() => buffer.push_whitespace(),
      _ => {
        buffer.begin(offset);
        buffer.text.push(ch);
      }
    }
    offset += ch.len_utf8();
  }

  flush(&mut buffer, &mut items, tracker, diagnostics);
  items
}

fn flush(
  buffer: &mut Buffer,
  items: &mut Vec<BodyItem>,
  tracker: &mut PositionTracker<'_>,
  diagnostics: &mut Diagnostics,
) {
  let Some((start, text)) = buffer.take() else {
    return;
  };
  if text.is_empty() {
    return;
  }
  let metadata = tracker.metadata_at(start);

  if text.starts_with('@') {
    items.push(BodyItem::Raw(Fragment::with_metadata(text, metadata)));
    return;
  }

  match parse_declaration(&text, metadata) {
    Ok(declaration) => items.push(BodyItem::Declaration(declaration)),
    Err(message) => diagnostics.warn(message),
  }
}

fn parse_declaration(text: &str, metadata: Metadata) -> Result<Declaration, String> {
  let location = format!("{}:{}", metadata.line, metadata.column);
  let Some(colon) = text.find(':') else {
    return Err(format!(
      "Invalid property name '{text}' at {location}. Ignoring."
    ));
  };

  let name = text[..colon].trim();
  if name.is_empty() {
    return Err(format!("Empty property name at {location}. Ignoring."));
  }

  let (value, important) = strip_important(text[colon + 1..].trim());
  if value.is_empty() {
    return Err(format!(
      "Empty property '{name}' at {location}. Ignoring."
    ));
  }

  Ok(Declaration {
    name: Fragment::with_metadata(name, metadata),
    value: value.to_string(),
    important,
  })
}

/// Splits a trailing `!important` flag off a value, in any letter case and
/// with optional whitespace after the `!`.
pub fn strip_important(value: &str) -> (&str, bool) {
  let Some(bang) = value.rfind('!') else {
    return (value, false);
  };
  if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
    (value[..bang].trim_end(), true)
  } else {
    (value, false)
  }
}
