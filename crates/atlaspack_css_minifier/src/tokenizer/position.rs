use std::sync::Arc;

use crate::escape::placeholder::{Placeholder, PLACEHOLDER_PREFIX};
use crate::token::Metadata;

/// Marks the byte offset in the escaped text where the content of a source
/// starts, and the original position of that first byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceBoundary {
  pub offset: usize,
  pub source: Option<Arc<str>>,
  pub line: u32,
  pub column: u32,
}

/// Maps byte offsets of the escaped text back to original 1-based line and
/// column positions.
///
/// The tracker only moves forward; asking for an offset behind the cursor
/// returns the current position. Placeholders carrying a waypoint advance
/// the cursor by the span they replaced instead of by their own length.
#[derive(Debug)]
pub struct PositionTracker<'a> {
  text: &'a str,
  boundaries: Vec<SourceBoundary>,
  next_boundary: usize,
  offset: usize,
  line: u32,
  column: u32,
  source: Option<Arc<str>>,
}

impl<'a> PositionTracker<'a> {
  pub fn new(text: &'a str, source: Option<Arc<str>>) -> Self {
    Self::with_boundaries(
      text,
      vec![SourceBoundary {
        offset: 0,
        source,
        line: 1,
        column: 1,
      }],
    )
  }

  pub fn with_boundaries(text: &'a str, mut boundaries: Vec<SourceBoundary>) -> Self {
    boundaries.sort_by_key(|boundary| boundary.offset);
    PositionTracker {
      text,
      boundaries,
      next_boundary: 0,
      offset: 0,
      line: 1,
      column: 1,
      source: None,
    }
  }

  pub fn metadata_at(&mut self, target: usize) -> Metadata {
    self.advance_to(target);
    Metadata::new(self.line, self.column, self.source.clone())
  }

  fn enter_boundaries(&mut self) {
    while let Some(boundary) = self.boundaries.get(self.next_boundary) {
      if boundary.offset > self.offset {
        break;
      }
      self.line = boundary.line;
      self.column = boundary.column;
      self.source = boundary.source.clone();
      self.next_boundary += 1;
    }
  }

  fn advance_to(&mut self, target: usize) {
    let target = target.min(self.text.len());
    self.enter_boundaries();

    while self.offset < target {
      if self.text[self.offset..].starts_with(PLACEHOLDER_PREFIX) {
        if let Some((placeholder, length)) = Placeholder::parse_at(self.text, self.offset) {
          if self.offset + length <= target {
            match placeholder.waypoint {
              Some(waypoint) if waypoint.lines > 0 => {
                self.line += waypoint.lines;
                self.column = waypoint.columns + 1;
              }
              Some(waypoint) => self.column += waypoint.columns,
              None => self.column += length as u32,
            }
            self.offset += length;
            self.enter_boundaries();
            continue;
          }
        }
      }

      let Some(ch) = self.text[self.offset..].chars().next() else {
        break;
      };
      if ch == '\n' {
        self.line += 1;
        self.column = 1;
      } else {
        self.column += 1;
      }
      self.offset += ch.len_utf8();
      self.enter_boundaries();
    }
  }
}
