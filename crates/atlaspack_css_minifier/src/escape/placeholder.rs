use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"__ESCAPED_(COMMENT|FREE_TEXT|EXPRESSION|URL)_(\d+)(?:\((\d+),(\d+)\))?__")
    .expect("placeholder pattern is valid")
});

pub const PLACEHOLDER_PREFIX: &str = "__ESCAPED_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
  Comment,
  FreeText,
  Expression,
  Url,
}

impl PlaceholderKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      PlaceholderKind::Comment => "COMMENT",
      PlaceholderKind::FreeText => "FREE_TEXT",
      PlaceholderKind::Expression => "EXPRESSION",
      PlaceholderKind::Url => "URL",
    }
  }

  fn from_name(kind: &str) -> Option<Self> {
    match kind {
      "COMMENT" => Some(PlaceholderKind::Comment),
      "FREE_TEXT" => Some(PlaceholderKind::FreeText),
      "EXPRESSION" => Some(PlaceholderKind::Expression),
      "URL" => Some(PlaceholderKind::Url),
      _ => None,
    }
  }
}

/// How far the original span moved the source position: the number of line
/// breaks it contained and the column count after the last one (or its whole
/// length when it had none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Waypoint {
  pub lines: u32,
  pub columns: u32,
}

impl Waypoint {
  /// Placeholders nested in `text` count as the span they replaced.
  pub fn of(text: &str) -> Self {
    let mut waypoint = Waypoint::default();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
      if rest.starts_with(PLACEHOLDER_PREFIX) {
        if let Some((
          Placeholder {
            waypoint: Some(nested),
            ..
          },
          length,
        )) = Placeholder::parse_at(rest, 0)
        {
          waypoint.advance(nested);
          rest = &rest[length..];
          continue;
        }
      }
      if ch == '\n' {
        waypoint.lines += 1;
        waypoint.columns = 0;
      } else {
        waypoint.columns += 1;
      }
      rest = &rest[ch.len_utf8()..];
    }

    waypoint
  }

  fn advance(&mut self, by: Waypoint) {
    if by.lines > 0 {
      self.lines += by.lines;
      self.columns = by.columns;
    } else {
      self.columns += by.columns;
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
  pub kind: PlaceholderKind,
  pub index: usize,
  pub waypoint: Option<Waypoint>,
}

impl fmt::Display for Placeholder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.waypoint {
      Some(waypoint) => write!(
        f,
        "{}{}_{}({},{})__",
        PLACEHOLDER_PREFIX,
        self.kind.as_str(),
        self.index,
        waypoint.lines,
        waypoint.columns
      ),
      None => write!(f, "{}{}_{}__", PLACEHOLDER_PREFIX, self.kind.as_str(), self.index),
    }
  }
}

impl Placeholder {
  /// Parses the placeholder starting exactly at byte `at`, returning it with
  /// its length in bytes.
  pub fn parse_at(text: &str, at: usize) -> Option<(Placeholder, usize)> {
    if !text[at..].starts_with(PLACEHOLDER_PREFIX) {
      return None;
    }
    let captures = PLACEHOLDER_PATTERN.captures_at(text, at)?;
    let whole = captures.get(0)?;
    if whole.start() != at {
      return None;
    }
    Some((Self::from_captures(&captures)?, whole.len()))
  }

  /// Every placeholder in `text` together with its byte range.
  pub fn find_all(text: &str) -> Vec<(std::ops::Range<usize>, Placeholder)> {
    PLACEHOLDER_PATTERN
      .captures_iter(text)
      .filter_map(|captures| {
        let whole = captures.get(0)?;
        Some((whole.range(), Self::from_captures(&captures)?))
      })
      .collect()
  }

  fn from_captures(captures: &regex::Captures<'_>) -> Option<Placeholder> {
    let kind = PlaceholderKind::from_name(captures.get(1)?.as_str())?;
    let index = captures.get(2)?.as_str().parse().ok()?;
    let waypoint = match (captures.get(3), captures.get(4)) {
      (Some(lines), Some(columns)) => Some(Waypoint {
        lines: lines.as_str().parse().ok()?,
        columns: columns.as_str().parse().ok()?,
      }),
      _ => None,
    };
    Some(Placeholder {
      kind,
      index,
      waypoint,
    })
  }
}

/// Originals of one placeholder kind, indexed by the number embedded in the
/// placeholder. Indices are handed out in increasing order, so escaping is
/// first in first out, while restoring by index keeps working when later
/// passes reorder the text the placeholders live in.
#[derive(Debug, Clone)]
pub struct PlaceholderStore {
  kind: PlaceholderKind,
  originals: Vec<String>,
  waypoints: bool,
}

impl PlaceholderStore {
  pub fn new(kind: PlaceholderKind, waypoints: bool) -> Self {
    PlaceholderStore {
      kind,
      originals: Vec::new(),
      waypoints,
    }
  }

  /// Index the next pushed original will get.
  pub fn next_index(&self) -> usize {
    self.originals.len()
  }

  /// Stores `original` and returns the placeholder text that replaces it.
  pub fn push(&mut self, original: &str) -> String {
    self.push_with_span(original.to_string(), original)
  }

  /// Stores `restored` while computing the waypoint from `span`, the text the
  /// placeholder actually replaced in the input.
  pub fn push_with_span(&mut self, restored: String, span: &str) -> String {
    let placeholder = Placeholder {
      kind: self.kind,
      index: self.originals.len(),
      waypoint: self.waypoints.then(|| Waypoint::of(span)),
    };
    self.originals.push(restored);
    placeholder.to_string()
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.originals.get(index).map(String::as_str)
  }

  pub fn originals_mut(&mut self) -> impl Iterator<Item = &mut String> {
    self.originals.iter_mut()
  }

  /// Replaces every placeholder of this store's kind with its original.
  /// Placeholders with an unknown index are left untouched.
  pub fn restore(&self, text: &str) -> String {
    self.restore_where(text, |_| true)
  }

  /// Like [`PlaceholderStore::restore`], limited to indices accepted by
  /// `include`.
  pub fn restore_where(&self, text: &str, include: impl Fn(usize) -> bool) -> String {
    if self.originals.is_empty() || !text.contains(PLACEHOLDER_PREFIX) {
      return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for (range, placeholder) in Placeholder::find_all(text) {
      if placeholder.kind != self.kind || !include(placeholder.index) {
        continue;
      }
      if let Some(original) = self.get(placeholder.index) {
        output.push_str(&text[last..range.start]);
        output.push_str(original);
        last = range.end;
      }
    }
    output.push_str(&text[last..]);
    output
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn waypoint_counts_lines_and_trailing_columns() {
    assert_eq!(Waypoint::of("abc"), Waypoint { lines: 0, columns: 3 });
    assert_eq!(Waypoint::of("a\nbc\ndef"), Waypoint { lines: 2, columns: 3 });
    assert_eq!(Waypoint::of("a\n"), Waypoint { lines: 1, columns: 0 });
  }

  #[test]
  fn waypoint_counts_nested_placeholders_as_their_span() {
    assert_eq!(
      Waypoint::of("/* __ESCAPED_FREE_TEXT_0(0,10)__x */"),
      Waypoint { lines: 0, columns: 17 }
    );
    assert_eq!(
      Waypoint::of("a__ESCAPED_COMMENT_2(1,3)__bc"),
      Waypoint { lines: 1, columns: 5 }
    );
  }

  #[test]
  fn renders_and_parses_placeholders() {
    let placeholder = Placeholder {
      kind: PlaceholderKind::FreeText,
      index: 12,
      waypoint: Some(Waypoint { lines: 1, columns: 4 }),
    };
    let text = format!("a{}b", placeholder);
    assert_eq!(text, "a__ESCAPED_FREE_TEXT_12(1,4)__b");
    assert_eq!(
      Placeholder::parse_at(&text, 1),
      Some((placeholder, text.len() - 2))
    );
    assert_eq!(Placeholder::parse_at(&text, 0), None);
  }

  #[test]
  fn restores_by_index_after_reordering() {
    let mut store = PlaceholderStore::new(PlaceholderKind::Url, false);
    let first = store.push("url(a.png)");
    let second = store.push("url(b.png)");

    let reordered = format!("{second};{first}");
    assert_eq!(store.restore(&reordered), "url(b.png);url(a.png)");
  }

  #[test]
  fn leaves_other_kinds_and_unknown_indices_alone() {
    let mut store = PlaceholderStore::new(PlaceholderKind::Url, false);
    store.push("url(a.png)");

    let text = "__ESCAPED_COMMENT_0__ __ESCAPED_URL_3__ __ESCAPED_URL_0__";
    assert_eq!(
      store.restore(text),
      "__ESCAPED_COMMENT_0__ __ESCAPED_URL_3__ url(a.png)"
    );
  }

  #[test]
  fn restores_only_selected_indices() {
    let mut store = PlaceholderStore::new(PlaceholderKind::FreeText, false);
    let first = store.push("'a'");
    let second = store.push("'b'");
    assert_eq!(store.next_index(), 2);

    let text = format!("{first} {second}");
    assert_eq!(store.restore_where(&text, |index| index == 1), "__ESCAPED_FREE_TEXT_0__ 'b'");
  }

  #[test]
  fn records_waypoints_only_when_enabled() {
    let mut store = PlaceholderStore::new(PlaceholderKind::Comment, true);
    assert_eq!(store.push("/*! a\nbc */"), "__ESCAPED_COMMENT_0(1,5)__");

    let mut store = PlaceholderStore::new(PlaceholderKind::Comment, false);
    assert_eq!(store.push("/*! a\nbc */"), "__ESCAPED_COMMENT_0__");
  }
}
