use std::collections::HashMap;

use crate::scanner::find_closing_quote;

/// `(ids, class-likes, types)`, compared lexicographically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::AddAssign for Specificity {
  fn add_assign(&mut self, other: Self) {
    self.0 += other.0;
    self.1 += other.1;
    self.2 += other.2;
  }
}

/// Single-colon spellings of pseudo-elements from CSS 2.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["after", "before", "first-letter", "first-line"];

fn is_name_char(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte >= 0x80
}

struct Counter<'a> {
  bytes: &'a [u8],
  text: &'a str,
  position: usize,
  /// A type selector can only start a compound: at the very beginning or
  /// right after a combinator.
  compound_start: bool,
  result: Specificity,
}

impl Counter<'_> {
  fn consume_name(&mut self) -> &str {
    let start = self.position;
    while self.position < self.bytes.len() {
      match self.bytes[self.position] {
        b'\\' => self.position += 2,
        byte if is_name_char(byte) => self.position += 1,
        _ => break,
      }
    }
    self.position = self.position.min(self.bytes.len());
    &self.text[start..self.position]
  }

  fn skip_parenthesised(&mut self) {
    let mut depth = 0usize;
    while self.position < self.bytes.len() {
      match self.bytes[self.position] {
        b'"' | b'\'' => {
          self.position = find_closing_quote(self.text, self.position).unwrap_or(self.bytes.len());
        }
        b'(' => depth += 1,
        b')' => {
          depth = depth.saturating_sub(1);
          if depth == 0 {
            self.position += 1;
            return;
          }
        }
        _ => {}
      }
      self.position += 1;
    }
  }

  fn skip_attribute(&mut self) {
    while self.position < self.bytes.len() {
      match self.bytes[self.position] {
        b'"' | b'\'' => {
          self.position = find_closing_quote(self.text, self.position).unwrap_or(self.bytes.len());
        }
        b']' => {
          self.position += 1;
          return;
        }
        _ => {}
      }
      self.position += 1;
    }
  }

  fn run(&mut self) {
    while self.position < self.bytes.len() {
      let byte = self.bytes[self.position];
      match byte {
        b'\\' => {
          self.position += 2;
          self.compound_start = false;
        }
        b'#' => {
          self.position += 1;
          self.consume_name();
          self.result.0 += 1;
          self.compound_start = false;
        }
        b'.' => {
          self.position += 1;
          self.consume_name();
          self.result.1 += 1;
          self.compound_start = false;
        }
        b'[' => {
          self.skip_attribute();
          self.result.1 += 1;
          self.compound_start = false;
        }
        b':' => self.pseudo(),
        b' ' | b'\t' | b'\n' | b'>' | b'+' | b'~' => {
          self.position += 1;
          self.compound_start = true;
        }
        b',' | b'(' | b')' => {
          self.position += 1;
          self.compound_start = false;
        }
        b'*' => {
          self.position += 1;
          self.compound_start = false;
        }
        _ if is_name_char(byte) => {
          self.consume_name();
          if self.compound_start {
            self.result.2 += 1;
          }
          self.compound_start = false;
        }
        _ => {
          self.position += 1;
          self.compound_start = false;
        }
      }
    }
  }

  fn pseudo(&mut self) {
    self.position += 1;
    let element = self.bytes.get(self.position) == Some(&b':');
    if element {
      self.position += 1;
    }
    let name = self.consume_name().to_ascii_lowercase();
    self.compound_start = false;

    if element || LEGACY_PSEUDO_ELEMENTS.contains(&name.as_str()) {
      self.result.2 += 1;
    } else {
      self.result.1 += 1;
    }

    if self.bytes.get(self.position) != Some(&b'(') {
      return;
    }
    if name == "not" {
      // Arguments are scanned in place. `(` and `,` never start a compound,
      // so a type name inside does not count.
      self.position += 1;
      return;
    }
    self.skip_parenthesised();
  }
}

/// Specificity of a single selector (no top-level commas).
pub fn specificity(selector: &str) -> Specificity {
  let mut counter = Counter {
    bytes: selector.as_bytes(),
    text: selector,
    position: 0,
    compound_start: true,
    result: Specificity::default(),
  };
  counter.run();
  counter.result
}

/// Memoizes [`specificity`] for the selectors of one run.
#[derive(Debug, Default)]
pub struct SpecificityCache {
  cache: HashMap<String, Specificity>,
}

impl SpecificityCache {
  pub fn get(&mut self, selector: &str) -> Specificity {
    if let Some(found) = self.cache.get(selector) {
      return *found;
    }
    let computed = specificity(selector);
    self.cache.insert(selector.to_string(), computed);
    computed
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn ids_beat_classes_beat_types() {
    assert!(specificity("#a") > specificity(".a"));
    assert!(specificity(".a") > specificity("a"));
  }

  #[test]
  fn counts_simple_selectors() {
    assert_eq!(specificity("a"), Specificity(0, 0, 1));
    assert_eq!(specificity("ul li.item > a:hover"), Specificity(0, 2, 3));
    assert_eq!(specificity("#nav .item[href]"), Specificity(1, 2, 0));
    assert_eq!(specificity("p::before"), Specificity(0, 0, 2));
    assert_eq!(specificity("p:after"), Specificity(0, 0, 2));
    assert_eq!(specificity("*"), Specificity(0, 0, 0));
  }

  #[test]
  fn not_arguments_add_up() {
    assert_eq!(specificity("a:not(#id,.c,h1)"), Specificity(1, 2, 1));
    assert_eq!(specificity("a:not(h1)"), Specificity(0, 1, 1));
    assert_eq!(specificity("a:not(.b)"), Specificity(0, 2, 1));
  }

  #[test]
  fn functional_pseudo_class_arguments_are_ignored() {
    assert_eq!(specificity("li:nth-child(2n+1)"), Specificity(0, 1, 1));
  }

  #[test]
  fn escaped_hash_and_quoted_attributes_do_not_count() {
    assert_eq!(specificity(".a\\#b"), Specificity(0, 1, 0));
    assert_eq!(specificity("a[title='#x .y']"), Specificity(0, 1, 1));
  }

  #[test]
  fn caches_results() {
    let mut cache = SpecificityCache::default();
    assert_eq!(cache.get(".a .b"), Specificity(0, 2, 0));
    assert_eq!(cache.get(".a .b"), Specificity(0, 2, 0));
  }
}
