use std::collections::HashSet;

use crate::token::Fragment;

/// Removes whitespace that carries no meaning in a selector, such as the
/// space around child and sibling combinators.
pub fn tidy_selector(selector: &str) -> String {
  let mut output = String::with_capacity(selector.len());
  let mut brackets = 0u32;
  let mut skip_space = true;
  let mut chars = selector.chars().peekable();

  while let Some(ch) = chars.next() {
    match ch {
      '\\' => {
        output.push(ch);
        if let Some(escaped) = chars.next() {
          output.push(escaped);
        }
        skip_space = false;
      }
      '[' => {
        brackets += 1;
        output.push(ch);
        skip_space = false;
      }
      ']' => {
        brackets = brackets.saturating_sub(1);
        output.push(ch);
        skip_space = false;
      }
      _ if brackets > 0 => output.push(ch),
      _ if ch.is_whitespace() => {
        let next_is_tight = matches!(chars.peek(), Some('>' | '+' | '~' | ',' | ')'));
        if !skip_space && !next_is_tight && !chars.peek().is_some_and(|c| c.is_whitespace()) {
          output.push(' ');
        }
      }
      '>' | '+' | '~' | ',' | '(' => {
        output.push(ch);
        skip_space = true;
      }
      _ => {
        output.push(ch);
        skip_space = false;
      }
    }
  }

  output.trim_end().to_string()
}

/// Drops selectors already seen (keeping the first one) and sorts the rest.
pub fn tidy_rule_duplicates(selectors: Vec<Fragment>) -> Vec<Fragment> {
  let mut seen = HashSet::new();
  let mut unique = selectors
    .into_iter()
    .filter(|selector| seen.insert(selector.value.clone()))
    .collect::<Vec<_>>();
  unique.sort_by(|left, right| left.value.cmp(&right.value));
  unique
}
