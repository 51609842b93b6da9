//! Cascade-aware merging of declarations, rules and at-rule blocks.

use std::collections::HashSet;

use crate::options::{Compatibility, Level2Options};
use crate::properties::optimize_body;
use crate::properties::reorder::{can_reorder, is_keyframes, scoped_properties, ScopedProperty};
use crate::selectors::{is_mergeable, tidy_rule_duplicates, SpecificityCache};
use crate::token::{BodyItem, Fragment, Token};

/// Blocks that may be merged with a later block carrying the same header.
const MERGEABLE_BLOCKS: &[&str] = &[
  "@container",
  "@document",
  "@-moz-document",
  "@media",
  "@supports",
];

#[tracing::instrument(level = "debug", skip_all)]
pub fn optimize(tokens: &mut Vec<Token>, options: &Level2Options, compatibility: &Compatibility) {
  let mut options = options.clone();
  options.merge_into_shorthands &= compatibility.properties.shorthand_merging;

  Optimizer {
    options: &options,
    compatibility,
    cache: SpecificityCache::default(),
  }
  .scope(tokens);
}

struct Optimizer<'a> {
  options: &'a Level2Options,
  compatibility: &'a Compatibility,
  cache: SpecificityCache,
}

impl Optimizer<'_> {
  fn scope(&mut self, tokens: &mut Vec<Token>) {
    for token in tokens.iter_mut() {
      match token {
        Token::Block { header, children } if !is_keyframes(&header.value) => self.scope(children),
        Token::Rule { body, .. } | Token::FlatBlock { body, .. } => optimize_body(body, self.options),
        _ => {}
      }
    }

    if self.options.remove_duplicate_rules {
      remove_duplicate_rules(tokens);
    }
    if self.options.merge_adjacent_rules {
      self.merge_adjacent_rules(tokens);
    }
    if self.options.merge_non_adjacent_rules {
      self.merge_non_adjacent_rules(tokens);
    }
    if self.options.merge_media {
      self.merge_media(tokens);
    }
    if self.options.remove_empty {
      tokens.retain(|token| !is_empty(token));
    }
  }

  fn mergeable(&self, selectors: &[Fragment]) -> bool {
    let compatibility = &self.compatibility.selectors;
    selectors.iter().all(|selector| {
      is_mergeable(
        &selector.value,
        &compatibility.mergeable_pseudo_classes,
        &compatibility.mergeable_pseudo_elements,
        compatibility.multiple_pseudo_merging,
      )
    })
  }

  fn merge_adjacent_rules(&mut self, tokens: &mut Vec<Token>) {
    let mut index = 1;
    while index < tokens.len() {
      let (before, after) = tokens.split_at_mut(index);
      let (
        Token::Rule {
          selectors: previous_selectors,
          body: previous_body,
        },
        Token::Rule { selectors, body },
      ) = (&mut before[index - 1], &mut after[0])
      else {
        index += 1;
        continue;
      };

      if Token::selector_key(previous_selectors) == Token::selector_key(selectors) {
        tracing::trace!(selectors = %Token::selector_key(selectors), "joining adjacent bodies");
        previous_body.append(body);
        optimize_body(previous_body, self.options);
        tokens.remove(index);
        continue;
      }

      let same_body = !body.is_empty() && Token::body_key(previous_body) == Token::body_key(body);
      if same_body && self.mergeable(previous_selectors) && self.mergeable(selectors) {
        tracing::trace!(selectors = %Token::selector_key(selectors), "joining adjacent selectors");
        previous_selectors.append(selectors);
        *previous_selectors = tidy_rule_duplicates(std::mem::take(previous_selectors));
        tokens.remove(index);
        continue;
      }

      index += 1;
    }
  }

  /// Joins rules with identical selectors that are separated by other
  /// tokens, when one of them can travel to the other without changing the
  /// cascade.
  fn merge_non_adjacent_rules(&mut self, tokens: &mut Vec<Token>) {
    let mut index = 0;
    while index < tokens.len() {
      let Token::Rule { selectors, .. } = &tokens[index] else {
        index += 1;
        continue;
      };
      let key = Token::selector_key(selectors);
      let partner = (index + 1..tokens.len()).find(|&other| {
        matches!(&tokens[other], Token::Rule { selectors, .. } if Token::selector_key(selectors) == key)
      });
      let Some(partner) = partner else {
        index += 1;
        continue;
      };

      if self.join(tokens, index, partner) {
        tracing::trace!(selectors = %key, "merged non-adjacent rules");
      } else {
        index += 1;
      }
    }
  }

  fn merge_media(&mut self, tokens: &mut Vec<Token>) {
    let mut index = 0;
    while index < tokens.len() {
      let Token::Block { header, .. } = &tokens[index] else {
        index += 1;
        continue;
      };
      if !MERGEABLE_BLOCKS.contains(&Token::at_rule_name(&header.value).as_str()) {
        index += 1;
        continue;
      }
      let key = header.value.clone();
      let partner = (index + 1..tokens.len()).find(|&other| {
        matches!(&tokens[other], Token::Block { header, .. } if header.value == key)
      });
      let Some(partner) = partner else {
        index += 1;
        continue;
      };

      if self.join(tokens, index, partner) {
        tracing::trace!(header = %key, "merged blocks");
      } else {
        index += 1;
      }
    }
  }

  /// Moves the token at `earlier` down into the one at `later`, or failing
  /// that the one at `later` up into `earlier`. Returns whether either
  /// move was safe and happened.
  fn join(&mut self, tokens: &mut Vec<Token>, earlier: usize, later: usize) -> bool {
    let traversed = tokens[earlier + 1..later]
      .iter()
      .flat_map(scoped_properties)
      .collect::<Vec<ScopedProperty>>();

    if can_reorder(&scoped_properties(&tokens[earlier]), &traversed, &mut self.cache) {
      let moved = tokens.remove(earlier);
      self.absorb(&mut tokens[later - 1], moved, true);
      return true;
    }
    if can_reorder(&scoped_properties(&tokens[later]), &traversed, &mut self.cache) {
      let moved = tokens.remove(later);
      self.absorb(&mut tokens[earlier], moved, false);
      return true;
    }
    false
  }

  /// Adds the content of `moved` to `target`, before the existing content
  /// when `moved` came from earlier in the stylesheet.
  fn absorb(&mut self, target: &mut Token, moved: Token, moved_from_before: bool) {
    match (target, moved) {
      (Token::Rule { body, .. }, Token::Rule { body: mut moved, .. }) => {
        join_lists(body, &mut moved, moved_from_before);
        optimize_body(body, self.options);
      }
      (
        Token::Block { children, .. },
        Token::Block {
          children: mut moved, ..
        },
      ) => {
        join_lists(children, &mut moved, moved_from_before);
        self.scope(children);
      }
      _ => {}
    }
  }
}

fn join_lists<T>(target: &mut Vec<T>, moved: &mut Vec<T>, moved_from_before: bool) {
  if moved_from_before {
    moved.append(target);
    std::mem::swap(target, moved);
  } else {
    target.append(moved);
  }
}

/// Removes all but the last of each set of identical rules.
fn remove_duplicate_rules(tokens: &mut Vec<Token>) {
  let mut seen = HashSet::new();
  let mut keep = vec![true; tokens.len()];
  for (index, token) in tokens.iter().enumerate().rev() {
    if let Token::Rule { selectors, body } = token {
      let key = format!("{}{{{}}}", Token::selector_key(selectors), Token::body_key(body));
      keep[index] = seen.insert(key);
    }
  }
  let mut keep = keep.into_iter();
  tokens.retain(|_| keep.next().unwrap_or(true));
}

fn is_empty(token: &Token) -> bool {
  let no_declarations = |body: &[BodyItem]| body.iter().all(|item| matches!(item, BodyItem::Comment(_)));
  match token {
    Token::Rule { selectors, body } => selectors.is_empty() || no_declarations(body),
    Token::FlatBlock { body, .. } => no_declarations(body),
    Token::Block { children, .. } => children.is_empty(),
    _ => false,
  }
}
