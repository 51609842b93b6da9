use super::compactable::root_name;
use crate::selectors::{specificities_overlap, SpecificityCache};
use crate::token::{BodyItem, Token};

/// A declaration together with the selectors it applies to, as needed to
/// decide whether two rules may swap places.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopedProperty {
  pub name: String,
  pub root: String,
  pub value: String,
  pub important: bool,
  pub selectors: Vec<String>,
}

fn scoped(body: &[BodyItem], selectors: &[String]) -> Vec<ScopedProperty> {
  body
    .iter()
    .filter_map(BodyItem::as_declaration)
    .map(|declaration| {
      let name = declaration.name.value.to_ascii_lowercase();
      ScopedProperty {
        root: root_name(&name).to_string(),
        name,
        value: declaration.value.clone(),
        important: declaration.important,
        selectors: selectors.to_vec(),
      }
    })
    .collect()
}

/// All declarations a token contributes to the cascade.
pub fn scoped_properties(token: &Token) -> Vec<ScopedProperty> {
  match token {
    Token::Rule { selectors, body } => {
      let selectors = selectors
        .iter()
        .map(|selector| selector.value.clone())
        .collect::<Vec<_>>();
      scoped(body, &selectors)
    }
    Token::FlatBlock { header, body } => scoped(body, &[header.value.clone()]),
    Token::Block { header, children } if !is_keyframes(&header.value) => {
      children.iter().flat_map(scoped_properties).collect()
    }
    _ => Vec::new(),
  }
}

pub fn is_keyframes(header: &str) -> bool {
  Token::at_rule_name(header).ends_with("keyframes")
}

fn touches_everything(property: &ScopedProperty) -> bool {
  property.name == "all"
}

fn same_family(left: &ScopedProperty, right: &ScopedProperty) -> bool {
  let font_and_line_height = |a: &ScopedProperty, b: &ScopedProperty| a.root == "font" && b.name == "line-height";
  left.root == right.root || font_and_line_height(left, right) || font_and_line_height(right, left)
}

fn can_swap(left: &ScopedProperty, right: &ScopedProperty, cache: &mut SpecificityCache) -> bool {
  if touches_everything(left) || touches_everything(right) {
    return false;
  }
  if !same_family(left, right) {
    return true;
  }
  if left.name == right.name && left.value == right.value && left.important == right.important {
    return true;
  }
  if left.important != right.important {
    return true;
  }
  !specificities_overlap(&left.selectors, &right.selectors, cache)
}

/// Whether `moved` declarations can be carried past all `traversed` ones
/// without changing which value wins for any element.
pub fn can_reorder(
  moved: &[ScopedProperty],
  traversed: &[ScopedProperty],
  cache: &mut SpecificityCache,
) -> bool {
  moved
    .iter()
    .all(|left| traversed.iter().all(|right| can_swap(left, right, cache)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn properties(selectors: &[&str], declarations: &[(&str, &str)]) -> Vec<ScopedProperty> {
    scoped_properties(&Token::rule(selectors, declarations))
  }

  #[test]
  fn unrelated_properties_reorder() {
    let mut cache = SpecificityCache::default();
    assert!(can_reorder(
      &properties(&["a"], &[("color", "red")]),
      &properties(&["a"], &[("margin", "0")]),
      &mut cache
    ));
  }

  #[test]
  fn same_property_with_overlapping_selectors_does_not_reorder() {
    let mut cache = SpecificityCache::default();
    assert!(!can_reorder(
      &properties(&[".a"], &[("color", "red")]),
      &properties(&[".b"], &[("color", "blue")]),
      &mut cache
    ));
  }

  #[test]
  fn different_specificity_reorders() {
    let mut cache = SpecificityCache::default();
    assert!(can_reorder(
      &properties(&[".a"], &[("color", "red")]),
      &properties(&["a"], &[("color", "blue")]),
      &mut cache
    ));
  }

  #[test]
  fn shorthand_and_longhand_share_a_family() {
    let mut cache = SpecificityCache::default();
    assert!(!can_reorder(
      &properties(&[".a"], &[("margin", "0")]),
      &properties(&[".b"], &[("margin-top", "1px")]),
      &mut cache
    ));
    assert!(!can_reorder(
      &properties(&[".a"], &[("font", "12px serif")]),
      &properties(&[".b"], &[("line-height", "1")]),
      &mut cache
    ));
  }

  #[test]
  fn identical_declarations_reorder() {
    let mut cache = SpecificityCache::default();
    assert!(can_reorder(
      &properties(&[".a"], &[("color", "red")]),
      &properties(&[".b"], &[("color", "red")]),
      &mut cache
    ));
  }

  #[test]
  fn keyframes_contribute_nothing() {
    let block = Token::Block {
      header: crate::token::Fragment::new("@keyframes x"),
      children: vec![Token::rule(&["from"], &[("color", "red")])],
    };
    assert!(scoped_properties(&block).is_empty());
  }
}
