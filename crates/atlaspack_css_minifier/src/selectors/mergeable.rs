use crate::scanner::{find_closing_paren, find_closing_quote};
use crate::tokenizer::split::split_with_offsets;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pseudo<'a> {
  /// Name including its leading colons, e.g. `:hover` or `::before`.
  name: &'a str,
  arguments: Option<&'a str>,
  element: bool,
}

/// Pseudo-classes and pseudo-elements at the top level of one selector.
fn pseudos(selector: &str) -> Vec<Pseudo<'_>> {
  let bytes = selector.as_bytes();
  let mut found = Vec::new();
  let mut index = 0;

  while index < bytes.len() {
    match bytes[index] {
      b'\\' => index += 2,
      b'"' | b'\'' => index = find_closing_quote(selector, index).unwrap_or(bytes.len()) + 1,
      b'[' => {
        index = selector[index..]
          .find(']')
          .map_or(bytes.len(), |offset| index + offset + 1);
      }
      b':' => {
        let start = index;
        let element = bytes.get(index + 1) == Some(&b':');
        index += if element { 2 } else { 1 };
        while index < bytes.len() && (bytes[index].is_ascii_alphanumeric() || bytes[index] == b'-' || bytes[index] == b'_') {
          index += 1;
        }
        let name = &selector[start..index];
        let arguments = if bytes.get(index) == Some(&b'(') {
          match find_closing_paren(selector, index) {
            Some(close) => {
              let arguments = &selector[index + 1..close];
              index = close + 1;
              Some(arguments)
            }
            None => {
              let arguments = &selector[index + 1..];
              index = bytes.len();
              Some(arguments)
            }
          }
        } else {
          None
        };
        found.push(Pseudo {
          name,
          arguments,
          element,
        });
      }
      _ => index += 1,
    }
  }

  found
}

fn is_vendor_prefixed(name: &str) -> bool {
  name.trim_start_matches(':').starts_with('-')
}

fn is_single_mergeable(
  selector: &str,
  pseudo_classes: &[String],
  pseudo_elements: &[String],
  allow_mixed: bool,
) -> bool {
  let selector = selector.trim();
  if selector.is_empty() || selector.contains("/deep/") {
    return false;
  }

  let pseudos = pseudos(selector);
  let mut has_class = false;
  let mut has_element = false;

  for (index, pseudo) in pseudos.iter().enumerate() {
    let name = pseudo.name.to_ascii_lowercase();
    if is_vendor_prefixed(&name) {
      return false;
    }

    let allowed = if pseudo.element {
      pseudo_elements.iter().any(|allowed| *allowed == name)
    } else {
      pseudo_classes.iter().any(|allowed| *allowed == name)
    };
    if !allowed {
      return false;
    }

    if pseudos[..index].contains(pseudo) {
      return false;
    }

    if name == ":not" {
      let Some(arguments) = pseudo.arguments else {
        return false;
      };
      if !is_mergeable(arguments, pseudo_classes, pseudo_elements, allow_mixed) {
        return false;
      }
    }

    if pseudo.element {
      has_element = true;
    } else {
      has_class = true;
    }
  }

  allow_mixed || !(has_class && has_element)
}

/// Whether rules using `selector` can be merged with other rules without
/// risking a browser dropping the whole merged rule.
pub fn is_mergeable(
  selector: &str,
  pseudo_classes: &[String],
  pseudo_elements: &[String],
  allow_mixed: bool,
) -> bool {
  split_with_offsets(selector, ',')
    .into_iter()
    .all(|(_, part)| is_single_mergeable(part, pseudo_classes, pseudo_elements, allow_mixed))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
  }

  fn mergeable(selector: &str, allow_mixed: bool) -> bool {
    is_mergeable(
      selector,
      &list(&[":hover", ":focus", ":not", ":first-child", ":nth-child", ":before"]),
      &list(&["::before", "::after"]),
      allow_mixed,
    )
  }

  #[test]
  fn plain_selectors_are_mergeable() {
    assert!(mergeable("a", false));
    assert!(mergeable(".a > .b, #c", false));
    assert!(mergeable("a:hover", false));
    assert!(mergeable("li:nth-child(2n+1)", false));
  }

  #[test]
  fn rejects_empty_and_deep_selectors() {
    assert!(!mergeable("", false));
    assert!(!mergeable("a,", false));
    assert!(!mergeable(".a /deep/ .b", false));
  }

  #[test]
  fn rejects_unknown_and_vendor_pseudos() {
    assert!(!mergeable("input::-moz-placeholder", false));
    assert!(!mergeable("a:-webkit-any-link", false));
    assert!(!mergeable("a:visited", false));
  }

  #[test]
  fn rejects_repeated_pseudos() {
    assert!(!mergeable("a:hover:hover", false));
  }

  #[test]
  fn mixed_pseudos_need_permission() {
    assert!(!mergeable("a:hover::before", false));
    assert!(mergeable("a:hover::before", true));
  }

  #[test]
  fn not_arguments_must_be_mergeable() {
    assert!(mergeable("a:not(.b)", false));
    assert!(!mergeable("a:not(:visited)", false));
  }

  #[test]
  fn unclosed_arguments_run_to_the_end() {
    assert_eq!(
      pseudos("a:not(\u{e9}\u{e9}"),
      vec![Pseudo {
        name: ":not",
        arguments: Some("\u{e9}\u{e9}"),
        element: false,
      }]
    );
    assert!(mergeable("a:not(.\u{e9}", false));
  }

  #[test]
  fn ignores_colons_in_attributes() {
    assert!(mergeable("a[href='http://x']", false));
  }
}
