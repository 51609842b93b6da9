//! Static table of shorthand properties and the longhands they expand to.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::tokenizer::split::space;
use crate::values::{
  has_variable, has_vendor_prefix, is_color, is_global_keyword, is_length, is_math_function,
  is_placeholder,
};

/// How the component values of a shorthand are laid out in its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// One to four values distributed over top, right, bottom and left.
  FourSides,
  /// Space separated values in any order, each recognised by type.
  Sequence,
  /// The whole value applies to every component alike.
  Uniform,
}

/// `can_override(new, old)` tells whether `new` is a value this property can
/// take in place of `old` without changing meaning.
pub type Validator = fn(&str, &str) -> bool;

pub struct Descriptor {
  pub name: &'static str,
  pub components: &'static [&'static str],
  pub component_of: &'static [&'static str],
  pub default_value: &'static str,
  pub can_override: Validator,
  pub shape: Shape,
}

impl std::fmt::Debug for Descriptor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Descriptor")
      .field("name", &self.name)
      .field("components", &self.components)
      .field("component_of", &self.component_of)
      .field("default_value", &self.default_value)
      .field("shape", &self.shape)
      .finish()
  }
}

impl Descriptor {
  pub fn is_shorthand(&self) -> bool {
    !self.components.is_empty()
  }

  pub fn covers(&self, name: &str) -> bool {
    self.components.contains(&name)
  }

  /// The longhands this property sets, following nested shorthands down.
  pub fn longhands(&self) -> Vec<&'static str> {
    if !self.is_shorthand() {
      return vec![self.name];
    }
    self
      .components
      .iter()
      .flat_map(|name| descriptor(name).map_or_else(|| vec![*name], Descriptor::longhands))
      .collect()
  }

  /// Whether `values` can be written as this shorthand at all.
  pub fn can_compose(&self, values: &[String]) -> bool {
    match self.shape {
      Shape::Uniform => values.windows(2).all(|pair| pair[0].eq_ignore_ascii_case(&pair[1])),
      Shape::FourSides | Shape::Sequence => true,
    }
  }

  /// Distributes a shorthand value over its components, or returns `None`
  /// when the value cannot be understood.
  pub fn break_up(&self, values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() || values.iter().any(|value| !is_plain(value)) {
      return None;
    }

    let components = self
      .components
      .iter()
      .map(|name| descriptor(name))
      .collect::<Option<Vec<_>>>()?;

    match self.shape {
      Shape::FourSides => {
        let sides = match values {
          [all] => [all, all, all, all],
          [vertical, horizontal] => [vertical, horizontal, vertical, horizontal],
          [top, horizontal, bottom] => [top, horizontal, bottom, horizontal],
          [top, right, bottom, left] => [top, right, bottom, left],
          _ => return None,
        };
        let valid = sides
          .iter()
          .zip(&components)
          .all(|(value, component)| (component.can_override)(value, component.default_value));
        valid.then(|| sides.iter().map(|value| value.to_string()).collect())
      }
      Shape::Sequence => {
        let mut assigned: Vec<Option<String>> = vec![None; components.len()];
        for value in values {
          let slot = components.iter().enumerate().position(|(index, component)| {
            assigned[index].is_none() && (component.can_override)(value, component.default_value)
          })?;
          assigned[slot] = Some(value.clone());
        }
        Some(
          assigned
            .into_iter()
            .zip(&components)
            .map(|(value, component)| value.unwrap_or_else(|| component.default_value.to_string()))
            .collect(),
        )
      }
      Shape::Uniform => {
        let value = values.join(" ");
        let valid = components
          .iter()
          .all(|component| (component.can_override)(&value, component.default_value));
        valid.then(|| vec![value; components.len()])
      }
    }
  }

  /// Builds the shortest shorthand value for the given component values.
  pub fn compose(&self, values: &[String]) -> String {
    match self.shape {
      Shape::FourSides => {
        let [top, right, bottom, left] = values else {
          return values.join(" ");
        };
        if left != right {
          format!("{top} {right} {bottom} {left}")
        } else if bottom != top {
          format!("{top} {right} {bottom}")
        } else if right != top {
          format!("{top} {right}")
        } else {
          top.to_string()
        }
      }
      Shape::Sequence => {
        let kept = values
          .iter()
          .zip(self.components)
          .filter(|(value, name)| {
            descriptor(name).map_or(true, |component| !value.eq_ignore_ascii_case(component.default_value))
          })
          .map(|(value, _)| value.as_str())
          .collect::<Vec<_>>();
        if kept.is_empty() {
          values.first().cloned().unwrap_or_default()
        } else {
          kept.join(" ")
        }
      }
      Shape::Uniform => values.first().cloned().unwrap_or_default(),
    }
  }
}

/// Values a shorthand can be built from: no global keywords, variables,
/// vendor hacks or IE star/underscore tricks.
pub fn is_plain(value: &str) -> bool {
  !is_global_keyword(value)
    && !has_variable(value)
    && !has_vendor_prefix(value)
    && !value.ends_with("\\9")
}

fn keyword(value: &str, keywords: &[&str]) -> bool {
  keywords.iter().any(|keyword| value.eq_ignore_ascii_case(keyword))
}

fn length_or_auto(value: &str, _: &str) -> bool {
  is_length(value) || is_math_function(value) || value.eq_ignore_ascii_case("auto")
}

fn non_negative_length(value: &str, _: &str) -> bool {
  (is_length(value) && !value.starts_with('-')) || is_math_function(value)
}

fn border_width(value: &str, _: &str) -> bool {
  is_length(value) || is_math_function(value) || keyword(value, &["thin", "medium", "thick"])
}

const BORDER_STYLES: &[&str] = &[
  "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

fn border_style(value: &str, _: &str) -> bool {
  keyword(value, BORDER_STYLES)
}

fn outline_style(value: &str, _: &str) -> bool {
  keyword(value, BORDER_STYLES) || value.eq_ignore_ascii_case("auto")
}

fn color(value: &str, _: &str) -> bool {
  is_color(value)
}

fn radius(value: &str, _: &str) -> bool {
  (is_length(value) && !value.starts_with('-')) || is_math_function(value)
}

const LIST_STYLE_POSITIONS: &[&str] = &["inside", "outside"];

fn list_style_type(value: &str, _: &str) -> bool {
  value.starts_with("__ESCAPED_FREE_TEXT_")
    || (!is_placeholder(value)
      && !keyword(value, LIST_STYLE_POSITIONS)
      && !value.contains('(')
      && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

fn list_style_position(value: &str, _: &str) -> bool {
  keyword(value, LIST_STYLE_POSITIONS)
}

fn image(value: &str, _: &str) -> bool {
  let lower = value.to_ascii_lowercase();
  lower == "none"
    || value.starts_with("__ESCAPED_URL_")
    || lower.starts_with("url(")
    || lower.contains("gradient(")
    || lower.starts_with("image-set(")
}

fn flex_direction(value: &str, _: &str) -> bool {
  keyword(value, &["row", "row-reverse", "column", "column-reverse"])
}

fn flex_wrap(value: &str, _: &str) -> bool {
  keyword(value, &["nowrap", "wrap", "wrap-reverse"])
}

fn border_side(value: &str, _: &str) -> bool {
  descriptor("border-top").is_some_and(|side| side.break_up(&space(value)).is_some())
}

fn any(_: &str, _: &str) -> bool {
  true
}

macro_rules! shorthand {
  ($name:expr, $shape:expr, [$($component:expr),+]) => {
    Descriptor {
      name: $name,
      components: &[$($component),+],
      component_of: &[],
      default_value: "",
      can_override: any,
      shape: $shape,
    }
  };
  ($name:expr, $shape:expr, [$($component:expr),+], [$($owner:expr),+], $validator:expr) => {
    Descriptor {
      name: $name,
      components: &[$($component),+],
      component_of: &[$($owner),+],
      default_value: "",
      can_override: $validator,
      shape: $shape,
    }
  };
}

macro_rules! longhand {
  ($name:expr, [$($owner:expr),+], $default:expr, $validator:expr) => {
    Descriptor {
      name: $name,
      components: &[],
      component_of: &[$($owner),+],
      default_value: $default,
      can_override: $validator,
      shape: Shape::Sequence,
    }
  };
}

static DESCRIPTORS: Lazy<HashMap<&'static str, Descriptor>> = Lazy::new(|| {
  let descriptors = vec![
    shorthand!("margin", Shape::FourSides, ["margin-top", "margin-right", "margin-bottom", "margin-left"]),
    longhand!("margin-top", ["margin"], "0", length_or_auto),
    longhand!("margin-right", ["margin"], "0", length_or_auto),
    longhand!("margin-bottom", ["margin"], "0", length_or_auto),
    longhand!("margin-left", ["margin"], "0", length_or_auto),
    shorthand!("padding", Shape::FourSides, ["padding-top", "padding-right", "padding-bottom", "padding-left"]),
    longhand!("padding-top", ["padding"], "0", non_negative_length),
    longhand!("padding-right", ["padding"], "0", non_negative_length),
    longhand!("padding-bottom", ["padding"], "0", non_negative_length),
    longhand!("padding-left", ["padding"], "0", non_negative_length),
    shorthand!(
      "border-width",
      Shape::FourSides,
      ["border-top-width", "border-right-width", "border-bottom-width", "border-left-width"]
    ),
    shorthand!(
      "border-style",
      Shape::FourSides,
      ["border-top-style", "border-right-style", "border-bottom-style", "border-left-style"]
    ),
    shorthand!(
      "border-color",
      Shape::FourSides,
      ["border-top-color", "border-right-color", "border-bottom-color", "border-left-color"]
    ),
    shorthand!(
      "border-radius",
      Shape::FourSides,
      [
        "border-top-left-radius",
        "border-top-right-radius",
        "border-bottom-right-radius",
        "border-bottom-left-radius"
      ]
    ),
    longhand!("border-top-left-radius", ["border-radius"], "0", radius),
    longhand!("border-top-right-radius", ["border-radius"], "0", radius),
    longhand!("border-bottom-right-radius", ["border-radius"], "0", radius),
    longhand!("border-bottom-left-radius", ["border-radius"], "0", radius),
    shorthand!(
      "border",
      Shape::Uniform,
      ["border-top", "border-right", "border-bottom", "border-left"]
    ),
    shorthand!(
      "border-top",
      Shape::Sequence,
      ["border-top-width", "border-top-style", "border-top-color"],
      ["border"],
      border_side
    ),
    shorthand!(
      "border-right",
      Shape::Sequence,
      ["border-right-width", "border-right-style", "border-right-color"],
      ["border"],
      border_side
    ),
    shorthand!(
      "border-bottom",
      Shape::Sequence,
      ["border-bottom-width", "border-bottom-style", "border-bottom-color"],
      ["border"],
      border_side
    ),
    shorthand!(
      "border-left",
      Shape::Sequence,
      ["border-left-width", "border-left-style", "border-left-color"],
      ["border"],
      border_side
    ),
    longhand!("border-top-width", ["border-width", "border-top"], "medium", border_width),
    longhand!("border-right-width", ["border-width", "border-right"], "medium", border_width),
    longhand!("border-bottom-width", ["border-width", "border-bottom"], "medium", border_width),
    longhand!("border-left-width", ["border-width", "border-left"], "medium", border_width),
    longhand!("border-top-style", ["border-style", "border-top"], "none", border_style),
    longhand!("border-right-style", ["border-style", "border-right"], "none", border_style),
    longhand!("border-bottom-style", ["border-style", "border-bottom"], "none", border_style),
    longhand!("border-left-style", ["border-style", "border-left"], "none", border_style),
    longhand!("border-top-color", ["border-color", "border-top"], "currentcolor", color),
    longhand!("border-right-color", ["border-color", "border-right"], "currentcolor", color),
    longhand!("border-bottom-color", ["border-color", "border-bottom"], "currentcolor", color),
    longhand!("border-left-color", ["border-color", "border-left"], "currentcolor", color),
    shorthand!("outline", Shape::Sequence, ["outline-color", "outline-style", "outline-width"]),
    longhand!("outline-color", ["outline"], "currentcolor", color),
    longhand!("outline-style", ["outline"], "none", outline_style),
    longhand!("outline-width", ["outline"], "medium", border_width),
    shorthand!(
      "list-style",
      Shape::Sequence,
      ["list-style-type", "list-style-position", "list-style-image"]
    ),
    longhand!("list-style-type", ["list-style"], "disc", list_style_type),
    longhand!("list-style-position", ["list-style"], "outside", list_style_position),
    longhand!("list-style-image", ["list-style"], "none", image),
    shorthand!("flex-flow", Shape::Sequence, ["flex-direction", "flex-wrap"]),
    longhand!("flex-direction", ["flex-flow"], "row", flex_direction),
    longhand!("flex-wrap", ["flex-flow"], "nowrap", flex_wrap),
  ];

  descriptors
    .into_iter()
    .map(|descriptor| (descriptor.name, descriptor))
    .collect()
});

pub fn descriptor(name: &str) -> Option<&'static Descriptor> {
  DESCRIPTORS.get(name)
}

/// Family a property belongs to for reordering purposes: the name without
/// any vendor prefix, up to its first dash.
pub fn root_name(name: &str) -> &str {
  let unprefixed = ["-webkit-", "-moz-", "-ms-", "-o-"]
    .iter()
    .find_map(|prefix| name.strip_prefix(prefix))
    .unwrap_or(name);
  unprefixed.split('-').next().unwrap_or(unprefixed)
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn values(value: &str) -> Vec<String> {
    value.split(' ').map(String::from).collect()
  }

  #[test]
  fn component_counts_match_their_owners() {
    for descriptor in DESCRIPTORS.values() {
      for component in descriptor.components {
        let component = descriptor_or_panic(component);
        assert!(component.component_of.contains(&descriptor.name));
      }
    }
  }

  fn descriptor_or_panic(name: &str) -> &'static Descriptor {
    match descriptor(name) {
      Some(descriptor) => descriptor,
      None => panic!("missing descriptor for {name}"),
    }
  }

  #[test]
  fn breaks_up_four_side_values() {
    let margin = descriptor_or_panic("margin");
    assert_eq!(margin.break_up(&values("0 auto")), Some(values("0 auto 0 auto")));
    assert_eq!(margin.break_up(&values("1px 2px 3px")), Some(values("1px 2px 3px 2px")));
    assert_eq!(margin.break_up(&values("1px solid")), None);
    assert_eq!(margin.break_up(&values("inherit")), None);
  }

  #[test]
  fn breaks_up_sequences_by_type() {
    let border_top = descriptor_or_panic("border-top");
    assert_eq!(
      border_top.break_up(&values("red 1px")),
      Some(values("1px none red"))
    );
    assert_eq!(border_top.break_up(&values("1px 2px")), None);
  }

  #[test]
  fn border_applies_one_side_value_everywhere() {
    let border = descriptor_or_panic("border");
    assert_eq!(
      border.break_up(&values("1px solid red")),
      Some(vec![String::from("1px solid red"); 4])
    );
    assert_eq!(border.break_up(&values("1px 2px")), None);
    assert!(border.can_compose(&values("a a A a")));
    assert!(!border.can_compose(&values("a a b a")));
    assert_eq!(border.longhands().len(), 12);
  }

  #[test]
  fn composes_the_shortest_value() {
    let margin = descriptor_or_panic("margin");
    assert_eq!(margin.compose(&values("0 0 0 0")), "0");
    assert_eq!(margin.compose(&values("0 1px 0 1px")), "0 1px");
    assert_eq!(margin.compose(&values("0 1px 2px 1px")), "0 1px 2px");
    assert_eq!(margin.compose(&values("0px 1px 2px 3px")), "0px 1px 2px 3px");

    let list_style = descriptor_or_panic("list-style");
    assert_eq!(list_style.compose(&values("square outside none")), "square");
    assert_eq!(list_style.compose(&values("disc outside none")), "disc");
  }

  #[test]
  fn roots_ignore_vendor_prefixes() {
    assert_eq!(root_name("margin-top"), "margin");
    assert_eq!(root_name("-webkit-border-radius"), "border");
    assert_eq!(root_name("color"), "color");
  }
}
