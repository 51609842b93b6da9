use super::compactable::is_plain;
use super::wrap::Property;
use crate::values::{function_names, has_vendor_prefix};

/// A later property can replace an earlier one only when it does not rely
/// on syntax the earlier one may be a fallback for.
fn can_replace(earlier: &Property, later: &Property) -> bool {
  if earlier.important && !later.important {
    return false;
  }

  let earlier_value = earlier.value_string();
  let later_value = later.value_string();
  if has_vendor_prefix(&earlier_value) || has_vendor_prefix(&later_value) || later_value.ends_with("\\9") {
    return false;
  }

  let available = function_names(&earlier_value);
  function_names(&later_value)
    .iter()
    .all(|function| available.contains(function))
}

/// Whether `longhand` can be folded into the matching component of the
/// earlier `shorthand`.
fn can_fold(shorthand: &Property, longhand: &Property) -> bool {
  let Some(component) = shorthand
    .components
    .iter()
    .find(|component| component.name == longhand.name)
  else {
    return false;
  };
  let [value] = longhand.value.as_slice() else {
    return false;
  };
  let Some(descriptor) = component.descriptor() else {
    return false;
  };

  is_plain(value)
    && (descriptor.can_override)(value, &component.value_string())
    && can_replace(component, longhand)
}

fn shares_components(earlier: &Property, later: &Property) -> bool {
  let Some(descriptor) = later.descriptor() else {
    return false;
  };
  descriptor.covers(&earlier.name)
    || earlier
      .descriptor()
      .is_some_and(|earlier| earlier.components.iter().any(|name| descriptor.covers(name)))
}

/// Marks properties overridden by later ones as unused and folds later
/// longhands into earlier understood shorthands.
pub fn override_properties(properties: &mut [Property]) {
  for earlier_index in 0..properties.len() {
    if properties[earlier_index].unused {
      continue;
    }

    for later_index in earlier_index + 1..properties.len() {
      let (head, tail) = properties.split_at_mut(later_index);
      let earlier = &mut head[earlier_index];
      let later = &mut tail[0];

      if later.unused {
        continue;
      }

      if later.name == earlier.name {
        if can_replace(earlier, later) {
          earlier.unused = true;
        } else if earlier.important && !later.important {
          later.unused = true;
          continue;
        }
        break;
      }

      let later_covers_earlier = later
        .descriptor()
        .is_some_and(|descriptor| descriptor.covers(&earlier.name));
      if later_covers_earlier {
        if can_replace(earlier, later) {
          earlier.unused = true;
        }
        break;
      }

      let folds_into_earlier = earlier.is_understood()
        && earlier
          .descriptor()
          .is_some_and(|descriptor| descriptor.covers(&later.name));
      if folds_into_earlier {
        if earlier.important && !later.important {
          later.unused = true;
          continue;
        }
        if earlier.important == later.important && can_fold(earlier, later) {
          if let Some(component) = earlier
            .components
            .iter_mut()
            .find(|component| component.name == later.name)
          {
            component.value = later.value.clone();
          }
          earlier.dirty = true;
          later.unused = true;
          continue;
        }
        break;
      }

      if earlier.shorthand && shares_components(earlier, later) {
        break;
      }
    }
  }

  for property in properties.iter_mut().filter(|property| property.dirty) {
    property.recompose();
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn properties(declarations: &[(&str, &str, bool)]) -> Vec<Property> {
    declarations
      .iter()
      .enumerate()
      .map(|(position, (name, value, important))| {
        let mut property = Property::new(*name, value, position);
        property.important = *important;
        for component in &mut property.components {
          component.important = *important;
        }
        property
      })
      .collect()
  }

  fn remaining(properties: &[Property]) -> Vec<String> {
    properties
      .iter()
      .filter(|property| !property.unused)
      .map(|property| property.to_declaration().serialize())
      .collect()
  }

  #[test]
  fn later_same_name_overrides_earlier() {
    let mut list = properties(&[("color", "red", false), ("color", "blue", false)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["color:blue"]);
  }

  #[test]
  fn keeps_fallbacks_for_newer_syntax() {
    let mut list = properties(&[("color", "red", false), ("color", "rgba(0,0,0,.5)", false)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["color:red", "color:rgba(0,0,0,.5)"]);
  }

  #[test]
  fn important_wins_over_later_plain_value() {
    let mut list = properties(&[("color", "red", true), ("color", "blue", false)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["color:red!important"]);
  }

  #[test]
  fn shorthand_overrides_earlier_longhand() {
    let mut list = properties(&[("margin-top", "1px", false), ("margin", "0", false)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["margin:0"]);
  }

  #[test]
  fn folds_later_longhand_into_shorthand() {
    let mut list = properties(&[("margin", "0", false), ("margin-left", "5px", false)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["margin:0 0 0 5px"]);
  }

  #[test]
  fn folds_into_the_nearest_shorthand_only() {
    let mut list = properties(&[
      ("border-width", "1px", false),
      ("border-top", "2px solid red", false),
      ("border-top-width", "3px", false),
    ]);
    override_properties(&mut list);
    assert_eq!(
      remaining(&list),
      vec!["border-width:1px", "border-top:3px solid red"]
    );
  }

  #[test]
  fn does_not_fold_across_an_intervening_shorthand() {
    let mut list = properties(&[
      ("border-width", "1px", false),
      ("border-top", "var(--x)", false),
      ("border-top-width", "3px", false),
    ]);
    override_properties(&mut list);
    assert_eq!(
      remaining(&list),
      vec!["border-width:1px", "border-top:var(--x)", "border-top-width:3px"]
    );
  }

  #[test]
  fn does_not_fold_important_longhand_into_plain_shorthand() {
    let mut list = properties(&[("padding", "0", false), ("padding-top", "1px", true)]);
    override_properties(&mut list);
    assert_eq!(remaining(&list), vec!["padding:0", "padding-top:1px!important"]);
  }
}
