use super::wrap::Property;
use crate::token::BodyItem;

/// Writes `properties` back into `body`, dropping the ones flagged unused.
///
/// Comments and raw items stay in front of the declaration that followed
/// them originally.
pub fn remove_unused(body: Vec<BodyItem>, properties: Vec<Property>) -> Vec<BodyItem> {
  let mut others = body
    .into_iter()
    .enumerate()
    .filter(|(_, item)| !matches!(item, BodyItem::Declaration(_)))
    .peekable();

  let mut output = Vec::with_capacity(properties.len());
  for property in properties {
    while let Some((_, item)) = others.next_if(|(index, _)| *index < property.position) {
      output.push(item);
    }
    if !property.unused {
      output.push(BodyItem::Declaration(property.to_declaration()));
    }
  }

  output.extend(others.map(|(_, item)| item));
  output
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::properties::wrap::wrap_all;
  use crate::token::{Declaration, Fragment};

  #[test]
  fn keeps_comments_in_place() {
    let body = vec![
      BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_0__")),
      BodyItem::Declaration(Declaration::new("color", "red")),
      BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_1__")),
      BodyItem::Declaration(Declaration::new("color", "blue")),
      BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_2__")),
    ];
    let mut properties = wrap_all(&body);
    properties[0].unused = true;

    assert_eq!(
      remove_unused(body, properties),
      vec![
        BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_0__")),
        BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_1__")),
        BodyItem::Declaration(Declaration::new("color", "blue")),
        BodyItem::Comment(Fragment::new("__ESCAPED_COMMENT_2__")),
      ]
    );
  }
}
