use super::compactable::{descriptor, Descriptor};
use crate::token::{BodyItem, Declaration, Fragment, Metadata};
use crate::tokenizer::split::space;

/// A declaration lifted into the shape the shorthand passes work on.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
  pub name: String,
  pub value: Vec<String>,
  pub important: bool,
  /// Set once another property makes this one redundant; removed in one
  /// final pass.
  pub unused: bool,
  pub shorthand: bool,
  /// The value was changed and must be rebuilt from `components`.
  pub dirty: bool,
  /// Index of the declaration this property came from in its body. A merged
  /// shorthand takes the index of its last component.
  pub position: usize,
  /// Component values of an understood shorthand, in descriptor order.
  pub components: Vec<Property>,
  pub metadata: Option<Metadata>,
}

impl Property {
  pub fn new(name: impl Into<String>, value: &str, position: usize) -> Self {
    let name = name.into();
    let mut property = Property {
      shorthand: descriptor(&name).is_some_and(Descriptor::is_shorthand),
      name,
      value: space(value),
      important: false,
      unused: false,
      dirty: false,
      position,
      components: Vec::new(),
      metadata: None,
    };
    property.components = property.break_up();
    property
  }

  pub fn descriptor(&self) -> Option<&'static Descriptor> {
    descriptor(&self.name)
  }

  pub fn value_string(&self) -> String {
    self.value.join(" ")
  }

  /// Whether the shorthand value was understood and split into components.
  pub fn is_understood(&self) -> bool {
    self
      .descriptor()
      .is_some_and(|descriptor| descriptor.components.len() == self.components.len() && !self.components.is_empty())
  }

  fn break_up(&self) -> Vec<Property> {
    let Some(descriptor) = self.descriptor().filter(|descriptor| descriptor.is_shorthand()) else {
      return Vec::new();
    };
    let Some(values) = descriptor.break_up(&self.value) else {
      return Vec::new();
    };
    descriptor
      .components
      .iter()
      .zip(values)
      .map(|(name, value)| Property {
        name: name.to_string(),
        value: space(&value),
        important: self.important,
        unused: false,
        shorthand: false,
        dirty: false,
        position: self.position,
        components: Vec::new(),
        metadata: self.metadata.clone(),
      })
      .collect()
  }

  /// Rebuilds `value` from the components after they changed.
  pub fn recompose(&mut self) {
    if let Some(descriptor) = self.descriptor() {
      let values = self
        .components
        .iter()
        .map(Property::value_string)
        .collect::<Vec<_>>();
      self.value = space(&descriptor.compose(&values));
    }
    self.dirty = false;
  }

  pub fn to_declaration(&self) -> Declaration {
    Declaration {
      name: Fragment {
        value: self.name.clone(),
        metadata: self.metadata.clone(),
      },
      value: self.value_string(),
      important: self.important,
    }
  }
}

/// Lifts every declaration of `body` into a [`Property`], keeping its index.
pub fn wrap_all(body: &[BodyItem]) -> Vec<Property> {
  body
    .iter()
    .enumerate()
    .filter_map(|(position, item)| {
      let declaration = item.as_declaration()?;
      let mut property = Property::new(declaration.name.value.clone(), &declaration.value, position);
      property.important = declaration.important;
      property.metadata = declaration.name.metadata.clone();
      for component in &mut property.components {
        component.important = declaration.important;
        component.metadata = declaration.name.metadata.clone();
      }
      Some(property)
    })
    .collect()
}
