use indexmap::IndexMap;

use super::compactable::{descriptor, is_plain, Descriptor};
use super::wrap::Property;
use crate::tokenizer::split::space;
use crate::values::is_global_keyword;

/// Longhands seen so far for one shorthand, keyed by component name and
/// pointing into the property list.
#[derive(Debug)]
struct Bucket {
  shorthand: &'static Descriptor,
  members: IndexMap<&'static str, usize>,
  /// A component showed up twice; the earlier one may be a fallback.
  duplicated: bool,
}

impl Bucket {
  fn new(shorthand: &'static Descriptor) -> Self {
    Bucket {
      shorthand,
      members: IndexMap::new(),
      duplicated: false,
    }
  }
}

fn shift_indices(buckets: &mut IndexMap<&'static str, Bucket>, inserted_at: usize) {
  for bucket in buckets.values_mut() {
    for index in bucket.members.values_mut() {
      if *index >= inserted_at {
        *index += 1;
      }
    }
  }
}

/// Replaces a complete bucket with one shorthand property. Returns the
/// index the shorthand was inserted at, or `None` when the merge is unsafe.
fn compact(properties: &mut Vec<Property>, bucket: &Bucket) -> Option<usize> {
  let shorthand = bucket.shorthand;
  if bucket.duplicated || bucket.members.len() != shorthand.components.len() {
    return None;
  }

  let members = shorthand
    .components
    .iter()
    .map(|name| bucket.members.get(name).copied())
    .collect::<Option<Vec<_>>>()?;

  let first = members.iter().copied().min()?;
  let last = members.iter().copied().max()?;
  let longhands = shorthand.longhands();
  let interleaved = (first..last)
    .filter(|index| !members.contains(index))
    .map(|index| &properties[index])
    .any(|property| {
      !property.unused
        && property
          .descriptor()
          .is_some_and(|other| other.longhands().iter().any(|name| longhands.contains(name)))
    });
  if interleaved {
    return None;
  }

  let important = properties[members[0]].important;
  if members
    .iter()
    .any(|&index| properties[index].unused || properties[index].important != important)
  {
    return None;
  }

  let values = members
    .iter()
    .map(|&index| properties[index].value_string())
    .collect::<Vec<_>>();

  let value = if is_global_keyword(&values[0]) && values.iter().all(|value| value.eq_ignore_ascii_case(&values[0])) {
    values[0].to_ascii_lowercase()
  } else {
    let valid = shorthand.components.iter().zip(&values).all(|(name, value)| {
      descriptor(name).is_some_and(|component| {
        is_plain(value)
          && (component.is_shorthand() || !value.contains(' '))
          && (component.can_override)(value, component.default_value)
      })
    });
    if !valid || !shorthand.can_compose(&values) {
      return None;
    }
    shorthand.compose(&values)
  };

  let merged = Property {
    name: shorthand.name.to_string(),
    value: space(&value),
    important,
    unused: false,
    shorthand: true,
    dirty: false,
    position: properties[last].position,
    components: members.iter().map(|&index| properties[index].clone()).collect(),
    metadata: properties[last].metadata.clone(),
  };

  for &index in &members {
    properties[index].unused = true;
  }
  properties.insert(last, merged);
  Some(last)
}

/// Merges complete sets of longhands into their shorthand, walking the
/// properties in order so the cascade between them is kept.
pub fn merge_into_shorthands(properties: &mut Vec<Property>) {
  let mut buckets: IndexMap<&'static str, Bucket> = IndexMap::new();
  let mut index = 0;

  while index < properties.len() {
    if properties[index].unused {
      index += 1;
      continue;
    }
    let Some(current) = properties[index].descriptor() else {
      index += 1;
      continue;
    };

    if current.is_shorthand() {
      let pending = buckets.keys().copied().collect::<Vec<_>>();
      for name in pending {
        if name == current.name {
          buckets.shift_remove(name);
          continue;
        }
        let related = buckets
          .get(name)
          .is_some_and(|bucket| bucket.members.keys().any(|component| current.covers(component)));
        if !related {
          continue;
        }
        if let Some(bucket) = buckets.shift_remove(name) {
          if let Some(inserted_at) = compact(properties, &bucket) {
            shift_indices(&mut buckets, inserted_at);
            if inserted_at <= index {
              index += 1;
            }
          }
        }
      }
    }

    for owner in current.component_of {
      let Some(owner_descriptor) = descriptor(owner) else {
        continue;
      };
      let bucket = buckets
        .entry(owner_descriptor.name)
        .or_insert_with(|| Bucket::new(owner_descriptor));
      if bucket.members.insert(current.name, index).is_some() {
        bucket.duplicated = true;
      }
    }

    index += 1;
  }

  while let Some((_, bucket)) = buckets.shift_remove_index(0) {
    if let Some(inserted_at) = compact(properties, &bucket) {
      shift_indices(&mut buckets, inserted_at);
    }
  }
}
