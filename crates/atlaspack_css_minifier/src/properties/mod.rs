//! The shorthand model: lifting declarations into properties, overriding,
//! merging longhands into shorthands and writing the result back.

pub mod compactable;
pub mod merge;
pub mod override_properties;
pub mod remove_unused;
pub mod reorder;
pub mod wrap;

use crate::options::Level2Options;
use crate::token::BodyItem;

use self::merge::merge_into_shorthands;
use self::override_properties::override_properties;
use self::remove_unused::remove_unused;
use self::wrap::wrap_all;

pub use self::wrap::Property;

/// Runs the enabled property passes over one declaration body.
pub fn optimize_body(body: &mut Vec<BodyItem>, options: &Level2Options) {
  if !options.override_properties && !options.merge_into_shorthands {
    return;
  }

  let mut properties = wrap_all(body);
  if options.override_properties {
    override_properties(&mut properties);
  }
  if options.merge_into_shorthands {
    merge_into_shorthands(&mut properties);
  }
  *body = remove_unused(std::mem::take(body), properties);
}
