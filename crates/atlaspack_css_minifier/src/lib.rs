//! A CSS minifier.
//!
//! Stylesheets go through a fixed pipeline: content that has to survive
//! byte for byte (comments, quoted text, `url(...)`, IE `expression(...)`) is
//! swapped for placeholders, the remaining text is split into a token tree,
//! a level 1 pass tidies values, selectors and at-rules, a level 2 pass
//! merges declarations into shorthands and compatible rules into each
//! other, and the stringifier writes the tree back out, restoring
//! placeholders and optionally recording a source map.
//!
//! # Example
//!
//! ```rust
//! use atlaspack_css_minifier::{minify, OptionsBuilder};
//!
//! let options = OptionsBuilder::new().level(2).build();
//! let output = minify(
//!   "@media screen{a{color:red}}@media screen{div{display:block}}",
//!   &options,
//! );
//!
//! assert_eq!(output.styles, "@media screen{a{color:red}div{display:block}}");
//! assert!(output.warnings.is_empty());
//! ```
//!
//! Malformed input never aborts a run. Problems are collected as warnings in
//! [`MinifyOutput`] and the best-effort result is returned anyway.

pub mod collaborators;
pub mod diagnostics;
pub mod escape;
pub mod minifier;
pub mod optimizer;
pub mod options;
pub mod properties;
pub mod scanner;
pub mod selectors;
pub mod source_map;
pub mod stringifier;
pub mod token;
pub mod tokenizer;
pub mod values;

pub use collaborators::{
  FsImportInliner, ImportInliner, InputSource, InputSourceMapTracker, PathUrlRebaser, UrlRebaser,
};
pub use diagnostics::{Diagnostics, ImportError, SourceMapError};
pub use escape::Escapes;
pub use minifier::{minify, Minifier, MinifyOutput, Stats};
pub use options::{
  Breaks, Compatibility, Format, IndentWith, Level, Level1Options, Level2Options, MinifyOptions,
  OptionsBuilder, RawOptions, SpecialComments, Spaces,
};
pub use selectors::{is_mergeable, specificities_overlap, specificity, Specificity};
pub use source_map::{InputSourceMap, Mapping, SourceMapOutput};
pub use stringifier::{stringify, PlainSink, Sink};
pub use token::{BodyItem, Declaration, Fragment, Metadata, Token};
pub use tokenizer::split::split;
pub use tokenizer::tokenize;
