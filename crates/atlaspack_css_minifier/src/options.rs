use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

/// What happens to `/*! ... */` comments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpecialComments {
  #[default]
  All,
  FirstOnly,
  None,
}

impl SpecialComments {
  fn from_keyword(keyword: &str) -> Option<Self> {
    match keyword {
      "all" | "*" => Some(SpecialComments::All),
      "1" => Some(SpecialComments::FirstOnly),
      "0" => Some(SpecialComments::None),
      _ => None,
    }
  }
}

const PSEUDO_CLASSES: &[&str] = &[
  ":active",
  ":after",
  ":before",
  ":checked",
  ":disabled",
  ":empty",
  ":enabled",
  ":first-child",
  ":first-letter",
  ":first-line",
  ":first-of-type",
  ":focus",
  ":hover",
  ":lang",
  ":last-child",
  ":last-of-type",
  ":link",
  ":not",
  ":nth-child",
  ":nth-last-child",
  ":nth-last-of-type",
  ":nth-of-type",
  ":only-child",
  ":only-of-type",
  ":root",
  ":target",
  ":visited",
];

const PSEUDO_ELEMENTS: &[&str] = &["::after", "::before", "::first-letter", "::first-line"];

const LEGACY_PSEUDO_CLASSES: &[&str] = &[
  ":active",
  ":after",
  ":before",
  ":first-child",
  ":first-letter",
  ":first-line",
  ":focus",
  ":hover",
  ":lang",
  ":link",
  ":visited",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorCompatibility {
  pub mergeable_pseudo_classes: Vec<String>,
  pub mergeable_pseudo_elements: Vec<String>,
  /// Whether a selector may mix pseudo-classes and pseudo-elements and still
  /// be merged with others.
  pub multiple_pseudo_merging: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyCompatibility {
  /// `0px` may be written as `0`.
  pub zero_units: bool,
  /// Longhands may be merged into shorthands.
  pub shorthand_merging: bool,
}

/// Which browsers the output has to keep working in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compatibility {
  pub selectors: SelectorCompatibility,
  pub properties: PropertyCompatibility,
}

impl Default for Compatibility {
  fn default() -> Self {
    Compatibility {
      selectors: SelectorCompatibility {
        mergeable_pseudo_classes: strings(PSEUDO_CLASSES),
        mergeable_pseudo_elements: strings(PSEUDO_ELEMENTS),
        multiple_pseudo_merging: true,
      },
      properties: PropertyCompatibility {
        zero_units: true,
        shorthand_merging: true,
      },
    }
  }
}

impl Compatibility {
  /// Expands a compatibility keyword such as `"*"` or `"ie8"`.
  pub fn from_keyword(keyword: &str) -> Option<Self> {
    let mut compatibility = Compatibility::default();
    match keyword {
      "*" | "ie11" | "ie10" => {}
      "ie9" => compatibility.selectors.multiple_pseudo_merging = false,
      "ie8" | "ie7" => {
        let mut classes = strings(LEGACY_PSEUDO_CLASSES);
        if keyword == "ie7" {
          classes.retain(|class| class != ":focus");
        }
        compatibility.selectors = SelectorCompatibility {
          mergeable_pseudo_classes: classes,
          mergeable_pseudo_elements: Vec::new(),
          multiple_pseudo_merging: false,
        };
        compatibility.properties.shorthand_merging = false;
      }
      _ => return None,
    }
    Some(compatibility)
  }
}

fn strings(values: &[&str]) -> Vec<String> {
  values.iter().map(|value| value.to_string()).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Breaks {
  pub after_at_rule: bool,
  pub after_block_begins: bool,
  pub after_block_ends: bool,
  pub after_comment: bool,
  pub after_property: bool,
  pub after_rule_begins: bool,
  pub after_rule_ends: bool,
  pub before_block_ends: bool,
  pub between_selectors: bool,
}

impl Breaks {
  fn all() -> Self {
    Breaks {
      after_at_rule: true,
      after_block_begins: true,
      after_block_ends: true,
      after_comment: true,
      after_property: true,
      after_rule_begins: true,
      after_rule_ends: true,
      before_block_ends: true,
      between_selectors: true,
    }
  }

  fn set(&mut self, name: &str, value: bool) -> bool {
    let field = match name {
      "afterAtRule" => &mut self.after_at_rule,
      "afterBlockBegins" => &mut self.after_block_begins,
      "afterBlockEnds" => &mut self.after_block_ends,
      "afterComment" => &mut self.after_comment,
      "afterProperty" => &mut self.after_property,
      "afterRuleBegins" => &mut self.after_rule_begins,
      "afterRuleEnds" => &mut self.after_rule_ends,
      "beforeBlockEnds" => &mut self.before_block_ends,
      "betweenSelectors" => &mut self.between_selectors,
      _ => return false,
    };
    *field = value;
    true
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Spaces {
  pub around_selector_relation: bool,
  pub before_block_begins: bool,
  pub before_value: bool,
}

impl Spaces {
  fn set(&mut self, name: &str, value: bool) -> bool {
    let field = match name {
      "aroundSelectorRelation" => &mut self.around_selector_relation,
      "beforeBlockBegins" => &mut self.before_block_begins,
      "beforeValue" => &mut self.before_value,
      _ => return false,
    };
    *field = value;
    true
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndentWith {
  #[default]
  Space,
  Tab,
}

/// Output layout. The default writes everything on one line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Format {
  pub breaks: Breaks,
  pub spaces: Spaces,
  pub indent_by: usize,
  pub indent_with: IndentWith,
  pub semicolon_after_last_property: bool,
}

impl Format {
  pub fn minified() -> Self {
    Format::default()
  }

  pub fn beautify() -> Self {
    Format {
      breaks: Breaks::all(),
      spaces: Spaces {
        around_selector_relation: true,
        before_block_begins: true,
        before_value: true,
      },
      indent_by: 2,
      indent_with: IndentWith::Space,
      semicolon_after_last_property: false,
    }
  }

  /// Minified, except that line breaks between top-level statements are kept.
  pub fn keep_breaks() -> Self {
    Format {
      breaks: Breaks {
        after_at_rule: true,
        after_block_ends: true,
        after_comment: true,
        after_rule_ends: true,
        ..Breaks::default()
      },
      ..Format::default()
    }
  }

  pub fn from_keyword(keyword: &str) -> Option<Self> {
    match keyword {
      "beautify" => Some(Format::beautify()),
      "keep-breaks" => Some(Format::keep_breaks()),
      "none" | "false" => Some(Format::minified()),
      _ => None,
    }
  }

  pub fn indentation(&self, depth: usize) -> String {
    let unit = match self.indent_with {
      IndentWith::Space => " ",
      IndentWith::Tab => "\t",
    };
    unit.repeat(self.indent_by * depth)
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level1Options {
  pub cleanup_charset: bool,
  pub normalize_urls: bool,
  pub optimize_borders: bool,
  pub optimize_colors: bool,
  pub optimize_font_weight: bool,
  pub optimize_numbers: bool,
  pub remove_empty: bool,
  pub special_comments: SpecialComments,
  pub tidy_at_rules: bool,
  pub tidy_selectors: bool,
}

impl Default for Level1Options {
  fn default() -> Self {
    Level1Options {
      cleanup_charset: true,
      normalize_urls: true,
      optimize_borders: true,
      optimize_colors: true,
      optimize_font_weight: true,
      optimize_numbers: true,
      remove_empty: true,
      special_comments: SpecialComments::All,
      tidy_at_rules: true,
      tidy_selectors: true,
    }
  }
}

impl Level1Options {
  fn set_all(&mut self, value: bool) {
    self.cleanup_charset = value;
    self.normalize_urls = value;
    self.optimize_borders = value;
    self.optimize_colors = value;
    self.optimize_font_weight = value;
    self.optimize_numbers = value;
    self.remove_empty = value;
    self.tidy_at_rules = value;
    self.tidy_selectors = value;
  }

  fn set(&mut self, name: &str, value: &Value, warnings: &mut Vec<String>) {
    if name == "specialComments" {
      let keyword = match value {
        Value::String(keyword) => keyword.clone(),
        other => other.to_string(),
      };
      match SpecialComments::from_keyword(&keyword) {
        Some(policy) => self.special_comments = policy,
        None => warnings.push(format!("Unknown special comments keyword '{keyword}'. Ignoring.")),
      }
      return;
    }

    let Some(value) = value.as_bool() else {
      warnings.push(format!("Level 1 option '{name}' expects a boolean. Ignoring."));
      return;
    };
    let field = match name {
      "all" => return self.set_all(value),
      "cleanupCharsets" => &mut self.cleanup_charset,
      "normalizeUrls" => &mut self.normalize_urls,
      "optimizeBorders" => &mut self.optimize_borders,
      "optimizeColors" => &mut self.optimize_colors,
      "optimizeFontWeight" => &mut self.optimize_font_weight,
      "optimizeNumbers" => &mut self.optimize_numbers,
      "removeEmpty" => &mut self.remove_empty,
      "tidyAtRules" => &mut self.tidy_at_rules,
      "tidySelectors" => &mut self.tidy_selectors,
      _ => {
        warnings.push(format!("Unknown level 1 option '{name}'. Ignoring."));
        return;
      }
    };
    *field = value;
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level2Options {
  pub merge_adjacent_rules: bool,
  pub merge_into_shorthands: bool,
  pub merge_media: bool,
  pub merge_non_adjacent_rules: bool,
  pub override_properties: bool,
  pub remove_duplicate_rules: bool,
  pub remove_empty: bool,
}

impl Default for Level2Options {
  fn default() -> Self {
    Level2Options {
      merge_adjacent_rules: true,
      merge_into_shorthands: true,
      merge_media: true,
      merge_non_adjacent_rules: true,
      override_properties: true,
      remove_duplicate_rules: true,
      remove_empty: true,
    }
  }
}

impl Level2Options {
  fn set(&mut self, name: &str, value: &Value, warnings: &mut Vec<String>) {
    let Some(value) = value.as_bool() else {
      warnings.push(format!("Level 2 option '{name}' expects a boolean. Ignoring."));
      return;
    };
    let field = match name {
      "all" => {
        *self = Level2Options {
          merge_adjacent_rules: value,
          merge_into_shorthands: value,
          merge_media: value,
          merge_non_adjacent_rules: value,
          override_properties: value,
          remove_duplicate_rules: value,
          remove_empty: value,
        };
        return;
      }
      "mergeAdjacentRules" => &mut self.merge_adjacent_rules,
      "mergeIntoShorthands" => &mut self.merge_into_shorthands,
      "mergeMedia" => &mut self.merge_media,
      "mergeNonAdjacentRules" => &mut self.merge_non_adjacent_rules,
      "overrideProperties" => &mut self.override_properties,
      "removeDuplicateRules" => &mut self.remove_duplicate_rules,
      "removeEmpty" => &mut self.remove_empty,
      _ => {
        warnings.push(format!("Unknown level 2 option '{name}'. Ignoring."));
        return;
      }
    };
    *field = value;
  }
}

/// Enabled optimization passes. `None` switches a level off entirely;
/// level 2 always runs on top of level 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
  pub one: Option<Level1Options>,
  pub two: Option<Level2Options>,
}

impl Default for Level {
  fn default() -> Self {
    Level::from_number(1).unwrap_or(Level { one: None, two: None })
  }
}

impl Level {
  pub fn from_number(level: u64) -> Option<Self> {
    match level {
      0 => Some(Level { one: None, two: None }),
      1 => Some(Level {
        one: Some(Level1Options::default()),
        two: None,
      }),
      2 => Some(Level {
        one: Some(Level1Options::default()),
        two: Some(Level2Options::default()),
      }),
      _ => None,
    }
  }

  pub fn special_comments(&self) -> SpecialComments {
    self
      .one
      .as_ref()
      .map_or(SpecialComments::All, |one| one.special_comments)
  }
}

/// Everything a minification run can be configured with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MinifyOptions {
  pub compatibility: Compatibility,
  pub format: Format,
  pub level: Level,
  pub source_map: bool,
  /// Embed the original sources in the output map.
  pub source_map_inline_sources: bool,
  /// Append the map to the styles as a `sourceMappingURL` data url.
  pub source_map_inline: bool,
  /// Source map of the input, as JSON text.
  pub input_source_map: Option<String>,
  /// Name of the input in source maps; `$stdin` when unset.
  pub source: Option<PathBuf>,
  pub root: Option<PathBuf>,
  pub relative_to: Option<PathBuf>,
  pub target: Option<PathBuf>,
  pub inline_imports: bool,
  pub rebase_urls: bool,
  /// Problems found while building these options, reported with the output
  /// of every run.
  pub warnings: Vec<String>,
}

/// Builds [`MinifyOptions`] from keywords. Unknown keywords leave the
/// default in place and add a warning.
#[derive(Clone, Debug, Default)]
pub struct OptionsBuilder {
  options: MinifyOptions,
}

impl OptionsBuilder {
  pub fn new() -> Self {
    OptionsBuilder::default()
  }

  fn warn(&mut self, message: String) {
    tracing::debug!(%message, "invalid minifier option");
    self.options.warnings.push(message);
  }

  pub fn compatibility(mut self, keyword: &str) -> Self {
    match Compatibility::from_keyword(keyword) {
      Some(compatibility) => self.options.compatibility = compatibility,
      None => self.warn(format!("Unknown compatibility keyword '{keyword}'. Ignoring.")),
    }
    self
  }

  pub fn format(mut self, keyword: &str) -> Self {
    match Format::from_keyword(keyword) {
      Some(format) => self.options.format = format,
      None => self.warn(format!("Unknown format keyword '{keyword}'. Ignoring.")),
    }
    self
  }

  pub fn format_options(mut self, format: Format) -> Self {
    self.options.format = format;
    self
  }

  pub fn keep_breaks(mut self, keep_breaks: bool) -> Self {
    if keep_breaks {
      let keep = Format::keep_breaks().breaks;
      let breaks = &mut self.options.format.breaks;
      breaks.after_at_rule |= keep.after_at_rule;
      breaks.after_block_ends |= keep.after_block_ends;
      breaks.after_comment |= keep.after_comment;
      breaks.after_rule_ends |= keep.after_rule_ends;
    }
    self
  }

  pub fn level(mut self, level: u64) -> Self {
    match Level::from_number(level) {
      Some(level) => self.options.level = level,
      None => self.warn(format!("Unknown optimization level '{level}'. Ignoring.")),
    }
    self
  }

  pub fn level_options(mut self, level: Level) -> Self {
    self.options.level = level;
    self
  }

  pub fn special_comments(mut self, keyword: &str) -> Self {
    match SpecialComments::from_keyword(keyword) {
      Some(policy) => {
        if let Some(one) = self.options.level.one.as_mut() {
          one.special_comments = policy;
        }
      }
      None => self.warn(format!("Unknown special comments keyword '{keyword}'. Ignoring.")),
    }
    self
  }

  pub fn source_map(mut self, enabled: bool) -> Self {
    self.options.source_map = enabled;
    self
  }

  pub fn source_map_inline_sources(mut self, enabled: bool) -> Self {
    self.options.source_map_inline_sources = enabled;
    self
  }

  pub fn source_map_inline(mut self, enabled: bool) -> Self {
    self.options.source_map_inline = enabled;
    self
  }

  pub fn input_source_map(mut self, map: impl Into<String>) -> Self {
    self.options.input_source_map = Some(map.into());
    self
  }

  pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
    self.options.source = Some(source.into());
    self
  }

  pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
    self.options.root = Some(root.into());
    self
  }

  pub fn relative_to(mut self, relative_to: impl Into<PathBuf>) -> Self {
    self.options.relative_to = Some(relative_to.into());
    self
  }

  pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
    self.options.target = Some(target.into());
    self
  }

  pub fn inline_imports(mut self, enabled: bool) -> Self {
    self.options.inline_imports = enabled;
    self
  }

  pub fn rebase_urls(mut self, enabled: bool) -> Self {
    self.options.rebase_urls = enabled;
    self
  }

  pub fn build(self) -> MinifyOptions {
    self.options
  }

  /// Reads options from host JSON configuration such as
  /// `{"level": 2, "format": "beautify", "sourceMap": true}`.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    let raw: RawOptions = serde_json::from_str(json)?;
    Ok(OptionsBuilder::from_raw(raw))
  }

  pub fn from_raw(raw: RawOptions) -> Self {
    let mut builder = OptionsBuilder::new();

    if let Some(level) = raw.level {
      builder = builder.apply_level(level);
    }
    if let Some(keyword) = raw.compatibility {
      builder = builder.compatibility(&keyword);
    }
    if let Some(format) = raw.format {
      builder = builder.apply_format(format);
    }
    if let Some(keep_breaks) = raw.keep_breaks {
      builder = builder.keep_breaks(keep_breaks);
    }
    if let Some(enabled) = raw.source_map {
      builder = builder.source_map(enabled);
    }
    if let Some(enabled) = raw.source_map_inline_sources {
      builder = builder.source_map_inline_sources(enabled);
    }
    if let Some(map) = raw.input_source_map {
      builder = builder.input_source_map(map);
    }
    builder.options.root = raw.root;
    builder.options.relative_to = raw.relative_to;
    builder.options.target = raw.target;
    builder.options.inline_imports = raw.inline.unwrap_or(false);
    builder.options.rebase_urls = raw.rebase.unwrap_or(false);
    builder
  }

  fn apply_level(mut self, level: RawLevel) -> Self {
    match level {
      RawLevel::Number(level) => self.level(level),
      RawLevel::Detailed(levels) => {
        let mut warnings = Vec::new();
        let mut two = None;
        let mut one = None;
        for (name, settings) in levels {
          match name.as_str() {
            "1" => {
              let options = one.get_or_insert_with(Level1Options::default);
              for (key, value) in &settings {
                options.set(key, value, &mut warnings);
              }
            }
            "2" => {
              let options = two.get_or_insert_with(Level2Options::default);
              for (key, value) in &settings {
                options.set(key, value, &mut warnings);
              }
            }
            other => warnings.push(format!("Unknown optimization level '{other}'. Ignoring.")),
          }
        }
        if two.is_some() && one.is_none() {
          one = Some(Level1Options::default());
        }
        self.options.level = Level { one, two };
        for warning in warnings {
          self.warn(warning);
        }
        self
      }
    }
  }

  fn apply_format(mut self, format: RawFormat) -> Self {
    match format {
      RawFormat::Enabled(false) => self.format_options(Format::minified()),
      RawFormat::Enabled(true) => self.format_options(Format::beautify()),
      RawFormat::Keyword(keyword) => self.format(&keyword),
      RawFormat::Detailed(raw) => {
        let mut format = Format::minified();
        let mut warnings = Vec::new();
        for (name, value) in raw.breaks.unwrap_or_default() {
          if !format.breaks.set(&name, value) {
            warnings.push(format!("Unknown format break '{name}'. Ignoring."));
          }
        }
        for (name, value) in raw.spaces.unwrap_or_default() {
          if !format.spaces.set(&name, value) {
            warnings.push(format!("Unknown format space '{name}'. Ignoring."));
          }
        }
        if let Some(indent_by) = raw.indent_by {
          format.indent_by = indent_by;
        }
        match raw.indent_with.as_deref() {
          None | Some("space") => {}
          Some("tab") => format.indent_with = IndentWith::Tab,
          Some(other) => warnings.push(format!("Unknown indentation '{other}'. Ignoring.")),
        }
        format.semicolon_after_last_property = raw.semicolon_after_last_property.unwrap_or(false);
        for warning in warnings {
          self.warn(warning);
        }
        self.format_options(format)
      }
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormatOptions {
  pub breaks: Option<HashMap<String, bool>>,
  pub spaces: Option<HashMap<String, bool>>,
  pub indent_by: Option<usize>,
  pub indent_with: Option<String>,
  pub semicolon_after_last_property: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawFormat {
  Enabled(bool),
  Keyword(String),
  Detailed(RawFormatOptions),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawLevel {
  Number(u64),
  Detailed(HashMap<String, HashMap<String, Value>>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOptions {
  pub compatibility: Option<String>,
  pub format: Option<RawFormat>,
  pub keep_breaks: Option<bool>,
  pub level: Option<RawLevel>,
  pub source_map: Option<bool>,
  pub source_map_inline_sources: Option<bool>,
  pub input_source_map: Option<String>,
  pub root: Option<PathBuf>,
  pub relative_to: Option<PathBuf>,
  pub target: Option<PathBuf>,
  pub inline: Option<bool>,
  pub rebase: Option<bool>,
}
