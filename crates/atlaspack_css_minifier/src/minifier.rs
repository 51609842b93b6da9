use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::collaborators::{FsImportInliner, ImportInliner, InputSource, PathUrlRebaser, UrlRebaser};
use crate::diagnostics::Diagnostics;
use crate::escape::Escapes;
use crate::optimizer::{level1, level2};
use crate::options::MinifyOptions;
use crate::source_map::{InputSourceMap, SourceMapOutput, SourceMapSink, STDIN};
use crate::stringifier::{stringify, PlainSink};
use crate::tokenizer::position::SourceBoundary;
use crate::tokenizer::tokenize;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
  pub original_size: usize,
  pub minified_size: usize,
  pub time_spent: Duration,
  /// Share of the input removed, between 0 and 1.
  pub efficiency: f64,
}

#[derive(Clone, Debug)]
pub struct MinifyOutput {
  pub styles: String,
  pub source_map: Option<SourceMapOutput>,
  pub warnings: Vec<String>,
  pub errors: Vec<String>,
  pub stats: Stats,
}

/// Runs the minification pipeline with one set of options. Every call to
/// [`Minifier::minify`] uses fresh escape state, so a minifier can be reused
/// across inputs.
pub struct Minifier {
  options: MinifyOptions,
  import_inliner: Option<Box<dyn ImportInliner>>,
  url_rebaser: Option<Box<dyn UrlRebaser>>,
}

impl Minifier {
  /// Uses the filesystem inliner when `inline_imports` is set, and a path
  /// rebaser when `rebase_urls` is set together with a `target`.
  pub fn new(options: MinifyOptions) -> Self {
    let base = base_directory(&options);

    let import_inliner = options.inline_imports.then(|| {
      let mut inliner = FsImportInliner::new(&base);
      inliner.rebase_urls = options.rebase_urls;
      Box::new(inliner) as Box<dyn ImportInliner>
    });

    let url_rebaser = match (&options.target, options.rebase_urls) {
      (Some(target), true) => {
        let to_base = target.parent().map(Path::to_path_buf).unwrap_or_default();
        Some(Box::new(PathUrlRebaser::new(&base, to_base)) as Box<dyn UrlRebaser>)
      }
      _ => None,
    };

    Minifier {
      options,
      import_inliner,
      url_rebaser,
    }
  }

  pub fn with_import_inliner(mut self, inliner: impl ImportInliner + 'static) -> Self {
    self.import_inliner = Some(Box::new(inliner));
    self
  }

  pub fn with_url_rebaser(mut self, rebaser: impl UrlRebaser + 'static) -> Self {
    self.url_rebaser = Some(Box::new(rebaser));
    self
  }

  pub fn options(&self) -> &MinifyOptions {
    &self.options
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub fn minify(&self, css: &str) -> MinifyOutput {
    let started = Instant::now();
    let options = &self.options;
    let mut diagnostics = Diagnostics::default();
    for warning in &options.warnings {
      diagnostics.warn(warning.clone());
    }

    let source_name = options
      .source
      .as_ref()
      .map(|source| Arc::<str>::from(source.to_string_lossy().as_ref()));
    let input_map = if options.source_map {
      self.load_input_map(css, &mut diagnostics)
    } else {
      None
    };

    let input = InputSource::new(source_name.clone(), css);
    let chunks = match &self.import_inliner {
      Some(inliner) => inliner.inline(input, &mut diagnostics),
      None => vec![input],
    };

    let mut escapes = Escapes::new(options.level.special_comments(), options.source_map);
    let mut escaped = String::with_capacity(css.len());
    let mut boundaries = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
      boundaries.push(SourceBoundary {
        offset: escaped.len(),
        source: chunk.name.clone(),
        line: chunk.line,
        column: chunk.column,
      });
      escaped.push_str(&escapes.escape(&chunk.css, &mut diagnostics));
    }

    if let Some(rebaser) = &self.url_rebaser {
      escapes.urls.rebase(rebaser.as_ref());
    }

    let mut tokens = tokenize(&escaped, boundaries, &mut diagnostics);

    if let Some(one) = &options.level.one {
      if one.normalize_urls {
        escapes.urls.normalize();
      }
      level1::optimize(&mut tokens, one, &options.compatibility, &mut diagnostics);
    }
    if let Some(two) = &options.level.two {
      level2::optimize(&mut tokens, two, &options.compatibility);
    }

    let (styles, source_map) = if options.source_map {
      let mut sink = SourceMapSink::new(options.target.as_deref(), options.root.as_deref());
      if let Some(input_map) = &input_map {
        sink = sink.with_input_map(input_map, source_name.clone());
      }
      stringify(&tokens, &options.format, &escapes, &mut sink);

      let contents = options
        .source_map_inline_sources
        .then(|| sources_content(css, &source_name, &chunks, input_map.as_ref(), &mut diagnostics));
      let (mut styles, map) = sink.finish(contents.as_ref());

      if options.source_map_inline {
        match map.inline_annotation() {
          Ok(annotation) => styles.push_str(&annotation),
          Err(error) => diagnostics.warn(error.to_string()),
        }
      }
      (styles, Some(map))
    } else {
      let mut sink = PlainSink::default();
      stringify(&tokens, &options.format, &escapes, &mut sink);
      (sink.into_output(), None)
    };

    let stats = Stats {
      original_size: css.len(),
      minified_size: styles.len(),
      time_spent: started.elapsed(),
      efficiency: efficiency(css.len(), styles.len()),
    };
    tracing::debug!(
      original_size = stats.original_size,
      minified_size = stats.minified_size,
      warnings = diagnostics.warnings.len(),
      "minified stylesheet"
    );

    MinifyOutput {
      styles,
      source_map,
      warnings: diagnostics.warnings,
      errors: diagnostics.errors,
      stats,
    }
  }

  fn load_input_map(&self, css: &str, diagnostics: &mut Diagnostics) -> Option<InputSourceMap> {
    let loaded = match &self.options.input_source_map {
      Some(text) => InputSourceMap::parse(text).map(Some),
      None => {
        let directory = self.options.source.as_deref().and_then(Path::parent);
        InputSourceMap::from_annotation(css, directory)
      }
    };
    loaded.unwrap_or_else(|error| {
      diagnostics.warn(error.to_string());
      None
    })
  }
}

/// Minifies `css` with `options`.
pub fn minify(css: &str, options: &MinifyOptions) -> MinifyOutput {
  Minifier::new(options.clone()).minify(css)
}

/// Directory relative references of the input are resolved against.
fn base_directory(options: &MinifyOptions) -> PathBuf {
  options
    .relative_to
    .clone()
    .or_else(|| options.root.clone())
    .or_else(|| {
      options
        .source
        .as_deref()
        .and_then(Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
    })
    .unwrap_or_else(|| PathBuf::from("."))
}

fn efficiency(original_size: usize, minified_size: usize) -> f64 {
  if original_size == 0 {
    return 0.0;
  }
  1.0 - minified_size as f64 / original_size as f64
}

fn sources_content(
  css: &str,
  source_name: &Option<Arc<str>>,
  chunks: &[InputSource],
  input_map: Option<&InputSourceMap>,
  diagnostics: &mut Diagnostics,
) -> HashMap<String, String> {
  let mut contents = input_map
    .map(InputSourceMap::sources_content)
    .unwrap_or_default();
  let root = source_name.as_deref().unwrap_or(STDIN).to_string();
  contents.insert(root.clone(), css.to_string());

  for name in chunks.iter().filter_map(|chunk| chunk.name.as_deref()) {
    if name == root || contents.contains_key(name) {
      continue;
    }
    match std::fs::read_to_string(name) {
      Ok(content) => {
        contents.insert(name.to_string(), content);
      }
      Err(_) => diagnostics.warn(format!("Could not read source content of {name:?}")),
    }
  }
  contents
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::options::OptionsBuilder;

  #[test]
  fn reports_sizes_and_efficiency() {
    let output = minify("a { color : red ; }", &MinifyOptions::default());

    assert_eq!(output.styles, "a{color:red}");
    assert_eq!(output.stats.original_size, 19);
    assert_eq!(output.stats.minified_size, 12);
    assert!((output.stats.efficiency - (1.0 - 12.0 / 19.0)).abs() < f64::EPSILON);
    assert!(output.source_map.is_none());
  }

  #[test]
  fn empty_input_has_zero_efficiency() {
    let output = minify("", &MinifyOptions::default());
    assert_eq!(output.styles, "");
    assert_eq!(output.stats.efficiency, 0.0);
  }

  #[test]
  fn carries_option_warnings_into_the_output() {
    let options = OptionsBuilder::new().format("fancy").build();
    let output = minify("a{color:red}", &options);
    assert_eq!(
      output.warnings,
      vec!["Unknown format keyword 'fancy'. Ignoring.".to_string()]
    );
  }

  #[test]
  fn level_zero_only_drops_regular_comments() {
    let options = OptionsBuilder::new().level(0).build();
    let output = minify("/*! keep */a{ color : #ff0000 }/* drop */", &options);
    assert_eq!(output.styles, "/*! keep */a{color:#ff0000}");
  }

  #[test]
  fn uses_a_custom_url_rebaser() {
    struct Prefix;
    impl UrlRebaser for Prefix {
      fn rebase(&self, address: &str) -> String {
        format!("static/{address}")
      }
    }

    let minifier = Minifier::new(MinifyOptions::default()).with_url_rebaser(Prefix);
    let output = minifier.minify("a{background:url(img/a.png)}");
    assert_eq!(output.styles, "a{background:url(static/img/a.png)}");
  }

  #[test]
  fn resolves_the_base_directory() {
    let options = OptionsBuilder::new().source("css/site.css").build();
    assert_eq!(base_directory(&options), PathBuf::from("css"));

    let options = OptionsBuilder::new().source("site.css").build();
    assert_eq!(base_directory(&options), PathBuf::from("."));

    let options = OptionsBuilder::new().source("css/site.css").root("/www").build();
    assert_eq!(base_directory(&options), PathBuf::from("/www"));
  }

  #[test]
  fn warns_about_broken_input_maps() {
    let options = OptionsBuilder::new()
      .source_map(true)
      .input_source_map("{not json")
      .build();
    let output = minify("a{color:red}", &options);

    assert_eq!(output.styles, "a{color:red}");
    assert_eq!(output.warnings, vec!["Invalid input source map".to_string()]);
  }
}
