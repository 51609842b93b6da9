use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pathdiff::diff_paths;
use percent_encoding::percent_decode_str;
use sourcemap::{SourceMap, SourceMapBuilder};

use crate::collaborators::InputSourceMapTracker;
use crate::diagnostics::SourceMapError;
use crate::stringifier::Sink;
use crate::token::Metadata;

/// Source name used for input that did not come from a file.
pub const STDIN: &str = "$stdin";

/// A [`Sink`] that records a mapping for every piece of output carrying
/// metadata, while tracking the generated line and column itself.
pub struct SourceMapSink<'a> {
  output: String,
  builder: SourceMapBuilder,
  line: u32,
  column: u32,
  sources: HashMap<String, u32>,
  base: Option<PathBuf>,
  input_map: Option<(&'a dyn InputSourceMapTracker, Option<Arc<str>>)>,
}

impl<'a> SourceMapSink<'a> {
  /// Source paths are written relative to the directory of `target` when
  /// given, or to `root` otherwise.
  pub fn new(target: Option<&Path>, root: Option<&Path>) -> Self {
    let file = target
      .and_then(Path::file_name)
      .map(|name| name.to_string_lossy().into_owned());
    let base = target
      .and_then(Path::parent)
      .or(root)
      .map(Path::to_path_buf);

    SourceMapSink {
      output: String::new(),
      builder: SourceMapBuilder::new(file.as_deref()),
      line: 1,
      column: 1,
      sources: HashMap::new(),
      base,
      input_map: None,
    }
  }

  /// Positions in `source` are translated through `tracker` before they are
  /// recorded.
  pub fn with_input_map(
    mut self,
    tracker: &'a dyn InputSourceMapTracker,
    source: Option<Arc<str>>,
  ) -> Self {
    self.input_map = Some((tracker, source));
    self
  }

  /// Finishes the map. `sources_content` is keyed by source name as it
  /// appears in the metadata, with [`STDIN`] standing for unnamed input.
  pub fn finish(
    mut self,
    sources_content: Option<&HashMap<String, String>>,
  ) -> (String, SourceMapOutput) {
    if let Some(contents) = sources_content {
      for (name, id) in &self.sources {
        if let Some(content) = contents.get(name) {
          self.builder.set_source_contents(*id, Some(content.as_str()));
        }
      }
    }
    let map = self.builder.into_sourcemap();
    (self.output, SourceMapOutput { map })
  }

  fn original(&self, metadata: &Metadata) -> Option<Metadata> {
    match &self.input_map {
      Some((tracker, source)) if metadata.source == *source => {
        tracker.original_position_for(metadata)
      }
      _ => Some(metadata.clone()),
    }
  }

  fn ensure_source(&mut self, name: &str) -> u32 {
    if let Some(id) = self.sources.get(name) {
      return *id;
    }
    let path = self.source_path(name);
    let id = self.builder.add_source(&path);
    self.sources.insert(name.to_string(), id);
    id
  }

  fn source_path(&self, name: &str) -> String {
    if name == STDIN || name.contains("://") {
      return name.to_string();
    }
    self
      .base
      .as_ref()
      .and_then(|base| diff_paths(name, base))
      .map(|relative| relative.to_string_lossy().replace('\\', "/"))
      .unwrap_or_else(|| name.replace('\\', "/"))
  }
}

impl Sink for SourceMapSink<'_> {
  fn store(&mut self, text: &str, metadata: Option<&Metadata>) {
    if let Some(original) = metadata.and_then(|metadata| self.original(metadata)) {
      let name = original.source.as_deref().unwrap_or(STDIN).to_string();
      let id = self.ensure_source(&name);
      self.builder.add_raw(
        self.line.saturating_sub(1),
        self.column.saturating_sub(1),
        original.line.saturating_sub(1),
        original.column.saturating_sub(1),
        Some(id),
        None,
        false,
      );
    }
    self.output.push_str(text);
    update_position(text, &mut self.line, &mut self.column);
  }
}

fn update_position(chunk: &str, line: &mut u32, column: &mut u32) {
  for ch in chunk.chars() {
    if ch == '\n' {
      *line += 1;
      *column = 1;
    } else {
      *column += 1;
    }
  }
}

/// One generated-to-original position pair. All coordinates are 1-based.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mapping {
  pub generated_line: u32,
  pub generated_column: u32,
  pub original_line: u32,
  pub original_column: u32,
  pub source: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SourceMapOutput {
  map: SourceMap,
}

impl SourceMapOutput {
  pub fn source_map(&self) -> &SourceMap {
    &self.map
  }

  pub fn sources(&self) -> Vec<String> {
    self.map.sources().map(str::to_string).collect()
  }

  pub fn mappings(&self) -> Vec<Mapping> {
    self
      .map
      .tokens()
      .map(|token| Mapping {
        generated_line: token.get_dst_line() + 1,
        generated_column: token.get_dst_col() + 1,
        original_line: token.get_src_line() + 1,
        original_column: token.get_src_col() + 1,
        source: token.get_source().map(str::to_string),
      })
      .collect()
  }

  pub fn to_json(&self) -> Result<String, SourceMapError> {
    let mut buf = Vec::new();
    self
      .map
      .to_writer(&mut buf)
      .map_err(SourceMapError::Serialize)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
  }

  /// The `sourceMappingURL` comment embedding this map as a data url.
  pub fn inline_annotation(&self) -> Result<String, SourceMapError> {
    let json = self.to_json()?;
    Ok(format!(
      "\n/*# sourceMappingURL=data:application/json;base64,{} */",
      BASE64.encode(json.as_bytes())
    ))
  }
}

/// A source map supplied with the input, used to carry positions back to
/// whatever produced the CSS being minified.
#[derive(Clone, Debug)]
pub struct InputSourceMap {
  map: SourceMap,
}

impl InputSourceMap {
  pub fn parse(text: &str) -> Result<Self, SourceMapError> {
    Ok(InputSourceMap {
      map: SourceMap::from_slice(text.as_bytes())?,
    })
  }

  /// Loads the map named by a trailing `sourceMappingURL` comment, either
  /// from its data url or from a file next to `directory`.
  pub fn from_annotation(css: &str, directory: Option<&Path>) -> Result<Option<Self>, SourceMapError> {
    let Some(annotation) = load_annotation(css) else {
      return Ok(None);
    };

    let text = if annotation.starts_with("data:") {
      decode_inline(&annotation)?
    } else if annotation.contains("://") {
      return Err(SourceMapError::UnsupportedAnnotation(annotation));
    } else {
      let path = match directory {
        Some(directory) => directory.join(&annotation),
        None => PathBuf::from(&annotation),
      };
      fs::read_to_string(&path).map_err(|source| SourceMapError::Io { path, source })?
    };

    Self::parse(&text).map(Some)
  }

  /// Embedded contents of the sources this map points at, by source name.
  pub fn sources_content(&self) -> HashMap<String, String> {
    self
      .map
      .sources()
      .enumerate()
      .filter_map(|(index, name)| {
        let content = self.map.get_source_contents(index as u32)?;
        Some((name.to_string(), content.to_string()))
      })
      .collect()
  }
}

impl InputSourceMapTracker for InputSourceMap {
  fn original_position_for(&self, metadata: &Metadata) -> Option<Metadata> {
    let line = metadata.line.checked_sub(1)?;
    let column = metadata.column.saturating_sub(1);
    let token = self.map.lookup_token(line, column)?;
    if token.get_dst_line() != line {
      return None;
    }
    Some(Metadata::new(
      token.get_src_line() + 1,
      token.get_src_col() + 1,
      token.get_source().map(Arc::from),
    ))
  }
}

fn load_annotation(css: &str) -> Option<String> {
  let mut search_start = css.len();
  while let Some(index) = css[..search_start].rfind("/*") {
    let comment = &css[index + 2..];
    let end = comment.find("*/")?;
    let body = comment[..end].trim();
    if let Some(rest) = body.strip_prefix('#') {
      if let Some(url) = rest.trim_start().strip_prefix("sourceMappingURL=") {
        return Some(url.trim().to_string());
      }
    }
    search_start = index;
  }
  None
}

fn decode_inline(text: &str) -> Result<String, SourceMapError> {
  let Some((prefix, data)) = text.trim().split_once(',') else {
    return Err(SourceMapError::UnsupportedAnnotation(text.to_string()));
  };

  if prefix.to_ascii_lowercase().contains("base64") {
    let decoded = BASE64.decode(data.as_bytes())?;
    String::from_utf8(decoded).map_err(|_| SourceMapError::UnsupportedAnnotation(prefix.to_string()))
  } else {
    percent_decode_str(data)
      .decode_utf8()
      .map(|decoded| decoded.into_owned())
      .map_err(|_| SourceMapError::UnsupportedAnnotation(prefix.to_string()))
  }
}
