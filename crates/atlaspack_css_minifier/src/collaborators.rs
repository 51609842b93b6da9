//! Hooks the pipeline calls out to for work that touches the filesystem:
//! inlining `@import`s, rebasing relative urls and reading positions from
//! an input source map.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use pathdiff::diff_paths;

use crate::diagnostics::{Diagnostics, ImportError};
use crate::escape::urls::{is_absolute_url, rebase_urls_in};
use crate::scanner::{find_closing_quote, find_code};
use crate::token::Metadata;

/// A chunk of stylesheet text and where its first byte came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSource {
  pub name: Option<Arc<str>>,
  pub css: String,
  pub line: u32,
  pub column: u32,
}

impl InputSource {
  pub fn new(name: Option<Arc<str>>, css: impl Into<String>) -> Self {
    InputSource {
      name,
      css: css.into(),
      line: 1,
      column: 1,
    }
  }
}

/// Expands `@import` statements before tokenizing.
pub trait ImportInliner {
  /// Returns the chunks that replace `input`, in output order.
  fn inline(&self, input: InputSource, diagnostics: &mut Diagnostics) -> Vec<InputSource>;
}

pub trait UrlRebaser {
  /// Rewrites a relative url address. Only called for relative addresses.
  fn rebase(&self, address: &str) -> String;
}

/// Resolves positions of the input back to the sources it was built from.
pub trait InputSourceMapTracker {
  fn original_position_for(&self, metadata: &Metadata) -> Option<Metadata>;
}

/// Removes `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Rewrites urls written relative to `from_base` so they resolve to the same
/// file when the stylesheet lives in `to_base`.
#[derive(Clone, Debug)]
pub struct PathUrlRebaser {
  pub from_base: PathBuf,
  pub to_base: PathBuf,
}

impl PathUrlRebaser {
  pub fn new(from_base: impl Into<PathBuf>, to_base: impl Into<PathBuf>) -> Self {
    PathUrlRebaser {
      from_base: from_base.into(),
      to_base: to_base.into(),
    }
  }
}

impl UrlRebaser for PathUrlRebaser {
  fn rebase(&self, address: &str) -> String {
    let split = address.find(['?', '#']).unwrap_or(address.len());
    let (path, suffix) = address.split_at(split);

    let absolute = normalize_path(&self.from_base.join(path));
    let to_base = normalize_path(&self.to_base);
    let Some(relative) = diff_paths(&absolute, &to_base) else {
      return address.to_string();
    };

    let mut rebased = relative.to_string_lossy().replace('\\', "/");
    rebased.push_str(suffix);
    rebased
  }
}

/// An `@import` statement split into its parts.
#[derive(Debug, PartialEq, Eq)]
struct ImportStatement<'a> {
  address: &'a str,
  media: &'a str,
}

impl<'a> ImportStatement<'a> {
  /// Parses the text between `@import` and `;`.
  fn parse(rest: &'a str) -> Option<Self> {
    let rest = rest.trim();
    let (address, after) = if starts_with_ignore_case(rest, "url(") {
      let close = find_code(rest, 4, ")")?;
      let inner = rest[4..close].trim();
      let address = inner
        .strip_prefix(['"', '\''])
        .and_then(|inner| inner.strip_suffix(['"', '\'']))
        .unwrap_or(inner);
      (address, &rest[close + 1..])
    } else if rest.starts_with(['"', '\'']) {
      let close = find_closing_quote(rest, 0)?;
      (&rest[1..close], &rest[close + 1..])
    } else {
      return None;
    };
    Some(ImportStatement {
      address,
      media: after.trim(),
    })
  }

  fn is_remote(&self) -> bool {
    self.address.starts_with("//") || (is_absolute_url(self.address) && !self.address.starts_with('/'))
  }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
  text
    .get(..prefix.len())
    .is_some_and(|start| start.eq_ignore_ascii_case(prefix))
}

/// Line and column reached after walking over `text`.
fn advance(text: &str, mut line: u32, mut column: u32) -> (u32, u32) {
  for ch in text.chars() {
    if ch == '\n' {
      line += 1;
      column = 1;
    } else {
      column += 1;
    }
  }
  (line, column)
}

/// Inlines local `@import`s found at the start of a stylesheet.
///
/// Remote imports are kept and hoisted in front of inlined content. Imports
/// that cannot be read, or that were already inlined, are dropped with a
/// warning.
#[derive(Clone, Debug)]
pub struct FsImportInliner {
  /// Directory imports of the root stylesheet are resolved against.
  pub base: PathBuf,
  /// Rebase urls of inlined files so they stay valid from `base`.
  pub rebase_urls: bool,
}

impl FsImportInliner {
  pub fn new(base: impl Into<PathBuf>) -> Self {
    FsImportInliner {
      base: base.into(),
      rebase_urls: true,
    }
  }

  fn read(&self, path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
      std::io::ErrorKind::NotFound => ImportError::NotFound(path.to_path_buf()),
      _ => ImportError::Io {
        path: path.to_path_buf(),
        source,
      },
    })
  }

  fn expand(
    &self,
    input: InputSource,
    directory: &Path,
    seen: &mut HashSet<PathBuf>,
    remote: &mut Vec<InputSource>,
    diagnostics: &mut Diagnostics,
  ) -> Vec<InputSource> {
    let css = input.css.as_str();
    let mut chunks = Vec::new();
    let mut cursor = 0;

    loop {
      let start = cursor + css[cursor..].len() - css[cursor..].trim_start().len();
      let rest = &css[start..];

      if rest.starts_with("/*") {
        let Some(end) = rest[2..].find("*/").map(|offset| start + 2 + offset + 2) else {
          break;
        };
        let (line, column) = advance(&css[..start], input.line, input.column);
        chunks.push(InputSource {
          name: input.name.clone(),
          css: css[start..end].to_string(),
          line,
          column,
        });
        cursor = end;
        continue;
      }

      let is_import = starts_with_ignore_case(rest, "@import");
      let is_charset = starts_with_ignore_case(rest, "@charset");
      if !is_import && !is_charset {
        break;
      }
      let Some(semicolon) = find_code(css, start, ";") else {
        break;
      };

      let (line, column) = advance(&css[..start], input.line, input.column);
      let statement = &css[start..=semicolon];
      let chunk = InputSource {
        name: input.name.clone(),
        css: statement.to_string(),
        line,
        column,
      };
      cursor = semicolon + 1;

      if is_charset {
        chunks.push(chunk);
        continue;
      }

      let Some(import) = ImportStatement::parse(&css[start + 7..semicolon]) else {
        chunks.push(chunk);
        continue;
      };
      if import.is_remote() {
        tracing::debug!(address = import.address, "keeping remote @import");
        remote.push(chunk);
        continue;
      }

      let path = normalize_path(&directory.join(import.address));
      if !seen.insert(path.clone()) {
        diagnostics.warn(ImportError::Circular(path).to_string());
        continue;
      }
      let contents = match self.read(&path) {
        Ok(contents) => contents,
        Err(error) => {
          diagnostics.warn(error.to_string());
          continue;
        }
      };
      tracing::debug!(path = %path.display(), "inlining @import");

      let imported_directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
      let contents = if self.rebase_urls {
        rebase_urls_in(&contents, &PathUrlRebaser::new(&imported_directory, &self.base))
      } else {
        contents
      };
      let imported = InputSource::new(Some(Arc::from(path.to_string_lossy().as_ref())), contents);
      let inner = self.expand(imported, &imported_directory, seen, remote, diagnostics);

      if import.media.is_empty() {
        chunks.extend(inner);
      } else {
        chunks.push(InputSource {
          css: format!("@media {}{{", import.media),
          ..chunk.clone()
        });
        chunks.extend(inner);
        chunks.push(InputSource {
          css: String::from("}"),
          ..chunk
        });
      }
    }

    let (line, column) = advance(&css[..cursor], input.line, input.column);
    chunks.push(InputSource {
      name: input.name.clone(),
      css: css[cursor..].to_string(),
      line,
      column,
    });
    chunks
  }
}

impl ImportInliner for FsImportInliner {
  fn inline(&self, input: InputSource, diagnostics: &mut Diagnostics) -> Vec<InputSource> {
    let mut seen = HashSet::new();
    let mut remote = Vec::new();
    let base = self.base.clone();
    let mut chunks = self.expand(input, &base, &mut seen, &mut remote, diagnostics);
    let charset = chunks
      .first()
      .is_some_and(|chunk| starts_with_ignore_case(&chunk.css, "@charset"));
    let at = usize::from(charset);
    chunks.splice(at..at, remote);
    chunks
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn rebases_between_directories() {
    let rebaser = PathUrlRebaser::new("/site/css/components", "/site/dist");
    assert_eq!(rebaser.rebase("../img/a.png"), "../css/img/a.png");
    assert_eq!(rebaser.rebase("b.svg#icon"), "../css/components/b.svg#icon");
  }

  #[test]
  fn normalizes_paths_lexically() {
    assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
  }

  #[test]
  fn parses_import_statements() {
    assert_eq!(
      ImportStatement::parse(" url('a.css') screen"),
      Some(ImportStatement {
        address: "a.css",
        media: "screen",
      })
    );
    assert_eq!(
      ImportStatement::parse(" \"b.css\""),
      Some(ImportStatement {
        address: "b.css",
        media: "",
      })
    );
    assert_eq!(ImportStatement::parse(" b.css"), None);
  }

  #[test]
  fn recognises_remote_imports() {
    let remote = |address| {
      ImportStatement {
        address,
        media: "",
      }
      .is_remote()
    };
    assert!(remote("https://cdn/x.css"));
    assert!(remote("//cdn/x.css"));
    assert!(!remote("x.css"));
    assert!(!remote("/abs/x.css"));
  }

  #[test]
  fn advances_positions() {
    assert_eq!(advance("ab\ncd", 1, 1), (2, 3));
    assert_eq!(advance("ab", 3, 4), (3, 6));
  }

  #[test]
  fn keeps_content_without_imports_as_one_chunk() {
    let inliner = FsImportInliner::new("/nowhere");
    let mut diagnostics = Diagnostics::default();
    let chunks = inliner.inline(InputSource::new(None, "a{color:red}"), &mut diagnostics);
    assert_eq!(chunks, vec![InputSource::new(None, "a{color:red}")]);
  }

  #[test]
  fn drops_missing_imports_with_a_warning() {
    let inliner = FsImportInliner::new("/nowhere");
    let mut diagnostics = Diagnostics::default();
    let chunks = inliner.inline(
      InputSource::new(None, "@import url(missing.css);\na{}"),
      &mut diagnostics,
    );
    assert_eq!(
      chunks,
      vec![InputSource {
        name: None,
        css: String::from("\na{}"),
        line: 1,
        column: 26,
      }]
    );
    assert_eq!(
      diagnostics.warnings,
      vec![String::from(
        "Ignoring local @import of \"/nowhere/missing.css\" as resource is missing"
      )]
    );
  }

  #[test]
  fn hoists_remote_imports() {
    let inliner = FsImportInliner::new("/nowhere");
    let mut diagnostics = Diagnostics::default();
    let chunks = inliner.inline(
      InputSource::new(None, "@charset \"utf-8\";@import url(//cdn/x.css);a{}"),
      &mut diagnostics,
    );
    let css = chunks.iter().map(|chunk| chunk.css.as_str()).collect::<Vec<_>>();
    assert_eq!(css, vec!["@charset \"utf-8\";", "@import url(//cdn/x.css);", "a{}"]);
  }
}
