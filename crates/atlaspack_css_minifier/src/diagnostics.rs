/// Non-fatal problems collected over a single minification run.
///
/// Nothing in the pipeline aborts on malformed input; every recoverable
/// problem lands here and the run carries on with a best-effort result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
  pub warnings: Vec<String>,
  pub errors: Vec<String>,
}

impl Diagnostics {
  pub fn warn(&mut self, message: impl Into<String>) {
    let message = message.into();
    tracing::debug!(%message, "css minifier warning");
    self.warnings.push(message);
  }

  pub fn error(&mut self, message: impl Into<String>) {
    let message = message.into();
    tracing::debug!(%message, "css minifier error");
    self.errors.push(message);
  }

  pub fn is_empty(&self) -> bool {
    self.warnings.is_empty() && self.errors.is_empty()
  }
}

/// Errors raised by the collaborators around the core pipeline.
///
/// They are always converted into diagnostics before they reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("Ignoring local @import of {0:?} as resource is missing")]
  NotFound(std::path::PathBuf),
  #[error("Ignoring local @import of {0:?} as it has already been imported")]
  Circular(std::path::PathBuf),
  #[error("Failed to read @import of {path:?}")]
  Io {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, thiserror::Error)]
pub enum SourceMapError {
  #[error("Invalid input source map")]
  Invalid(#[from] sourcemap::Error),
  #[error("Unsupported source map annotation {0:?}")]
  UnsupportedAnnotation(String),
  #[error("Failed to decode inline source map")]
  Decode(#[from] base64::DecodeError),
  #[error("Failed to read source map file {path:?}")]
  Io {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to serialize source map")]
  Serialize(#[source] sourcemap::Error),
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn collects_warnings_and_errors_separately() {
    let mut diagnostics = Diagnostics::default();
    assert!(diagnostics.is_empty());

    diagnostics.warn("Broken comment");
    diagnostics.error("Bad import");

    assert_eq!(diagnostics.warnings, vec![String::from("Broken comment")]);
    assert_eq!(diagnostics.errors, vec![String::from("Bad import")]);
  }

  #[test]
  fn import_errors_render_the_path() {
    let error = ImportError::NotFound("missing.css".into());
    assert_eq!(
      error.to_string(),
      "Ignoring local @import of \"missing.css\" as resource is missing"
    );
  }
}
