//! Protected spans: comments, legacy expressions, URLs and quoted strings
//! are swapped for placeholders before tokenizing so structural scanning
//! never looks inside them.

pub mod comments;
pub mod expressions;
pub mod free_text;
pub mod placeholder;
pub mod urls;

use crate::diagnostics::Diagnostics;
use crate::options::SpecialComments;

use self::comments::CommentsProcessor;
use self::expressions::ExpressionsProcessor;
use self::free_text::FreeTextProcessor;
use self::placeholder::PLACEHOLDER_PREFIX;
use self::urls::UrlsProcessor;

pub trait Processor {
  /// Replaces every protected span in `text` with a placeholder.
  fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String;

  /// Puts the originals back in place of this processor's placeholders.
  fn restore(&self, text: &str) -> String;
}

/// All processors of a run. Escaping first hides placeholder prefixes already
/// present in the input, then goes comments, expressions, URLs and quoted
/// text; restoring walks the same chain backwards.
#[derive(Debug, Clone)]
pub struct Escapes {
  pub comments: CommentsProcessor,
  pub expressions: ExpressionsProcessor,
  pub urls: UrlsProcessor,
  pub free_text: FreeTextProcessor,
}

impl Escapes {
  pub fn new(special_comments: SpecialComments, waypoints: bool) -> Self {
    Escapes {
      comments: CommentsProcessor::new(special_comments, waypoints),
      expressions: ExpressionsProcessor::new(waypoints),
      urls: UrlsProcessor::new(waypoints),
      free_text: FreeTextProcessor::new(waypoints),
    }
  }

  pub fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String {
    let text = self.free_text.protect_markers(text);
    let text = self.comments.escape(&text, diagnostics);
    let text = self.expressions.escape(&text, diagnostics);
    let text = self.urls.escape(&text, diagnostics);
    self.free_text.escape(&text, diagnostics)
  }

  pub fn restore(&self, text: &str) -> String {
    if !text.contains(PLACEHOLDER_PREFIX) {
      return text.to_string();
    }
    let text = self.free_text.restore(text);
    let text = self.urls.restore(&text);
    let text = self.expressions.restore(&text);
    let text = self.comments.restore(&text);
    self.free_text.restore_markers(&text)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn restore_reverses_escape() {
    let css = r#"/*! keep */a{content:"/* x */";background:url("a b.png");width:expression(1+1)}/* drop */"#;
    let mut escapes = Escapes::new(SpecialComments::All, false);
    let mut diagnostics = Diagnostics::default();

    let escaped = escapes.escape(css, &mut diagnostics);

    assert_eq!(
      escaped,
      "__ESCAPED_COMMENT_0__a{content:__ESCAPED_FREE_TEXT_0__;background:__ESCAPED_URL_0__;width:__ESCAPED_EXPRESSION_0__}"
    );
    assert_eq!(
      escapes.restore(&escaped),
      r#"/*! keep */a{content:"/* x */";background:url("a b.png");width:expression(1+1)}"#
    );
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn quoted_text_inside_a_url_is_restored() {
    let mut escapes = Escapes::new(SpecialComments::All, false);
    let mut diagnostics = Diagnostics::default();

    let escaped = escapes.escape("a{b:url('x.png') 'y'}", &mut diagnostics);

    assert_eq!(escaped, "a{b:__ESCAPED_URL_0__ __ESCAPED_FREE_TEXT_0__}");
    assert_eq!(escapes.restore(&escaped), "a{b:url('x.png') 'y'}");
  }

  #[test]
  fn placeholder_shaped_input_survives_a_round_trip() {
    let css = "/* __ESCAPED_COMMENT_0__ */a{b:url(x)}.__ESCAPED_URL_0__{c:\"__ESCAPED_FREE_TEXT_1__\"}";
    let mut escapes = Escapes::new(SpecialComments::All, false);
    let mut diagnostics = Diagnostics::default();

    let escaped = escapes.escape(css, &mut diagnostics);

    assert_eq!(
      escapes.restore(&escaped),
      "a{b:url(x)}.__ESCAPED_URL_0__{c:\"__ESCAPED_FREE_TEXT_1__\"}"
    );

    let mut escapes = Escapes::new(SpecialComments::All, true);
    let kept = "/*! __ESCAPED_COMMENT_0__ */a{b:url(x)}.__ESCAPED_URL_0__{c:d}";
    let escaped = escapes.escape(kept, &mut diagnostics);
    assert_eq!(escapes.restore(&escaped), kept);
  }
}
