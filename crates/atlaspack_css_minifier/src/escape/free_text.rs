use super::placeholder::{PlaceholderKind, PlaceholderStore, PLACEHOLDER_PREFIX};
use super::Processor;
use crate::diagnostics::Diagnostics;
use crate::scanner::{find_closing_quote, next_quote};

/// Replaces quoted strings with placeholders so no later pass can touch the
/// characters inside them.
#[derive(Debug, Clone)]
pub struct FreeTextProcessor {
  store: PlaceholderStore,
  /// Indices standing for placeholder prefixes that were already in the input.
  markers: Vec<usize>,
}

impl FreeTextProcessor {
  pub fn new(waypoints: bool) -> Self {
    FreeTextProcessor {
      store: PlaceholderStore::new(PlaceholderKind::FreeText, waypoints),
      markers: Vec::new(),
    }
  }

  /// Hides every literal placeholder prefix in `text` behind a placeholder of
  /// its own, so text shaped like a placeholder is never restored as one.
  pub fn protect_markers(&mut self, text: &str) -> String {
    if !text.contains(PLACEHOLDER_PREFIX) {
      return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    for (index, part) in text.split(PLACEHOLDER_PREFIX).enumerate() {
      if index > 0 {
        self.markers.push(self.store.next_index());
        output.push_str(&self.store.push(PLACEHOLDER_PREFIX));
      }
      output.push_str(part);
    }
    output
  }

  /// Puts back the prefixes hidden by [`FreeTextProcessor::protect_markers`].
  /// Runs after every other restore.
  pub fn restore_markers(&self, text: &str) -> String {
    if self.markers.is_empty() {
      return text.to_string();
    }
    self.store.restore_where(text, |index| self.markers.contains(&index))
  }
}

impl Processor for FreeTextProcessor {
  fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(open) = next_quote(text, cursor) {
      let Some(close) = find_closing_quote(text, open) else {
        diagnostics.warn(format!(
          "Broken quoted text: '{}'",
          text[open..].chars().take(20).collect::<String>()
        ));
        break;
      };

      output.push_str(&text[cursor..open]);
      output.push_str(&self.store.push(&text[open..=close]));
      cursor = close + 1;
    }

    output.push_str(&text[cursor..]);
    output
  }

  fn restore(&self, text: &str) -> String {
    self.store.restore_where(text, |index| !self.markers.contains(&index))
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn escapes_both_quote_styles() {
    let mut processor = FreeTextProcessor::new(false);
    let mut diagnostics = Diagnostics::default();
    let css = r#"a[title="x;y"]{content:'{\'}'}"#;

    let escaped = processor.escape(css, &mut diagnostics);

    assert_eq!(
      escaped,
      "a[title=__ESCAPED_FREE_TEXT_0__]{content:__ESCAPED_FREE_TEXT_1__}"
    );
    assert_eq!(processor.restore(&escaped), css);
  }

  #[test]
  fn markers_restore_separately_from_quoted_text() {
    let mut processor = FreeTextProcessor::new(false);
    let mut diagnostics = Diagnostics::default();

    let protected = processor.protect_markers(".__ESCAPED_URL_0__{content:'x'}");
    let escaped = processor.escape(&protected, &mut diagnostics);

    assert_eq!(
      escaped,
      ".__ESCAPED_FREE_TEXT_0__URL_0__{content:__ESCAPED_FREE_TEXT_1__}"
    );
    let restored = processor.restore(&escaped);
    assert_eq!(restored, ".__ESCAPED_FREE_TEXT_0__URL_0__{content:'x'}");
    assert_eq!(
      processor.restore_markers(&restored),
      ".__ESCAPED_URL_0__{content:'x'}"
    );
  }

  #[test]
  fn unterminated_quote_stops_the_scan() {
    let mut processor = FreeTextProcessor::new(false);
    let mut diagnostics = Diagnostics::default();

    let escaped = processor.escape("a{content:'x}", &mut diagnostics);

    assert_eq!(escaped, "a{content:'x}");
    assert_eq!(
      diagnostics.warnings,
      vec![String::from("Broken quoted text: ''x}'")]
    );
  }
}
