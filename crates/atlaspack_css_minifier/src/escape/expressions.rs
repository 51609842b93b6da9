use super::placeholder::{PlaceholderKind, PlaceholderStore};
use super::Processor;
use crate::diagnostics::Diagnostics;
use crate::scanner::{find_closing_paren, find_code_ignore_case};

const EXPRESSION_START: &str = "expression(";

/// Protects legacy `expression(...)` values, which may contain any character
/// including braces and semicolons.
#[derive(Debug, Clone)]
pub struct ExpressionsProcessor {
  store: PlaceholderStore,
}

impl ExpressionsProcessor {
  pub fn new(waypoints: bool) -> Self {
    ExpressionsProcessor {
      store: PlaceholderStore::new(PlaceholderKind::Expression, waypoints),
    }
  }
}

impl Processor for ExpressionsProcessor {
  fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(start) = find_code_ignore_case(text, cursor, EXPRESSION_START) {
      let open = start + EXPRESSION_START.len() - 1;
      let Some(close) = find_closing_paren(text, open) else {
        diagnostics.warn(format!(
          "Broken expression: '{}'",
          text[start..].chars().take(20).collect::<String>()
        ));
        break;
      };

      output.push_str(&text[cursor..start]);
      output.push_str(&self.store.push(&text[start..=close]));
      cursor = close + 1;
    }

    output.push_str(&text[cursor..]);
    output
  }

  fn restore(&self, text: &str) -> String {
    self.store.restore(text)
  }
}
