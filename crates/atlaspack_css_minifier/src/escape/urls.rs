use super::placeholder::{PlaceholderKind, PlaceholderStore};
use super::Processor;
use crate::collaborators::UrlRebaser;
use crate::diagnostics::Diagnostics;
use crate::scanner::{find_code, find_code_ignore_case};

const URL_START: &str = "url(";

/// Replaces `url(...)` tokens with placeholders. The stored originals can be
/// normalized and rebased before they are restored.
#[derive(Debug, Clone)]
pub struct UrlsProcessor {
  store: PlaceholderStore,
}

impl UrlsProcessor {
  pub fn new(waypoints: bool) -> Self {
    UrlsProcessor {
      store: PlaceholderStore::new(PlaceholderKind::Url, waypoints),
    }
  }

  /// Drops redundant whitespace and quotes inside every escaped URL.
  pub fn normalize(&mut self) {
    for original in self.store.originals_mut() {
      if let Some(url) = ParsedUrl::parse(original) {
        *original = url.to_string();
      }
    }
  }

  pub fn rebase(&mut self, rebaser: &dyn UrlRebaser) {
    for original in self.store.originals_mut() {
      *original = rebase_url(original, rebaser);
    }
  }
}

impl Processor for UrlsProcessor {
  fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(start) = find_code_ignore_case(text, cursor, URL_START) {
      let Some(close) = find_code(text, start + URL_START.len(), ")") else {
        diagnostics.warn(format!(
          "Broken URL: '{}'",
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

/// A `url(...)` token split into its address and optional quote.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedUrl<'a> {
  address: &'a str,
  quote: Option<char>,
}

impl<'a> ParsedUrl<'a> {
  fn parse(token: &'a str) -> Option<Self> {
    if token.len() < URL_START.len() + 1
      || !token[..URL_START.len()].eq_ignore_ascii_case(URL_START)
      || !token.ends_with(')')
    {
      return None;
    }

    let inner = token[URL_START.len()..token.len() - 1].trim();
    let quote = inner.chars().next().filter(|c| *c == '"' || *c == '\'');
    match quote {
      Some(quote) if inner.len() >= 2 && inner.ends_with(quote) => Some(ParsedUrl {
        address: &inner[1..inner.len() - 1],
        quote: Some(quote),
      }),
      Some(_) => None,
      None => Some(ParsedUrl {
        address: inner,
        quote: None,
      }),
    }
  }

  fn needs_quotes(address: &str) -> bool {
    address.is_empty()
      || address
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '(' | ')' | '\\'))
  }
}

impl std::fmt::Display for ParsedUrl<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if Self::needs_quotes(self.address) {
      let quote = self.quote.unwrap_or('"');
      write!(f, "url({quote}{}{quote})", self.address)
    } else {
      write!(f, "url({})", self.address)
    }
  }
}

/// Whether `address` points somewhere that does not depend on the location
/// of the stylesheet referencing it.
pub fn is_absolute_url(address: &str) -> bool {
  let scheme_end = address
    .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')))
    .unwrap_or(address.len());

  address.is_empty()
    || address.starts_with('/')
    || address.starts_with('#')
    || (scheme_end > 0 && address[scheme_end..].starts_with(':'))
}

/// Rewrites the address of a single `url(...)` token through `rebaser`,
/// keeping its quoting style.
pub fn rebase_url(token: &str, rebaser: &dyn UrlRebaser) -> String {
  let Some(url) = ParsedUrl::parse(token) else {
    return token.to_string();
  };
  if is_absolute_url(url.address) {
    return token.to_string();
  }

  let rebased = rebaser.rebase(url.address);
  match url.quote {
    Some(quote) => format!("url({quote}{rebased}{quote})"),
    None if ParsedUrl::needs_quotes(&rebased) => format!("url(\"{rebased}\")"),
    None => format!("url({rebased})"),
  }
}

/// Rebases every `url(...)` token found in plain stylesheet text.
pub fn rebase_urls_in(text: &str, rebaser: &dyn UrlRebaser) -> String {
  let mut output = String::with_capacity(text.len());
  let mut cursor = 0;

  while let Some(start) = find_code_ignore_case(text, cursor, URL_START) {
    let Some(close) = find_code(text, start + URL_START.len(), ")") else {
      break;
    };
    output.push_str(&text[cursor..start]);
    output.push_str(&rebase_url(&text[start..=close], rebaser));
    cursor = close + 1;
  }

  output.push_str(&text[cursor..]);
  output
}
