//! Syntactic tidy-up: every change here is local to a single value,
//! selector or header and never depends on the cascade.

use crate::diagnostics::Diagnostics;
use crate::escape::placeholder::{Placeholder, PLACEHOLDER_PREFIX};
use crate::options::{Compatibility, Level1Options};
use crate::scanner::find_closing_paren;
use crate::selectors::{tidy_rule_duplicates, tidy_selector};
use crate::token::{BodyItem, Token};
use crate::tokenizer::collapse_whitespace;
use crate::values::{rgb_to_hex, shorten_color, shorten_number};

const MATH_SCOPES: &[&str] = &["calc", "-webkit-calc", "-moz-calc", "min", "max", "clamp"];

const BORDER_LIKE: &[&str] = &[
  "border",
  "border-top",
  "border-right",
  "border-bottom",
  "border-left",
  "outline",
];

#[tracing::instrument(level = "debug", skip_all)]
pub fn optimize(
  tokens: &mut Vec<Token>,
  options: &Level1Options,
  compatibility: &Compatibility,
  diagnostics: &mut Diagnostics,
) {
  if options.cleanup_charset {
    cleanup_charset(tokens);
  }
  optimize_tokens(tokens, options, compatibility, diagnostics);
}

fn optimize_tokens(
  tokens: &mut Vec<Token>,
  options: &Level1Options,
  compatibility: &Compatibility,
  diagnostics: &mut Diagnostics,
) {
  for token in tokens.iter_mut() {
    match token {
      Token::Rule { selectors, body } => {
        if options.tidy_selectors {
          for selector in selectors.iter_mut() {
            selector.value = tidy_selector(&selector.value);
          }
          *selectors = tidy_rule_duplicates(std::mem::take(selectors));
        }
        optimize_body(body, options, compatibility, diagnostics);
      }
      Token::FlatBlock { header, body } => {
        if options.tidy_at_rules {
          header.value = tidy_at_rule(&header.value);
        }
        optimize_body(body, options, compatibility, diagnostics);
      }
      Token::Block { header, children } => {
        if options.tidy_at_rules {
          header.value = tidy_at_rule(&header.value);
        }
        optimize_tokens(children, options, compatibility, diagnostics);
      }
      Token::AtRule(fragment) => {
        if options.tidy_at_rules {
          fragment.value = tidy_at_rule(&fragment.value);
        }
      }
      Token::Text(_) | Token::Comment(_) => {}
    }
  }

  if options.remove_empty {
    tokens.retain(|token| !is_empty(token));
  }
}

fn is_empty(token: &Token) -> bool {
  match token {
    Token::Rule { selectors, body } => selectors.is_empty() || body.is_empty(),
    Token::FlatBlock { body, .. } => body.is_empty(),
    Token::Block { children, .. } => children.is_empty(),
    Token::Text(fragment) => fragment.value.trim().is_empty(),
    Token::AtRule(_) | Token::Comment(_) => false,
  }
}

/// Keeps the first `@charset` only, moved to the very beginning.
fn cleanup_charset(tokens: &mut Vec<Token>) {
  let is_charset = |token: &Token| {
    matches!(token, Token::AtRule(fragment) if Token::at_rule_name(&fragment.value) == "@charset")
  };
  let Some(first) = tokens.iter().position(is_charset) else {
    return;
  };
  let charset = tokens.remove(first);
  tokens.retain(|token| !is_charset(token));
  tokens.insert(0, charset);
}

fn optimize_body(
  body: &mut Vec<BodyItem>,
  options: &Level1Options,
  compatibility: &Compatibility,
  diagnostics: &mut Diagnostics,
) {
  body.retain_mut(|item| {
    let BodyItem::Declaration(declaration) = item else {
      return true;
    };
    if !declaration.name.value.starts_with("--") {
      declaration.name.value = declaration.name.value.to_ascii_lowercase();
    }
    let name = declaration.name.value.as_str();
    let value = optimize_value(name, &declaration.value, options, compatibility);
    if value.is_empty() {
      let location = declaration
        .name
        .metadata
        .as_ref()
        .map(|metadata| format!(" at {}:{}", metadata.line, metadata.column))
        .unwrap_or_default();
      diagnostics.warn(format!("Empty property '{name}'{location}. Ignoring."));
      return false;
    }
    declaration.value = value;
    true
  });
}

fn carries_color(name: &str) -> bool {
  name.contains("color")
    || name.starts_with("background")
    || name.starts_with("border")
    || name.starts_with("outline")
    || matches!(
      name,
      "box-shadow" | "text-shadow" | "fill" | "stroke" | "column-rule" | "text-decoration"
    )
}

/// Tidies one declaration value.
pub fn optimize_value(
  name: &str,
  value: &str,
  options: &Level1Options,
  compatibility: &Compatibility,
) -> String {
  if name.starts_with("--")
    || name == "filter"
    || name == "-ms-filter"
    || value.contains("progid:")
  {
    return value.to_string();
  }

  let mut value = ValueWalker {
    options,
    colors: options.optimize_colors && carries_color(name),
    keep_zero_units: !compatibility.properties.zero_units
      || matches!(name, "flex" | "flex-basis" | "-webkit-flex" | "-ms-flex"),
    output: String::with_capacity(value.len()),
    functions: Vec::new(),
  }
  .walk(value);

  if options.optimize_font_weight && name == "font-weight" {
    match value.to_ascii_lowercase().as_str() {
      "normal" => value = String::from("400"),
      "bold" => value = String::from("700"),
      _ => {}
    }
  }

  if options.optimize_borders && BORDER_LIKE.contains(&name) && value.eq_ignore_ascii_case("none") {
    value = String::from("0");
  }

  value
}

struct ValueWalker<'a> {
  options: &'a Level1Options,
  colors: bool,
  keep_zero_units: bool,
  output: String,
  functions: Vec<String>,
}

impl ValueWalker<'_> {
  fn walk(mut self, value: &str) -> String {
    let mut offset = 0;
    let mut atom_start = 0;

    while offset < value.len() {
      if value[offset..].starts_with(PLACEHOLDER_PREFIX) {
        if let Some((_, length)) = Placeholder::parse_at(value, offset) {
          self.atom(&value[atom_start..offset]);
          self.output.push_str(&value[offset..offset + length]);
          offset += length;
          atom_start = offset;
          continue;
        }
      }

      let Some(ch) = value[offset..].chars().next() else {
        break;
      };
      match ch {
        '(' => {
          let name = value[atom_start..offset].to_ascii_lowercase();
          if self.colors && (name == "rgb" || name == "rgba") {
            if let Some(close) = find_closing_paren(value, offset) {
              if let Some(hex) = rgb_to_hex(&value[offset + 1..close]) {
                self.atom(&hex);
                offset = close + 1;
                atom_start = offset;
                continue;
              }
            }
          }
          self.output.push_str(&value[atom_start..=offset]);
          self.functions.push(name);
          offset += 1;
          atom_start = offset;
        }
        ')' | ',' | '/' | ' ' => {
          self.atom(&value[atom_start..offset]);
          if ch == ')' {
            self.functions.pop();
          }
          self.output.push(ch);
          offset += 1;
          atom_start = offset;
        }
        _ => offset += ch.len_utf8(),
      }
    }
    self.atom(&value[atom_start..]);
    self.output
  }

  fn in_math(&self) -> bool {
    self
      .functions
      .iter()
      .any(|function| MATH_SCOPES.contains(&function.as_str()))
  }

  fn atom(&mut self, atom: &str) {
    if atom.is_empty() {
      return;
    }
    if self.options.optimize_numbers {
      let drop_zero_unit = !self.keep_zero_units && !self.in_math();
      if let Some(shortened) = shorten_number(atom, drop_zero_unit) {
        self.output.push_str(&shortened);
        return;
      }
    }
    if self.colors && self.functions.is_empty() {
      if let Some(shortened) = shorten_color(atom) {
        self.output.push_str(&shortened);
        return;
      }
    }
    self.output.push_str(atom);
  }
}

/// Collapses whitespace in an at-rule header and drops it where it carries
/// no meaning.
pub fn tidy_at_rule(header: &str) -> String {
  let collapsed = collapse_whitespace(header);
  let mut output = String::with_capacity(collapsed.len());
  let mut chars = collapsed.chars().peekable();

  while let Some(ch) = chars.next() {
    match ch {
      ' ' if matches!(chars.peek(), Some(':' | ',' | ')')) => {}
      ':' | ',' | '(' => {
        output.push(ch);
        if chars.peek() == Some(&' ') {
          chars.next();
        }
      }
      _ => output.push(ch),
    }
  }
  output
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::token::Fragment;

  fn value(name: &str, value: &str) -> String {
    optimize_value(name, value, &Level1Options::default(), &Compatibility::default())
  }

  fn run(mut tokens: Vec<Token>) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    optimize(
      &mut tokens,
      &Level1Options::default(),
      &Compatibility::default(),
      &mut diagnostics,
    );
    (tokens, diagnostics)
  }

  #[test]
  fn shortens_colors_in_color_properties() {
    assert_eq!(value("color", "#f00"), "red");
    assert_eq!(value("color", "#FFFFFF"), "#fff");
    assert_eq!(value("background", "white url(x)"), "#fff url(x)");
    assert_eq!(value("border-color", "rgb(255,0,0)"), "red");
    assert_eq!(value("color", "rgba(0,0,0,.5)"), "rgba(0,0,0,.5)");
  }

  #[test]
  fn leaves_colors_alone_elsewhere() {
    assert_eq!(value("font-family", "white"), "white");
    assert_eq!(value("animation-name", "red"), "red");
  }

  #[test]
  fn shortens_numbers_and_zero_units() {
    assert_eq!(value("margin", "0px 0.50em -0.5px 1.0px"), "0 .5em -.5px 1px");
    assert_eq!(value("transition", "opacity 0s"), "opacity 0s");
    assert_eq!(value("width", "calc(100% - 0px)"), "calc(100% - 0px)");
    assert_eq!(value("flex", "1 1 0px"), "1 1 0px");
    assert_eq!(value("--gap", "0px"), "0px");
  }

  #[test]
  fn keeps_zero_units_for_legacy_browsers() {
    let mut compatibility = Compatibility::default();
    compatibility.properties.zero_units = false;
    assert_eq!(
      optimize_value("margin", "0px", &Level1Options::default(), &compatibility),
      "0px"
    );
  }

  #[test]
  fn rewrites_keywords() {
    assert_eq!(value("font-weight", "bold"), "700");
    assert_eq!(value("font-weight", "normal"), "400");
    assert_eq!(value("border", "none"), "0");
    assert_eq!(value("outline", "none"), "0");
    assert_eq!(value("display", "none"), "none");
  }

  #[test]
  fn leaves_placeholders_and_filters_untouched() {
    assert_eq!(value("background", "__ESCAPED_URL_0(0,12)__ 0px"), "__ESCAPED_URL_0(0,12)__ 0");
    assert_eq!(
      value("filter", "progid:DXImageTransform.Microsoft.Alpha(Opacity=80)"),
      "progid:DXImageTransform.Microsoft.Alpha(Opacity=80)"
    );
  }

  #[test]
  fn tidies_at_rule_headers() {
    assert_eq!(
      tidy_at_rule("@media  screen and ( max-width : 100px ) , print"),
      "@media screen and (max-width:100px),print"
    );
    assert_eq!(tidy_at_rule("@supports (display: grid)"), "@supports (display:grid)");
  }

  #[test]
  fn tidies_rules_and_removes_empty_ones() {
    let (tokens, _) = run(vec![
      Token::rule(&["b", "a > p", "b"], &[("COLOR", "#ff0000")]),
      Token::rule(&["div"], &[]),
      Token::Block {
        header: Fragment::new("@media print"),
        children: vec![Token::rule(&["p"], &[])],
      },
    ]);

    assert_eq!(tokens, vec![Token::rule(&["a>p", "b"], &[("color", "red")])]);
  }

  #[test]
  fn moves_the_first_charset_to_the_front() {
    let (tokens, _) = run(vec![
      Token::rule(&["a"], &[("color", "red")]),
      Token::AtRule(Fragment::new("@charset \"utf-8\"")),
      Token::AtRule(Fragment::new("@charset \"latin1\"")),
    ]);

    assert_eq!(
      tokens,
      vec![
        Token::AtRule(Fragment::new("@charset \"utf-8\"")),
        Token::rule(&["a"], &[("color", "red")]),
      ]
    );
  }

  #[test]
  fn drops_values_that_end_up_empty() {
    let (tokens, diagnostics) = run(vec![Token::rule(&["a"], &[("color", ""), ("margin", "0")])]);
    assert_eq!(tokens, vec![Token::rule(&["a"], &[("margin", "0")])]);
    assert_eq!(diagnostics.warnings, vec![String::from("Empty property 'color'. Ignoring.")]);
  }
}
