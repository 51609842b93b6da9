use crate::escape::Escapes;
use crate::options::Format;
use crate::token::{BodyItem, Fragment, Metadata, Token};

/// Receives the output text piece by piece. Pieces that came from the input
/// carry the metadata of where they started.
pub trait Sink {
  fn store(&mut self, text: &str, metadata: Option<&Metadata>);
}

#[derive(Debug, Default)]
pub struct PlainSink {
  output: String,
}

impl PlainSink {
  pub fn into_output(self) -> String {
    self.output
  }
}

impl Sink for PlainSink {
  fn store(&mut self, text: &str, _metadata: Option<&Metadata>) {
    self.output.push_str(text);
  }
}

/// Writes `tokens` to `sink`, putting escaped content back on the way out.
pub fn stringify<S: Sink>(tokens: &[Token], format: &Format, escapes: &Escapes, sink: &mut S) {
  let mut stringifier = Stringifier {
    format,
    escapes,
    sink,
    at_line_start: true,
  };
  stringifier.tokens(tokens, 0);
}

struct Stringifier<'a, S: Sink> {
  format: &'a Format,
  escapes: &'a Escapes,
  sink: &'a mut S,
  at_line_start: bool,
}

impl<S: Sink> Stringifier<'_, S> {
  fn store(&mut self, text: &str, metadata: Option<&Metadata>) {
    if text.is_empty() {
      return;
    }
    self.sink.store(text, metadata);
    self.at_line_start = text.ends_with('\n');
  }

  fn fragment(&mut self, fragment: &Fragment) {
    let restored = self.escapes.restore(&fragment.value);
    self.store(&restored, fragment.metadata.as_ref());
  }

  fn line_break(&mut self, enabled: bool) {
    if enabled {
      self.store("\n", None);
    }
  }

  fn space(&mut self, enabled: bool) {
    if enabled {
      self.store(" ", None);
    }
  }

  fn indent(&mut self, depth: usize) {
    if self.at_line_start {
      let indentation = self.format.indentation(depth);
      self.store(&indentation, None);
    }
  }

  fn is_blank(&self, fragment: &Fragment) -> bool {
    self.escapes.restore(&fragment.value).trim().is_empty()
  }

  fn has_content(&self, body: &[BodyItem]) -> bool {
    body.iter().any(|item| match item {
      BodyItem::Declaration(declaration) => !declaration.value.is_empty(),
      BodyItem::Raw(fragment) => !fragment.value.is_empty(),
      BodyItem::Comment(_) => false,
    })
  }

  fn is_visible(&self, token: &Token) -> bool {
    match token {
      Token::Text(fragment) | Token::Comment(fragment) => !self.is_blank(fragment),
      Token::AtRule(fragment) => !fragment.value.is_empty(),
      Token::Block { children, .. } => children.iter().any(|child| self.is_visible(child)),
      Token::FlatBlock { body, .. } => self.has_content(body),
      Token::Rule { selectors, body } => !selectors.is_empty() && self.has_content(body),
    }
  }

  fn tokens(&mut self, tokens: &[Token], depth: usize) {
    let visible = tokens
      .iter()
      .filter(|token| self.is_visible(token))
      .collect::<Vec<_>>();

    for (index, token) in visible.iter().enumerate() {
      self.token(token, depth);
      if index + 1 < visible.len() {
        let breaks = &self.format.breaks;
        let enabled = match token {
          Token::Rule { .. } => breaks.after_rule_ends,
          Token::Block { .. } | Token::FlatBlock { .. } => breaks.after_block_ends,
          Token::AtRule(_) => breaks.after_at_rule,
          Token::Comment(_) => breaks.after_comment,
          Token::Text(_) => false,
        };
        self.line_break(enabled);
      }
    }
  }

  fn token(&mut self, token: &Token, depth: usize) {
    self.indent(depth);
    match token {
      Token::Text(fragment) | Token::Comment(fragment) => self.fragment(fragment),
      Token::AtRule(fragment) => {
        self.fragment(fragment);
        self.store(";", None);
      }
      Token::Block { header, children } => {
        self.fragment(header);
        self.open(self.format.breaks.after_block_begins);
        self.tokens(children, depth + 1);
        self.close(depth);
      }
      Token::FlatBlock { header, body } => {
        self.fragment(header);
        self.open(self.format.breaks.after_block_begins);
        self.body(body, depth + 1);
        self.close(depth);
      }
      Token::Rule { selectors, body } => {
        self.selectors(selectors, depth);
        self.open(self.format.breaks.after_rule_begins);
        self.body(body, depth + 1);
        self.close(depth);
      }
    }
  }

  fn open(&mut self, line_break: bool) {
    self.space(self.format.spaces.before_block_begins);
    self.store("{", None);
    self.line_break(line_break);
  }

  fn close(&mut self, depth: usize) {
    self.line_break(self.format.breaks.before_block_ends);
    self.indent(depth);
    self.store("}", None);
  }

  fn selectors(&mut self, selectors: &[Fragment], depth: usize) {
    for (index, selector) in selectors.iter().enumerate() {
      if index > 0 {
        self.store(",", None);
        self.line_break(self.format.breaks.between_selectors);
        self.indent(depth);
      }
      let value = if self.format.spaces.around_selector_relation {
        space_relations(&selector.value)
      } else {
        selector.value.clone()
      };
      let restored = self.escapes.restore(&value);
      self.store(&restored, selector.metadata.as_ref());
    }
  }

  fn body(&mut self, body: &[BodyItem], depth: usize) {
    let visible = body
      .iter()
      .filter(|item| match item {
        BodyItem::Declaration(declaration) => !declaration.value.is_empty(),
        BodyItem::Comment(fragment) | BodyItem::Raw(fragment) => !self.is_blank(fragment),
      })
      .collect::<Vec<_>>();

    for (index, item) in visible.iter().enumerate() {
      self.indent(depth);
      let last = index + 1 == visible.len();
      match item {
        BodyItem::Declaration(declaration) => {
          self.fragment(&declaration.name);
          self.store(":", None);
          self.space(self.format.spaces.before_value);
          let value = self.escapes.restore(&declaration.value);
          self.store(&value, None);
          if declaration.important {
            self.store("!important", None);
          }
          if !last || self.format.semicolon_after_last_property {
            self.store(";", None);
          }
          if !last {
            self.line_break(self.format.breaks.after_property);
          }
        }
        BodyItem::Raw(fragment) => {
          self.fragment(fragment);
          if !last {
            self.line_break(self.format.breaks.after_property);
          }
        }
        BodyItem::Comment(fragment) => {
          self.fragment(fragment);
          if !last {
            self.line_break(self.format.breaks.after_comment);
          }
        }
      }
    }
  }
}

/// Surrounds `>`, `+` and `~` combinators with single spaces.
fn space_relations(selector: &str) -> String {
  let mut output = String::with_capacity(selector.len() + 4);
  let mut nesting = 0usize;
  for ch in selector.chars() {
    match ch {
      '(' | '[' => {
        nesting += 1;
        output.push(ch);
      }
      ')' | ']' => {
        nesting = nesting.saturating_sub(1);
        output.push(ch);
      }
      '>' | '+' | '~' if nesting == 0 => {
        if !output.ends_with(' ') {
          output.push(' ');
        }
        output.push(ch);
        output.push(' ');
      }
      ' ' if nesting == 0 && output.ends_with(' ') => {}
      _ => output.push(ch),
    }
  }
  output
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::diagnostics::Diagnostics;
  use crate::options::SpecialComments;

  fn render(tokens: &[Token], format: &Format) -> String {
    let escapes = Escapes::new(SpecialComments::All, false);
    let mut sink = PlainSink::default();
    stringify(tokens, format, &escapes, &mut sink);
    sink.into_output()
  }

  fn sample() -> Vec<Token> {
    vec![
      Token::AtRule(Fragment::new("@import url(a.css)")),
      Token::rule(&["a", "b>c"], &[("color", "red"), ("margin", "0")]),
      Token::Block {
        header: Fragment::new("@media print"),
        children: vec![Token::rule(&["p"], &[("display", "none")])],
      },
    ]
  }

  #[test]
  fn writes_minified_output() {
    assert_eq!(
      render(&sample(), &Format::minified()),
      "@import url(a.css);a,b>c{color:red;margin:0}@media print{p{display:none}}"
    );
  }

  #[test]
  fn writes_beautified_output() {
    assert_eq!(
      render(&sample(), &Format::beautify()),
      "@import url(a.css);\na,\nb > c {\n  color: red;\n  margin: 0\n}\n@media print {\n  p {\n    display: none\n  }\n}"
    );
  }

  #[test]
  fn keeps_breaks_between_statements() {
    assert_eq!(
      render(&sample(), &Format::keep_breaks()),
      "@import url(a.css);\na,b>c{color:red;margin:0}\n@media print{p{display:none}}"
    );
  }

  #[test]
  fn omits_empty_rules_and_blocks() {
    let tokens = vec![
      Token::rule(&["a"], &[]),
      Token::rule(&["b"], &[("color", "")]),
      Token::Block {
        header: Fragment::new("@media print"),
        children: vec![Token::rule(&["p"], &[])],
      },
      Token::rule(&["c"], &[("color", "red")]),
    ];
    assert_eq!(render(&tokens, &Format::minified()), "c{color:red}");
  }

  #[test]
  fn restores_placeholders() {
    let mut escapes = Escapes::new(SpecialComments::All, false);
    let mut diagnostics = Diagnostics::default();
    let escaped = escapes.escape("/*! x */a{content:\"}\"}", &mut diagnostics);
    assert_eq!(escaped, "__ESCAPED_COMMENT_0__a{content:__ESCAPED_FREE_TEXT_0__}");

    let tokens = vec![
      Token::Comment(Fragment::new("__ESCAPED_COMMENT_0__")),
      Token::rule(&["a"], &[("content", "__ESCAPED_FREE_TEXT_0__")]),
    ];
    let mut sink = PlainSink::default();
    stringify(&tokens, &Format::minified(), &escapes, &mut sink);
    assert_eq!(sink.into_output(), "/*! x */a{content:\"}\"}");
  }

  #[test]
  fn adds_the_trailing_semicolon_on_request() {
    let format = Format {
      semicolon_after_last_property: true,
      ..Format::minified()
    };
    assert_eq!(
      render(&[Token::rule(&["a"], &[("color", "red")])], &format),
      "a{color:red;}"
    );
  }

  #[test]
  fn spaces_selector_relations() {
    assert_eq!(space_relations("a>b+c~d"), "a > b + c ~ d");
    assert_eq!(space_relations("a > b"), "a > b");
    assert_eq!(space_relations("li:nth-child(2n+1)"), "li:nth-child(2n+1)");
  }
}
