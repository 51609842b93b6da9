//! Turns escaped stylesheet text into a [`Token`] tree.
//!
//! The input has already been through [`crate::escape`], so the only
//! structural characters left are `{`, `}` and `;`.

pub mod extract;
pub mod position;
pub mod split;

use crate::diagnostics::Diagnostics;
use crate::escape::placeholder::{Placeholder, PlaceholderKind};
use crate::token::{Fragment, Token};

use self::extract::extract_properties;
use self::position::{PositionTracker, SourceBoundary};
use self::split::split_with_offsets;

/// At-rules whose body holds rules rather than declarations.
const NESTED_BLOCKS: &[&str] = &[
  "@container",
  "@document",
  "@-moz-document",
  "@keyframes",
  "@-moz-keyframes",
  "@-o-keyframes",
  "@-webkit-keyframes",
  "@layer",
  "@media",
  "@scope",
  "@starting-style",
  "@supports",
];

pub fn is_nested_block(name: &str) -> bool {
  NESTED_BLOCKS.contains(&name)
}

pub fn collapse_whitespace(value: &str) -> String {
  value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[tracing::instrument(level = "debug", skip_all, fields(length = text.len()))]
pub fn tokenize(
  text: &str,
  boundaries: Vec<SourceBoundary>,
  diagnostics: &mut Diagnostics,
) -> Vec<Token> {
  let mut tokenizer = Tokenizer {
    text,
    tracker: PositionTracker::with_boundaries(text, boundaries),
    diagnostics,
  };
  tokenizer.tokens(0, text.len())
}

struct Tokenizer<'a, 'd> {
  text: &'a str,
  tracker: PositionTracker<'a>,
  diagnostics: &'d mut Diagnostics,
}

impl<'a> Tokenizer<'a, '_> {
  fn tokens(&mut self, start: usize, end: usize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut cursor = start;

    loop {
      cursor = self.skip_whitespace(cursor, end);
      if cursor >= end {
        break;
      }

      if let Some((placeholder, length)) = Placeholder::parse_at(self.text, cursor) {
        if placeholder.kind == PlaceholderKind::Comment {
          let metadata = self.tracker.metadata_at(cursor);
          tokens.push(Token::Comment(Fragment::with_metadata(
            &self.text[cursor..cursor + length],
            metadata,
          )));
          cursor += length;
          continue;
        }
      }

      match self.next_structural(cursor, end) {
        None => {
          self.statement(&mut tokens, cursor, end);
          cursor = end;
        }
        Some((position, b';')) => {
          self.statement(&mut tokens, cursor, position);
          cursor = position + 1;
        }
        Some((position, b'}')) => {
          let metadata = self.tracker.metadata_at(position);
          self.diagnostics.warn(format!(
            "Unexpected '}}' at {}:{}. Ignoring.",
            metadata.line, metadata.column
          ));
          cursor = position + 1;
        }
        Some((open, _)) => {
          let close = self.matching_brace(open, end);
          let body_end = close.unwrap_or(end);
          if close.is_none() {
            let metadata = self.tracker.metadata_at(cursor);
            self.diagnostics.warn(format!(
              "Missing '}}' for block at {}:{}.",
              metadata.line, metadata.column
            ));
          }
          if let Some(token) = self.block(cursor, open, body_end) {
            tokens.push(token);
          }
          cursor = close.map(|close| close + 1).unwrap_or(end);
        }
      }
    }

    tokens
  }

  fn block(&mut self, start: usize, open: usize, end: usize) -> Option<Token> {
    let header = self.text[start..open].trim_end();

    if header.starts_with('@') {
      let fragment = Fragment::with_metadata(collapse_whitespace(header), self.tracker.metadata_at(start));
      let name = Token::at_rule_name(header);
      if is_nested_block(&name) {
        return Some(Token::Block {
          header: fragment,
          children: self.tokens(open + 1, end),
        });
      }
      return Some(Token::FlatBlock {
        header: fragment,
        body: extract_properties(self.text, open + 1, end, &mut self.tracker, self.diagnostics),
      });
    }

    let selectors = self.selectors(start, header);
    if selectors.is_empty() {
      let metadata = self.tracker.metadata_at(start);
      self.diagnostics.warn(format!(
        "Missing selector at {}:{}. Ignoring.",
        metadata.line, metadata.column
      ));
      return None;
    }

    Some(Token::Rule {
      selectors,
      body: extract_properties(self.text, open + 1, end, &mut self.tracker, self.diagnostics),
    })
  }

  fn selectors(&mut self, start: usize, header: &str) -> Vec<Fragment> {
    let mut selectors = Vec::new();
    for (offset, part) in split_with_offsets(header, ',') {
      let leading = part.len() - part.trim_start().len();
      let value = collapse_whitespace(part);
      if value.is_empty() {
        continue;
      }
      let metadata = self.tracker.metadata_at(start + offset + leading);
      selectors.push(Fragment::with_metadata(value, metadata));
    }
    selectors
  }

  fn statement(&mut self, tokens: &mut Vec<Token>, start: usize, end: usize) {
    let raw = self.text[start..end].trim_end();
    if raw.is_empty() {
      return;
    }

    let metadata = self.tracker.metadata_at(start);
    if raw.starts_with('@') {
      tokens.push(Token::AtRule(Fragment::with_metadata(collapse_whitespace(raw), metadata)));
    } else {
      self.diagnostics.warn(format!(
        "Unexpected content '{}' at {}:{}. Keeping it verbatim.",
        raw.chars().take(20).collect::<String>(),
        metadata.line,
        metadata.column
      ));
      tokens.push(Token::Text(Fragment::with_metadata(raw, metadata)));
    }
  }

  fn skip_whitespace(&self, mut cursor: usize, end: usize) -> usize {
    let bytes = self.text.as_bytes();
    while cursor < end && bytes[cursor].is_ascii_whitespace() {
      cursor += 1;
    }
    cursor
  }

  fn next_structural(&self, from: usize, end: usize) -> Option<(usize, u8)> {
    let bytes = self.text.as_bytes();
    (from..end)
      .find(|&index| matches!(bytes[index], b'{' | b'}' | b';'))
      .map(|index| (index, bytes[index]))
  }

  fn matching_brace(&self, open: usize, end: usize) -> Option<usize> {
    let bytes = self.text.as_bytes();
    let mut depth = 0usize;
    for (index, byte) in bytes.iter().enumerate().take(end).skip(open) {
      match byte {
        b'{' => depth += 1,
        b'}' => {
          depth -= 1;
          if depth == 0 {
            return Some(index);
          }
        }
        _ => {}
      }
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::token::{BodyItem, Declaration, Metadata};

  fn tokens(css: &str) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::default();
    let tokens = tokenize(
      css,
      vec![SourceBoundary {
        offset: 0,
        source: None,
        line: 1,
        column: 1,
      }],
      &mut diagnostics,
    );
    (tokens, diagnostics)
  }

  fn strip(tokens: Vec<Token>) -> Vec<Token> {
    tokens.into_iter().map(strip_token).collect()
  }

  fn strip_fragment(fragment: Fragment) -> Fragment {
    Fragment::new(fragment.value)
  }

  fn strip_body(body: Vec<BodyItem>) -> Vec<BodyItem> {
    body
      .into_iter()
      .map(|item| match item {
        BodyItem::Declaration(declaration) => BodyItem::Declaration(Declaration {
          name: strip_fragment(declaration.name),
          ..declaration
        }),
        BodyItem::Comment(fragment) => BodyItem::Comment(strip_fragment(fragment)),
        BodyItem::Raw(fragment) => BodyItem::Raw(strip_fragment(fragment)),
      })
      .collect()
  }

  fn strip_token(token: Token) -> Token {
    match token {
      Token::Text(fragment) => Token::Text(strip_fragment(fragment)),
      Token::Comment(fragment) => Token::Comment(strip_fragment(fragment)),
      Token::AtRule(fragment) => Token::AtRule(strip_fragment(fragment)),
      Token::Block { header, children } => Token::Block {
        header: strip_fragment(header),
        children: strip(children),
      },
      Token::FlatBlock { header, body } => Token::FlatBlock {
        header: strip_fragment(header),
        body: strip_body(body),
      },
      Token::Rule { selectors, body } => Token::Rule {
        selectors: selectors.into_iter().map(strip_fragment).collect(),
        body: strip_body(body),
      },
    }
  }

  #[test]
  fn tokenizes_rules_blocks_and_statements() {
    let (tokens, diagnostics) = tokens(
      "@charset 'x';\na , b{color:red}\n@media  screen{p{margin:0}}@font-face{font-family:x}",
    );

    assert_eq!(
      strip(tokens),
      vec![
        Token::AtRule(Fragment::new("@charset 'x'")),
        Token::rule(&["a", "b"], &[("color", "red")]),
        Token::Block {
          header: Fragment::new("@media screen"),
          children: vec![Token::rule(&["p"], &[("margin", "0")])],
        },
        Token::FlatBlock {
          header: Fragment::new("@font-face"),
          body: vec![BodyItem::Declaration(Declaration::new("font-family", "x"))],
        },
      ]
    );
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn records_selector_positions() {
    let (tokens, _) = tokens("a,\n  .b{}");
    let Some(Token::Rule { selectors, .. }) = tokens.first() else {
      panic!("expected a rule");
    };
    assert_eq!(
      selectors.iter().map(|s| s.metadata.clone()).collect::<Vec<_>>(),
      vec![Some(Metadata::new(1, 1, None)), Some(Metadata::new(2, 3, None))]
    );
  }

  #[test]
  fn top_level_comment_placeholders_become_comment_tokens() {
    let (tokens, _) = tokens("__ESCAPED_COMMENT_0__a{}");
    assert_eq!(
      strip(tokens),
      vec![
        Token::Comment(Fragment::new("__ESCAPED_COMMENT_0__")),
        Token::Rule {
          selectors: vec![Fragment::new("a")],
          body: vec![],
        },
      ]
    );
  }

  #[test]
  fn degrades_gracefully_on_broken_blocks() {
    let (tokens, diagnostics) = tokens("}a{color:red");
    assert_eq!(strip(tokens), vec![Token::rule(&["a"], &[("color", "red")])]);
    assert_eq!(diagnostics.warnings.len(), 2);
  }

  #[test]
  fn keeps_stray_text_verbatim() {
    let (tokens, diagnostics) = tokens("a{}garbage");
    assert_eq!(
      strip(tokens),
      vec![
        Token::Rule {
          selectors: vec![Fragment::new("a")],
          body: vec![],
        },
        Token::Text(Fragment::new("garbage")),
      ]
    );
    assert_eq!(diagnostics.warnings.len(), 1);
  }
}
