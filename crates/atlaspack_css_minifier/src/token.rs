use std::sync::Arc;

/// Where a fragment started in its source. Both coordinates are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Metadata {
  pub line: u32,
  pub column: u32,
  pub source: Option<Arc<str>>,
}

impl Metadata {
  pub fn new(line: u32, column: u32, source: Option<Arc<str>>) -> Self {
    Metadata {
      line,
      column,
      source,
    }
  }
}

/// A piece of text together with the position it came from, if tracked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
  pub value: String,
  pub metadata: Option<Metadata>,
}

impl Fragment {
  pub fn new(value: impl Into<String>) -> Self {
    Fragment {
      value: value.into(),
      metadata: None,
    }
  }

  pub fn with_metadata(value: impl Into<String>, metadata: Metadata) -> Self {
    Fragment {
      value: value.into(),
      metadata: Some(metadata),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
  pub name: Fragment,
  pub value: String,
  pub important: bool,
}

impl Declaration {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Declaration {
      name: Fragment::new(name),
      value: value.into(),
      important: false,
    }
  }

  /// `name:value` with `!important` appended when set.
  pub fn serialize(&self) -> String {
    let mut output = format!("{}:{}", self.name.value, self.value);
    if self.important {
      output.push_str("!important");
    }
    output
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyItem {
  Declaration(Declaration),
  Comment(Fragment),
  /// Anything inside a body that is not a `name:value` pair but must be
  /// kept, such as nested page-margin at-rules.
  Raw(Fragment),
}

impl BodyItem {
  pub fn as_declaration(&self) -> Option<&Declaration> {
    match self {
      BodyItem::Declaration(declaration) => Some(declaration),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
  /// Top-level text that fits no other shape, kept verbatim.
  Text(Fragment),
  Comment(Fragment),
  /// A statement at-rule such as `@import` or `@charset`, without the `;`.
  AtRule(Fragment),
  /// An at-rule whose body holds further rules: `@media`, `@supports`...
  Block {
    header: Fragment,
    children: Vec<Token>,
  },
  /// An at-rule whose body holds declarations: `@font-face`, `@page`...
  FlatBlock {
    header: Fragment,
    body: Vec<BodyItem>,
  },
  Rule {
    selectors: Vec<Fragment>,
    body: Vec<BodyItem>,
  },
}

impl Token {
  pub fn rule(selectors: &[&str], declarations: &[(&str, &str)]) -> Self {
    Token::Rule {
      selectors: selectors.iter().map(|s| Fragment::new(*s)).collect(),
      body: declarations
        .iter()
        .map(|(name, value)| BodyItem::Declaration(Declaration::new(*name, *value)))
        .collect(),
    }
  }

  /// Selectors joined with commas, used as the identity of a rule.
  pub fn selector_key(selectors: &[Fragment]) -> String {
    selectors
      .iter()
      .map(|selector| selector.value.as_str())
      .collect::<Vec<_>>()
      .join(",")
  }

  /// Declarations joined with semicolons, used as the identity of a body.
  pub fn body_key(body: &[BodyItem]) -> String {
    body
      .iter()
      .filter_map(BodyItem::as_declaration)
      .map(Declaration::serialize)
      .collect::<Vec<_>>()
      .join(";")
  }

  /// Lower-cased at-rule name of a block header, e.g. `@media`.
  pub fn at_rule_name(header: &str) -> String {
    header
      .trim_start()
      .split(|c: char| c.is_whitespace() || c == '(' || c == '{' || c == ';')
      .next()
      .unwrap_or_default()
      .to_ascii_lowercase()
  }
}
