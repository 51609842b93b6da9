use super::placeholder::{PlaceholderKind, PlaceholderStore};
use super::Processor;
use crate::diagnostics::Diagnostics;
use crate::options::SpecialComments;
use crate::scanner::find_code;

/// Replaces `/* ... */` comments with placeholders.
///
/// Special comments (`/*! ... */`) are kept according to the configured
/// policy; every other comment is dropped. Dropped comments still leave a
/// waypoint behind when source maps are on so positions stay exact.
#[derive(Debug, Clone)]
pub struct CommentsProcessor {
  store: PlaceholderStore,
  policy: SpecialComments,
  waypoints: bool,
  kept_special: usize,
}

impl CommentsProcessor {
  pub fn new(policy: SpecialComments, waypoints: bool) -> Self {
    CommentsProcessor {
      store: PlaceholderStore::new(PlaceholderKind::Comment, waypoints),
      policy,
      waypoints,
      kept_special: 0,
    }
  }

  fn keeps(&mut self, comment: &str) -> bool {
    if !comment.starts_with("/*!") {
      return false;
    }
    let keep = match self.policy {
      SpecialComments::All => true,
      SpecialComments::FirstOnly => self.kept_special == 0,
      SpecialComments::None => false,
    };
    if keep {
      self.kept_special += 1;
    }
    keep
  }
}

impl Processor for CommentsProcessor {
  fn escape(&mut self, text: &str, diagnostics: &mut Diagnostics) -> String {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while let Some(start) = find_code(text, cursor, "/*") {
      output.push_str(&text[cursor..start]);

      let Some(end) = text[start + 2..].find("*/").map(|offset| start + 2 + offset + 2) else {
        diagnostics.warn(format!(
          "Broken comment: '{}'",
          text[start..].chars().take(20).collect::<String>()
        ));
        cursor = start;
        break;
      };

      let comment = &text[start..end];
      if self.keeps(comment) {
        output.push_str(&self.store.push(comment));
      } else if self.waypoints {
        output.push_str(&self.store.push_with_span(String::new(), comment));
      }
      cursor = end;
    }

    output.push_str(&text[cursor..]);
    output
  }

  fn restore(&self, text: &str) -> String {
    self.store.restore(text)
  }
}
