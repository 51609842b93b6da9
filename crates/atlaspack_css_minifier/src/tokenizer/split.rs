//! Splitting CSS values and selector lists on a separator that sits outside
//! of function parentheses and quoted strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Plain,
  Escaped,
  Quoted(char),
  QuotedEscaped(char),
}

/// Splits `value` on every `separator` found at parenthesis depth zero.
///
/// When `keep_separator` is set each part but the last keeps its trailing
/// separator. Empty input yields a single empty part.
pub fn split(value: &str, separator: char, keep_separator: bool) -> Vec<String> {
  let parts = split_with_offsets(value, separator);
  let last = parts.len() - 1;
  parts
    .into_iter()
    .enumerate()
    .map(|(index, (_, part))| {
      let mut part = part.to_string();
      if keep_separator && index < last {
        part.push(separator);
      }
      part
    })
    .collect()
}

/// Parts together with the byte offset each one starts at. Always returns at
/// least one part.
pub fn split_with_offsets(value: &str, separator: char) -> Vec<(usize, &str)> {
  let mut parts = Vec::new();
  let mut state = State::Plain;
  let mut depth = 0u32;
  let mut start = 0;

  for (index, ch) in value.char_indices() {
    state = match state {
      State::Escaped => State::Plain,
      State::QuotedEscaped(quote) => State::Quoted(quote),
      State::Quoted(quote) if ch == '\\' => State::QuotedEscaped(quote),
      State::Quoted(quote) if ch == quote => State::Plain,
      State::Quoted(quote) => State::Quoted(quote),
      State::Plain => match ch {
        '\\' => State::Escaped,
        '"' | '\'' => State::Quoted(ch),
        '(' => {
          depth = depth.saturating_add(1);
          State::Plain
        }
        ')' => {
          depth = depth.saturating_sub(1);
          State::Plain
        }
        _ if ch == separator && depth == 0 => {
          parts.push((start, &value[start..index]));
          start = index + ch.len_utf8();
          State::Plain
        }
        _ => State::Plain,
      },
    };
  }

  parts.push((start, &value[start..]));
  parts
}

/// Whitespace separated list; runs of whitespace count as one separator.
pub fn space(value: &str) -> Vec<String> {
  let normalized = value.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
  if normalized.is_empty() {
    return Vec::new();
  }
  split(&normalized, ' ', false)
}
