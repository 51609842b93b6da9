//! Escape-aware byte scanning shared by the protected-span processors, the
//! tokenizer and the selector helpers.
//!
//! Every delimiter this crate scans for is ASCII, so scanning works on bytes
//! and any index returned here is always a valid `char` boundary.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Code,
  Quoted { quote: u8 },
}

/// Walks a string byte by byte while tracking whether the cursor sits inside
/// a quoted string. Escaped characters (`\x`) are consumed as a pair.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
  bytes: &'a [u8],
  position: usize,
  state: State,
}

impl<'a> Cursor<'a> {
  pub fn new(text: &'a str, from: usize) -> Self {
    Cursor {
      bytes: text.as_bytes(),
      position: from.min(text.len()),
      state: State::Code,
    }
  }

  pub fn position(&self) -> usize {
    self.position
  }

  /// Returns the next byte that sits outside of any quoted string.
  ///
  /// An unterminated quote swallows the rest of the input, which makes the
  /// cursor report `None` instead of inventing a closing delimiter.
  pub fn next_code(&mut self) -> Option<(usize, u8)> {
    while self.position < self.bytes.len() {
      let index = self.position;
      let byte = self.bytes[index];
      self.position += 1;

      match self.state {
        State::Quoted { quote } => {
          if byte == b'\\' {
            self.position += 1;
          } else if byte == quote {
            self.state = State::Code;
          }
        }
        State::Code => {
          if byte == b'\\' {
            self.position += 1;
            return Some((index, byte));
          }
          if byte == b'"' || byte == b'\'' {
            self.state = State::Quoted { quote: byte };
            continue;
          }
          return Some((index, byte));
        }
      }
    }
    None
  }
}

/// Returns `true` when the byte at `index` is preceded by an odd number of
/// backslashes.
pub fn is_escaped(text: &str, index: usize) -> bool {
  let bytes = text.as_bytes();
  let mut count = 0;
  let mut cursor = index;
  while cursor > 0 && bytes[cursor - 1] == b'\\' {
    count += 1;
    cursor -= 1;
  }
  count % 2 == 1
}

/// Index of the nearest unescaped `'` or `"` at or after `from`.
pub fn next_quote(text: &str, from: usize) -> Option<usize> {
  let bytes = text.as_bytes();
  (from..bytes.len()).find(|&index| {
    (bytes[index] == b'"' || bytes[index] == b'\'') && !is_escaped(text, index)
  })
}

/// Index of the quote closing the string opened at `open`.
pub fn find_closing_quote(text: &str, open: usize) -> Option<usize> {
  let bytes = text.as_bytes();
  let quote = *bytes.get(open)?;
  let mut index = open + 1;
  while index < bytes.len() {
    match bytes[index] {
      b'\\' => index += 2,
      byte if byte == quote => return Some(index),
      _ => index += 1,
    }
  }
  None
}

/// First occurrence of `needle` at or after `from` that is not inside a
/// quoted string and not escaped.
pub fn find_code(text: &str, from: usize, needle: &str) -> Option<usize> {
  let needle = needle.as_bytes();
  let first = *needle.first()?;
  let bytes = text.as_bytes();
  let mut cursor = Cursor::new(text, from);
  while let Some((index, byte)) = cursor.next_code() {
    if byte == first && bytes[index..].starts_with(needle) && !is_escaped(text, index) {
      return Some(index);
    }
  }
  None
}

/// Same as [`find_code`] but compares ASCII case-insensitively.
pub fn find_code_ignore_case(text: &str, from: usize, needle: &str) -> Option<usize> {
  let needle = needle.as_bytes();
  let bytes = text.as_bytes();
  let mut cursor = Cursor::new(text, from);
  while let Some((index, _)) = cursor.next_code() {
    if bytes.len() - index >= needle.len()
      && bytes[index..index + needle.len()].eq_ignore_ascii_case(needle)
      && !is_escaped(text, index)
    {
      return Some(index);
    }
  }
  None
}

/// Index of the parenthesis closing the one at `open`, counting nested
/// parentheses and suspending the count inside quoted strings.
pub fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut cursor = Cursor::new(text, open);
  while let Some((index, byte)) = cursor.next_code() {
    match byte {
      b'(' => depth += 1,
      b')' => {
        depth = depth.saturating_sub(1);
        if depth == 0 {
          return Some(index);
        }
      }
      _ => {}
    }
  }
  None
}

/// Index of the brace closing the one at `open`, skipping quoted strings.
pub fn find_closing_brace(text: &str, open: usize, end: usize) -> Option<usize> {
  let mut depth = 0usize;
  let mut cursor = Cursor::new(&text[..end], open);
  while let Some((index, byte)) = cursor.next_code() {
    match byte {
      b'{' => depth += 1,
      b'}' => {
        depth = depth.saturating_sub(1);
        if depth == 0 {
          return Some(index);
        }
      }
      _ => {}
    }
  }
  None
}
