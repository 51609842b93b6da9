//! Classification and shortening of single CSS value atoms: colours,
//! numbers and lengths.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::escape::placeholder::PLACEHOLDER_PREFIX;

static NUMBER: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^([+-]?)(\d*)(?:\.(\d+))?([a-zA-Z%]*)$").expect("number pattern is valid")
});

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
    .expect("hex colour pattern is valid")
});

pub const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

const LENGTH_UNITS: &[&str] = &[
  "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "vi", "vb", "svh", "lvh", "dvh",
  "svw", "lvw", "dvw", "cm", "mm", "q", "in", "pt", "pc",
];

const COLOR_FUNCTIONS: &[&str] = &[
  "rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch(", "oklab(", "oklch(", "color(",
  "color-mix(", "light-dark(",
];

const MATH_FUNCTIONS: &[&str] = &["calc(", "min(", "max(", "clamp(", "var(", "env("];

/// Named colours paired with their six digit hex form.
const NAMED_COLORS: &[(&str, &str)] = &[
  ("aliceblue", "#f0f8ff"),
  ("antiquewhite", "#faebd7"),
  ("aqua", "#00ffff"),
  ("aquamarine", "#7fffd4"),
  ("azure", "#f0ffff"),
  ("beige", "#f5f5dc"),
  ("bisque", "#ffe4c4"),
  ("black", "#000000"),
  ("blanchedalmond", "#ffebcd"),
  ("blue", "#0000ff"),
  ("blueviolet", "#8a2be2"),
  ("brown", "#a52a2a"),
  ("burlywood", "#deb887"),
  ("cadetblue", "#5f9ea0"),
  ("chartreuse", "#7fff00"),
  ("chocolate", "#d2691e"),
  ("coral", "#ff7f50"),
  ("cornflowerblue", "#6495ed"),
  ("cornsilk", "#fff8dc"),
  ("crimson", "#dc143c"),
  ("darkblue", "#00008b"),
  ("darkcyan", "#008b8b"),
  ("darkgoldenrod", "#b8860b"),
  ("darkgray", "#a9a9a9"),
  ("darkgreen", "#006400"),
  ("darkkhaki", "#bdb76b"),
  ("darkmagenta", "#8b008b"),
  ("darkolivegreen", "#556b2f"),
  ("darkorange", "#ff8c00"),
  ("darkorchid", "#9932cc"),
  ("darkred", "#8b0000"),
  ("darksalmon", "#e9967a"),
  ("darkseagreen", "#8fbc8f"),
  ("darkslateblue", "#483d8b"),
  ("darkslategray", "#2f4f4f"),
  ("darkturquoise", "#00ced1"),
  ("darkviolet", "#9400d3"),
  ("deeppink", "#ff1493"),
  ("deepskyblue", "#00bfff"),
  ("dimgray", "#696969"),
  ("dodgerblue", "#1e90ff"),
  ("firebrick", "#b22222"),
  ("floralwhite", "#fffaf0"),
  ("forestgreen", "#228b22"),
  ("fuchsia", "#ff00ff"),
  ("gainsboro", "#dcdcdc"),
  ("ghostwhite", "#f8f8ff"),
  ("gold", "#ffd700"),
  ("goldenrod", "#daa520"),
  ("gray", "#808080"),
  ("green", "#008000"),
  ("greenyellow", "#adff2f"),
  ("honeydew", "#f0fff0"),
  ("hotpink", "#ff69b4"),
  ("indianred", "#cd5c5c"),
  ("indigo", "#4b0082"),
  ("ivory", "#fffff0"),
  ("khaki", "#f0e68c"),
  ("lavender", "#e6e6fa"),
  ("lavenderblush", "#fff0f5"),
  ("lawngreen", "#7cfc00"),
  ("lemonchiffon", "#fffacd"),
  ("lightblue", "#add8e6"),
  ("lightcoral", "#f08080"),
  ("lightcyan", "#e0ffff"),
  ("lightgoldenrodyellow", "#fafad2"),
  ("lightgray", "#d3d3d3"),
  ("lightgreen", "#90ee90"),
  ("lightpink", "#ffb6c1"),
  ("lightsalmon", "#ffa07a"),
  ("lightseagreen", "#20b2aa"),
  ("lightskyblue", "#87cefa"),
  ("lightslategray", "#778899"),
  ("lightsteelblue", "#b0c4de"),
  ("lightyellow", "#ffffe0"),
  ("lime", "#00ff00"),
  ("limegreen", "#32cd32"),
  ("linen", "#faf0e6"),
  ("maroon", "#800000"),
  ("mediumaquamarine", "#66cdaa"),
  ("mediumblue", "#0000cd"),
  ("mediumorchid", "#ba55d3"),
  ("mediumpurple", "#9370db"),
  ("mediumseagreen", "#3cb371"),
  ("mediumslateblue", "#7b68ee"),
  ("mediumspringgreen", "#00fa9a"),
  ("mediumturquoise", "#48d1cc"),
  ("mediumvioletred", "#c71585"),
  ("midnightblue", "#191970"),
  ("mintcream", "#f5fffa"),
  ("mistyrose", "#ffe4e1"),
  ("moccasin", "#ffe4b5"),
  ("navajowhite", "#ffdead"),
  ("navy", "#000080"),
  ("oldlace", "#fdf5e6"),
  ("olive", "#808000"),
  ("olivedrab", "#6b8e23"),
  ("orange", "#ffa500"),
  ("orangered", "#ff4500"),
  ("orchid", "#da70d6"),
  ("palegoldenrod", "#eee8aa"),
  ("palegreen", "#98fb98"),
  ("paleturquoise", "#afeeee"),
  ("palevioletred", "#db7093"),
  ("papayawhip", "#ffefd5"),
  ("peachpuff", "#ffdab9"),
  ("peru", "#cd853f"),
  ("pink", "#ffc0cb"),
  ("plum", "#dda0dd"),
  ("powderblue", "#b0e0e6"),
  ("purple", "#800080"),
  ("rebeccapurple", "#663399"),
  ("red", "#ff0000"),
  ("rosybrown", "#bc8f8f"),
  ("royalblue", "#4169e1"),
  ("saddlebrown", "#8b4513"),
  ("salmon", "#fa8072"),
  ("sandybrown", "#f4a460"),
  ("seagreen", "#2e8b57"),
  ("seashell", "#fff5ee"),
  ("sienna", "#a0522d"),
  ("silver", "#c0c0c0"),
  ("skyblue", "#87ceeb"),
  ("slateblue", "#6a5acd"),
  ("slategray", "#708090"),
  ("snow", "#fffafa"),
  ("springgreen", "#00ff7f"),
  ("steelblue", "#4682b4"),
  ("tan", "#d2b48c"),
  ("teal", "#008080"),
  ("thistle", "#d8bfd8"),
  ("tomato", "#ff6347"),
  ("turquoise", "#40e0d0"),
  ("violet", "#ee82ee"),
  ("wheat", "#f5deb3"),
  ("white", "#ffffff"),
  ("whitesmoke", "#f5f5f5"),
  ("yellow", "#ffff00"),
  ("yellowgreen", "#9acd32"),
];

static NAME_TO_HEX: Lazy<HashMap<&'static str, &'static str>> =
  Lazy::new(|| NAMED_COLORS.iter().copied().collect());

/// The shortest name for each hex value; aliases such as `aqua`/`cyan` share
/// a hex and only the first listed one is kept.
static HEX_TO_NAME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::new();
  for (name, hex) in NAMED_COLORS {
    map.entry(*hex).or_insert(*name);
  }
  map
});

pub fn is_global_keyword(value: &str) -> bool {
  GLOBAL_KEYWORDS.iter().any(|keyword| value.eq_ignore_ascii_case(keyword))
}

pub fn is_placeholder(value: &str) -> bool {
  value.starts_with(PLACEHOLDER_PREFIX)
}

/// Lower-cased function names used in `value`, with escaped URLs counted as
/// `url`.
pub fn function_names(value: &str) -> Vec<String> {
  let mut names = Vec::new();
  let bytes = value.as_bytes();
  for (index, _) in value.match_indices('(') {
    let start = value[..index]
      .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
      .map(|found| found + 1)
      .unwrap_or(0);
    if start < index && (bytes[start].is_ascii_alphabetic() || bytes[start] == b'-') {
      names.push(value[start..index].to_ascii_lowercase());
    }
  }
  if value.contains("__ESCAPED_URL_") {
    names.push(String::from("url"));
  }
  names.sort();
  names.dedup();
  names
}

pub fn has_vendor_prefix(value: &str) -> bool {
  ["-webkit-", "-moz-", "-ms-", "-o-"]
    .iter()
    .any(|prefix| value.to_ascii_lowercase().contains(prefix))
}

pub fn is_math_function(value: &str) -> bool {
  let lower = value.to_ascii_lowercase();
  MATH_FUNCTIONS.iter().any(|function| lower.starts_with(function)) && value.ends_with(')')
}

pub fn has_variable(value: &str) -> bool {
  value.to_ascii_lowercase().contains("var(")
}

/// Lengths, percentages and a unitless zero.
pub fn is_length(value: &str) -> bool {
  let Some(captures) = NUMBER.captures(value) else {
    return false;
  };
  let integer = captures.get(2).map_or("", |m| m.as_str());
  let fraction = captures.get(3).map_or("", |m| m.as_str());
  if integer.is_empty() && fraction.is_empty() {
    return false;
  }
  let unit = captures.get(4).map_or("", |m| m.as_str()).to_ascii_lowercase();
  if unit.is_empty() {
    return integer.trim_start_matches('0').is_empty() && fraction.trim_end_matches('0').is_empty();
  }
  unit == "%" || LENGTH_UNITS.contains(&unit.as_str())
}

pub fn is_number(value: &str) -> bool {
  NUMBER
    .captures(value)
    .map(|captures| {
      let digits = captures.get(2).map_or(0, |m| m.len()) + captures.get(3).map_or(0, |m| m.len());
      digits > 0 && captures.get(4).map_or(true, |m| m.as_str().is_empty())
    })
    .unwrap_or(false)
}

pub fn is_color(value: &str) -> bool {
  let lower = value.to_ascii_lowercase();
  HEX_COLOR.is_match(value)
    || NAME_TO_HEX.contains_key(lower.as_str())
    || lower == "currentcolor"
    || lower == "transparent"
    || (COLOR_FUNCTIONS.iter().any(|function| lower.starts_with(function)) && lower.ends_with(')'))
    || has_variable(&lower)
}

/// Canonical six digit lower-case hex of a colour atom, when it has one.
fn hex_of(value: &str) -> Option<String> {
  let lower = value.to_ascii_lowercase();
  if let Some(hex) = NAME_TO_HEX.get(lower.as_str()) {
    return Some(hex.to_string());
  }
  if !HEX_COLOR.is_match(&lower) {
    return None;
  }
  match lower.len() {
    4 => {
      let mut expanded = String::from("#");
      for ch in lower[1..].chars() {
        expanded.push(ch);
        expanded.push(ch);
      }
      Some(expanded)
    }
    7 => Some(lower),
    _ => None,
  }
}

fn short_hex(hex: &str) -> String {
  let bytes = hex.as_bytes();
  if bytes.len() == 7 && bytes[1] == bytes[2] && bytes[3] == bytes[4] && bytes[5] == bytes[6] {
    format!("#{}{}{}", bytes[1] as char, bytes[3] as char, bytes[5] as char)
  } else {
    hex.to_string()
  }
}

/// Shortest equivalent spelling of a colour atom, or `None` when the atom is
/// not a colour this module knows how to shorten. Ties keep the input form.
pub fn shorten_color(value: &str) -> Option<String> {
  let hex = hex_of(value)?;
  let is_name = !value.starts_with('#');

  let mut best = if is_name {
    value.to_ascii_lowercase()
  } else {
    short_hex(&hex)
  };

  let alternative = if is_name {
    short_hex(&hex)
  } else {
    HEX_TO_NAME.get(hex.as_str()).map(|name| name.to_string()).unwrap_or_default()
  };
  if !alternative.is_empty() && alternative.len() < best.len() {
    best = alternative;
  }
  Some(best)
}

/// Converts `rgb(r,g,b)` with integer channels to a hex colour.
pub fn rgb_to_hex(arguments: &str) -> Option<String> {
  let channels = arguments
    .split(',')
    .map(|channel| channel.trim().parse::<i64>().ok())
    .collect::<Option<Vec<_>>>()?;
  if channels.len() != 3 {
    return None;
  }
  let mut hex = String::from("#");
  for channel in channels {
    hex.push_str(&format!("{:02x}", channel.clamp(0, 255)));
  }
  Some(hex)
}

/// Shortens a numeric atom: drops leading and trailing zeros, the sign of
/// zero and, when `drop_zero_unit` is set, the length unit of a zero.
pub fn shorten_number(value: &str, drop_zero_unit: bool) -> Option<String> {
  let captures = NUMBER.captures(value)?;
  let sign = captures.get(1).map_or("", |m| m.as_str());
  let integer = captures.get(2).map_or("", |m| m.as_str()).trim_start_matches('0');
  let fraction = captures.get(3).map_or("", |m| m.as_str()).trim_end_matches('0');
  let unit = captures.get(4).map_or("", |m| m.as_str());

  if captures.get(2).map_or(0, |m| m.len()) + captures.get(3).map_or(0, |m| m.len()) == 0 {
    return None;
  }

  let is_zero = integer.is_empty() && fraction.is_empty();
  if is_zero {
    let lower = unit.to_ascii_lowercase();
    if unit.is_empty() || (drop_zero_unit && LENGTH_UNITS.contains(&lower.as_str())) {
      return Some(String::from("0"));
    }
    return Some(format!("0{unit}"));
  }

  let mut output = String::from(if sign == "-" { "-" } else { sign });
  output.push_str(integer);
  if !fraction.is_empty() {
    output.push('.');
    output.push_str(fraction);
  }
  output.push_str(unit);
  Some(output)
}
