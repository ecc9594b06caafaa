//! User-supplied color parsing
//!
//! Elements can carry a `colour` tag with anything from CSS names to
//! half-typed hex strings. Parsing is forgiving: short hex strings are
//! padded out by convention rather than rejected, overlong ones are
//! truncated, and only genuinely unintelligible input yields `None`.

use crate::canvas::Color;

/// A few CSS color names worth recognizing without a full table.
const NAMED: &[(&str, Color)] = &[
    ("black", Color::new(0, 0, 0)),
    ("white", Color::new(255, 255, 255)),
    ("red", Color::new(255, 0, 0)),
    ("green", Color::new(0, 128, 0)),
    ("blue", Color::new(0, 0, 255)),
    ("yellow", Color::new(255, 255, 0)),
    ("orange", Color::new(255, 165, 0)),
    ("purple", Color::new(128, 0, 128)),
    ("pink", Color::new(255, 192, 203)),
    ("brown", Color::new(165, 42, 42)),
    ("gray", Color::new(128, 128, 128)),
    ("grey", Color::new(128, 128, 128)),
    ("cyan", Color::new(0, 255, 255)),
    ("magenta", Color::new(255, 0, 255)),
];

/// Parses a color name or `#`-prefixed hex string.
pub fn parse_color(input: &str) -> Option<Color> {
    let input = input.trim().to_ascii_lowercase();
    if let Some(hex) = input.strip_prefix('#') {
        return parse_hex(hex);
    }
    NAMED
        .iter()
        .find(|(name, _)| *name == input)
        .map(|&(_, color)| color)
}

/// Normalizes a hex digit string to six digits, then parses it.
///
/// One digit repeats to fill (`#b` is `#bbbbbb`), two digits tile
/// (`#ab` is `#ababab`), three digits double per channel (`#abc` is
/// `#aabbcc`), four and five digits pad with their last digit, and
/// anything longer is truncated to six.
fn parse_hex(hex: &str) -> Option<Color> {
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits: Vec<char> = hex.chars().collect();
    let full: Vec<char> = match digits.len() {
        1 => vec![digits[0]; 6],
        2 => digits.iter().cycle().take(6).copied().collect(),
        3 => digits.iter().flat_map(|&c| [c, c]).collect(),
        4 | 5 => {
            let last = digits[digits.len() - 1];
            let mut padded = digits.clone();
            padded.resize(6, last);
            padded
        }
        _ => digits[..6].to_vec(),
    };
    let channel = |i: usize| {
        let s: String = full[i * 2..i * 2 + 2].iter().collect();
        u8::from_str_radix(&s, 16).ok()
    };
    Some(Color::new(channel(0)?, channel(1)?, channel(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_hex() {
        assert_eq!(parse_color("#1f77b4"), Some(Color::new(0x1f, 0x77, 0xb4)));
        assert_eq!(parse_color("#ABCDEF"), Some(Color::new(0xab, 0xcd, 0xef)));
    }

    #[test]
    fn test_short_hex_conventions() {
        assert_eq!(parse_color("#b"), Some(Color::new(0xbb, 0xbb, 0xbb)));
        assert_eq!(parse_color("#ab"), Some(Color::new(0xab, 0xab, 0xab)));
        assert_eq!(parse_color("#abc"), Some(Color::new(0xaa, 0xbb, 0xcc)));
        assert_eq!(parse_color("#abcd"), Some(Color::new(0xab, 0xcd, 0xdd)));
        assert_eq!(parse_color("#abcde"), Some(Color::new(0xab, 0xcd, 0xee)));
    }

    #[test]
    fn test_overlong_hex_truncated() {
        assert_eq!(
            parse_color("#11223344"),
            Some(Color::new(0x11, 0x22, 0x33))
        );
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::new(255, 0, 0)));
        assert_eq!(parse_color(" Grey "), Some(Color::new(128, 128, 128)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(parse_color("#"), None);
        assert_eq!(parse_color("#xyz"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
        assert_eq!(parse_color(""), None);
    }
}
