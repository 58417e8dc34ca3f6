//! HTML entity decoding and display cleanup for words.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref ENTITIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("lt", "<");
        m.insert("gt", ">");
        m.insert("amp", "&");
        m.insert("quot", "\"");
        m.insert("apos", "'");
        m.insert("nbsp", "\u{00A0}");
        m.insert("copy", "\u{00A9}");
        m.insert("reg", "\u{00AE}");
        m.insert("trade", "\u{2122}");
        m.insert("hellip", "\u{2026}");
        m.insert("mdash", "\u{2014}");
        m.insert("ndash", "\u{2013}");
        m.insert("ldquo", "\u{201C}");
        m.insert("rdquo", "\u{201D}");
        m.insert("lsquo", "\u{2018}");
        m.insert("rsquo", "\u{2019}");
        m.insert("sbquo", "\u{201A}");
        m.insert("bdquo", "\u{201E}");
        m.insert("laquo", "\u{00AB}");
        m.insert("raquo", "\u{00BB}");
        m.insert("bull", "\u{2022}");
        m.insert("middot", "\u{00B7}");
        m.insert("times", "\u{00D7}");
        m.insert("divide", "\u{00F7}");
        m.insert("euro", "\u{20AC}");
        m.insert("pound", "\u{00A3}");
        m.insert("yen", "\u{00A5}");
        m.insert("cent", "\u{00A2}");
        m.insert("deg", "\u{00B0}");
        m.insert("plusmn", "\u{00B1}");
        m.insert("para", "\u{00B6}");
        m.insert("sect", "\u{00A7}");
        m.insert("frac14", "\u{00BC}");
        m.insert("frac12", "\u{00BD}");
        m.insert("frac34", "\u{00BE}");
        m.insert("eacute", "\u{00E9}");
        m.insert("egrave", "\u{00E8}");
        m.insert("aacute", "\u{00E1}");
        m.insert("agrave", "\u{00E0}");
        m.insert("ouml", "\u{00F6}");
        m.insert("uuml", "\u{00FC}");
        m.insert("auml", "\u{00E4}");
        m.insert("szlig", "\u{00DF}");
        m.insert("ccedil", "\u{00E7}");
        m.insert("ntilde", "\u{00F1}");
        m
    };

    /// Mis-decoded UTF-8 sequences, replaced before any per-character
    /// cleanup. The three-character forms must come before their prefix.
    static ref MOJIBAKE: Vec<(&'static str, &'static str)> = vec![
        ("\u{00E2}\u{20AC}\u{201C}", "-"),
        ("\u{00E2}\u{20AC}\u{0153}", "\""),
        ("\u{00E2}\u{20AC}", "\""),
    ];
}

/// Longest reference body accepted between `&` and `;`.
const MAX_REFERENCE_LEN: usize = 32;

/// Decode HTML entities in a string. Unknown or unterminated references are
/// kept as written.
pub fn decode(input: &str) -> String {
    scan(input, false)
}

/// Replace typographic punctuation and common mojibake with plain ASCII.
pub fn normalize_punctuation(input: &str) -> String {
    if input.is_ascii() {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    for ch in fix_mojibake(input).chars() {
        push_plain(&mut out, ch);
    }
    out
}

/// Display cleanup applied to each word when text formatting is enabled.
pub fn format_word(input: &str) -> String {
    scan(&fix_mojibake(input), true).trim().to_string()
}

/// Copy `input` decoding references on the way. With `plain`, every
/// character written, literal or decoded, goes through [`push_plain`].
fn scan(input: &str, plain: bool) -> String {
    if !input.contains('&') && (!plain || input.is_ascii()) {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let literal_end = rest.find('&').unwrap_or(rest.len());
        push_str(&mut out, &rest[..literal_end], plain);
        rest = &rest[literal_end..];
        if rest.is_empty() {
            return out;
        }

        match reference_len(rest) {
            Some(len) if push_reference(&mut out, &rest[1..len - 1], plain) => {
                rest = &rest[len..];
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
}

/// Length of the `&name;` reference at the start of `text`, if well formed.
fn reference_len(text: &str) -> Option<usize> {
    let body = &text[1..];
    let body_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
        .unwrap_or(body.len());
    let terminated = body[body_len..].starts_with(';');
    (terminated && body_len > 0 && body_len <= MAX_REFERENCE_LEN).then_some(body_len + 2)
}

fn push_reference(out: &mut String, body: &str, plain: bool) -> bool {
    if let Some(numeric) = body.strip_prefix('#') {
        let Some(ch) = decode_numeric(numeric) else {
            return false;
        };
        if plain {
            push_plain(out, ch);
        } else {
            out.push(ch);
        }
        return true;
    }
    match ENTITIES.get(body) {
        Some(text) => {
            push_str(out, text, plain);
            true
        }
        None => false,
    }
}

fn decode_numeric(digits: &str) -> Option<char> {
    let code_point = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse(),
    };
    code_point.ok().and_then(char::from_u32)
}

fn push_str(out: &mut String, text: &str, plain: bool) {
    if plain && !text.is_ascii() {
        text.chars().for_each(|ch| push_plain(out, ch));
    } else {
        out.push_str(text);
    }
}

/// Write `ch`, swapping curly quotes, dashes and no-break spaces for ASCII.
fn push_plain(out: &mut String, ch: char) {
    let plain = match ch {
        '\u{2018}' | '\u{2019}' | '\u{201A}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
        '\u{2013}' | '\u{2014}' => '-',
        '\u{00A0}' => ' ',
        other => other,
    };
    out.push(plain);
}

fn fix_mojibake(input: &str) -> String {
    if input.is_ascii() {
        return input.to_string();
    }
    MOJIBAKE
        .iter()
        .fold(input.to_string(), |text, (from, to)| text.replace(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic_entities() {
        assert_eq!(decode("&lt;"), "<");
        assert_eq!(decode("&gt;"), ">");
        assert_eq!(decode("&amp;"), "&");
        assert_eq!(decode("&quot;"), "\"");
        assert_eq!(decode("&apos;"), "'");
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode("&#65;"), "A");
        assert_eq!(decode("&#x41;"), "A");
        assert_eq!(decode("&#039;"), "'");
        assert_eq!(decode("&#8217;"), "\u{2019}");
    }

    #[test]
    fn test_decode_multiple_entities() {
        assert_eq!(decode("&lt;div&gt;"), "<div>");
        assert_eq!(decode("Tom &amp; Jerry"), "Tom & Jerry");
    }

    #[test]
    fn test_decode_unknown_entity() {
        assert_eq!(decode("&unknown;"), "&unknown;");
        assert_eq!(decode("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn test_decode_incomplete_entity() {
        assert_eq!(decode("&lt"), "&lt");
        assert_eq!(decode("&"), "&");
        assert_eq!(decode("R&D"), "R&D");
        assert_eq!(decode("&;"), "&;");
        assert_eq!(decode("&amp;lt;"), "&lt;");
        assert_eq!(decode("&&amp;"), "&&");
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_punctuation("it\u{2019}s"), "it's");
        assert_eq!(normalize_punctuation("\u{201C}quoted\u{201D}"), "\"quoted\"");
        assert_eq!(normalize_punctuation("1990\u{2013}2000"), "1990-2000");
        assert_eq!(normalize_punctuation("a\u{2014}b"), "a-b");
        assert_eq!(normalize_punctuation("\u{00E2}\u{20AC}\u{201C}"), "-");
        assert_eq!(normalize_punctuation("plain"), "plain");
    }

    #[test]
    fn test_format_word() {
        assert_eq!(format_word("don&rsquo;t"), "don't");
        assert_eq!(format_word("&ldquo;Hi&rdquo;"), "\"Hi\"");
        assert_eq!(format_word("&mdash;"), "-");
        assert_eq!(format_word("&#8220;yes&#8221;"), "\"yes\"");
        assert_eq!(format_word("&nbsp;"), "");
        assert_eq!(format_word("\u{00E2}\u{20AC}\u{0153}Hi&rsquo;"), "\"Hi'");
        assert_eq!(format_word("caf&eacute;"), "caf\u{00E9}");
    }
}
