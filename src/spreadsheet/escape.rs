//! `_xHHHH_` escapes, the form Office Open XML uses for characters that
//! XML 1.0 cannot carry (most C0 control characters).

use regex::Captures;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"_x([0-9A-Fa-f]{4})_").expect("Hardcode regex pattern"))
}

fn is_xml_char(character: char) -> bool {
    matches!(character, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Escapes characters XML 1.0 forbids, and underscores that would read back as an escape.
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    let pattern = escape_pattern();
    if text.chars().all(is_xml_char) && !pattern.is_match(text) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for (index, character) in text.char_indices() {
        if !is_xml_char(character) {
            escaped.push_str(&format!("_x{:04X}_", character as u32));
        } else if character == '_' && pattern.find_at(text, index).is_some_and(|found| found.start() == index) {
            escaped.push_str("_x005F_");
        } else {
            escaped.push(character);
        }
    }
    Cow::Owned(escaped)
}

/// Resolves `_xHHHH_` escapes. Escapes naming no valid character are kept as written.
pub(crate) fn unescape_text(text: &str) -> Cow<'_, str> {
    escape_pattern().replace_all(text, |captures: &Captures| {
        u32::from_str_radix(&captures[1], 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| captures[0].to_owned())
    })
}
