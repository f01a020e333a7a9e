//! Conversions between Excel-style cell references ("B12") and 0-based indexes.

use regex::Regex;
use std::sync::OnceLock;

/// Rows in a worksheet (1048576)
pub(crate) const MAX_ROWS: usize = 1 << 20;
/// Columns in a worksheet (A..XFD)
pub(crate) const MAX_COLS: usize = 1 << 14;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\$?([A-Za-z]+)\$?(\d+)$").expect("Hardcode regex pattern"))
}

/// Converts column letters to a 0-based column index (A = 0, Z = 25, AA = 26).
/// Columns past XFD are rejected.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut column = 0usize;
    for letter in letters.chars() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let digit = letter.to_ascii_uppercase() as usize - 'A' as usize + 1;
        column = column.checked_mul(26)?.checked_add(digit)?;
        if column > MAX_COLS {
            return None;
        }
    }
    Some(column - 1)
}

/// Converts a 1-based row number to a 0-based row index.
/// Rows past 1048576 are rejected.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row: usize| row - 1)
}

/// Converts a 0-based column index to column letters.
pub(crate) fn index_to_col(col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters
}

/// Parses a cell reference such as "C7" into 0-based (row, col).
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = reference_pattern().captures(reference)?;
    let col = captures.get(1).and_then(|matcher| col_to_index(matcher.as_str()))?;
    let row = captures.get(2).and_then(|matcher| row_to_index(matcher.as_str()))?;
    Some((row, col))
}

/// Formats 0-based (row, col) as an Excel-style cell reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_columns() {
        assert_eq!(col_to_index("A"), Some(0));
        assert_eq!(col_to_index("z"), Some(25));
        assert_eq!(col_to_index("AA"), Some(26));
        assert_eq!(col_to_index("AZ"), Some(51));
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("XFD"), Some(MAX_COLS - 1));
        assert_eq!(col_to_index("XFE"), None);
        assert_eq!(col_to_index("AAAAAAAAAAAAAAAA"), None);
        assert_eq!(index_to_col(0), "A");
        assert_eq!(index_to_col(27), "AB");
        assert_eq!(index_to_col(701), "ZZ");
        assert_eq!(index_to_col(702), "AAA");
    }

    #[test]
    fn converts_references() {
        assert_eq!(reference_to_index("A1"), Some((0, 0)));
        assert_eq!(reference_to_index("C7"), Some((6, 2)));
        assert_eq!(reference_to_index("$B$2"), Some((1, 1)));
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("7C"), None);
        assert_eq!(reference_to_index("A1048576"), Some((MAX_ROWS - 1, 0)));
        assert_eq!(reference_to_index("A1048577"), None);
        assert_eq!(reference_to_index("A99999999999999999999999"), None);
        assert_eq!(index_to_reference(6, 2), "C7");
    }
}
