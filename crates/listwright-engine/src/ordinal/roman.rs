use std::sync::OnceLock;

use regex::Regex;

use super::OrdinalError;

const NUMERALS: [(usize, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Upper-case numeral for 1..=3999.
pub(super) fn to_roman(mut value: usize) -> Option<String> {
    if !(1..=3999).contains(&value) {
        return None;
    }
    let mut out = String::new();
    for (amount, numeral) in NUMERALS {
        while value >= amount {
            out.push_str(numeral);
            value -= amount;
        }
    }
    Some(out)
}

/// Parse a well-formed numeral in either case. Sloppy forms such as "IIII"
/// or "IC" are rejected so they can be read as alpha ordinals instead.
pub(super) fn to_arabic(token: &str) -> Result<usize, OrdinalError> {
    static ROMAN_REGEX: OnceLock<Regex> = OnceLock::new();
    let roman_regex = ROMAN_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^M{0,3}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$")
            .expect("Invalid roman regex")
    });

    if token.is_empty() || !roman_regex.is_match(token) {
        return Err(OrdinalError::InvalidRoman(token.to_string()));
    }

    let upper = token.to_ascii_uppercase();
    let mut rest = upper.as_str();
    let mut value = 0;
    for (amount, numeral) in NUMERALS {
        while let Some(tail) = rest.strip_prefix(numeral) {
            value += amount;
            rest = tail;
        }
    }
    Ok(value)
}
