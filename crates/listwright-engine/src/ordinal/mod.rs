//! # Ordinal codec
//!
//! Conversion between item positions and the ordinal tokens shown in list
//! labels, for every numbering system a list can use. Nothing here touches
//! the node tree.
//!
//! Alpha ordinals are bijective base-26 counted from zero (`0 -> "a"`,
//! `25 -> "z"`, `26 -> "aa"`), the way spreadsheet columns are named. The
//! other systems count from one.

mod roman;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrdinalError {
    #[error("Unknown ordinal type: {0}")]
    UnknownType(String),
    #[error("Invalid roman numeral: {0}")]
    InvalidRoman(String),
    #[error("Invalid alpha ordinal: {0}")]
    InvalidAlpha(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Ordinal value {value} is out of range for {ordinal_type}")]
    OutOfRange {
        value: i64,
        ordinal_type: OrdinalType,
    },
    #[error("Empty ordinal")]
    Empty,
}

/// Numbering system of an ordered list.
///
/// `Arabic` and `Outline` render the same digits. They differ in how labels
/// are prefixed: outline labels carry their ancestors' ordinals ("2.3.1").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrdinalType {
    #[serde(rename = "number", alias = "arabic")]
    Arabic,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
    #[default]
    #[serde(rename = "section", alias = "outline")]
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalCase {
    Lower,
    Upper,
}

/// Upper only when every cased character is upper case; mixed case is lower.
pub fn case_of(token: &str) -> OrdinalCase {
    let mut cased = token.chars().filter(|c| c.is_alphabetic()).peekable();
    if cased.peek().is_some() && cased.all(char::is_uppercase) {
        OrdinalCase::Upper
    } else {
        OrdinalCase::Lower
    }
}

/// Work out which numbering system produced `token`.
///
/// Digits are arabic. Otherwise a token that parses as a roman numeral is
/// roman, and anything else is alpha. Roman wins for ambiguous letters such
/// as "i", "v" or "x".
pub fn classify(token: &str) -> OrdinalType {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        return OrdinalType::Arabic;
    }
    let upper = case_of(token) == OrdinalCase::Upper;
    match (roman::to_arabic(token), upper) {
        (Ok(_), true) => OrdinalType::UpperRoman,
        (Ok(_), false) => OrdinalType::LowerRoman,
        (Err(_), true) => OrdinalType::UpperAlpha,
        (Err(_), false) => OrdinalType::LowerAlpha,
    }
}

impl OrdinalType {
    pub const ALL: [OrdinalType; 6] = [
        OrdinalType::Arabic,
        OrdinalType::LowerAlpha,
        OrdinalType::UpperAlpha,
        OrdinalType::LowerRoman,
        OrdinalType::UpperRoman,
        OrdinalType::Outline,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OrdinalType::Arabic => "number",
            OrdinalType::LowerAlpha => "lower-alpha",
            OrdinalType::UpperAlpha => "upper-alpha",
            OrdinalType::LowerRoman => "lower-roman",
            OrdinalType::UpperRoman => "upper-roman",
            OrdinalType::Outline => "section",
        }
    }

    pub fn is_alpha(self) -> bool {
        matches!(self, OrdinalType::LowerAlpha | OrdinalType::UpperAlpha)
    }

    pub fn is_roman(self) -> bool {
        matches!(self, OrdinalType::LowerRoman | OrdinalType::UpperRoman)
    }

    /// Index of the first item: alpha counts from zero.
    pub fn first_index(self) -> usize {
        if self.is_alpha() { 0 } else { 1 }
    }

    fn apply_case(self, token: String) -> String {
        match self {
            OrdinalType::UpperAlpha | OrdinalType::UpperRoman => token.to_uppercase(),
            _ => token.to_lowercase(),
        }
    }

    pub fn encode(self, index: usize) -> Result<String, OrdinalError> {
        match self {
            OrdinalType::Arabic | OrdinalType::Outline => Ok(index.to_string()),
            OrdinalType::LowerAlpha | OrdinalType::UpperAlpha => {
                Ok(self.apply_case(to_alpha(index)))
            }
            OrdinalType::LowerRoman | OrdinalType::UpperRoman => {
                let numeral = roman::to_roman(index).ok_or(OrdinalError::OutOfRange {
                    value: i64::try_from(index).unwrap_or(i64::MAX),
                    ordinal_type: self,
                })?;
                Ok(self.apply_case(numeral))
            }
        }
    }

    pub fn decode(self, token: &str) -> Result<usize, OrdinalError> {
        if token.is_empty() {
            return Err(OrdinalError::Empty);
        }
        match self {
            OrdinalType::Arabic | OrdinalType::Outline => token
                .parse()
                .map_err(|_| OrdinalError::InvalidNumber(token.to_string())),
            OrdinalType::LowerAlpha | OrdinalType::UpperAlpha => from_alpha(token),
            OrdinalType::LowerRoman | OrdinalType::UpperRoman => roman::to_arabic(token),
        }
    }
}

impl fmt::Display for OrdinalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OrdinalType {
    type Err = OrdinalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" | "arabic" => Ok(OrdinalType::Arabic),
            "lower-alpha" => Ok(OrdinalType::LowerAlpha),
            "upper-alpha" => Ok(OrdinalType::UpperAlpha),
            "lower-roman" => Ok(OrdinalType::LowerRoman),
            "upper-roman" => Ok(OrdinalType::UpperRoman),
            "section" | "outline" => Ok(OrdinalType::Outline),
            _ => Err(OrdinalError::UnknownType(s.to_string())),
        }
    }
}

fn to_alpha(mut index: usize) -> String {
    let mut chars = Vec::new();
    loop {
        chars.push(char::from(b'a' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    chars.iter().rev().collect()
}

fn from_alpha(token: &str) -> Result<usize, OrdinalError> {
    let invalid = || OrdinalError::InvalidAlpha(token.to_string());
    let mut value: usize = 0;
    for c in token.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = (c.to_ascii_lowercase() as u8 - b'a') as usize + 1;
        value = value
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    Ok(value - 1)
}

/// Shift an ordinal token by `offset`.
///
/// Dotted tokens ("2.3", "2.3.") only change their final segment; the
/// leading chain and any trailing dot are kept. When `ordinal_type` is not
/// given it is classified from the final segment.
pub fn translate(
    token: &str,
    offset: i64,
    ordinal_type: Option<OrdinalType>,
) -> Result<String, OrdinalError> {
    let (body, trailing_dot) = match token.strip_suffix('.') {
        Some(body) => (body, "."),
        None => (token, ""),
    };
    let (chain, last) = match body.rfind('.') {
        Some(at) => body.split_at(at + 1),
        None => ("", body),
    };
    let ordinal_type = ordinal_type.unwrap_or_else(|| classify(last));
    let decoded = ordinal_type.decode(last)?;
    let out_of_range = |value| OrdinalError::OutOfRange {
        value,
        ordinal_type,
    };
    let value = i64::try_from(decoded)
        .ok()
        .and_then(|value| value.checked_add(offset))
        .ok_or_else(|| out_of_range(i64::MAX))?;
    let shifted = usize::try_from(value).map_err(|_| out_of_range(value))?;
    Ok(format!("{chain}{}{trailing_dot}", ordinal_type.encode(shifted)?))
}
