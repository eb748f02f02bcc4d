//! ISBN normalization and check-digit validation.
//!
//! Books store ISBN-10 and ISBN-13 values in separate collections. Values are
//! stored normalized: no hyphens, no whitespace, and an upper-case `X` check
//! digit for ISBN-10.

use crate::error::{ErrorKind, Result};
use regex::Regex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;

// Thirteen-digit alternative first: regex alternation is leftmost-first, and
// the ten-digit branch would otherwise happily match a prefix.
static ISBN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:\d[-\s]?){12}\d|(?:\d[-\s]?){9}[\dXx])\b").unwrap());

/// A validated, normalized ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Isbn {
    Ten(String),
    Thirteen(String),
}
impl Isbn {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ten(s) | Self::Thirteen(s) => s,
        }
    }
}
impl FromStr for Isbn {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self> {
        let normalized = normalize(s);
        match normalized.len() {
            10 if is_valid_isbn10(&normalized) => Ok(Self::Ten(normalized)),
            13 if is_valid_isbn13(&normalized) => Ok(Self::Thirteen(normalized)),
            _ => exn::bail!(ErrorKind::InvalidIsbn {
                field: "isbn",
                value: s.to_string()
            }),
        }
    }
}
impl Display for Isbn {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Strip separators and upper-case a trailing `x`.
pub fn normalize(value: impl AsRef<str>) -> String {
    value
        .as_ref()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Validate a normalized ISBN-10: weights 10 down to 1, sum divisible by 11.
pub fn is_valid_isbn10(isbn: &str) -> bool {
    if isbn.len() != 10 {
        return false;
    }
    let mut sum = 0;
    for (i, c) in isbn.chars().enumerate() {
        let digit = match (i, c) {
            (9, 'X') => 10,
            (_, c) => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += digit * (10 - i as u32);
    }
    sum % 11 == 0
}

/// Validate a normalized ISBN-13: alternating weights 1 and 3, sum divisible by 10.
pub fn is_valid_isbn13(isbn: &str) -> bool {
    if isbn.len() != 13 {
        return false;
    }
    let mut sum = 0;
    for (i, c) in isbn.chars().enumerate() {
        let Some(digit) = c.to_digit(10) else {
            return false;
        };
        sum += digit * if i % 2 == 0 { 1 } else { 3 };
    }
    sum % 10 == 0
}

/// Find the first valid ISBN in free text, e.g. `"ISBN-13: 978-0-306-40615-7"`.
pub fn find(text: impl AsRef<str>) -> Option<Isbn> {
    ISBN_REGEX
        .captures_iter(text.as_ref())
        .filter_map(|captures| captures.get(1))
        .find_map(|m| m.as_str().parse::<Isbn>().ok())
}
