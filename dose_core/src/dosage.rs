//! Free-text dosage tokenizer.
//!
//! A dosage is a numeric literal, optionally followed by separators and one
//! unit token from a closed set: `"10mg"`, `"0.5 mL"`, `"2u"`, `"1 x"`.
//! The first numeric run in the text is used; anything after the unit token
//! is ignored.

use std::fmt;

/// Unit tokens recognized after the amount, as (spelling, canonical token)
const UNIT_TOKENS: &[(&str, &str)] = &[
    ("μg", "μg"),
    ("µg", "μg"),
    ("mg", "mg"),
    ("kg", "kg"),
    ("g", "g"),
    ("mL", "mL"),
    ("u", "u"),
    ("x", "x"),
];

const SEPARATORS: &[char] = &[' ', '-', '_'];

/// A successfully tokenized dosage
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParsedDosage {
    pub amount: f64,
    /// Canonical unit token, empty when no unit followed the amount
    pub token: &'static str,
}

/// The dosage text did not contain a usable amount
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unparseable;

impl fmt::Display for Unparseable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dosage has no parseable amount")
    }
}

impl std::error::Error for Unparseable {}

fn is_numeric(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

/// Tokenize a dosage string into an amount and a unit token
pub fn parse_dosage(text: &str) -> Result<ParsedDosage, Unparseable> {
    let start = text.find(is_numeric).ok_or(Unparseable)?;
    let rest = &text[start..];
    let end = rest.find(|c: char| !is_numeric(c)).unwrap_or(rest.len());

    let amount: f64 = rest[..end].parse().map_err(|_| Unparseable)?;

    let tail = rest[end..].trim_start_matches(SEPARATORS);
    let token = UNIT_TOKENS
        .iter()
        .find(|(spelling, _)| tail.starts_with(spelling))
        .map(|(_, token)| *token)
        .unwrap_or("");

    Ok(ParsedDosage { amount, token })
}
