//! Price normalization.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ParserError, ParserResult};

/// A normalized price, or the raw text when it could not be interpreted and
/// format errors were ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Raw(String),
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Amount(value) => Some(*value),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(value) => write!(f, "{value:.2}"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

/// Compiled price pattern of a site profile.
#[derive(Debug, Clone)]
pub struct PriceFormat {
    pattern: Regex,
}

impl PriceFormat {
    pub fn new(pattern: &str) -> ParserResult<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Strips whitespace from `raw`, then parses the first substring matching
    /// the pattern.
    ///
    /// Without a match, returns `raw` untouched when `ignore_format_errors` is
    /// set and [`ParserError::PriceFormat`] otherwise. A match that is not a
    /// number always fails with [`ParserError::PriceParse`].
    pub fn normalize(&self, raw: &str, ignore_format_errors: bool) -> ParserResult<Price> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        match self.pattern.find(&compact) {
            Some(found) => found
                .as_str()
                .parse::<f64>()
                .map(Price::Amount)
                .map_err(|source| ParserError::PriceParse {
                    matched: found.as_str().to_string(),
                    source,
                }),
            None if ignore_format_errors => Ok(Price::Raw(raw.to_string())),
            None => Err(ParserError::PriceFormat {
                pattern: self.as_str().to_string(),
                input: raw.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits() -> PriceFormat {
        PriceFormat::new(r"\d+").unwrap()
    }

    #[test]
    fn strips_grouping_spaces() {
        assert_eq!(digits().normalize("1 234 грн", false).unwrap(), Price::Amount(1234.0));
        assert_eq!(digits().normalize("56\u{a0}999₴", false).unwrap(), Price::Amount(56999.0));
    }

    #[test]
    fn unmatched_text_is_kept_when_ignored() {
        assert_eq!(
            digits().normalize("уточнюйте", true).unwrap(),
            Price::Raw("уточнюйте".to_string())
        );
    }

    #[test]
    fn unmatched_text_fails_when_not_ignored() {
        let err = digits().normalize("уточнюйте", false).unwrap_err();
        match err {
            ParserError::PriceFormat { pattern, input } => {
                assert_eq!(pattern, r"\d+");
                assert_eq!(input, "уточнюйте");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_match_fails_even_when_ignored() {
        let format = PriceFormat::new(r"[\d,]+").unwrap();
        let err = format.normalize("1,234,5 грн", true).unwrap_err();
        assert!(matches!(err, ParserError::PriceParse { .. }));
    }

    #[test]
    fn decimal_pattern() {
        let format = PriceFormat::new(r"\d+(\.\d+)?").unwrap();
        assert_eq!(format.normalize("ціна: 245.50 грн.", false).unwrap(), Price::Amount(245.5));
    }

    #[test]
    fn serializes_untagged() {
        assert_eq!(serde_json::to_string(&Price::Amount(399.0)).unwrap(), "399.0");
        assert_eq!(serde_json::to_string(&Price::Raw("n/a".into())).unwrap(), "\"n/a\"");
    }
}
