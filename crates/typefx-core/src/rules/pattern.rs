//! Compiled text patterns used by effect rules.
//!
//! Patterns are written in rule tables as regex source strings and compiled
//! once at load time. Use an inline `(?i)` flag for case-insensitivity; the
//! matcher lowercases its input anyway.

use std::fmt;

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RuleError;

/// A compiled regex that keeps its original source for display and hints.
#[derive(Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern from regex source.
    pub fn new(source: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(source).map_err(|source_err| RuleError::InvalidPattern {
            pattern: source.to_string(),
            source: source_err,
        })?;
        Ok(Self { regex })
    }

    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Text of the first capture group of the leftmost match, if any.
    pub fn first_group<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.source())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_group_returns_capture() {
        let p = Pattern::new(r"(\d+)\s*lions?").unwrap();
        assert_eq!(p.first_group("i saw 12 lions"), Some("12"));
        assert_eq!(p.first_group("lions"), None);
    }

    #[test]
    fn invalid_source_is_rejected() {
        let err = Pattern::new("(unclosed").unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn deserializes_from_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            p: Pattern,
        }
        let w: Wrapper = toml::from_str(r#"p = '\$'"#).unwrap();
        assert!(w.p.is_match("$5"));
        assert_eq!(w.p.source(), r"\$");
    }
}
