/// The strategy used to compare one member's value.
///
/// [`ComparisonKind::Unknown`] is a sentinel returned by convention tables
/// when no registered predicate matches; it never reaches the dispatch step
/// because the resolver falls back to [`ComparisonKind::Value`].
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a member (or a container element) is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// No decision was made; callers must fall back to a default.
    #[default]
    Unknown,
    /// The member is skipped entirely.
    Ignore,
    /// Equality of the two values, optionally through a custom comparer.
    Value,
    /// Equality of the identity keys extracted from the two values.
    Id,
    /// Recursive member-by-member comparison of a nested shape.
    Entity,
    /// Cardinality check followed by positional element comparison.
    Collection,
    /// Cardinality check only.
    Count,
    /// Keyed comparison over the union of both key sets.
    Dictionary,
}

impl ComparisonKind {
    /// Returns the canonical lowercase name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Ignore => "ignore",
            Self::Value => "value",
            Self::Id => "id",
            Self::Entity => "entity",
            Self::Collection => "collection",
            Self::Count => "count",
            Self::Dictionary => "dictionary",
        }
    }

    /// Returns `true` unless this is the [`ComparisonKind::Unknown`] sentinel.
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns `self` when known, otherwise `fallback`.
    pub fn or(self, fallback: ComparisonKind) -> ComparisonKind {
        if self.is_known() { self } else { fallback }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised comparison kind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKindError(pub String);

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised comparison kind: {:?}", self.0)
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for ComparisonKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "ignore" => Ok(Self::Ignore),
            "value" => Ok(Self::Value),
            "id" => Ok(Self::Id),
            "entity" => Ok(Self::Entity),
            "collection" => Ok(Self::Collection),
            "count" => Ok(Self::Count),
            "dictionary" => Ok(Self::Dictionary),
            _ => Err(ParseKindError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn unknown_falls_back() {
        assert_eq!(
            ComparisonKind::Unknown.or(ComparisonKind::Value),
            ComparisonKind::Value
        );
        assert_eq!(
            ComparisonKind::Count.or(ComparisonKind::Value),
            ComparisonKind::Count
        );
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(
            "Dictionary".parse::<ComparisonKind>().expect("parse"),
            ComparisonKind::Dictionary
        );
        assert!("sideways".parse::<ComparisonKind>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ComparisonKind::Collection).expect("serialize");
        assert_eq!(json, "\"collection\"");
        let back: ComparisonKind = serde_json::from_str("\"id\"").expect("deserialize");
        assert_eq!(back, ComparisonKind::Id);
    }
}
