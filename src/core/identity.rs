//! Entity identity and link-kind tags
//!
//! Entities in the catalog are addressed by positive integer ids. A link kind
//! is a tag that tells apart the different purposes sharing the same
//! entity-to-entity relation table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A persisted catalog entity identifier (always `> 0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(i64);

impl EntityId {
    /// Create an id from a raw store value, rejecting `raw <= 0`
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// The raw integer value
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| IdParseError::NotANumber(s.to_string()))?;
        Self::new(raw).ok_or(IdParseError::NotPositive(raw))
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::new(raw).ok_or_else(|| serde::de::Error::custom(IdParseError::NotPositive(raw)))
    }
}

/// A link kind: numeric tag in the relation table plus its short text code
///
/// The code is what appears at the CSV and API boundaries; the numeric id is
/// what the store keys rows by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkKind {
    type_id: i64,
    code: &'static str,
}

impl LinkKind {
    /// Generic "related entities" relation
    pub const RELATED: LinkKind = LinkKind::new(1, "relation");
    /// Up-sell suggestions
    pub const UP_SELL: LinkKind = LinkKind::new(4, "up_sell");
    /// Cross-sell suggestions
    pub const CROSS_SELL: LinkKind = LinkKind::new(5, "cross_sell");
    /// Parts list: each linked entity is a part with a build quantity
    pub const PARTLISTS: LinkKind = LinkKind::new(60, "partlists");

    pub const fn new(type_id: i64, code: &'static str) -> Self {
        Self { type_id, code }
    }

    /// Numeric tag used by the relation table
    pub fn type_id(&self) -> i64 {
        self.type_id
    }

    /// Short identifier used at API/CSV boundaries
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// CSV column carrying this kind's links, e.g. `_partlists_`
    pub fn csv_column(&self) -> String {
        format!("_{}_", self.code)
    }

    /// Get all built-in link kinds
    pub fn all() -> &'static [LinkKind] {
        &[
            LinkKind::RELATED,
            LinkKind::UP_SELL,
            LinkKind::CROSS_SELL,
            LinkKind::PARTLISTS,
        ]
    }

    /// Look up a built-in kind by its numeric tag
    pub fn from_type_id(type_id: i64) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.type_id == type_id)
    }
}

impl Default for LinkKind {
    fn default() -> Self {
        LinkKind::PARTLISTS
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

impl FromStr for LinkKind {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(type_id) = s.parse::<i64>() {
            return Self::from_type_id(type_id)
                .ok_or_else(|| IdParseError::UnknownLinkKind(s.to_string()));
        }
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "related" => "relation",
            "upsell" => "up_sell",
            "crosssell" => "cross_sell",
            "partlist" => "partlists",
            other => other,
        };
        Self::all()
            .iter()
            .copied()
            .find(|k| k.code == code)
            .ok_or_else(|| IdParseError::UnknownLinkKind(s.to_string()))
    }
}

impl Serialize for LinkKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for LinkKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when parsing ids and link kinds
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdParseError {
    #[error("invalid entity id: '{0}' is not a number")]
    NotANumber(String),

    #[error("invalid entity id: {0} (ids must be positive)")]
    NotPositive(i64),

    #[error("unknown link kind: '{0}' (valid: relation, up_sell, cross_sell, partlists or their numeric ids 1, 4, 5, 60)")]
    UnknownLinkKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_rejects_non_positive() {
        assert!(EntityId::new(0).is_none());
        assert!(EntityId::new(-4).is_none());
        assert_eq!(EntityId::new(7).map(EntityId::get), Some(7));
    }

    #[test]
    fn test_entity_id_parsing() {
        assert_eq!(" 42 ".parse::<EntityId>().unwrap().get(), 42);
        assert_eq!(
            "0".parse::<EntityId>().unwrap_err(),
            IdParseError::NotPositive(0)
        );
        assert!(matches!(
            "abc".parse::<EntityId>().unwrap_err(),
            IdParseError::NotANumber(_)
        ));
    }

    #[test]
    fn test_link_kind_parses_code_and_number() {
        assert_eq!("partlists".parse::<LinkKind>().unwrap(), LinkKind::PARTLISTS);
        assert_eq!("60".parse::<LinkKind>().unwrap(), LinkKind::PARTLISTS);
        assert_eq!("related".parse::<LinkKind>().unwrap(), LinkKind::RELATED);
        assert_eq!("4".parse::<LinkKind>().unwrap(), LinkKind::UP_SELL);
        assert!("99".parse::<LinkKind>().is_err());
        assert!("wishlist".parse::<LinkKind>().is_err());
    }

    #[test]
    fn test_link_kind_csv_column() {
        assert_eq!(LinkKind::PARTLISTS.csv_column(), "_partlists_");
        assert_eq!(LinkKind::CROSS_SELL.csv_column(), "_cross_sell_");
    }
}
