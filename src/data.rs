use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::types::CanonicalId;

/// Identifier that may arrive as a JSON number or a JSON string.
///
/// Ordering is natural: integers compare numerically, text compares
/// lexicographically, and integers sort before text when both appear.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    /// JSON integer.
    Integer(i64),
    /// JSON string (or a float kept in textual form).
    Text(String),
}

impl Identifier {
    /// Canonical string form used for lookups, so `1` and `"1"` compare equal.
    pub fn canonical(&self) -> CanonicalId {
        match self {
            Identifier::Integer(value) => value.to_string(),
            Identifier::Text(value) => value.clone(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Integer(value) => write!(f, "{value}"),
            Identifier::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Integer(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Text(value)
    }
}

/// Parses user input: integral text becomes `Integer`, anything else `Text`.
impl FromStr for Identifier {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Ok(trimmed
            .parse::<i64>()
            .map(Identifier::Integer)
            .unwrap_or_else(|_| Identifier::Text(trimmed.to_string())))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Identifier::Integer(value) => serializer.serialize_i64(*value),
            Identifier::Text(value) => serializer.serialize_str(value),
        }
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdentifierVisitor)
    }
}

struct IdentifierVisitor;

impl Visitor<'_> for IdentifierVisitor {
    type Value = Identifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string identifier")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Identifier, E> {
        Ok(Identifier::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Identifier, E> {
        Ok(i64::try_from(value)
            .map(Identifier::Integer)
            .unwrap_or_else(|_| Identifier::Text(value.to_string())))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Identifier, E> {
        // Keep the JSON rendering (`1.0` stays `1.0`) rather than truncating.
        serde_json::Number::from_f64(value)
            .map(|number| Identifier::Text(number.to_string()))
            .ok_or_else(|| E::custom("non-finite number cannot be an identifier"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Identifier, E> {
        Ok(Identifier::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Identifier, E> {
        Ok(Identifier::Text(value))
    }
}

/// One user-interaction row. Only `user_id` is read; other fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct InteractionRecord {
    /// User who produced the interaction.
    #[serde(default)]
    pub user_id: Option<Identifier>,
}

/// One article-metadata row.
///
/// Display fields stay optional here; placeholders are applied when cards are
/// rendered, see `workflow::ArticleCard`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ArticleRecord {
    /// Article identifier; rows without one are not indexed.
    #[serde(default)]
    pub article_id: Option<Identifier>,
    /// Headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Category label or id, as stored.
    #[serde(default)]
    pub category: Option<String>,
    /// Link to the article.
    #[serde(default)]
    pub url: Option<String>,
}
