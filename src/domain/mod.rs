//! Domain primitives for the watchlist.
//!
//! Identifiers are opaque strings: records created here get a UUID, while
//! records imported from older exports keep whatever id they were saved with.

pub mod events;
pub mod genre;

pub use events::LibraryEvent;
pub use genre::Genre;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unique identifier of an anime record within the collection.
///
/// Older exports may store the id as a JSON number; it is read as its
/// decimal string.
///
/// # Examples
///
/// ```rust
/// use anime_archive::domain::RecordId;
///
/// let id = RecordId::from("1700000000000");
/// assert_eq!(id.as_str(), "1700000000000");
/// assert_eq!(id.to_string(), "1700000000000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => Self(id),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

impl RecordId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a user-defined custom list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(String);

impl ListId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ListId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_record_id_serializes_as_plain_string() {
        let id = RecordId::from("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");

        let parsed: RecordId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn test_numeric_record_id_is_read_as_string() {
        let parsed: RecordId = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(parsed.as_str(), "1700000000000");
        assert!(serde_json::from_str::<RecordId>("true").is_err());
    }
}
