//! Snippet identifier.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a snippet.
///
/// Snippet IDs are UUIDv7 values: a 48-bit Unix millisecond prefix followed
/// by random bits. That makes them
/// - unique with overwhelming probability (uniqueness is still enforced by
///   the store's primary key, not here)
/// - roughly ordered by creation time, both as bytes and as strings
/// - safe in a URL path segment: the canonical form is 32 lowercase hex
///   characters
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnippetId([u8; 16]);

impl SnippetId {
    /// Generates a fresh identifier. Never fails.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().into_bytes())
    }

    /// Creates an ID from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Converts to a UUID.
    #[must_use]
    pub fn to_uuid(&self) -> Uuid {
        Uuid::from_bytes(self.0)
    }

    /// Parses the 32-character hex form, or the hyphenated UUID form.
    ///
    /// Anything else (empty strings, numbers, braces, `urn:` prefixes)
    /// yields `None`, so a stale or mangled URL never reaches the store.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 32 && s.len() != 36 {
            return None;
        }
        Uuid::try_parse(s).ok().map(|uuid| Self(uuid.into_bytes()))
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnippetId({self})")
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uuid().simple())
    }
}

impl From<Uuid> for SnippetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.into_bytes())
    }
}

impl From<[u8; 16]> for SnippetId {
    fn from(bytes: [u8; 16]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl Serialize for SnippetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnippetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = SnippetId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 32-character hex snippet id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SnippetId, E> {
                SnippetId::parse(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(IdVisitor)
    }
}
