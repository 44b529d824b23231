//! Canonical record identifiers.
//!
//! This module defines the identifier type used for patient records and
//! checklist log entries.

use crate::{PostError, PostResult};
use std::fmt;
use uuid::Uuid;

/// The post's canonical record identifier (32 lowercase hex characters, no
/// hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is
/// in canonical form. Use it whenever an identifier crosses the core
/// boundary — CLI input, store blobs, report rows.
///
/// # Construction
/// - [`RecordId::new`] generates a fresh identifier (for new records).
/// - [`RecordId::parse`] validates an externally supplied identifier.
///
/// # Display format
/// When displayed or converted to string, `RecordId` always produces the
/// canonical 32-character lowercase hex form without hyphens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (hyphenated or
    /// uppercase); callers must provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::Validation`] if `input` is not 32 lowercase hex
    /// characters.
    pub fn parse(input: &str) -> PostResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(PostError::Validation(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns true if `input` is in canonical form.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_canonical_form() {
        let id = RecordId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert!(RecordId::is_canonical(&text));
    }

    #[test]
    fn parses_canonical_input() {
        let id = RecordId::new();
        let reparsed = RecordId::parse(&id.to_string()).expect("canonical id");
        assert_eq!(id, reparsed);
    }

    #[test]
    fn rejects_hyphenated_and_uppercase_input() {
        assert!(RecordId::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
        assert!(RecordId::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(RecordId::parse("not-an-id").is_err());
    }

    #[test]
    fn serde_round_trips_as_string() {
        let id = RecordId::new();
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, format!("\"{}\"", id));
        let back: RecordId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(id, back);
    }
}
