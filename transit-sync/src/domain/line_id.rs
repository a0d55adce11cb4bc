//! Line identifier type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum length of a line identifier.
const MAX_LEN: usize = 32;

/// Error returned when parsing an invalid line identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid line id {value:?}: {reason}")]
pub struct InvalidLineId {
    value: String,
    reason: &'static str,
}

/// A registry line identifier such as `L1`, `red` or `U-2`.
///
/// Line ids end up as JSON keys and file-facing tags, so they are limited to
/// ASCII letters, digits, `-` and `_`, at most 32 characters long. Any
/// `LineId` value is valid by construction.
///
/// # Examples
///
/// ```
/// use transit_sync::domain::LineId;
///
/// let id = LineId::parse("L1").unwrap();
/// assert_eq!(id.as_str(), "L1");
///
/// assert!(LineId::parse("").is_err());
/// assert!(LineId::parse("Red Line").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(String);

impl LineId {
    /// Parse a line id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidLineId> {
        let invalid = |reason| InvalidLineId {
            value: s.to_string(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if s.len() > MAX_LEN {
            return Err(invalid("must be at most 32 characters"));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(invalid("must contain only ASCII letters, digits, '-' or '_'"));
        }

        Ok(LineId(s.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LineId({})", self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LineId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LineId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LineId::parse(&s).map_err(serde::de::Error::custom)
    }
}
