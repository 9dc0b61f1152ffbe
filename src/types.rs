/// Shared types used across the codebase
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Longest accepted owner or version path segment
pub const IDENTIFIER_MAX_LEN: usize = 255;

/// Compact ISO-8601 form used for version identifiers, e.g. `20261015T101530.123456Z`
const VERSION_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("identifier exceeds 255 characters")]
    TooLong,

    #[error("identifier contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Check a path segment against `[A-Za-z0-9-_.~]{1,255}`
pub fn validate_identifier(value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')))
    {
        return Err(IdentifierError::InvalidChar(c));
    }
    // All accepted characters are ASCII, so byte length equals char count here
    if value.len() > IDENTIFIER_MAX_LEN {
        return Err(IdentifierError::TooLong);
    }
    Ok(())
}

/// Logical profile name. Only constructible from input that satisfies the identifier grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate_identifier(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version path segment as received. Grammar-checked, but not yet known to be a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionId(String);

impl VersionId {
    pub fn parse(value: impl Into<String>) -> Result<Self, IdentifierError> {
        let value = value.into();
        validate_identifier(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret the segment as a stored version timestamp
    pub fn to_version(&self) -> Option<ProfileVersion> {
        self.0.parse().ok()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert timestamp of a profile version, at microsecond precision.
///
/// Serialized in the compact form so the value can be pasted back into a
/// `/profile/{owner}/{version}` path unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileVersion(DateTime<Utc>);

#[derive(Debug, Error)]
#[error("invalid profile version {0:?}")]
pub struct InvalidVersion(String);

impl ProfileVersion {
    /// Wrap a timestamp, dropping anything finer than a microsecond
    pub fn new(at: DateTime<Utc>) -> Self {
        let micros = at.timestamp_micros();
        Self(DateTime::from_timestamp_micros(micros).unwrap_or(at))
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for ProfileVersion {
    fn from(at: DateTime<Utc>) -> Self {
        Self::new(at)
    }
}

impl fmt::Display for ProfileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(VERSION_FORMAT))
    }
}

impl FromStr for ProfileVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, VERSION_FORMAT)
            .map(|naive| Self::new(naive.and_utc()))
            .map_err(|_| InvalidVersion(s.to_string()))
    }
}

impl Serialize for ProfileVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProfileVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_identifier_grammar() {
        assert!(OwnerId::parse("alice").is_ok());
        assert!(OwnerId::parse("a-b_c.d~e").is_ok());
        assert!(OwnerId::parse("0f8e2c1a-uuid-like").is_ok());
        assert!(OwnerId::parse("x".repeat(IDENTIFIER_MAX_LEN)).is_ok());
    }

    #[test]
    fn rejects_outside_grammar() {
        assert_eq!(OwnerId::parse(""), Err(IdentifierError::Empty));
        assert_eq!(
            OwnerId::parse("x".repeat(IDENTIFIER_MAX_LEN + 1)),
            Err(IdentifierError::TooLong)
        );
        assert_eq!(OwnerId::parse("a b"), Err(IdentifierError::InvalidChar(' ')));
        assert_eq!(OwnerId::parse("a/b"), Err(IdentifierError::InvalidChar('/')));
        assert_eq!(OwnerId::parse("al%69ce"), Err(IdentifierError::InvalidChar('%')));
        assert_eq!(OwnerId::parse("bob@example"), Err(IdentifierError::InvalidChar('@')));
        assert!(VersionId::parse("2024-01-01 10:00:00").is_err());
    }

    #[test]
    fn version_renders_in_identifier_grammar() {
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 10, 15, 30).unwrap()
            + chrono::Duration::microseconds(123_456);
        let version = ProfileVersion::new(at);
        assert_eq!(version.to_string(), "20261015T101530.123456Z");
        assert!(validate_identifier(&version.to_string()).is_ok());
    }

    #[test]
    fn version_parses_back_to_same_instant() {
        let version = ProfileVersion::now();
        let parsed: ProfileVersion = version.to_string().parse().unwrap();
        assert_eq!(parsed, version);
    }

    #[test]
    fn version_truncates_to_microseconds() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::nanoseconds(1_234_567);
        assert_eq!(ProfileVersion::new(at).to_string(), "20260102T030405.001234Z");
    }

    #[test]
    fn version_segment_that_is_not_a_timestamp() {
        let segment = VersionId::parse("not-a-version").unwrap();
        assert!(segment.to_version().is_none());

        let segment = VersionId::parse("20261015T101530.123456Z").unwrap();
        assert!(segment.to_version().is_some());
    }
}
