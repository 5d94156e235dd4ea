// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::Error;
use crate::error::Result;

/// A UTC timestamp with second precision, serialized as an RFC 3339 string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
  /// Creates a new `Timestamp` of the current time.
  ///
  /// Sub-second components are truncated so that round-trips through the
  /// string representation are lossless.
  pub fn now_utc() -> Self {
    Self(truncate(OffsetDateTime::now_utc()))
  }

  /// Parses a `Timestamp` from an RFC 3339 string.
  pub fn parse(input: &str) -> Result<Self> {
    OffsetDateTime::parse(input, &Rfc3339)
      .map(truncate)
      .map(Self)
      .map_err(|err| Error::InvalidTimestamp(err.to_string()))
  }

  /// Returns the RFC 3339 representation.
  pub fn to_rfc3339(&self) -> String {
    // safe to unwrap, the wrapped time is always valid and in range
    self.0.format(&Rfc3339).unwrap()
  }

  /// Returns the timestamp as seconds since the Unix epoch.
  pub fn to_unix(&self) -> i64 {
    self.0.unix_timestamp()
  }

  /// Creates a `Timestamp` from seconds since the Unix epoch.
  pub fn from_unix(seconds: i64) -> Result<Self> {
    OffsetDateTime::from_unix_timestamp(seconds)
      .map(Self)
      .map_err(|err| Error::InvalidTimestamp(err.to_string()))
  }
}

fn truncate(value: OffsetDateTime) -> OffsetDateTime {
  // safe to unwrap, zero is always a valid nanosecond
  value.replace_nanosecond(0).unwrap()
}

impl Debug for Timestamp {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "{:?}", self.to_rfc3339())
  }
}

impl Display for Timestamp {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}", self.to_rfc3339())
  }
}

impl FromStr for Timestamp {
  type Err = Error;

  fn from_str(string: &str) -> Result<Self, Self::Err> {
    Self::parse(string)
  }
}

impl Serialize for Timestamp {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_rfc3339())
  }
}

impl<'de> Deserialize<'de> for Timestamp {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let string: String = String::deserialize(deserializer)?;
    Self::parse(&string).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::Timestamp;

  #[test]
  fn test_parse_roundtrip() {
    let original: &str = "2024-03-21T13:37:42Z";
    let parsed: Timestamp = Timestamp::parse(original).unwrap();
    assert_eq!(parsed.to_rfc3339(), original);
  }

  #[test]
  fn test_now_roundtrip() {
    let now: Timestamp = Timestamp::now_utc();
    let parsed: Timestamp = Timestamp::parse(&now.to_rfc3339()).unwrap();
    assert_eq!(now, parsed);
  }

  #[test]
  fn test_invalid() {
    assert!(Timestamp::parse("not-a-timestamp").is_err());
    assert!(Timestamp::parse("2024-13-01T00:00:00Z").is_err());
  }

  #[test]
  fn test_serde_string_representation() {
    let parsed: Timestamp = Timestamp::parse("2024-03-21T13:37:42Z").unwrap();
    let json: String = serde_json::to_string(&parsed).unwrap();
    assert_eq!(json, "\"2024-03-21T13:37:42Z\"");
    let back: Timestamp = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, back);
  }
}
