// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::str::FromStr;

use did_url::DID;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// A validated DID URI.
///
/// The inner string is the normalized `did:<method>:<method-id>` form without
/// any fragment or query part, which makes equality usable for tenant keys.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
  /// Parses and validates a DID URI.
  pub fn parse(input: impl AsRef<str>) -> Result<Self> {
    let did: DID = DID::parse(input.as_ref()).map_err(|err| Error::InvalidDid(err.to_string()))?;

    Ok(Self(format!("did:{}:{}", did.method(), did.method_id())))
  }

  /// Returns the DID method name, e.g. `jwk` for `did:jwk:...`.
  pub fn method(&self) -> &str {
    // safe to unwrap, the inner string always has three segments
    self.0.split(':').nth(1).unwrap()
  }

  /// Returns the method-specific identifier.
  pub fn method_id(&self) -> &str {
    // the method id may itself contain colons
    let prefix_len: usize = "did:".len() + self.method().len() + 1;
    &self.0[prefix_len..]
  }

  /// Returns the DID as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for Did {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(&self.0)
  }
}

impl Debug for Did {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "Did({})", self.0)
  }
}

impl FromStr for Did {
  type Err = Error;

  fn from_str(string: &str) -> Result<Self, Self::Err> {
    Self::parse(string)
  }
}

impl TryFrom<String> for Did {
  type Error = Error;

  fn try_from(other: String) -> Result<Self, Self::Error> {
    Self::parse(other)
  }
}

impl From<Did> for String {
  fn from(other: Did) -> Self {
    other.0
  }
}

impl AsRef<str> for Did {
  fn as_ref(&self) -> &str {
    &self.0
  }
}
