// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Debug;
use core::fmt::Display;
use core::fmt::Formatter;
use core::str::FromStr;

use agent_crypto::jwk::Jwk;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// The stable handle for a stored key: `urn:jwk:<RFC 7638 thumbprint>`.
///
/// A key URI is a pure function of the public canonical members of a JWK, so
/// importing the same key twice yields the same URI and key equality is
/// decidable by string comparison.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyUri(String);

impl KeyUri {
  /// The URI scheme prefixing every key URI.
  pub const SCHEME: &'static str = "urn:jwk:";

  /// Computes the key URI of `jwk`.
  pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
    let thumbprint: String = jwk.thumbprint_b64()?;
    Ok(Self(format!("{}{}", Self::SCHEME, thumbprint)))
  }

  /// Parses a key URI, validating the scheme.
  pub fn parse(input: impl AsRef<str>) -> Result<Self> {
    let input: &str = input.as_ref();
    match input.strip_prefix(Self::SCHEME) {
      Some(thumbprint) if !thumbprint.is_empty() => Ok(Self(input.to_owned())),
      _ => Err(Error::InvalidKeyUri(input.to_owned())),
    }
  }

  /// Returns the thumbprint component of the URI.
  pub fn thumbprint(&self) -> &str {
    &self.0[Self::SCHEME.len()..]
  }

  /// Returns the key URI as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for KeyUri {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(&self.0)
  }
}

impl Debug for KeyUri {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "KeyUri({})", self.0)
  }
}

impl FromStr for KeyUri {
  type Err = Error;

  fn from_str(string: &str) -> Result<Self, Self::Err> {
    Self::parse(string)
  }
}

impl TryFrom<String> for KeyUri {
  type Error = Error;

  fn try_from(other: String) -> Result<Self, Self::Error> {
    Self::parse(other)
  }
}

impl From<KeyUri> for String {
  fn from(other: KeyUri) -> Self {
    other.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_key_uri_fixture() {
    let jwk: Jwk = serde_json::from_str(
      r#"{"kty":"EC","crv":"secp256k1","x":"1SRPl0oKoKPFJ5FLSWnvftE13QD9GtYKldOj7GNKe8o","y":"EuCLyOvrsp10-rdi1PEiKSCF9DJIN-2PzR7zP14AqIw"}"#,
    )
    .unwrap();

    let uri: KeyUri = KeyUri::from_jwk(&jwk).unwrap();
    assert_eq!(uri.as_str(), "urn:jwk:vO8jHDKD8dynDvVp8Ea2szjIRz2V-hCMhtmJYOxO4oY");
    assert_eq!(uri.thumbprint(), "vO8jHDKD8dynDvVp8Ea2szjIRz2V-hCMhtmJYOxO4oY");
  }

  #[test]
  fn test_private_and_public_key_share_a_uri() {
    let jwk: Jwk = agent_crypto::signature::generate_ed25519().unwrap();
    assert_eq!(
      KeyUri::from_jwk(&jwk).unwrap(),
      KeyUri::from_jwk(&jwk.to_public()).unwrap()
    );
  }

  #[test]
  fn test_parse_validates_scheme() {
    assert!(KeyUri::parse("urn:jwk:abc").is_ok());
    assert!(KeyUri::parse("urn:jwk:").is_err());
    assert!(KeyUri::parse("urn:uuid:abc").is_err());
  }
}
