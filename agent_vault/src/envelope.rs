// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Display;
use core::fmt::Formatter;
use core::str::FromStr;

use agent_crypto::jwk::Jwk;
use agent_crypto::jwu;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;

/// The JWE `alg` value of the vault envelope.
pub const VAULT_ALG: &str = "PBES2-HS512+XC20PKW";
/// The JWE `enc` value of the vault envelope.
pub const VAULT_ENC: &str = "XC20P";
/// The literal occupying the unused fourth segment.
const UNUSED_SEGMENT: &str = "unused";

/// The protected header of the vault envelope.
///
/// The serialized header doubles as the additional authenticated data of the
/// AEAD, so the stored byte form is authoritative; re-serialization is never
/// used for verification.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProtectedHeader {
  /// The key-management algorithm, always [`VAULT_ALG`].
  pub alg: String,
  /// The content-encryption algorithm, always [`VAULT_ENC`].
  pub enc: String,
  /// Critical extension members; carries `wrappedKey`.
  pub crit: Vec<String>,
  /// The PBKDF2 iteration count.
  pub p2c: u32,
  /// The base64url-encoded PBKDF2 salt.
  pub p2s: String,
  /// The public JWK of the identity the vault protects.
  #[serde(rename = "wrappedKey")]
  pub wrapped_key: Jwk,
}

impl ProtectedHeader {
  /// Creates the header for a vault sealed with `iterations` and `salt`.
  pub fn new(iterations: u32, salt: &[u8], wrapped_key: Jwk) -> Self {
    Self {
      alg: VAULT_ALG.to_owned(),
      enc: VAULT_ENC.to_owned(),
      crit: vec!["wrappedKey".to_owned()],
      p2c: iterations,
      p2s: jwu::encode_b64(salt),
      wrapped_key,
    }
  }

  /// Returns the decoded PBKDF2 salt.
  pub fn salt(&self) -> Result<Vec<u8>> {
    Ok(jwu::decode_b64(&self.p2s)?)
  }
}

/// The compact five-segment envelope persisted by the vault:
/// `b64u(header).b64u(ciphertext).b64u(nonce).b64u("unused").b64u(tag)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactEnvelope {
  header_bytes: Vec<u8>,
  ciphertext: Vec<u8>,
  nonce: Vec<u8>,
  tag: Vec<u8>,
}

impl CompactEnvelope {
  /// Assembles an envelope; `header` is serialized exactly once here.
  pub fn new(header: &ProtectedHeader, ciphertext: Vec<u8>, nonce: Vec<u8>, tag: Vec<u8>) -> Result<Self> {
    Ok(Self {
      header_bytes: serde_json::to_vec(header)?,
      ciphertext,
      nonce,
      tag,
    })
  }

  /// The exact serialized header bytes, used as the AEAD associated data.
  pub fn header_bytes(&self) -> &[u8] {
    &self.header_bytes
  }

  /// Parses the protected header.
  pub fn header(&self) -> Result<ProtectedHeader> {
    Ok(serde_json::from_slice(&self.header_bytes)?)
  }

  /// The encrypted vault content.
  pub fn ciphertext(&self) -> &[u8] {
    &self.ciphertext
  }

  /// The AEAD nonce.
  pub fn nonce(&self) -> &[u8] {
    &self.nonce
  }

  /// The AEAD tag.
  pub fn tag(&self) -> &[u8] {
    &self.tag
  }

  /// Parses the compact five-segment form.
  pub fn parse(input: &str) -> Result<Self> {
    let segments: Vec<&str> = input.split('.').collect();
    let [header, ciphertext, nonce, unused, tag]: [&str; 5] = segments
      .try_into()
      .map_err(|_| Error::MalformedEnvelope("expected five segments"))?;

    if jwu::decode_b64(unused)? != UNUSED_SEGMENT.as_bytes() {
      return Err(Error::MalformedEnvelope("unexpected fourth segment"));
    }

    Ok(Self {
      header_bytes: jwu::decode_b64(header)?,
      ciphertext: jwu::decode_b64(ciphertext)?,
      nonce: jwu::decode_b64(nonce)?,
      tag: jwu::decode_b64(tag)?,
    })
  }
}

impl Display for CompactEnvelope {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(
      f,
      "{}.{}.{}.{}.{}",
      jwu::encode_b64(&self.header_bytes),
      jwu::encode_b64(&self.ciphertext),
      jwu::encode_b64(&self.nonce),
      jwu::encode_b64(UNUSED_SEGMENT),
      jwu::encode_b64(&self.tag),
    )
  }
}

impl FromStr for CompactEnvelope {
  type Err = Error;

  fn from_str(string: &str) -> Result<Self, Self::Err> {
    Self::parse(string)
  }
}

#[cfg(test)]
mod tests {
  use agent_crypto::signature::generate_ed25519;

  use super::*;

  fn envelope() -> CompactEnvelope {
    let header: ProtectedHeader = ProtectedHeader::new(210_000, &[7; 52], generate_ed25519().unwrap().to_public());
    CompactEnvelope::new(&header, vec![1, 2, 3], vec![9; 24], vec![4; 16]).unwrap()
  }

  #[test]
  fn test_compact_roundtrip() {
    let original: CompactEnvelope = envelope();
    let compact: String = original.to_string();
    assert_eq!(compact.split('.').count(), 5);

    let parsed: CompactEnvelope = CompactEnvelope::parse(&compact).unwrap();
    assert_eq!(parsed, original);
    assert_eq!(parsed.header().unwrap().p2c, 210_000);
    assert_eq!(parsed.header().unwrap().salt().unwrap(), vec![7; 52]);
  }

  #[test]
  fn test_parse_rejects_malformed_input() {
    assert!(matches!(
      CompactEnvelope::parse("only.four.segments.here"),
      Err(Error::MalformedEnvelope(_))
    ));

    let mut compact: String = envelope().to_string();
    compact.push_str(".extra");
    assert!(CompactEnvelope::parse(&compact).is_err());
  }
}
