// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use strum::Display;
use strum::EnumString;

/// The key algorithms the key manager can generate and operate with.
///
/// The string forms follow JOSE: curve names for signature keys and JWE
/// algorithm names for symmetric keys.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Display, EnumString)]
pub enum KeyAlgorithm {
  /// EdDSA signatures over Ed25519.
  #[strum(serialize = "Ed25519")]
  Ed25519,
  /// ECDSA signatures over secp256k1.
  #[strum(serialize = "secp256k1")]
  Secp256k1,
  /// ECDSA signatures over secp256r1 (P-256).
  #[strum(serialize = "secp256r1")]
  Secp256r1,
  /// AES Key Wrap with a 128-bit key.
  #[strum(serialize = "A128KW")]
  A128Kw,
  /// AES Key Wrap with a 192-bit key.
  #[strum(serialize = "A192KW")]
  A192Kw,
  /// AES Key Wrap with a 256-bit key.
  #[strum(serialize = "A256KW")]
  A256Kw,
  /// AES-GCM with a 128-bit key.
  #[strum(serialize = "A128GCM")]
  A128Gcm,
  /// AES-GCM with a 192-bit key.
  #[strum(serialize = "A192GCM")]
  A192Gcm,
  /// AES-GCM with a 256-bit key.
  #[strum(serialize = "A256GCM")]
  A256Gcm,
}

impl KeyAlgorithm {
  /// Returns `true` for the symmetric (oct) algorithms.
  pub const fn is_symmetric(&self) -> bool {
    self.symmetric_key_len().is_some()
  }

  /// Returns the key length in bytes for symmetric algorithms.
  pub const fn symmetric_key_len(&self) -> Option<usize> {
    match self {
      Self::A128Kw | Self::A128Gcm => Some(16),
      Self::A192Kw | Self::A192Gcm => Some(24),
      Self::A256Kw | Self::A256Gcm => Some(32),
      Self::Ed25519 | Self::Secp256k1 | Self::Secp256r1 => None,
    }
  }

  /// Returns `true` for the AES Key Wrap algorithms.
  pub const fn is_key_wrap(&self) -> bool {
    matches!(self, Self::A128Kw | Self::A192Kw | Self::A256Kw)
  }

  /// Returns `true` for the AES-GCM algorithms.
  pub const fn is_aes_gcm(&self) -> bool {
    matches!(self, Self::A128Gcm | Self::A192Gcm | Self::A256Gcm)
  }
}

#[cfg(test)]
mod tests {
  use core::str::FromStr;

  use super::KeyAlgorithm;

  #[test]
  fn test_string_forms() {
    assert_eq!(KeyAlgorithm::Ed25519.to_string(), "Ed25519");
    assert_eq!(KeyAlgorithm::Secp256k1.to_string(), "secp256k1");
    assert_eq!(KeyAlgorithm::A256Kw.to_string(), "A256KW");
    assert_eq!(KeyAlgorithm::from_str("A128GCM").unwrap(), KeyAlgorithm::A128Gcm);
    assert!(KeyAlgorithm::from_str("RS256").is_err());
  }

  #[test]
  fn test_symmetric_lengths() {
    assert_eq!(KeyAlgorithm::A192Gcm.symmetric_key_len(), Some(24));
    assert_eq!(KeyAlgorithm::Ed25519.symmetric_key_len(), None);
    assert!(KeyAlgorithm::A256Kw.is_key_wrap());
    assert!(!KeyAlgorithm::A256Gcm.is_key_wrap());
  }
}
