// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Display;
use core::fmt::Formatter;

/// Supported Edwards curves for the JWK `crv` property.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum EdCurve {
  /// Ed25519 signature algorithm key pairs.
  Ed25519,
}

impl EdCurve {
  /// Returns the JWK "crv" value as a string slice.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Ed25519 => "Ed25519",
    }
  }
}

impl Display for EdCurve {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}

/// Supported Weierstrass curves for the JWK `crv` property.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum EcCurve {
  /// The secp256k1 curve (ES256K).
  Secp256k1,
  /// The NIST P-256 curve, also known as secp256r1 (ES256).
  P256,
}

impl EcCurve {
  /// Returns the JWK "crv" value as a string slice.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Secp256k1 => "secp256k1",
      Self::P256 => "P-256",
    }
  }

  /// Parses a curve from its JWK "crv" value.
  ///
  /// The `secp256r1` alias for P-256 is accepted on input.
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "secp256k1" => Some(Self::Secp256k1),
      "P-256" | "secp256r1" => Some(Self::P256),
      _ => None,
    }
  }
}

impl Display for EcCurve {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}
