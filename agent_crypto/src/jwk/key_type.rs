// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Display;
use core::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

/// Supported types for the JSON Web Key `kty` property.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub enum JwkType {
  /// Elliptic Curve.
  #[serde(rename = "EC")]
  Ec,
  /// Octet Key Pair.
  #[serde(rename = "OKP")]
  Okp,
  /// Octet sequence (symmetric keys).
  #[serde(rename = "oct")]
  Oct,
}

impl JwkType {
  /// Returns the JWK "kty" value as a string slice.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Ec => "EC",
      Self::Okp => "OKP",
      Self::Oct => "oct",
    }
  }
}

impl Display for JwkType {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}
