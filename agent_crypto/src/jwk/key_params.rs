// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;
use zeroize::Zeroize;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::EcCurve;
use crate::jwk::EdCurve;
use crate::jwk::JwkType;

/// Algorithm-specific members of a JWK.
///
/// The variants are untagged; the `kty` member of the enclosing [`Jwk`]
/// [`crate::jwk::Jwk`] determines which variant is valid.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
#[serde(untagged)]
pub enum JwkParams {
  /// Elliptic Curve parameters.
  Ec(JwkParamsEc),
  /// Octet Key Pair parameters.
  Okp(JwkParamsOkp),
  /// Octet sequence parameters.
  Oct(JwkParamsOct),
}

impl JwkParams {
  /// Returns the key type implied by the parameter set.
  pub const fn kty(&self) -> JwkType {
    match self {
      Self::Ec(_) => JwkType::Ec,
      Self::Okp(_) => JwkType::Okp,
      Self::Oct(_) => JwkType::Oct,
    }
  }

  /// Returns a copy with all private members removed.
  pub fn to_public(&self) -> Self {
    match self {
      Self::Ec(inner) => Self::Ec(inner.to_public()),
      Self::Okp(inner) => Self::Okp(inner.to_public()),
      Self::Oct(_) => Self::Oct(JwkParamsOct { k: None }),
    }
  }

  /// Returns `true` if the parameter set contains private members.
  pub fn is_private(&self) -> bool {
    match self {
      Self::Ec(inner) => inner.d.is_some(),
      Self::Okp(inner) => inner.d.is_some(),
      Self::Oct(inner) => inner.k.is_some(),
    }
  }
}

/// Parameters for Elliptic Curve Keys (RFC 7518 §6.2).
#[derive(Clone, Debug, Hash, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
pub struct JwkParamsEc {
  /// The name of the cryptographic curve.
  pub crv: String,
  /// The base64url-encoded x-coordinate.
  pub x: String,
  /// The base64url-encoded y-coordinate.
  pub y: String,
  /// The base64url-encoded private scalar.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub d: Option<String>,
}

impl JwkParamsEc {
  /// Returns a copy with the private scalar removed.
  pub fn to_public(&self) -> Self {
    Self {
      crv: self.crv.clone(),
      x: self.x.clone(),
      y: self.y.clone(),
      d: None,
    }
  }

  /// Returns the [`EcCurve`] if the `crv` member names a supported curve.
  pub fn try_ec_curve(&self) -> Result<EcCurve> {
    EcCurve::from_name(&self.crv).ok_or(Error::InvalidJwk("unsupported EC curve"))
  }
}

/// Parameters for Octet Key Pairs (RFC 8037 §2).
#[derive(Clone, Debug, Hash, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
pub struct JwkParamsOkp {
  /// The name of the cryptographic curve.
  pub crv: String,
  /// The base64url-encoded public key.
  pub x: String,
  /// The base64url-encoded private key.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub d: Option<String>,
}

impl JwkParamsOkp {
  /// Returns a copy with the private key removed.
  pub fn to_public(&self) -> Self {
    Self {
      crv: self.crv.clone(),
      x: self.x.clone(),
      d: None,
    }
  }

  /// Returns the [`EdCurve`] if the `crv` member names a supported curve.
  pub fn try_ed_curve(&self) -> Result<EdCurve> {
    match self.crv.as_str() {
      "Ed25519" => Ok(EdCurve::Ed25519),
      _ => Err(Error::InvalidJwk("unsupported OKP curve")),
    }
  }
}

/// Parameters for symmetric keys (RFC 7518 §6.4).
///
/// `k` is optional so that a public rendition of an `oct` key, with the
/// secret stripped, remains representable.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Deserialize, Serialize, Zeroize)]
pub struct JwkParamsOct {
  /// The base64url-encoded key value.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub k: Option<String>,
}
