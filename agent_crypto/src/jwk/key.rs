// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crypto::hashes::sha::SHA256;
use crypto::hashes::sha::SHA256_LEN;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use zeroize::Zeroize;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::JwkParams;
use crate::jwk::JwkParamsEc;
use crate::jwk::JwkParamsOct;
use crate::jwk::JwkParamsOkp;
use crate::jwk::JwkType;
use crate::jwu::encode_b64;

/// A JSON Web Key with the members the agent works with.
///
/// Private members are zeroed on drop.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Jwk {
  kty: JwkType,
  #[serde(skip_serializing_if = "Option::is_none")]
  alg: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  kid: Option<String>,
  #[serde(flatten)]
  params: JwkParams,
}

impl Jwk {
  /// Creates a new `Jwk` from algorithm-specific parameters.
  pub fn from_params(params: impl Into<JwkParams>) -> Self {
    let params: JwkParams = params.into();

    Self {
      kty: params.kty(),
      alg: None,
      kid: None,
      params,
    }
  }

  /// Returns the value of the `kty` property.
  pub fn kty(&self) -> JwkType {
    self.kty
  }

  /// Returns the value of the `alg` property.
  pub fn alg(&self) -> Option<&str> {
    self.alg.as_deref()
  }

  /// Sets the value of the `alg` property.
  pub fn set_alg(&mut self, value: impl Into<String>) {
    self.alg = Some(value.into());
  }

  /// Returns the value of the `kid` property.
  pub fn kid(&self) -> Option<&str> {
    self.kid.as_deref()
  }

  /// Sets the value of the `kid` property.
  pub fn set_kid(&mut self, value: impl Into<String>) {
    self.kid = Some(value.into());
  }

  /// Returns the algorithm-specific parameters.
  pub fn params(&self) -> &JwkParams {
    &self.params
  }

  /// Returns the EC parameters if the key is an Elliptic Curve key.
  pub fn try_ec_params(&self) -> Result<&JwkParamsEc> {
    match (self.kty, &self.params) {
      (JwkType::Ec, JwkParams::Ec(params)) => Ok(params),
      _ => Err(Error::InvalidJwk("expected EC parameters")),
    }
  }

  /// Returns the OKP parameters if the key is an Octet Key Pair.
  pub fn try_okp_params(&self) -> Result<&JwkParamsOkp> {
    match (self.kty, &self.params) {
      (JwkType::Okp, JwkParams::Okp(params)) => Ok(params),
      _ => Err(Error::InvalidJwk("expected OKP parameters")),
    }
  }

  /// Returns the oct parameters if the key is a symmetric key.
  pub fn try_oct_params(&self) -> Result<&JwkParamsOct> {
    match (self.kty, &self.params) {
      (JwkType::Oct, JwkParams::Oct(params)) => Ok(params),
      _ => Err(Error::InvalidJwk("expected oct parameters")),
    }
  }

  /// Returns the base64url-decoded `k` member of a symmetric key.
  pub fn try_oct_key(&self) -> Result<Vec<u8>> {
    let params: &JwkParamsOct = self.try_oct_params()?;
    let k: &str = params.k.as_deref().ok_or(Error::InvalidJwk("missing k member"))?;

    crate::jwu::decode_b64(k)
  }

  /// Returns `true` if the key contains private members.
  pub fn is_private(&self) -> bool {
    self.params.is_private()
  }

  /// Returns a copy of the key with all private members stripped.
  ///
  /// The `alg` and `kid` properties are retained.
  pub fn to_public(&self) -> Jwk {
    Self {
      kty: self.kty,
      alg: self.alg.clone(),
      kid: self.kid.clone(),
      params: self.params.to_public(),
    }
  }

  /// Computes the RFC 7638 SHA-256 thumbprint over the canonical members.
  ///
  /// The result is base64url-encoded without padding. The thumbprint only
  /// covers the public canonical members for asymmetric keys, so a private
  /// key and its public counterpart share a thumbprint.
  pub fn thumbprint_b64(&self) -> Result<String> {
    let members: Value = match &self.params {
      JwkParams::Ec(params) => json!({
        "crv": params.crv,
        "kty": self.kty.name(),
        "x": params.x,
        "y": params.y,
      }),
      JwkParams::Okp(params) => json!({
        "crv": params.crv,
        "kty": self.kty.name(),
        "x": params.x,
      }),
      JwkParams::Oct(params) => {
        let k: &str = params.k.as_deref().ok_or(Error::InvalidJwk("missing k member"))?;
        json!({
          "k": k,
          "kty": self.kty.name(),
        })
      }
    };

    let canonical: Vec<u8> = serde_jcs::to_vec(&members)?;
    let mut digest: [u8; SHA256_LEN] = [0; SHA256_LEN];
    SHA256(&canonical, &mut digest);

    Ok(encode_b64(digest))
  }
}

impl From<JwkParamsEc> for JwkParams {
  fn from(other: JwkParamsEc) -> Self {
    Self::Ec(other)
  }
}

impl From<JwkParamsOkp> for JwkParams {
  fn from(other: JwkParamsOkp) -> Self {
    Self::Okp(other)
  }
}

impl From<JwkParamsOct> for JwkParams {
  fn from(other: JwkParamsOct) -> Self {
    Self::Oct(other)
  }
}

impl Drop for Jwk {
  fn drop(&mut self) {
    self.params.zeroize();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rfc8037_thumbprint() {
    let jwk: Jwk = serde_json::from_str(
      r#"{"crv":"Ed25519","kty":"OKP","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#,
    )
    .unwrap();

    assert_eq!(jwk.thumbprint_b64().unwrap(), "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");
  }

  #[test]
  fn test_thumbprint_ignores_member_order_and_extras() {
    let ordered: Jwk = serde_json::from_str(
      r#"{"kty":"EC","crv":"secp256k1","x":"1SRPl0oKoKPFJ5FLSWnvftE13QD9GtYKldOj7GNKe8o","y":"EuCLyOvrsp10-rdi1PEiKSCF9DJIN-2PzR7zP14AqIw"}"#,
    )
    .unwrap();
    let shuffled: Jwk = serde_json::from_str(
      r#"{"y":"EuCLyOvrsp10-rdi1PEiKSCF9DJIN-2PzR7zP14AqIw","x":"1SRPl0oKoKPFJ5FLSWnvftE13QD9GtYKldOj7GNKe8o","crv":"secp256k1","kty":"EC","alg":"ES256K","kid":"ignored"}"#,
    )
    .unwrap();

    assert_eq!(ordered.thumbprint_b64().unwrap(), shuffled.thumbprint_b64().unwrap());
    assert_eq!(
      ordered.thumbprint_b64().unwrap(),
      "vO8jHDKD8dynDvVp8Ea2szjIRz2V-hCMhtmJYOxO4oY"
    );
  }

  #[test]
  fn test_thumbprint_of_public_key_matches() {
    let private: Jwk = serde_json::from_str(
      r#"{"kty":"OKP","crv":"Ed25519","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo","d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A"}"#,
    )
    .unwrap();

    assert!(private.is_private());
    assert!(!private.to_public().is_private());
    assert_eq!(
      private.thumbprint_b64().unwrap(),
      private.to_public().thumbprint_b64().unwrap()
    );
  }

  #[test]
  fn test_oct_thumbprint_requires_key_member() {
    let jwk: Jwk = serde_json::from_str(r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#).unwrap();
    assert!(jwk.thumbprint_b64().is_ok());
    assert!(jwk.to_public().thumbprint_b64().is_err());
  }

  #[test]
  fn test_params_accessors_check_kty() {
    let jwk: Jwk = serde_json::from_str(r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#).unwrap();
    assert!(jwk.try_oct_params().is_ok());
    assert!(jwk.try_ec_params().is_err());
    assert!(jwk.try_okp_params().is_err());
  }
}
