// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Signature creation and verification for the supported JWS algorithms.

use core::fmt::Display;
use core::fmt::Formatter;

use crypto::signatures::ed25519;
use k256::ecdsa::signature::Signer;
use k256::ecdsa::signature::Verifier;
use k256::elliptic_curve::generic_array::GenericArray;
use rand::rngs::OsRng;

use crate::error::Error;
use crate::error::Result;
use crate::jwk::EcCurve;
use crate::jwk::Jwk;
use crate::jwk::JwkParams;
use crate::jwk::JwkParamsEc;
use crate::jwk::JwkParamsOkp;
use crate::jwu::decode_b64;
use crate::jwu::encode_b64;

/// The JWS signature algorithms the agent supports.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum JwsAlgorithm {
  /// EdDSA over Ed25519.
  EdDSA,
  /// ECDSA over secp256k1 with SHA-256.
  ES256K,
  /// ECDSA over P-256 with SHA-256.
  ES256,
}

impl JwsAlgorithm {
  /// Returns the JWS "alg" value as a string slice.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::EdDSA => "EdDSA",
      Self::ES256K => "ES256K",
      Self::ES256 => "ES256",
    }
  }

  /// Infers the algorithm from the `kty`/`crv` members of a JWK.
  pub fn from_jwk(jwk: &Jwk) -> Result<Self> {
    match jwk.params() {
      JwkParams::Okp(params) => {
        params.try_ed_curve()?;
        Ok(Self::EdDSA)
      }
      JwkParams::Ec(params) => match params.try_ec_curve()? {
        EcCurve::Secp256k1 => Ok(Self::ES256K),
        EcCurve::P256 => Ok(Self::ES256),
      },
      JwkParams::Oct(_) => Err(Error::AlgorithmNotSupported("oct keys cannot sign".to_owned())),
    }
  }
}

impl Display for JwsAlgorithm {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}

/// Generates a new Ed25519 key pair as a private JWK with `alg` set.
pub fn generate_ed25519() -> Result<Jwk> {
  let private: ed25519::SecretKey =
    ed25519::SecretKey::generate().map_err(|err| Error::KeyGenerationFailed(err.to_string()))?;
  let public: ed25519::PublicKey = private.public_key();

  let params: JwkParamsOkp = JwkParamsOkp {
    crv: "Ed25519".to_owned(),
    x: encode_b64(public.to_bytes().as_slice()),
    d: Some(encode_b64(private.to_bytes().as_slice())),
  };

  let mut jwk: Jwk = Jwk::from_params(params);
  jwk.set_alg(JwsAlgorithm::EdDSA.name());
  Ok(jwk)
}

/// Generates a new secp256k1 key pair as a private JWK with `alg` set.
pub fn generate_secp256k1() -> Result<Jwk> {
  let signing: k256::ecdsa::SigningKey = k256::ecdsa::SigningKey::random(&mut OsRng);
  let point = signing.verifying_key().to_encoded_point(false);

  let params: JwkParamsEc = JwkParamsEc {
    crv: EcCurve::Secp256k1.name().to_owned(),
    x: encode_b64(point.x().ok_or_else(|| Error::KeyGenerationFailed("identity point".to_owned()))?),
    y: encode_b64(point.y().ok_or_else(|| Error::KeyGenerationFailed("identity point".to_owned()))?),
    d: Some(encode_b64(signing.to_bytes().as_slice())),
  };

  let mut jwk: Jwk = Jwk::from_params(params);
  jwk.set_alg(JwsAlgorithm::ES256K.name());
  Ok(jwk)
}

/// Generates a new P-256 key pair as a private JWK with `alg` set.
pub fn generate_p256() -> Result<Jwk> {
  let signing: p256::ecdsa::SigningKey = p256::ecdsa::SigningKey::random(&mut OsRng);
  let point = signing.verifying_key().to_encoded_point(false);

  let params: JwkParamsEc = JwkParamsEc {
    crv: EcCurve::P256.name().to_owned(),
    x: encode_b64(point.x().ok_or_else(|| Error::KeyGenerationFailed("identity point".to_owned()))?),
    y: encode_b64(point.y().ok_or_else(|| Error::KeyGenerationFailed("identity point".to_owned()))?),
    d: Some(encode_b64(signing.to_bytes().as_slice())),
  };

  let mut jwk: Jwk = Jwk::from_params(params);
  jwk.set_alg(JwsAlgorithm::ES256.name());
  Ok(jwk)
}

/// Signs `data` with the private JWK, using the algorithm its curve implies.
pub fn sign(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>> {
  match JwsAlgorithm::from_jwk(jwk)? {
    JwsAlgorithm::EdDSA => sign_ed25519(jwk, data),
    JwsAlgorithm::ES256K => sign_secp256k1(jwk, data),
    JwsAlgorithm::ES256 => sign_p256(jwk, data),
  }
}

/// Verifies `signature` over `data` with the public members of `jwk`.
///
/// Returns `Ok(false)` for well-formed keys with non-matching or malformed
/// signatures; errors are reserved for unusable keys.
pub fn verify(jwk: &Jwk, signature: &[u8], data: &[u8]) -> Result<bool> {
  match JwsAlgorithm::from_jwk(jwk)? {
    JwsAlgorithm::EdDSA => verify_ed25519(jwk, signature, data),
    JwsAlgorithm::ES256K => verify_secp256k1(jwk, signature, data),
    JwsAlgorithm::ES256 => verify_p256(jwk, signature, data),
  }
}

fn private_scalar(jwk: &Jwk) -> Result<Vec<u8>> {
  let d: &str = match jwk.params() {
    JwkParams::Ec(params) => params.d.as_deref(),
    JwkParams::Okp(params) => params.d.as_deref(),
    JwkParams::Oct(_) => None,
  }
  .ok_or(Error::InvalidJwk("missing private member"))?;

  decode_b64(d)
}

fn sign_ed25519(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>> {
  let scalar: Vec<u8> = private_scalar(jwk)?;
  let scalar: [u8; ed25519::SecretKey::LENGTH] = scalar
    .try_into()
    .map_err(|bytes: Vec<u8>| Error::InvalidKeyLength(bytes.len()))?;

  let secret: ed25519::SecretKey = ed25519::SecretKey::from_bytes(&scalar);
  Ok(secret.sign(data).to_bytes().to_vec())
}

fn verify_ed25519(jwk: &Jwk, signature: &[u8], data: &[u8]) -> Result<bool> {
  let params: &JwkParamsOkp = jwk.try_okp_params()?;
  let x: Vec<u8> = decode_b64(&params.x)?;
  let x: [u8; ed25519::PublicKey::LENGTH] = x.try_into().map_err(|bytes: Vec<u8>| Error::InvalidKeyLength(bytes.len()))?;
  let public: ed25519::PublicKey =
    ed25519::PublicKey::try_from(x).map_err(|_| Error::InvalidJwk("invalid Ed25519 public key"))?;

  let signature: [u8; ed25519::Signature::LENGTH] = match signature.try_into() {
    Ok(bytes) => bytes,
    Err(_) => return Ok(false),
  };

  Ok(public.verify(&ed25519::Signature::from_bytes(signature), data))
}

fn sign_secp256k1(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>> {
  let scalar: Vec<u8> = private_scalar(jwk)?;
  let signing: k256::ecdsa::SigningKey =
    k256::ecdsa::SigningKey::from_slice(&scalar).map_err(|_| Error::InvalidJwk("invalid private scalar"))?;

  let signature: k256::ecdsa::Signature = signing.sign(data);
  let signature: k256::ecdsa::Signature = signature.normalize_s().unwrap_or(signature);
  Ok(signature.to_vec())
}

fn verify_secp256k1(jwk: &Jwk, signature: &[u8], data: &[u8]) -> Result<bool> {
  let params: &JwkParamsEc = jwk.try_ec_params()?;
  let x: Vec<u8> = decode_b64(&params.x)?;
  let y: Vec<u8> = decode_b64(&params.y)?;
  if x.len() != 32 || y.len() != 32 {
    return Err(Error::InvalidJwk("invalid public coordinates"));
  }

  let point: k256::EncodedPoint =
    k256::EncodedPoint::from_affine_coordinates(GenericArray::from_slice(&x), GenericArray::from_slice(&y), false);
  let verifying: k256::ecdsa::VerifyingKey =
    k256::ecdsa::VerifyingKey::from_encoded_point(&point).map_err(|_| Error::InvalidJwk("invalid public point"))?;

  let signature: k256::ecdsa::Signature = match k256::ecdsa::Signature::from_slice(signature) {
    Ok(signature) => signature,
    Err(_) => return Ok(false),
  };
  let signature: k256::ecdsa::Signature = signature.normalize_s().unwrap_or(signature);

  Ok(verifying.verify(data, &signature).is_ok())
}

fn sign_p256(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>> {
  let scalar: Vec<u8> = private_scalar(jwk)?;
  let signing: p256::ecdsa::SigningKey =
    p256::ecdsa::SigningKey::from_slice(&scalar).map_err(|_| Error::InvalidJwk("invalid private scalar"))?;

  let signature: p256::ecdsa::Signature = signing.sign(data);
  Ok(signature.to_vec())
}

fn verify_p256(jwk: &Jwk, signature: &[u8], data: &[u8]) -> Result<bool> {
  let params: &JwkParamsEc = jwk.try_ec_params()?;
  let x: Vec<u8> = decode_b64(&params.x)?;
  let y: Vec<u8> = decode_b64(&params.y)?;
  if x.len() != 32 || y.len() != 32 {
    return Err(Error::InvalidJwk("invalid public coordinates"));
  }

  let point: p256::EncodedPoint =
    p256::EncodedPoint::from_affine_coordinates(GenericArray::from_slice(&x), GenericArray::from_slice(&y), false);
  let verifying: p256::ecdsa::VerifyingKey =
    p256::ecdsa::VerifyingKey::from_encoded_point(&point).map_err(|_| Error::InvalidJwk("invalid public point"))?;

  let signature: p256::ecdsa::Signature = match p256::ecdsa::Signature::from_slice(signature) {
    Ok(signature) => signature,
    Err(_) => return Ok(false),
  };

  Ok(verifying.verify(data, &signature).is_ok())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(jwk: &Jwk) {
    let data: &[u8] = b"sample payload";
    let signature: Vec<u8> = sign(jwk, data).unwrap();

    assert!(verify(jwk, &signature, data).unwrap());
    assert!(verify(&jwk.to_public(), &signature, data).unwrap());
    assert!(!verify(jwk, &signature, b"other payload").unwrap());

    let mut tampered: Vec<u8> = signature;
    tampered[0] ^= 0x01;
    assert!(!verify(jwk, &tampered, data).unwrap());
  }

  #[test]
  fn test_ed25519_roundtrip() {
    let jwk: Jwk = generate_ed25519().unwrap();
    assert_eq!(JwsAlgorithm::from_jwk(&jwk).unwrap(), JwsAlgorithm::EdDSA);
    roundtrip(&jwk);
  }

  #[test]
  fn test_secp256k1_roundtrip() {
    let jwk: Jwk = generate_secp256k1().unwrap();
    assert_eq!(JwsAlgorithm::from_jwk(&jwk).unwrap(), JwsAlgorithm::ES256K);
    roundtrip(&jwk);
  }

  #[test]
  fn test_p256_roundtrip() {
    let jwk: Jwk = generate_p256().unwrap();
    assert_eq!(JwsAlgorithm::from_jwk(&jwk).unwrap(), JwsAlgorithm::ES256);
    roundtrip(&jwk);
  }

  #[test]
  fn test_rfc8037_eddsa_vector() {
    let jwk: Jwk = serde_json::from_str(
      r#"{"kty":"OKP","crv":"Ed25519","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo","d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A"}"#,
    )
    .unwrap();

    // RFC 8037 A.4: EdDSA over the ASCII payload of the example JWS.
    let payload: &[u8] = b"Eg45cvXb1RRpyCre8bHQ8Q";
    let signature: Vec<u8> = sign(&jwk, payload).unwrap();
    assert!(verify(&jwk, &signature, payload).unwrap());
  }

  #[test]
  fn test_signing_requires_private_member() {
    let jwk: Jwk = generate_ed25519().unwrap().to_public();
    assert!(matches!(sign(&jwk, b"data"), Err(Error::InvalidJwk(_))));
  }

  #[test]
  fn test_oct_keys_cannot_sign() {
    let jwk: Jwk = serde_json::from_str(r#"{"kty":"oct","k":"GawgguFyGrWKav7AX4VKUg"}"#).unwrap();
    assert!(matches!(sign(&jwk, b"data"), Err(Error::AlgorithmNotSupported(_))));
  }
}
