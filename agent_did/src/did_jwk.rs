// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_crypto::jwk::Jwk;
use agent_crypto::jwu;

use crate::did::Did;
use crate::document::DidDocument;
use crate::document::VerificationMethod;
use crate::error::Error;
use crate::error::Result;

/// The `did:jwk` method: a DID minted from a single public JWK.
///
/// The method-specific id is the base64url-encoded JWK JSON and the derived
/// document carries exactly one verification method with fragment `#0`.
pub struct DidJwk;

impl DidJwk {
  /// The method name.
  pub const METHOD: &'static str = "jwk";

  /// Mints a DID from the public members of `jwk`.
  pub fn encode(jwk: &Jwk) -> Result<Did> {
    let public: Jwk = jwk.to_public();
    let encoded: String = jwu::encode_b64(serde_json::to_vec(&public).map_err(|err| {
      Error::InvalidDid(err.to_string())
    })?);

    Did::parse(format!("did:jwk:{encoded}"))
  }

  /// Derives the DID document of a `did:jwk` DID.
  pub fn resolve(did: &Did) -> Result<DidDocument> {
    if did.method() != Self::METHOD {
      return Err(Error::MethodNotSupported(did.method().to_owned()));
    }

    let decoded: Vec<u8> = jwu::decode_b64(did.method_id()).map_err(Error::CryptoError)?;
    let jwk: Jwk = serde_json::from_slice(&decoded).map_err(|err| Error::ResolutionFailed(err.to_string()))?;

    let method_id: String = format!("{did}#0");
    let mut document: DidDocument = DidDocument::new(did.clone());
    document.verification_method.push(VerificationMethod {
      id: method_id.clone(),
      type_: "JsonWebKey".to_owned(),
      controller: did.clone(),
      public_key_jwk: Some(jwk),
    });
    document.authentication.push(method_id.clone());
    document.assertion_method.push(method_id);

    Ok(document)
  }
}
