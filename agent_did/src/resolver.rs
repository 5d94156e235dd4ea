// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::did::Did;
use crate::did_jwk::DidJwk;
use crate::document::DidDocument;
use crate::error::Result;

/// An interface for DID resolution.
///
/// Implementations resolve a DID to its document; how they do so (derivation,
/// network lookup, a local store) is up to them. The aggregate installs a
/// store-first resolver so identities it manages resolve without a network.
#[async_trait]
pub trait DidResolver: Send + Sync {
  /// Resolves `did` to its DID document.
  async fn resolve(&self, did: &Did) -> Result<DidDocument>;
}

/// A resolver for the `did:jwk` method.
///
/// Resolution is a pure derivation from the method-specific id, so this
/// resolver never performs I/O.
#[derive(Clone, Copy, Debug, Default)]
pub struct DidJwkResolver;

impl DidJwkResolver {
  /// Creates a new `DidJwkResolver`.
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl DidResolver for DidJwkResolver {
  async fn resolve(&self, did: &Did) -> Result<DidDocument> {
    DidJwk::resolve(did)
  }
}

#[cfg(test)]
mod tests {
  use agent_crypto::signature::generate_ed25519;

  use super::*;
  use crate::error::Error;

  #[tokio::test]
  async fn test_resolves_did_jwk() {
    let did: Did = DidJwk::encode(&generate_ed25519().unwrap()).unwrap();
    let document: DidDocument = DidJwkResolver::new().resolve(&did).await.unwrap();
    assert_eq!(document.id, did);
  }

  #[tokio::test]
  async fn test_rejects_unknown_method() {
    let did: Did = Did::parse("did:web:example.com").unwrap();
    assert!(matches!(
      DidJwkResolver::new().resolve(&did).await,
      Err(Error::MethodNotSupported(_))
    ));
  }
}
