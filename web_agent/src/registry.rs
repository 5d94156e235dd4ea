// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use agent_crypto::jwk::Jwk;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidJwk;
use agent_keys::KeyAlgorithm;
use agent_keys::KeyManager;
use agent_keys::KeyUri;
use agent_store::DataStore;

use crate::error::Error;
use crate::error::Result;
use crate::identity::Identity;
use crate::identity::IdentityMetadata;
use crate::identity::PortableDid;
use crate::identity::PortableIdentity;

/// Manages the identities the agent holds besides its own DID.
///
/// Identities are persisted as typed objects in the portable-identity
/// collection under the agent tenant; their private keys live exclusively in
/// the key manager and only travel through [`IdentityRegistry::export`].
pub struct IdentityRegistry {
  store: Arc<dyn DataStore<Identity>>,
  key_manager: Arc<dyn KeyManager>,
}

impl IdentityRegistry {
  /// Creates a registry over the given store and key manager.
  pub fn new(store: Arc<dyn DataStore<Identity>>, key_manager: Arc<dyn KeyManager>) -> Self {
    Self { store, key_manager }
  }

  /// Mints a new `did:jwk` identity, optionally advertising DWN endpoints
  /// in its stored document, and persists it under `tenant` unless `store`
  /// is `false`.
  pub async fn create(
    &self,
    tenant: &Did,
    metadata: IdentityMetadata,
    dwn_endpoints: Vec<String>,
    store: bool,
  ) -> Result<Identity> {
    let key_uri: KeyUri = self.key_manager.generate_key(KeyAlgorithm::Ed25519).await?;
    let public: Jwk = self.key_manager.get_public_key(&key_uri).await?;
    let did: Did = DidJwk::encode(&public)?;

    let mut document: DidDocument = DidJwk::resolve(&did)?;
    if !dwn_endpoints.is_empty() {
      document.set_dwn_endpoints(dwn_endpoints);
    }

    let identity: Identity = Identity {
      did_uri: did.clone(),
      metadata,
      portable_did: PortableDid {
        uri: did.clone(),
        document,
      },
    };

    if store {
      self
        .store
        .set(tenant, did.as_str(), &identity, true)
        .await?;
    }

    log::debug!("created identity {did}");
    Ok(identity)
  }

  /// Returns the identity registered under `did_uri`, if any.
  pub async fn get(&self, tenant: &Did, did_uri: &Did) -> Result<Option<Identity>> {
    Ok(self.store.get(tenant, did_uri.as_str()).await?)
  }

  /// Returns all identities registered under `tenant`.
  pub async fn list(&self, tenant: &Did) -> Result<Vec<Identity>> {
    Ok(self.store.list(tenant).await?)
  }

  /// Removes the identity registered under `did_uri`, returning whether it
  /// existed. The identity's keys stay in the key manager.
  pub async fn delete(&self, tenant: &Did, did_uri: &Did) -> Result<bool> {
    Ok(self.store.delete(tenant, did_uri.as_str()).await?)
  }

  /// Exports an identity with the private keys of every verification method
  /// the key manager can produce.
  pub async fn export(&self, tenant: &Did, did_uri: &Did) -> Result<PortableIdentity> {
    let identity: Identity = self
      .get(tenant, did_uri)
      .await?
      .ok_or_else(|| Error::IdentityNotFound(did_uri.to_string()))?;

    let mut private_keys: Vec<Jwk> = Vec::new();
    for method in &identity.portable_did.document.verification_method {
      let Some(public) = method.public_key_jwk.as_ref() else {
        continue;
      };
      let key_uri: KeyUri = self.key_manager.get_key_uri(public)?;
      private_keys.push(self.key_manager.export_key(&key_uri).await?);
    }

    Ok(PortableIdentity {
      portable_did: identity.portable_did,
      metadata: identity.metadata,
      private_keys,
    })
  }

  /// Imports a portable identity: its keys into the key manager and its
  /// stored parts under `tenant`.
  pub async fn import(&self, tenant: &Did, portable: PortableIdentity) -> Result<Identity> {
    for jwk in portable.private_keys {
      self.key_manager.import_key(jwk).await?;
    }

    let identity: Identity = Identity {
      did_uri: portable.portable_did.uri.clone(),
      metadata: portable.metadata,
      portable_did: portable.portable_did,
    };
    self
      .store
      .set(tenant, identity.did_uri.as_str(), &identity, false)
      .await?;

    Ok(identity)
  }

  /// Replaces the DWN endpoints in the identity's stored document.
  ///
  /// Fails with [`Error::NoChangesDetected`] when the endpoints already
  /// match, without touching the store.
  pub async fn set_dwn_endpoints(&self, tenant: &Did, did_uri: &Did, endpoints: Vec<String>) -> Result<Identity> {
    let mut identity: Identity = self
      .get(tenant, did_uri)
      .await?
      .ok_or_else(|| Error::IdentityNotFound(did_uri.to_string()))?;

    if !identity.portable_did.document.set_dwn_endpoints(endpoints) {
      return Err(Error::NoChangesDetected);
    }

    self
      .store
      .set(tenant, did_uri.as_str(), &identity, false)
      .await?;
    Ok(identity)
  }

  /// Renames the identity.
  ///
  /// Fails with [`Error::NoChangesDetected`] when the name already matches,
  /// without touching the store.
  pub async fn set_metadata_name(&self, tenant: &Did, did_uri: &Did, name: impl Into<String>) -> Result<Identity> {
    let name: String = name.into();
    let mut identity: Identity = self
      .get(tenant, did_uri)
      .await?
      .ok_or_else(|| Error::IdentityNotFound(did_uri.to_string()))?;

    if identity.metadata.name == name {
      return Err(Error::NoChangesDetected);
    }

    identity.metadata.name = name;
    self
      .store
      .set(tenant, did_uri.as_str(), &identity, false)
      .await?;
    Ok(identity)
  }

  /// Returns the identity connected to `connected_did`, or any connected
  /// identity when no counterparty is given.
  pub async fn connected_identity(&self, tenant: &Did, connected_did: Option<&Did>) -> Result<Option<Identity>> {
    let identities: Vec<Identity> = self.list(tenant).await?;

    Ok(identities.into_iter().find(|identity| match connected_did {
      Some(wanted) => identity.metadata.connected_did.as_ref() == Some(wanted),
      None => identity.metadata.connected_did.is_some(),
    }))
  }
}

impl core::fmt::Debug for IdentityRegistry {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("IdentityRegistry")
  }
}
