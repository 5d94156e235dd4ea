// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use agent_core::common::Shared;
use agent_crypto::jwk::Jwk;
use async_trait::async_trait;

use crate::error::Result;
use crate::key_uri::KeyUri;

/// The persistence seam under a [`LocalKeyManager`][crate::LocalKeyManager].
///
/// Implementations store private JWKs by key URI. They are the only place
/// outside the key manager where private key material is allowed to rest.
#[async_trait]
pub trait KeyStore: Send + Sync {
  /// Returns the key stored under `uri`, if any.
  async fn get(&self, uri: &KeyUri) -> Result<Option<Jwk>>;

  /// Stores `jwk` under `uri`, overwriting any previous value.
  async fn set(&self, uri: &KeyUri, jwk: Jwk) -> Result<()>;

  /// Deletes the key stored under `uri`, returning whether it existed.
  async fn delete(&self, uri: &KeyUri) -> Result<bool>;

  /// Returns the URIs of all stored keys.
  async fn list(&self) -> Result<Vec<KeyUri>>;
}

/// An in-memory [`KeyStore`].
#[derive(Default)]
pub struct MemKeyStore {
  keys: Shared<HashMap<KeyUri, Jwk>>,
}

impl MemKeyStore {
  /// Creates a new, empty `MemKeyStore`.
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KeyStore for MemKeyStore {
  async fn get(&self, uri: &KeyUri) -> Result<Option<Jwk>> {
    Ok(self.keys.read()?.get(uri).cloned())
  }

  async fn set(&self, uri: &KeyUri, jwk: Jwk) -> Result<()> {
    self.keys.write()?.insert(uri.clone(), jwk);
    Ok(())
  }

  async fn delete(&self, uri: &KeyUri) -> Result<bool> {
    Ok(self.keys.write()?.remove(uri).is_some())
  }

  async fn list(&self) -> Result<Vec<KeyUri>> {
    Ok(self.keys.read()?.keys().cloned().collect())
  }
}

impl core::fmt::Debug for MemKeyStore {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("MemKeyStore")
  }
}
