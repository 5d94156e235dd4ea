// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use agent_core::common::Shared;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidResolver;
use agent_store::DataStore;
use async_trait::async_trait;

use crate::identity::Identity;

/// A store-first DID resolver.
///
/// DIDs the agent manages resolve from the identity registry, where their
/// documents may have been amended with DWN service endpoints; everything
/// else falls back to the method resolver. The registry store is attached
/// after construction because it is itself built on top of the DWN client
/// that needs this resolver.
pub struct AgentResolver {
  store: Shared<Option<Arc<dyn DataStore<Identity>>>>,
  agent_did: Arc<Shared<Option<Did>>>,
  fallback: Arc<dyn DidResolver>,
}

impl AgentResolver {
  /// Creates a resolver with no attached registry store.
  pub fn new(fallback: Arc<dyn DidResolver>, agent_did: Arc<Shared<Option<Did>>>) -> Self {
    Self {
      store: Shared::new(None),
      agent_did,
      fallback,
    }
  }

  /// Attaches the identity registry store for store-first resolution.
  pub fn attach_store(&self, store: Arc<dyn DataStore<Identity>>) -> agent_did::Result<()> {
    *self
      .store
      .write()
      .map_err(|err| agent_did::Error::ResolutionFailed(err.to_string()))? = Some(store);
    Ok(())
  }
}

#[async_trait]
impl DidResolver for AgentResolver {
  async fn resolve(&self, did: &Did) -> agent_did::Result<DidDocument> {
    let lookup: Option<(Arc<dyn DataStore<Identity>>, Did)> = {
      let store = self
        .store
        .read()
        .map_err(|err| agent_did::Error::ResolutionFailed(err.to_string()))?
        .clone();
      let tenant = self
        .agent_did
        .read()
        .map_err(|err| agent_did::Error::ResolutionFailed(err.to_string()))?
        .clone();
      // the agent's own DID lives in the vault, not the registry; skipping
      // it here also keeps store queries (signed as the agent) from
      // resolving recursively
      match tenant {
        Some(tenant) if tenant != *did => store.map(|store| (store, tenant)),
        _ => None,
      }
    };

    if let Some((store, tenant)) = lookup {
      match store.get(&tenant, did.as_str()).await {
        Ok(Some(identity)) => return Ok(identity.portable_did.document),
        Ok(None) => {}
        Err(err) => log::debug!("registry resolution of {did} failed, falling back: {err}"),
      }
    }

    self.fallback.resolve(did).await
  }
}

impl core::fmt::Debug for AgentResolver {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("AgentResolver")
  }
}
