// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use agent_core::common::Shared;
use agent_did::resolver::DidJwkResolver;
use agent_did::Did;
use agent_dwn::DwnClient;
use agent_dwn::HttpTransport;
use agent_dwn::MemNode;
use agent_dwn::MessageSink;
use agent_dwn::RemoteTransport;
use agent_keys::KeyManager;
use agent_keys::LocalKeyManager;
use agent_store::DataStore;
use agent_store::DwnDataStore;
use agent_store::MemDataStore;
use agent_sync::SyncDb;
use agent_sync::SyncEngine;
use agent_vault::IdentityVault;
use agent_vault::MemVaultStore;
use agent_vault::VaultContent;
use agent_vault::VaultStore;

use crate::error::Error;
use crate::error::Result;
use crate::identity::Identity;
use crate::identity::IdentityMetadata;
use crate::identity::PortableIdentity;
use crate::registry::IdentityRegistry;
use crate::resolver::AgentResolver;
use crate::tenant;

/// The storage backing the identity registry.
pub enum RegistryStore {
  /// Typed records in the agent's DWN (the default).
  Dwn,
  /// A plain in-memory map, for tests and ephemeral agents.
  Memory,
  /// A caller-provided store.
  Custom(Arc<dyn DataStore<Identity>>),
}

/// An [`Agent`] builder for easier agent configuration.
pub struct AgentBuilder {
  vault_store: Arc<dyn VaultStore>,
  vault_work_factor: u32,
  key_manager: Arc<dyn KeyManager>,
  node: Arc<dyn MessageSink>,
  transport: Arc<dyn RemoteTransport>,
  registry_store: RegistryStore,
  sync_db: Option<SyncDb>,
}

impl AgentBuilder {
  /// Creates a builder with in-memory collaborators.
  pub fn new() -> Self {
    Self {
      vault_store: Arc::new(MemVaultStore::new()),
      vault_work_factor: agent_vault::vault::DEFAULT_KEY_DERIVATION_WORK_FACTOR,
      key_manager: Arc::new(LocalKeyManager::new()),
      node: Arc::new(MemNode::new()),
      transport: Arc::new(HttpTransport::new()),
      registry_store: RegistryStore::Dwn,
      sync_db: None,
    }
  }

  /// Sets the vault persistence.
  pub fn vault_store(mut self, value: Arc<dyn VaultStore>) -> Self {
    self.vault_store = value;
    self
  }

  /// Sets the vault's PBKDF2 work factor.
  pub fn vault_work_factor(mut self, value: u32) -> Self {
    self.vault_work_factor = value;
    self
  }

  /// Sets the key manager.
  pub fn key_manager(mut self, value: Arc<dyn KeyManager>) -> Self {
    self.key_manager = value;
    self
  }

  /// Sets the local DWN message engine.
  pub fn node(mut self, value: Arc<dyn MessageSink>) -> Self {
    self.node = value;
    self
  }

  /// Sets the remote DWN transport.
  pub fn transport(mut self, value: Arc<dyn RemoteTransport>) -> Self {
    self.transport = value;
    self
  }

  /// Sets the identity registry storage adapter.
  pub fn registry_store(mut self, value: RegistryStore) -> Self {
    self.registry_store = value;
    self
  }

  /// Sets the sync engine's embedded store.
  pub fn sync_db(mut self, value: SyncDb) -> Self {
    self.sync_db = Some(value);
    self
  }

  /// Creates the [`Agent`] based on the builder configuration.
  pub fn build(self) -> Result<Agent> {
    let agent_did: Arc<Shared<Option<Did>>> = Arc::new(Shared::new(None));
    let resolver: Arc<AgentResolver> = Arc::new(AgentResolver::new(
      Arc::new(DidJwkResolver::new()),
      Arc::clone(&agent_did),
    ));

    let dwn: DwnClient = DwnClient::new(self.node, self.transport, self.key_manager.clone(), resolver.clone());

    let store: Arc<dyn DataStore<Identity>> = match self.registry_store {
      RegistryStore::Dwn => Arc::new(DwnDataStore::<Identity>::new(dwn.clone())),
      RegistryStore::Memory => Arc::new(MemDataStore::<Identity>::new()),
      RegistryStore::Custom(store) => store,
    };
    resolver.attach_store(store.clone())?;

    let identities: IdentityRegistry = IdentityRegistry::new(store, self.key_manager.clone());

    let sync_db: SyncDb = match self.sync_db {
      Some(db) => db,
      None => SyncDb::temporary()?,
    };
    let sync: SyncEngine = SyncEngine::new(sync_db, dwn.clone(), resolver.clone());

    let vault: IdentityVault<Arc<dyn VaultStore>> =
      IdentityVault::with_work_factor(self.vault_store, self.vault_work_factor);

    Ok(Agent {
      vault,
      key_manager: self.key_manager,
      resolver,
      dwn,
      identities,
      sync,
      agent_did,
    })
  }
}

impl Default for AgentBuilder {
  fn default() -> Self {
    Self::new()
  }
}

/// The agent aggregate: vault, key manager, DWN client, identity registry
/// and sync engine behind one handle.
///
/// The agent DID becomes available after [`Agent::initialize`] (first
/// launch) or [`Agent::start`] (subsequent launches) and is the default
/// tenant of every data-store operation.
pub struct Agent {
  vault: IdentityVault<Arc<dyn VaultStore>>,
  key_manager: Arc<dyn KeyManager>,
  resolver: Arc<AgentResolver>,
  dwn: DwnClient,
  identities: IdentityRegistry,
  sync: SyncEngine,
  agent_did: Arc<Shared<Option<Did>>>,
}

impl Agent {
  /// Creates an [`AgentBuilder`].
  pub fn builder() -> AgentBuilder {
    AgentBuilder::new()
  }

  /// Returns `true` while the vault has never been initialized.
  pub async fn first_launch(&self) -> Result<bool> {
    Ok(!self.vault.is_initialized().await?)
  }

  /// Initializes the vault under `password` and adopts the new agent DID.
  pub async fn initialize(&self, password: &str) -> Result<Did> {
    self.vault.initialize(password).await?;
    self.adopt_vault_identity().await
  }

  /// Unlocks the vault and adopts the stored agent DID.
  pub async fn start(&self, password: &str) -> Result<Did> {
    self.vault.unlock(password).await?;
    self.adopt_vault_identity().await
  }

  /// Locks the vault and forgets the agent DID.
  pub fn lock(&self) -> Result<()> {
    self.vault.lock()?;
    *self.agent_did.write()? = None;
    Ok(())
  }

  async fn adopt_vault_identity(&self) -> Result<Did> {
    let contents: VaultContent = self.vault.contents()?;
    for jwk in &contents.private_keys {
      self.key_manager.import_key(jwk.clone()).await?;
    }

    *self.agent_did.write()? = Some(contents.did.clone());
    Ok(contents.did)
  }

  /// Returns the agent DID, available while the vault is unlocked.
  pub fn agent_did(&self) -> Result<Did> {
    self.agent_did.read()?.clone().ok_or(Error::TenantResolutionFailed)
  }

  /// Determines the tenant of an operation; see [`tenant::resolve_tenant`].
  pub fn resolve_tenant(&self, explicit: Option<&Did>, subject: Option<&Did>) -> Result<Did> {
    let agent: Option<Did> = self.agent_did.read()?.clone();
    tenant::resolve_tenant(explicit, subject, agent.as_ref())
  }

  /// The identity vault.
  pub fn vault(&self) -> &IdentityVault<Arc<dyn VaultStore>> {
    &self.vault
  }

  /// The key manager.
  pub fn key_manager(&self) -> &Arc<dyn KeyManager> {
    &self.key_manager
  }

  /// The store-first DID resolver.
  pub fn resolver(&self) -> Arc<AgentResolver> {
    Arc::clone(&self.resolver)
  }

  /// The DWN client.
  pub fn dwn(&self) -> &DwnClient {
    &self.dwn
  }

  /// The identity registry, for operations under an explicit tenant.
  pub fn identities(&self) -> &IdentityRegistry {
    &self.identities
  }

  /// The sync engine.
  pub fn sync(&self) -> &SyncEngine {
    &self.sync
  }

  // ===========================================================================
  // Identity management under the agent tenant
  // ===========================================================================

  /// Creates and persists a new identity under the agent tenant.
  pub async fn create_identity(&self, metadata: IdentityMetadata, dwn_endpoints: Vec<String>) -> Result<Identity> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.create(&tenant, metadata, dwn_endpoints, true).await
  }

  /// Returns the identity registered under `did_uri`, if any.
  pub async fn get_identity(&self, did_uri: &Did) -> Result<Option<Identity>> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.get(&tenant, did_uri).await
  }

  /// Returns all identities registered under the agent tenant.
  pub async fn list_identities(&self) -> Result<Vec<Identity>> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.list(&tenant).await
  }

  /// Removes an identity, returning whether it existed.
  pub async fn delete_identity(&self, did_uri: &Did) -> Result<bool> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.delete(&tenant, did_uri).await
  }

  /// Exports an identity together with its private keys.
  pub async fn export_identity(&self, did_uri: &Did) -> Result<PortableIdentity> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.export(&tenant, did_uri).await
  }

  /// Imports a portable identity under the agent tenant.
  pub async fn import_identity(&self, portable: PortableIdentity) -> Result<Identity> {
    let tenant: Did = self.resolve_tenant(None, None)?;
    self.identities.import(&tenant, portable).await
  }

  /// Enrolls an identity for replication.
  pub fn register_sync_identity(&self, did: Did) -> Result<()> {
    Ok(self.sync.register_identity(did)?)
  }

  /// Starts periodic replication with the given interval.
  pub fn start_sync(&self, interval: Duration) -> Result<()> {
    Ok(self.sync.start_sync(interval)?)
  }

  /// Stops periodic replication, surfacing a terminal tick error if any.
  pub async fn stop_sync(&self) -> Result<()> {
    Ok(self.sync.stop_sync().await?)
  }
}

impl core::fmt::Debug for Agent {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("Agent")
  }
}
