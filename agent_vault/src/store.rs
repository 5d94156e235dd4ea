// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_core::common::Shared;
use async_trait::async_trait;

use crate::error::Result;
use crate::vault::VaultStatus;

/// The persistence seam under an [`IdentityVault`][crate::IdentityVault].
///
/// Implementations persist the compact envelope and the status record; both
/// are opaque to the store.
#[async_trait]
pub trait VaultStore: Send + Sync {
  /// Returns the persisted status record, if any.
  async fn status(&self) -> Result<Option<VaultStatus>>;

  /// Persists the status record.
  async fn set_status(&self, status: VaultStatus) -> Result<()>;

  /// Returns the persisted compact envelope, if any.
  async fn envelope(&self) -> Result<Option<String>>;

  /// Persists the compact envelope.
  async fn set_envelope(&self, envelope: String) -> Result<()>;
}

#[async_trait]
impl<T: VaultStore + ?Sized> VaultStore for std::sync::Arc<T> {
  async fn status(&self) -> Result<Option<VaultStatus>> {
    (**self).status().await
  }

  async fn set_status(&self, status: VaultStatus) -> Result<()> {
    (**self).set_status(status).await
  }

  async fn envelope(&self) -> Result<Option<String>> {
    (**self).envelope().await
  }

  async fn set_envelope(&self, envelope: String) -> Result<()> {
    (**self).set_envelope(envelope).await
  }
}

/// An in-memory [`VaultStore`].
#[derive(Default)]
pub struct MemVaultStore {
  status: Shared<Option<VaultStatus>>,
  envelope: Shared<Option<String>>,
}

impl MemVaultStore {
  /// Creates a new, empty `MemVaultStore`.
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl VaultStore for MemVaultStore {
  async fn status(&self) -> Result<Option<VaultStatus>> {
    Ok(self.status.read()?.clone())
  }

  async fn set_status(&self, status: VaultStatus) -> Result<()> {
    *self.status.write()? = Some(status);
    Ok(())
  }

  async fn envelope(&self) -> Result<Option<String>> {
    Ok(self.envelope.read()?.clone())
  }

  async fn set_envelope(&self, envelope: String) -> Result<()> {
    *self.envelope.write()? = Some(envelope);
    Ok(())
  }
}

impl core::fmt::Debug for MemVaultStore {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("MemVaultStore")
  }
}
