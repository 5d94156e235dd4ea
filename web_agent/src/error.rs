// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur at the agent aggregate.

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// This type represents all possible errors that can occur in the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Caused by errors from the [agent_core] crate.
  #[error(transparent)]
  CoreError(#[from] agent_core::Error),
  /// Caused by errors from the [agent_crypto] crate.
  #[error(transparent)]
  CryptoError(#[from] agent_crypto::Error),
  /// Caused by errors from the [agent_did] crate.
  #[error(transparent)]
  DidError(#[from] agent_did::Error),
  /// Caused by errors from the [agent_keys] crate.
  #[error(transparent)]
  KeysError(#[from] agent_keys::Error),
  /// Caused by errors from the [agent_vault] crate.
  #[error(transparent)]
  VaultError(#[from] agent_vault::Error),
  /// Caused by errors from the [agent_dwn] crate.
  #[error(transparent)]
  DwnError(#[from] agent_dwn::Error),
  /// Caused by errors from the [agent_store] crate.
  #[error(transparent)]
  StoreError(#[from] agent_store::Error),
  /// Caused by errors from the [agent_sync] crate.
  #[error(transparent)]
  SyncError(#[from] agent_sync::Error),
  /// Caused by an operation that found no tenant: no explicit tenant, no
  /// subject DID, and no agent DID available.
  #[error("no tenant could be resolved for the operation")]
  TenantResolutionFailed,
  /// Caused by referring to an identity the registry does not hold.
  #[error("identity not found: {0}")]
  IdentityNotFound(String),
  /// Caused by a mutating operation whose result equals the current state.
  #[error("no changes detected")]
  NoChangesDetected,
}
