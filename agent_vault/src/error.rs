// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur when working with the identity vault.

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// This type represents all possible errors that can occur in the crate.
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
  /// Caused by vault content that cannot be (de)serialized.
  #[error("vault serialization failed: {0}")]
  SerializationError(#[from] serde_json::Error),
  /// Caused by invoking an operation that requires an initialized vault.
  #[error("vault not initialized")]
  NotInitialized,
  /// Caused by attempting to initialize a vault twice.
  #[error("vault already initialized")]
  AlreadyInitialized,
  /// Caused by invoking an operation that requires an unlocked vault.
  #[error("vault locked")]
  Locked,
  /// Caused by a password that fails to decrypt the vault envelope.
  #[error("invalid vault password")]
  InvalidPassword,
  /// Caused by an envelope that does not have the expected five segments.
  #[error("malformed vault envelope: {0}")]
  MalformedEnvelope(&'static str),
}
