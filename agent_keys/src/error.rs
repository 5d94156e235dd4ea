// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur during key management.

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
  /// Caused by requesting an algorithm the key manager cannot serve.
  #[error("algorithm not supported: {0}")]
  AlgorithmNotSupported(String),
  /// Caused by attempting to use a key that is not in the store.
  #[error("key not found: {0}")]
  KeyNotFound(String),
  /// Caused by a string that is not a valid `urn:jwk:` key URI.
  #[error("invalid key URI: {0}")]
  InvalidKeyUri(String),
}
