// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur when constructing or dispatching DWN messages.

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
  /// Caused by errors from the [agent_keys] crate.
  #[error(transparent)]
  KeysError(#[from] agent_keys::Error),
  /// Caused by a message that cannot be (de)serialized.
  #[error("message serialization failed: {0}")]
  SerializationError(#[from] serde_json::Error),
  /// Caused by a request that is missing a parameter its type requires.
  #[error("missing message parameter: {0}")]
  MissingParameter(&'static str),
  /// Caused by a remote DWN endpoint that cannot be reached.
  #[error("endpoint unreachable: {0}")]
  EndpointUnreachable(String),
}
