// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur when working with DIDs and DID documents.

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// This type represents all possible errors that can occur in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Caused by errors from the [agent_crypto] crate.
  #[error(transparent)]
  CryptoError(#[from] agent_crypto::Error),
  /// Caused by a string that is not a valid DID URI.
  #[error("invalid DID: {0}")]
  InvalidDid(String),
  /// Caused by a DID whose method no available resolver can handle.
  #[error("DID method not supported: {0}")]
  MethodNotSupported(String),
  /// Caused by a resolver that could not produce a DID document.
  #[error("DID resolution failed: {0}")]
  ResolutionFailed(String),
  /// Caused by a DID document that is missing a required part.
  #[error("invalid DID document: {0}")]
  InvalidDocument(&'static str),
}
