// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur in the typed data store.

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
  /// Caused by errors from the [agent_dwn] crate.
  #[error(transparent)]
  DwnError(#[from] agent_dwn::Error),
  /// Caused by an object that cannot be (de)serialized.
  #[error("object serialization failed: {0}")]
  SerializationError(#[from] serde_json::Error),
  /// Caused by `set` with duplicate prevention on an id that already exists.
  #[error("an entry already exists for id: {0}")]
  DuplicateEntry(String),
  /// Caused by a stored object too large to be returned inline.
  #[error("stored object exceeds the inline data limit: {0}")]
  ObjectTooLarge(String),
  /// Caused by a failure to install the collection protocol for a tenant.
  #[error("protocol installation failed: {0}")]
  ProtocolInstallFailed(String),
  /// Caused by a DWN refusing a record write.
  #[error("record write failed with status {code}: {detail}")]
  WriteFailed {
    code: u16,
    detail: String,
  },
  /// Caused by a DWN rejecting a record query.
  #[error("record query failed with status {code}: {detail}")]
  QueryFailed {
    code: u16,
    detail: String,
  },
  /// Caused by a DWN refusing a record delete.
  #[error("record delete failed with status {code}: {detail}")]
  DeleteFailed {
    code: u16,
    detail: String,
  },
  /// Caused by an index entry whose record the DWN no longer returns.
  #[error("index and DWN state disagree for: {0}")]
  DwnInconsistent(String),
}
