// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur in the sync engine.

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
  /// Caused by the embedded ordered-key store.
  #[error("sync storage error: {0}")]
  StorageError(#[from] sled::Error),
  /// Caused by a queue key that does not have the expected four segments.
  #[error("malformed sync queue key: {0}")]
  MalformedKey(String),
  /// Caused by the monotonic watermark generator overflowing within one
  /// millisecond.
  #[error("watermark generation failed")]
  WatermarkExhausted,
  /// Caused by an event log query the serving DWN refused.
  #[error("event log query rejected with status {code}: {detail}")]
  QueryRejected {
    code: u16,
    detail: String,
  },
  /// Caused by starting the scheduler while it is already running.
  #[error("sync is already running")]
  AlreadySyncing,
  /// Caused by the scheduler task ending abnormally.
  #[error("sync task failed: {0}")]
  TaskFailed(String),
}
