// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur in the core primitives.

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// This type represents all possible errors that can occur in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Caused by attempting to read a poisoned shared resource.
  #[error("shared resource poisoned: read")]
  SharedReadPoisoned,
  /// Caused by attempting to write a poisoned shared resource.
  #[error("shared resource poisoned: write")]
  SharedWritePoisoned,
  /// Caused by a timestamp that cannot be parsed or formatted as RFC 3339.
  #[error("invalid timestamp: {0}")]
  InvalidTimestamp(String),
}
