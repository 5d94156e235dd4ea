// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Errors that may occur while performing cryptographic operations.

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T, E = Error> = ::core::result::Result<T, E>;

/// This type represents all possible errors that can occur in the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Caused by requesting a hash function outside the supported SHA-2 set.
  #[error("unsupported hash algorithm: {0}")]
  UnsupportedHash(String),
  /// Caused by requesting a key or signature algorithm this crate cannot serve.
  #[error("algorithm not supported: {0}")]
  AlgorithmNotSupported(String),
  /// Caused by an AEAD tag mismatch or a key-unwrap integrity failure.
  #[error("authentication failed")]
  AuthenticationFailed,
  /// Caused by a JWK that is missing members or carries inconsistent ones.
  #[error("invalid JWK: {0}")]
  InvalidJwk(&'static str),
  /// Caused by key material whose length does not match the algorithm.
  #[error("invalid key length: {0}")]
  InvalidKeyLength(usize),
  /// Caused by a nonce whose length does not match the cipher.
  #[error("invalid nonce length: {0}")]
  InvalidNonceLength(usize),
  /// Caused by an authentication tag of unexpected length.
  #[error("invalid tag length: {0}")]
  InvalidTagLength(usize),
  /// Caused by a failure to produce random key material.
  #[error("key generation failed: {0}")]
  KeyGenerationFailed(String),
  /// Caused by a cipher rejecting its inputs during encryption.
  #[error("encryption failed")]
  EncryptionFailed,
  /// Caused by RFC 3394 inputs that are not a multiple of the block size.
  #[error("key wrap failed")]
  KeyWrapFailed,
  /// Caused by input that is not valid base64url without padding.
  #[error("invalid base64: {0}")]
  InvalidBase64(String),
  /// Caused by a value that cannot be canonicalized as JSON.
  #[error("canonical serialization failed: {0}")]
  CanonicalizationFailed(#[from] serde_json::Error),
}
