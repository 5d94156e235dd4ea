// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! AES Key Wrap (RFC 3394).

use aes::cipher::generic_array::GenericArray;
use aes::Aes128;
use aes::Aes192;
use aes::Aes256;
use aes_kw::Kek;

use crate::error::Error;
use crate::error::Result;

/// Length added to the plaintext key by the RFC 3394 integrity block.
pub const AES_KW_OVERHEAD: usize = 8;

/// Wraps `key` under `kek`; the output is eight bytes longer than the input.
///
/// The AES key size is selected by the length of `kek` (16, 24 or 32 bytes).
pub fn aes_kw_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>> {
  match kek.len() {
    16 => Kek::<Aes128>::from(GenericArray::clone_from_slice(kek))
      .wrap_vec(key)
      .map_err(|_| Error::KeyWrapFailed),
    24 => Kek::<Aes192>::from(GenericArray::clone_from_slice(kek))
      .wrap_vec(key)
      .map_err(|_| Error::KeyWrapFailed),
    32 => Kek::<Aes256>::from(GenericArray::clone_from_slice(kek))
      .wrap_vec(key)
      .map_err(|_| Error::KeyWrapFailed),
    other => Err(Error::InvalidKeyLength(other)),
  }
}

/// Unwraps `wrapped` under `kek`, checking the RFC 3394 integrity value.
///
/// Fails with [`Error::AuthenticationFailed`] when the integrity check does
/// not pass, which also covers wrapping under the wrong key-encryption key.
pub fn aes_kw_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>> {
  if wrapped.len() < 2 * AES_KW_OVERHEAD || wrapped.len() % AES_KW_OVERHEAD != 0 {
    return Err(Error::KeyWrapFailed);
  }

  match kek.len() {
    16 => Kek::<Aes128>::from(GenericArray::clone_from_slice(kek))
      .unwrap_vec(wrapped)
      .map_err(|_| Error::AuthenticationFailed),
    24 => Kek::<Aes192>::from(GenericArray::clone_from_slice(kek))
      .unwrap_vec(wrapped)
      .map_err(|_| Error::AuthenticationFailed),
    32 => Kek::<Aes256>::from(GenericArray::clone_from_slice(kek))
      .unwrap_vec(wrapped)
      .map_err(|_| Error::AuthenticationFailed),
    other => Err(Error::InvalidKeyLength(other)),
  }
}
