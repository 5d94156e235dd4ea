// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Authenticated encryption with associated data.
//!
//! XChaCha20-Poly1305 protects the identity vault envelope; AES-GCM protects
//! content keys. Both produce detached 16-byte tags.

use aes::cipher::generic_array::GenericArray;
use aes::Aes192;
use aes_gcm::aead::consts::U12;
use aes_gcm::AeadInPlace;
use aes_gcm::Aes128Gcm;
use aes_gcm::Aes256Gcm;
use aes_gcm::AesGcm;
use aes_gcm::KeyInit;
use chacha20poly1305::XChaCha20Poly1305;

use crate::error::Error;
use crate::error::Result;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Nonce length of XChaCha20-Poly1305.
pub const XCHACHA20_POLY1305_NONCE_LEN: usize = 24;
/// Nonce length of AES-GCM.
pub const AES_GCM_NONCE_LEN: usize = 12;
/// Tag length shared by both AEAD families.
pub const AEAD_TAG_LEN: usize = 16;

/// Encrypts `plaintext` with XChaCha20-Poly1305, returning `(ciphertext, tag)`.
pub fn xchacha20poly1305_encrypt(
  key: &[u8],
  nonce: &[u8],
  plaintext: &[u8],
  associated_data: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
  if key.len() != 32 {
    return Err(Error::InvalidKeyLength(key.len()));
  }
  if nonce.len() != XCHACHA20_POLY1305_NONCE_LEN {
    return Err(Error::InvalidNonceLength(nonce.len()));
  }

  let cipher: XChaCha20Poly1305 = XChaCha20Poly1305::new(GenericArray::from_slice(key));
  let mut buffer: Vec<u8> = plaintext.to_vec();
  let tag = cipher
    .encrypt_in_place_detached(GenericArray::from_slice(nonce), associated_data, &mut buffer)
    .map_err(|_| Error::EncryptionFailed)?;

  Ok((buffer, tag.to_vec()))
}

/// Decrypts an XChaCha20-Poly1305 ciphertext with a detached tag.
///
/// Fails with [`Error::AuthenticationFailed`] on tag mismatch.
pub fn xchacha20poly1305_decrypt(
  key: &[u8],
  nonce: &[u8],
  ciphertext: &[u8],
  tag: &[u8],
  associated_data: &[u8],
) -> Result<Vec<u8>> {
  if key.len() != 32 {
    return Err(Error::InvalidKeyLength(key.len()));
  }
  if nonce.len() != XCHACHA20_POLY1305_NONCE_LEN {
    return Err(Error::InvalidNonceLength(nonce.len()));
  }
  if tag.len() != AEAD_TAG_LEN {
    return Err(Error::InvalidTagLength(tag.len()));
  }

  let cipher: XChaCha20Poly1305 = XChaCha20Poly1305::new(GenericArray::from_slice(key));
  let mut buffer: Vec<u8> = ciphertext.to_vec();
  cipher
    .decrypt_in_place_detached(
      GenericArray::from_slice(nonce),
      associated_data,
      &mut buffer,
      GenericArray::from_slice(tag),
    )
    .map_err(|_| Error::AuthenticationFailed)?;

  Ok(buffer)
}

/// Encrypts `plaintext` with AES-GCM, returning `(ciphertext, tag)`.
///
/// The AES key size is selected by the length of `key` (16, 24 or 32 bytes).
pub fn aes_gcm_encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8], associated_data: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
  if nonce.len() != AES_GCM_NONCE_LEN {
    return Err(Error::InvalidNonceLength(nonce.len()));
  }

  let nonce: &GenericArray<u8, U12> = GenericArray::from_slice(nonce);
  let mut buffer: Vec<u8> = plaintext.to_vec();

  let tag: Vec<u8> = match key.len() {
    16 => Aes128Gcm::new(GenericArray::from_slice(key))
      .encrypt_in_place_detached(nonce, associated_data, &mut buffer)
      .map_err(|_| Error::EncryptionFailed)?
      .to_vec(),
    24 => Aes192Gcm::new(GenericArray::from_slice(key))
      .encrypt_in_place_detached(nonce, associated_data, &mut buffer)
      .map_err(|_| Error::EncryptionFailed)?
      .to_vec(),
    32 => Aes256Gcm::new(GenericArray::from_slice(key))
      .encrypt_in_place_detached(nonce, associated_data, &mut buffer)
      .map_err(|_| Error::EncryptionFailed)?
      .to_vec(),
    other => return Err(Error::InvalidKeyLength(other)),
  };

  Ok((buffer, tag))
}

/// Decrypts an AES-GCM ciphertext with a detached tag.
///
/// Fails with [`Error::AuthenticationFailed`] on tag mismatch.
pub fn aes_gcm_decrypt(
  key: &[u8],
  nonce: &[u8],
  ciphertext: &[u8],
  tag: &[u8],
  associated_data: &[u8],
) -> Result<Vec<u8>> {
  if nonce.len() != AES_GCM_NONCE_LEN {
    return Err(Error::InvalidNonceLength(nonce.len()));
  }
  if tag.len() != AEAD_TAG_LEN {
    return Err(Error::InvalidTagLength(tag.len()));
  }

  let nonce: &GenericArray<u8, U12> = GenericArray::from_slice(nonce);
  let tag: &GenericArray<u8, _> = GenericArray::from_slice(tag);
  let mut buffer: Vec<u8> = ciphertext.to_vec();

  let decrypted: Result<(), aes_gcm::Error> = match key.len() {
    16 => Aes128Gcm::new(GenericArray::from_slice(key)).decrypt_in_place_detached(nonce, associated_data, &mut buffer, tag),
    24 => Aes192Gcm::new(GenericArray::from_slice(key)).decrypt_in_place_detached(nonce, associated_data, &mut buffer, tag),
    32 => Aes256Gcm::new(GenericArray::from_slice(key)).decrypt_in_place_detached(nonce, associated_data, &mut buffer, tag),
    other => return Err(Error::InvalidKeyLength(other)),
  };

  decrypted.map_err(|_| Error::AuthenticationFailed)?;

  Ok(buffer)
}
