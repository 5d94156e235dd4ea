// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Password-based and extract-expand key derivation.

use core::fmt::Display;
use core::fmt::Formatter;

use hkdf::Hkdf;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

use crate::error::Error;
use crate::error::Result;

/// Iteration floor below which PBKDF2-HMAC-SHA-256 is considered weak.
pub const PBKDF2_SHA256_RECOMMENDED_ITERATIONS: u32 = 600_000;
/// Iteration floor below which PBKDF2-HMAC-SHA-512 is considered weak.
pub const PBKDF2_SHA512_RECOMMENDED_ITERATIONS: u32 = 210_000;

/// The SHA-2 hash functions supported for key derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaHash {
  Sha256,
  Sha384,
  Sha512,
}

impl ShaHash {
  /// Parses a hash function from its standard name, e.g. `SHA-256`.
  pub fn from_name(name: &str) -> Result<Self> {
    match name {
      "SHA-256" => Ok(Self::Sha256),
      "SHA-384" => Ok(Self::Sha384),
      "SHA-512" => Ok(Self::Sha512),
      other => Err(Error::UnsupportedHash(other.to_owned())),
    }
  }

  /// Returns the standard name of the hash function.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Sha256 => "SHA-256",
      Self::Sha384 => "SHA-384",
      Self::Sha512 => "SHA-512",
    }
  }

  fn recommended_pbkdf2_iterations(&self) -> u32 {
    match self {
      Self::Sha256 => PBKDF2_SHA256_RECOMMENDED_ITERATIONS,
      Self::Sha384 => PBKDF2_SHA512_RECOMMENDED_ITERATIONS,
      Self::Sha512 => PBKDF2_SHA512_RECOMMENDED_ITERATIONS,
    }
  }
}

impl Display for ShaHash {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}

/// Derives `out_len` bytes from `password` with PBKDF2 (RFC 8018).
///
/// The iteration count is caller-chosen; counts below the recommended floor
/// for the selected hash are permitted but logged.
pub fn pbkdf2(password: &[u8], salt: &[u8], iterations: u32, hash: ShaHash, out_len: usize) -> Result<Vec<u8>> {
  if iterations == 0 {
    return Err(Error::KeyGenerationFailed("PBKDF2 requires at least one iteration".to_owned()));
  }
  if iterations < hash.recommended_pbkdf2_iterations() {
    log::warn!(
      "PBKDF2-{} iteration count {} is below the recommended {}",
      hash,
      iterations,
      hash.recommended_pbkdf2_iterations()
    );
  }

  let mut output: Vec<u8> = vec![0; out_len];
  match hash {
    ShaHash::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output),
    ShaHash::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut output),
    ShaHash::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut output),
  }

  Ok(output)
}

/// Derives `out_len` bytes with HKDF (RFC 5869).
///
/// `salt` and `info` default to empty when absent.
pub fn hkdf(ikm: &[u8], salt: Option<&[u8]>, info: Option<&[u8]>, hash: ShaHash, out_len: usize) -> Result<Vec<u8>> {
  let info: &[u8] = info.unwrap_or_default();
  let mut output: Vec<u8> = vec![0; out_len];

  let expanded = match hash {
    ShaHash::Sha256 => Hkdf::<Sha256>::new(salt, ikm).expand(info, &mut output),
    ShaHash::Sha384 => Hkdf::<Sha384>::new(salt, ikm).expand(info, &mut output),
    ShaHash::Sha512 => Hkdf::<Sha512>::new(salt, ikm).expand(info, &mut output),
  };

  expanded.map_err(|err| Error::KeyGenerationFailed(err.to_string()))?;

  Ok(output)
}
