// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Content ids over canonical JSON.

use crypto::hashes::sha::SHA256;
use crypto::hashes::sha::SHA256_LEN;
use multibase::Base;
use serde::Serialize;

use crate::error::Result;

/// Computes the content id of `value`: the multibase (base32, lower) SHA-256
/// digest of its JCS canonical form.
pub fn compute_cid<T: Serialize>(value: &T) -> Result<String> {
  let canonical: Vec<u8> = serde_jcs::to_vec(value)?;

  let mut digest: [u8; SHA256_LEN] = [0; SHA256_LEN];
  SHA256(&canonical, &mut digest);

  Ok(multibase::encode(Base::Base32Lower, digest))
}

/// Computes the content id of a raw data payload.
pub fn compute_data_cid(data: &[u8]) -> String {
  let mut digest: [u8; SHA256_LEN] = [0; SHA256_LEN];
  SHA256(data, &mut digest);

  multibase::encode(Base::Base32Lower, digest)
}

#[cfg(test)]
mod tests {
  use super::compute_cid;
  use super::compute_data_cid;

  #[test]
  fn test_cid_ignores_member_order() {
    let a: serde_json::Value = serde_json::json!({"x": 1, "y": 2});
    let b: serde_json::Value = serde_json::json!({"y": 2, "x": 1});
    assert_eq!(compute_cid(&a).unwrap(), compute_cid(&b).unwrap());
  }

  #[test]
  fn test_cid_shape() {
    let cid: String = compute_cid(&serde_json::json!({"x": 1})).unwrap();
    assert!(cid.starts_with('b'));
    assert!(cid.len() > 32);
  }

  #[test]
  fn test_data_cid_is_content_addressed() {
    assert_eq!(compute_data_cid(b"data"), compute_data_cid(b"data"));
    assert_ne!(compute_data_cid(b"data"), compute_data_cid(b"other"));
  }
}
