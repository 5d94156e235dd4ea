// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Utilities for base64url-encoded JOSE segments.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::Error;
use crate::error::Result;

/// Encodes `data` as base64url without padding.
pub fn encode_b64(data: impl AsRef<[u8]>) -> String {
  URL_SAFE_NO_PAD.encode(data)
}

/// Decodes base64url `data` without padding.
pub fn decode_b64(data: impl AsRef<[u8]>) -> Result<Vec<u8>> {
  URL_SAFE_NO_PAD
    .decode(data)
    .map_err(|err| Error::InvalidBase64(err.to_string()))
}
