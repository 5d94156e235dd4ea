// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! JWK handling and the cryptographic primitives used by the web-agent
//! crates: password-based key derivation, authenticated encryption, RFC 3394
//! key wrapping and the signature algorithms of the supported curves.

#![forbid(unsafe_code)]
#![allow(clippy::upper_case_acronyms)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod aead;
pub mod error;
pub mod jwk;
pub mod jwu;
pub mod kdf;
pub mod key_wrap;
pub mod signature;

pub use self::error::Error;
pub use self::error::Result;
