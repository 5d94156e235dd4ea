// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Key management for the web-agent crates.
//!
//! Private key material never leaves this crate except through
//! [`KeyManager::export_key`]; every other component refers to keys by their
//! deterministic [`KeyUri`].

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod algorithm;
pub mod error;
pub mod key_manager;
pub mod key_store;
pub mod key_uri;

pub use self::algorithm::KeyAlgorithm;
pub use self::error::Error;
pub use self::error::Result;
pub use self::key_manager::DeterministicKeyManager;
pub use self::key_manager::KeyManager;
pub use self::key_manager::LocalKeyManager;
pub use self::key_store::KeyStore;
pub use self::key_store::MemKeyStore;
pub use self::key_uri::KeyUri;
