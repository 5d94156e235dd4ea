// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The password-encrypted identity vault owning the agent's own DID.
//!
//! The vault persists a single compact authenticated-encryption envelope and
//! a small status record. The vault unlock key derived from the password
//! exists in memory only between [`IdentityVault::unlock`] and
//! [`IdentityVault::lock`].

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod envelope;
pub mod error;
pub mod store;
pub mod vault;

pub use self::envelope::CompactEnvelope;
pub use self::envelope::ProtectedHeader;
pub use self::error::Error;
pub use self::error::Result;
pub use self::store::MemVaultStore;
pub use self::store::VaultStore;
pub use self::vault::IdentityVault;
pub use self::vault::VaultBackup;
pub use self::vault::VaultContent;
pub use self::vault::VaultStatus;
