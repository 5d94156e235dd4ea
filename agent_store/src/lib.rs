// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Typed object collections layered over a DWN message log.
//!
//! A [`Collection`] describes how objects of one type map onto DWN records
//! (protocol, path, schema); [`DwnDataStore`] persists them under a tenant
//! DID with a TTL record index and an LRU object cache, and [`MemDataStore`]
//! is the in-memory variant used in tests and for ephemeral agents.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod collection;
pub mod data_store;
pub mod error;
pub mod ttl_cache;

pub use self::collection::Collection;
pub use self::data_store::DataStore;
pub use self::data_store::DwnDataStore;
pub use self::data_store::MemDataStore;
pub use self::error::Error;
pub use self::error::Result;
pub use self::ttl_cache::TtlCache;
