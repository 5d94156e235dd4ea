// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Bi-directional replication between the local DWN and the remote DWN
//! endpoints advertised in each registered identity's DID document.
//!
//! Cursors, the push/pull queues and the de-duplication history live in a
//! single embedded ordered-key store; queue keys carry a monotonic ULID
//! watermark so lexicographic iteration is oldest-first.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod db;
pub mod engine;
pub mod error;
pub mod send_cache;

pub use self::db::Direction;
pub use self::db::SyncDb;
pub use self::db::SyncKey;
pub use self::engine::SyncEngine;
pub use self::error::Error;
pub use self::error::Result;
pub use self::send_cache::SendCache;
