// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Shared primitives for the web-agent crates.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod common;
pub mod error;

pub use self::error::Error;
pub use self::error::Result;
