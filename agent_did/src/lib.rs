// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! DID and DID document types for the web-agent crates, plus the `did:jwk`
//! composition used for the agent's own identity.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod did;
pub mod did_jwk;
pub mod document;
pub mod error;
pub mod resolver;

pub use self::did::Did;
pub use self::did_jwk::DidJwk;
pub use self::document::DidDocument;
pub use self::document::Service;
pub use self::document::VerificationMethod;
pub use self::error::Error;
pub use self::error::Result;
pub use self::resolver::DidResolver;
