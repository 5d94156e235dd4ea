// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The personal-data agent: one aggregate binding the identity vault, the
//! key manager, the DWN-backed identity registry and the sync engine.
//!
//! The agent's own DID lives in the password-protected vault; additional
//! identities are persisted as typed objects under the agent tenant and
//! replicated to the DWN endpoints their documents advertise.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod agent;
pub mod error;
pub mod identity;
pub mod registry;
pub mod resolver;
pub mod tenant;

pub use self::agent::Agent;
pub use self::agent::AgentBuilder;
pub use self::agent::RegistryStore;
pub use self::error::Error;
pub use self::error::Result;
pub use self::identity::Identity;
pub use self::identity::IdentityMetadata;
pub use self::identity::PortableDid;
pub use self::identity::PortableIdentity;
pub use self::registry::IdentityRegistry;
pub use self::resolver::AgentResolver;
pub use self::tenant::resolve_tenant;
