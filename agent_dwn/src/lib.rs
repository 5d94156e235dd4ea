// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! The DWN message model and client facade used by the web-agent crates.
//!
//! The message engine itself is an external collaborator behind the
//! [`MessageSink`] trait; this crate provides the uniform request/reply
//! envelope, message construction and signing, remote transport, and an
//! in-memory node that stands in for the engine in tests.

#![forbid(unsafe_code)]
#![warn(
  rust_2018_idioms,
  unreachable_pub,
  rustdoc::broken_intra_doc_links,
  rustdoc::private_intra_doc_links,
  rustdoc::private_doc_tests,
  clippy::missing_safety_doc,
)]

pub mod cid;
pub mod client;
pub mod error;
pub mod mem_node;
pub mod message;
pub mod node;
pub mod reply;
pub mod request;
pub mod transport;

pub use self::client::DwnClient;
pub use self::client::MessageReply;
pub use self::error::Error;
pub use self::error::Result;
pub use self::mem_node::MemNode;
pub use self::message::Authorization;
pub use self::message::Descriptor;
pub use self::message::DwnMessage;
pub use self::message::MessageType;
pub use self::message::PaginationCursor;
pub use self::message::ProtocolDefinition;
pub use self::message::RecordsFilter;
pub use self::node::MessageSink;
pub use self::reply::MessagesReadEntry;
pub use self::reply::Reply;
pub use self::reply::Status;
pub use self::request::DwnRequest;
pub use self::request::MessageParams;
pub use self::transport::HttpTransport;
pub use self::transport::RemoteTransport;
