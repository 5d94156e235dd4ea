// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_did::Did;

use crate::message::MessageType;
use crate::message::PaginationCursor;
use crate::message::ProtocolDefinition;
use crate::message::RecordsFilter;

/// Type-specific inputs for constructing a DWN message.
///
/// Which members are read depends on the [`MessageType`] of the enclosing
/// [`DwnRequest`]; unneeded members are ignored.
#[derive(Clone, Debug, Default)]
pub struct MessageParams {
  /// The protocol URI of a record write or protocol query.
  pub protocol: Option<String>,
  /// The protocol path of a record write.
  pub protocol_path: Option<String>,
  /// The schema URI of a record write.
  pub schema: Option<String>,
  /// The data format of a record write, e.g. `application/json`.
  pub data_format: Option<String>,
  /// The record id of a write (stable identity) or delete (target).
  pub record_id: Option<String>,
  /// The record data of a write.
  pub data: Option<Vec<u8>>,
  /// The filter of a records query or read.
  pub filter: Option<RecordsFilter>,
  /// The continuation cursor of a query.
  pub cursor: Option<PaginationCursor>,
  /// The definition installed by `ProtocolsConfigure`.
  pub definition: Option<ProtocolDefinition>,
  /// The event CID read by `MessagesRead`.
  pub message_cid: Option<String>,
}

/// A request to author and dispatch one DWN message.
#[derive(Clone, Debug)]
pub struct DwnRequest {
  /// The DID signing the message.
  pub author: Did,
  /// The tenant the message is addressed to.
  pub target: Did,
  /// The type of message to construct.
  pub message_type: MessageType,
  /// Type-specific inputs.
  pub params: MessageParams,
}

impl DwnRequest {
  /// Creates a request authored by and targeting the same DID.
  pub fn new(author: Did, message_type: MessageType) -> Self {
    Self {
      target: author.clone(),
      author,
      message_type,
      params: MessageParams::default(),
    }
  }

  /// Sets the target tenant.
  pub fn with_target(mut self, target: Did) -> Self {
    self.target = target;
    self
  }

  /// Sets the message parameters.
  pub fn with_params(mut self, params: MessageParams) -> Self {
    self.params = params;
    self
  }
}
