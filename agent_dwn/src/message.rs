// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_core::common::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::cid;
use crate::error::Result;

/// The DWN message types the agent constructs and dispatches.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Deserialize, Serialize)]
pub enum MessageType {
  RecordsWrite,
  RecordsRead,
  RecordsQuery,
  RecordsDelete,
  RecordsSubscribe,
  ProtocolsConfigure,
  ProtocolsQuery,
  MessagesQuery,
  MessagesRead,
}

impl MessageType {
  /// Returns the DWN interface name.
  pub const fn interface(&self) -> &'static str {
    match self {
      Self::RecordsWrite | Self::RecordsRead | Self::RecordsQuery | Self::RecordsDelete | Self::RecordsSubscribe => {
        "Records"
      }
      Self::ProtocolsConfigure | Self::ProtocolsQuery => "Protocols",
      Self::MessagesQuery | Self::MessagesRead => "Messages",
    }
  }

  /// Returns the DWN method name.
  pub const fn method(&self) -> &'static str {
    match self {
      Self::RecordsWrite => "Write",
      Self::RecordsRead | Self::MessagesRead => "Read",
      Self::RecordsQuery | Self::ProtocolsQuery | Self::MessagesQuery => "Query",
      Self::RecordsDelete => "Delete",
      Self::RecordsSubscribe => "Subscribe",
      Self::ProtocolsConfigure => "Configure",
    }
  }

  fn from_parts(interface: &str, method: &str) -> Option<Self> {
    match (interface, method) {
      ("Records", "Write") => Some(Self::RecordsWrite),
      ("Records", "Read") => Some(Self::RecordsRead),
      ("Records", "Query") => Some(Self::RecordsQuery),
      ("Records", "Delete") => Some(Self::RecordsDelete),
      ("Records", "Subscribe") => Some(Self::RecordsSubscribe),
      ("Protocols", "Configure") => Some(Self::ProtocolsConfigure),
      ("Protocols", "Query") => Some(Self::ProtocolsQuery),
      ("Messages", "Query") => Some(Self::MessagesQuery),
      ("Messages", "Read") => Some(Self::MessagesRead),
      _ => None,
    }
  }
}

/// A filter over records, used by `RecordsQuery` and `RecordsRead`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsFilter {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub protocol: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub protocol_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub record_id: Option<String>,
}

/// An opaque position in a DWN event log.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationCursor {
  /// The CID of the last event the caller has seen.
  pub message_cid: String,
}

/// A protocol definition installed by `ProtocolsConfigure`.
///
/// The type and structure trees are opaque to the agent; the engine enforces
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDefinition {
  /// The protocol URI.
  pub protocol: String,
  /// Whether records under this protocol are publicly readable.
  pub published: bool,
  /// The record type declarations.
  pub types: serde_json::Value,
  /// The record hierarchy.
  pub structure: serde_json::Value,
}

/// The descriptor of a DWN message: its type plus type-specific properties.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
  /// The DWN interface, e.g. `Records`.
  pub interface: String,
  /// The DWN method, e.g. `Write`.
  pub method: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message_timestamp: Option<Timestamp>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub protocol: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub protocol_path: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub schema: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_format: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_cid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_size: Option<usize>,
  /// The record targeted by `RecordsDelete`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub record_id: Option<String>,
  /// The event targeted by `MessagesRead`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message_cid: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter: Option<RecordsFilter>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cursor: Option<PaginationCursor>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub definition: Option<ProtocolDefinition>,
}

impl Descriptor {
  /// Creates an empty descriptor of the given type stamped with now.
  pub fn new(message_type: MessageType) -> Self {
    Self {
      interface: message_type.interface().to_owned(),
      method: message_type.method().to_owned(),
      message_timestamp: Some(Timestamp::now_utc()),
      ..Self::default()
    }
  }

  /// Returns the message type, if the interface/method pair is known.
  pub fn message_type(&self) -> Option<MessageType> {
    MessageType::from_parts(&self.interface, &self.method)
  }
}

/// A JWS over the descriptor CID, attached to every authored message.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Authorization {
  /// base64url of the canonical `{"descriptorCid": ...}` payload.
  pub payload: String,
  /// The signatures over the payload.
  pub signatures: Vec<JwsSignatureEntry>,
}

/// One signature of a JWS in general serialization.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct JwsSignatureEntry {
  /// base64url of the protected header (`alg`, `kid`).
  pub protected: String,
  /// base64url of the signature bytes.
  pub signature: String,
}

/// A DWN message: a signed descriptor with optional inline data.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DwnMessage {
  pub descriptor: Descriptor,
  /// The stable record identity, present on record-bearing messages.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub record_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub authorization: Option<Authorization>,
  /// base64url of the record data when it fits in a query reply.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub encoded_data: Option<String>,
}

impl DwnMessage {
  /// Creates an unsigned message with the given descriptor.
  pub fn new(descriptor: Descriptor) -> Self {
    Self {
      descriptor,
      ..Self::default()
    }
  }

  /// Computes the content id of the message.
  ///
  /// Inline data is excluded: the data is addressed separately by the
  /// `dataCid` member of the descriptor.
  pub fn cid(&self) -> Result<String> {
    let mut value: serde_json::Value = serde_json::to_value(self)?;
    if let Some(object) = value.as_object_mut() {
      object.remove("encodedData");
    }

    cid::compute_cid(&value)
  }
}
