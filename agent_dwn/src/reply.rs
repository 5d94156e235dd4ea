// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;
use serde::Serialize;

use crate::message::DwnMessage;
use crate::message::PaginationCursor;

/// An HTTP-semantics status carried by every reply.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Status {
  pub code: u16,
  pub detail: String,
}

/// The event returned by `MessagesRead`: the message plus its data.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadEntry {
  pub message: DwnMessage,
  /// base64url of the message data, when any was stored with it.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<String>,
}

/// The uniform reply envelope of both local processing and remote sends.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
  pub status: Status,
  /// `RecordsQuery` / `ProtocolsQuery` results.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub entries: Option<Vec<DwnMessage>>,
  /// `MessagesQuery` results: event log CIDs, oldest first.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message_cids: Option<Vec<String>>,
  /// The `RecordsRead` result.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub record: Option<Box<DwnMessage>>,
  /// The `MessagesRead` result.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub entry: Option<MessagesReadEntry>,
  /// The continuation cursor of a paginated query.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cursor: Option<PaginationCursor>,
}

impl Reply {
  /// A `200 OK` reply.
  pub fn ok() -> Self {
    Self::with_status(200, "OK")
  }

  /// A `202 Accepted` reply.
  pub fn accepted() -> Self {
    Self::with_status(202, "Accepted")
  }

  /// A `404 Not Found` reply.
  pub fn not_found() -> Self {
    Self::with_status(404, "Not Found")
  }

  /// A `409 Conflict` reply, meaning the message is already present.
  pub fn conflict() -> Self {
    Self::with_status(409, "Conflict")
  }

  /// A reply with an arbitrary status.
  pub fn with_status(code: u16, detail: impl Into<String>) -> Self {
    Self {
      status: Status {
        code,
        detail: detail.into(),
      },
      ..Self::default()
    }
  }

  /// Returns `true` for `200` and `202` statuses.
  pub fn is_success(&self) -> bool {
    matches!(self.status.code, 200 | 202)
  }

  /// Returns `true` when a mirrored message landed or was already present;
  /// the sync engine treats `409` as success.
  pub fn is_synchronized(&self) -> bool {
    self.is_success() || self.status.code == 409
  }
}

impl Default for Status {
  fn default() -> Self {
    Self {
      code: 500,
      detail: "uninitialized reply".to_owned(),
    }
  }
}
