// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_dwn::ProtocolDefinition;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The data format every collection record is written with.
pub const COLLECTION_DATA_FORMAT: &str = "application/json";

/// Describes how one object type maps onto DWN records.
///
/// The constants identify the collection `(protocol, protocolPath, schema)`;
/// `object_id` is the per-collection strategy used to rebuild the record
/// index from an authoritative DWN query.
pub trait Collection: Serialize + DeserializeOwned + Clone + Send + Sync {
  /// The protocol URI records of this collection are written under.
  const PROTOCOL: &'static str;
  /// The protocol path within the protocol structure.
  const PROTOCOL_PATH: &'static str;
  /// The schema URI of the record data.
  const SCHEMA: &'static str;

  /// Returns the id this object is addressed by within its tenant.
  fn object_id(&self) -> String;

  /// Returns the protocol definition installed before the first write.
  fn protocol_definition() -> ProtocolDefinition {
    ProtocolDefinition {
      protocol: Self::PROTOCOL.to_owned(),
      published: false,
      types: serde_json::json!({
        Self::PROTOCOL_PATH: {
          "schema": Self::SCHEMA,
          "dataFormats": [COLLECTION_DATA_FORMAT],
        },
      }),
      structure: serde_json::json!({
        Self::PROTOCOL_PATH: {},
      }),
    }
  }
}
