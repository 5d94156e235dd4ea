// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_crypto::jwk::Jwk;
use agent_did::Did;
use agent_did::DidDocument;
use agent_store::Collection;
use serde::Deserialize;
use serde::Serialize;

/// The protocol and schema URI of the portable-identity collection.
pub const PORTABLE_IDENTITY_PROTOCOL: &str = "https://identity.foundation/schemas/web5/portable-identity";

/// User-facing metadata attached to a registered identity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMetadata {
  /// A human-readable label.
  pub name: String,
  /// The DID of a counterparty this identity is connected to, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub connected_did: Option<Did>,
  /// The tenant the identity is stored under, when not the agent DID.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tenant: Option<Did>,
}

impl IdentityMetadata {
  /// Creates metadata with just a name.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      connected_did: None,
      tenant: None,
    }
  }
}

/// The non-secret, portable part of a DID: its URI and document.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableDid {
  pub uri: Did,
  pub document: DidDocument,
}

/// A registered identity as persisted in the typed data store.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  /// The identity's DID.
  pub did_uri: Did,
  /// User-facing metadata.
  pub metadata: IdentityMetadata,
  /// The stored DID document, authoritative for locally-managed DIDs.
  pub portable_did: PortableDid,
}

impl Collection for Identity {
  const PROTOCOL: &'static str = PORTABLE_IDENTITY_PROTOCOL;
  const PROTOCOL_PATH: &'static str = "identity";
  const SCHEMA: &'static str = PORTABLE_IDENTITY_PROTOCOL;

  fn object_id(&self) -> String {
    self.did_uri.to_string()
  }
}

/// An identity in transferable form: the stored parts plus private keys.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableIdentity {
  pub portable_did: PortableDid,
  pub metadata: IdentityMetadata,
  /// The private JWKs backing the document's verification methods.
  pub private_keys: Vec<Jwk>,
}
