// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_core::common::OneOrMany;
use agent_crypto::jwk::Jwk;
use serde::Deserialize;
use serde::Serialize;

use crate::did::Did;
use crate::error::Error;
use crate::error::Result;

/// The service type advertising the DWN endpoints of an identity.
pub const DWN_SERVICE_TYPE: &str = "DecentralizedWebNode";
/// The conventional id of the DWN service entry.
pub const DWN_SERVICE_ID: &str = "dwn";

/// A DID document: the resolved description of a DID.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
  /// The DID the document describes.
  pub id: Did,
  /// The verification methods (public keys) of the DID.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub verification_method: Vec<VerificationMethod>,
  /// References to verification methods usable for authentication.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub authentication: Vec<String>,
  /// References to verification methods usable for assertions.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub assertion_method: Vec<String>,
  /// The service endpoints of the DID.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub service: Vec<Service>,
}

impl DidDocument {
  /// Creates a document describing `id` with no methods or services.
  pub fn new(id: Did) -> Self {
    Self {
      id,
      verification_method: Vec::new(),
      authentication: Vec::new(),
      assertion_method: Vec::new(),
      service: Vec::new(),
    }
  }

  /// Returns the first verification method carrying a public JWK.
  ///
  /// This is the method whose key the agent uses to author DWN messages.
  pub fn signing_method(&self) -> Result<&VerificationMethod> {
    self
      .verification_method
      .iter()
      .find(|method| method.public_key_jwk.is_some())
      .ok_or(Error::InvalidDocument("no verification method with a public JWK"))
  }

  /// Returns the DWN endpoints advertised by the document, in order.
  pub fn dwn_endpoints(&self) -> Vec<String> {
    self
      .service
      .iter()
      .filter(|service| service.type_ == DWN_SERVICE_TYPE)
      .flat_map(|service| service.service_endpoint.iter().cloned())
      .collect()
  }

  /// Replaces the endpoints of the DWN service, appending a new service
  /// entry when none exists. Returns `true` if the document changed.
  pub fn set_dwn_endpoints(&mut self, endpoints: Vec<String>) -> bool {
    if let Some(service) = self.service.iter_mut().find(|service| service.type_ == DWN_SERVICE_TYPE) {
      if service.service_endpoint.as_slice() == endpoints.as_slice() {
        return false;
      }
      service.service_endpoint = OneOrMany::Many(endpoints);
      return true;
    }

    self.service.push(Service {
      id: DWN_SERVICE_ID.to_owned(),
      type_: DWN_SERVICE_TYPE.to_owned(),
      service_endpoint: OneOrMany::Many(endpoints),
    });
    true
  }
}

/// A public key entry of a DID document.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
  /// The id of the method, usually `<did>#<fragment>`.
  pub id: String,
  /// The method type; keys are expressed as `JsonWebKey`.
  #[serde(rename = "type")]
  pub type_: String,
  /// The DID controlling the key.
  pub controller: Did,
  /// The public key as a JWK.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub public_key_jwk: Option<Jwk>,
}

/// A service entry of a DID document.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
  /// The id of the service entry.
  pub id: String,
  /// The service type.
  #[serde(rename = "type")]
  pub type_: String,
  /// One or more endpoint URLs.
  pub service_endpoint: OneOrMany<String>,
}
