// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use agent_crypto::jwu;
use agent_did::Did;
use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::message::DwnMessage;
use crate::reply::Reply;

/// Transport for delivering a message to a remote DWN endpoint.
///
/// A transport error means the endpoint could not be reached or answered
/// garbage; a reachable endpoint that refuses a message answers through the
/// [`Reply`] status instead.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
  /// Delivers `message` for `target` to `endpoint`.
  async fn send(&self, endpoint: &str, target: &Did, message: &DwnMessage, data: Option<&[u8]>) -> Result<Reply>;
}

/// A [`RemoteTransport`] over HTTPS.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
  client: reqwest::Client,
}

impl HttpTransport {
  /// Creates a transport with a default client.
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
  async fn send(&self, endpoint: &str, target: &Did, message: &DwnMessage, data: Option<&[u8]>) -> Result<Reply> {
    let body: serde_json::Value = serde_json::json!({
      "target": target,
      "message": message,
      "encodedData": data.map(jwu::encode_b64),
    });

    let response: reqwest::Response = self
      .client
      .post(endpoint)
      .json(&body)
      .send()
      .await
      .map_err(|err| Error::EndpointUnreachable(format!("{endpoint}: {err}")))?;

    response
      .json()
      .await
      .map_err(|err| Error::EndpointUnreachable(format!("{endpoint}: malformed reply: {err}")))
  }
}
