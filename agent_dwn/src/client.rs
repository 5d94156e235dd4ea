// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use agent_crypto::jwk::Jwk;
use agent_crypto::jwu;
use agent_crypto::signature::JwsAlgorithm;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidResolver;
use agent_did::VerificationMethod;
use agent_keys::KeyManager;
use agent_keys::KeyUri;

use crate::cid;
use crate::error::Error;
use crate::error::Result;
use crate::message::Authorization;
use crate::message::Descriptor;
use crate::message::DwnMessage;
use crate::message::JwsSignatureEntry;
use crate::message::MessageType;
use crate::node::MessageSink;
use crate::reply::Reply;
use crate::request::DwnRequest;
use crate::transport::RemoteTransport;

/// The result of processing or sending one authored message.
#[derive(Clone, Debug)]
pub struct MessageReply {
  /// The signed message as dispatched.
  pub message: DwnMessage,
  /// The content id of the message.
  pub message_cid: String,
  /// The engine or endpoint reply.
  pub reply: Reply,
}

/// The agent-side DWN client: constructs and signs messages, processes them
/// on the local node, and delivers them to remote endpoints.
#[derive(Clone)]
pub struct DwnClient {
  node: Arc<dyn MessageSink>,
  transport: Arc<dyn RemoteTransport>,
  key_manager: Arc<dyn KeyManager>,
  resolver: Arc<dyn DidResolver>,
}

impl DwnClient {
  /// Creates a client over the given collaborators.
  pub fn new(
    node: Arc<dyn MessageSink>,
    transport: Arc<dyn RemoteTransport>,
    key_manager: Arc<dyn KeyManager>,
    resolver: Arc<dyn DidResolver>,
  ) -> Self {
    Self {
      node,
      transport,
      key_manager,
      resolver,
    }
  }

  /// Constructs, signs and processes a message on the local node.
  pub async fn process_message(&self, request: DwnRequest) -> Result<MessageReply> {
    let (message, data) = self.build_message(&request).await?;
    let message_cid: String = message.cid()?;
    let reply: Reply = self.node.process(&request.target, message.clone(), data).await?;

    Ok(MessageReply {
      message,
      message_cid,
      reply,
    })
  }

  /// Constructs and signs a message, then delivers it to the first remote
  /// DWN endpoint of the author's DID document that succeeds.
  ///
  /// Endpoints are tried in document order; failures are collected and
  /// surfaced only when every endpoint fails.
  pub async fn send_request(&self, request: DwnRequest) -> Result<MessageReply> {
    let (message, data) = self.build_message(&request).await?;
    let message_cid: String = message.cid()?;

    let document: DidDocument = self.resolver.resolve(&request.author).await?;
    let endpoints: Vec<String> = document.dwn_endpoints();
    if endpoints.is_empty() {
      return Err(Error::EndpointUnreachable(format!(
        "no DWN service endpoints for {}",
        request.author
      )));
    }

    let mut failures: Vec<String> = Vec::new();
    for endpoint in &endpoints {
      match self
        .transport
        .send(endpoint, &request.target, &message, data.as_deref())
        .await
      {
        Ok(reply) => {
          return Ok(MessageReply {
            message,
            message_cid,
            reply,
          });
        }
        Err(err) => {
          log::warn!("send to {endpoint} failed: {err}");
          failures.push(err.to_string());
        }
      }
    }

    Err(Error::EndpointUnreachable(failures.join("; ")))
  }

  /// Constructs and signs a message, then delivers it to one explicit
  /// remote endpoint.
  pub async fn send_message(&self, endpoint: &str, request: DwnRequest) -> Result<MessageReply> {
    let (message, data) = self.build_message(&request).await?;
    let message_cid: String = message.cid()?;
    let reply: Reply = self
      .transport
      .send(endpoint, &request.target, &message, data.as_deref())
      .await?;

    Ok(MessageReply {
      message,
      message_cid,
      reply,
    })
  }

  /// Processes an already-constructed message on the local node.
  pub async fn process_raw(&self, target: &Did, message: DwnMessage, data: Option<Vec<u8>>) -> Result<Reply> {
    self.node.process(target, message, data).await
  }

  /// Delivers an already-constructed message to one explicit endpoint.
  pub async fn send_raw(
    &self,
    endpoint: &str,
    target: &Did,
    message: &DwnMessage,
    data: Option<&[u8]>,
  ) -> Result<Reply> {
    self.transport.send(endpoint, target, message, data).await
  }

  async fn build_message(&self, request: &DwnRequest) -> Result<(DwnMessage, Option<Vec<u8>>)> {
    let mut descriptor: Descriptor = Descriptor::new(request.message_type);
    let params = &request.params;
    let mut data: Option<Vec<u8>> = None;

    match request.message_type {
      MessageType::RecordsWrite => {
        let payload: Vec<u8> = params.data.clone().ok_or(Error::MissingParameter("data"))?;
        descriptor.protocol = params.protocol.clone();
        descriptor.protocol_path = params.protocol_path.clone();
        descriptor.schema = params.schema.clone();
        descriptor.data_format = params.data_format.clone().or_else(|| Some("application/json".to_owned()));
        descriptor.data_cid = Some(cid::compute_data_cid(&payload));
        descriptor.data_size = Some(payload.len());
        data = Some(payload);
      }
      MessageType::RecordsDelete => {
        descriptor.record_id = Some(params.record_id.clone().ok_or(Error::MissingParameter("record_id"))?);
      }
      MessageType::RecordsQuery | MessageType::RecordsSubscribe => {
        descriptor.filter = params.filter.clone();
        descriptor.cursor = params.cursor.clone();
      }
      MessageType::RecordsRead => {
        descriptor.filter = Some(params.filter.clone().ok_or(Error::MissingParameter("filter"))?);
      }
      MessageType::ProtocolsConfigure => {
        descriptor.definition = Some(params.definition.clone().ok_or(Error::MissingParameter("definition"))?);
      }
      MessageType::ProtocolsQuery => {
        descriptor.filter = params.filter.clone();
      }
      MessageType::MessagesQuery => {
        descriptor.cursor = params.cursor.clone();
      }
      MessageType::MessagesRead => {
        descriptor.message_cid = Some(params.message_cid.clone().ok_or(Error::MissingParameter("message_cid"))?);
      }
    }

    let mut message: DwnMessage = DwnMessage::new(descriptor);

    if request.message_type == MessageType::RecordsWrite {
      // the record id defaults to the content id of the initial descriptor,
      // so callers control supersession by passing an explicit id
      message.record_id = match params.record_id.clone() {
        Some(record_id) => Some(record_id),
        None => Some(cid::compute_cid(&message.descriptor)?),
      };
    }

    message.authorization = Some(self.sign_authorization(&request.author, &message.descriptor).await?);

    if let Some(payload) = data.as_ref() {
      message.encoded_data = Some(jwu::encode_b64(payload));
    }

    Ok((message, data))
  }

  /// Signs the descriptor CID with the author's signing key, located through
  /// the author's DID document and produced by the key manager.
  async fn sign_authorization(&self, author: &Did, descriptor: &Descriptor) -> Result<Authorization> {
    let document: DidDocument = self.resolver.resolve(author).await?;
    let method: &VerificationMethod = document.signing_method()?;
    let public_jwk: &Jwk = method
      .public_key_jwk
      .as_ref()
      .ok_or(agent_did::Error::InvalidDocument("verification method without a JWK"))?;

    let key_uri: KeyUri = self.key_manager.get_key_uri(public_jwk)?;
    let algorithm: JwsAlgorithm = JwsAlgorithm::from_jwk(public_jwk)?;

    let descriptor_cid: String = cid::compute_cid(descriptor)?;
    let payload: String = jwu::encode_b64(serde_jcs::to_vec(&serde_json::json!({
      "descriptorCid": descriptor_cid,
    }))?);
    let protected: String = jwu::encode_b64(serde_json::to_vec(&serde_json::json!({
      "alg": algorithm.name(),
      "kid": method.id,
    }))?);

    let signing_input: String = format!("{protected}.{payload}");
    let signature: Vec<u8> = self.key_manager.sign(&key_uri, signing_input.as_bytes()).await?;

    Ok(Authorization {
      payload,
      signatures: vec![JwsSignatureEntry {
        protected,
        signature: jwu::encode_b64(signature),
      }],
    })
  }
}

impl core::fmt::Debug for DwnClient {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("DwnClient")
  }
}

#[cfg(test)]
mod tests {
  use agent_did::resolver::DidJwkResolver;
  use agent_did::DidJwk;
  use agent_keys::KeyAlgorithm;
  use agent_keys::LocalKeyManager;

  use super::*;
  use crate::mem_node::MemNode;
  use crate::message::RecordsFilter;
  use crate::request::MessageParams;

  struct NoTransport;

  #[async_trait::async_trait]
  impl RemoteTransport for NoTransport {
    async fn send(&self, endpoint: &str, _: &Did, _: &DwnMessage, _: Option<&[u8]>) -> Result<Reply> {
      Err(Error::EndpointUnreachable(endpoint.to_owned()))
    }
  }

  async fn client_with_author() -> (DwnClient, Did) {
    let key_manager: Arc<LocalKeyManager> = Arc::new(LocalKeyManager::new());
    let key_uri = key_manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();
    let public = key_manager.get_public_key(&key_uri).await.unwrap();
    let author: Did = DidJwk::encode(&public).unwrap();

    let client: DwnClient = DwnClient::new(
      Arc::new(MemNode::new()),
      Arc::new(NoTransport),
      key_manager,
      Arc::new(DidJwkResolver::new()),
    );
    (client, author)
  }

  #[tokio::test]
  async fn test_write_then_query() {
    let (client, author) = client_with_author().await;

    let write: MessageReply = client
      .process_message(
        DwnRequest::new(author.clone(), MessageType::RecordsWrite).with_params(MessageParams {
          schema: Some("https://example.com/schema".to_owned()),
          data: Some(b"{\"x\":1}".to_vec()),
          ..MessageParams::default()
        }),
      )
      .await
      .unwrap();
    assert_eq!(write.reply.status.code, 202);
    assert!(write.message.authorization.is_some());
    assert!(write.message.record_id.is_some());

    let query: MessageReply = client
      .process_message(
        DwnRequest::new(author, MessageType::RecordsQuery).with_params(MessageParams {
          filter: Some(RecordsFilter {
            schema: Some("https://example.com/schema".to_owned()),
            ..RecordsFilter::default()
          }),
          ..MessageParams::default()
        }),
      )
      .await
      .unwrap();

    let entries = query.reply.entries.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].encoded_data.as_deref(), Some(jwu::encode_b64(b"{\"x\":1}").as_str()));
  }

  #[tokio::test]
  async fn test_signature_verifies_against_document_key() {
    let (client, author) = client_with_author().await;

    let reply: MessageReply = client
      .process_message(
        DwnRequest::new(author.clone(), MessageType::RecordsWrite).with_params(MessageParams {
          data: Some(b"{}".to_vec()),
          ..MessageParams::default()
        }),
      )
      .await
      .unwrap();

    let authorization: Authorization = reply.message.authorization.unwrap();
    let entry: &JwsSignatureEntry = &authorization.signatures[0];
    let signing_input: String = format!("{}.{}", entry.protected, authorization.payload);

    let document: DidDocument = DidJwk::resolve(&author).unwrap();
    let jwk: &Jwk = document.signing_method().unwrap().public_key_jwk.as_ref().unwrap();
    let signature: Vec<u8> = jwu::decode_b64(&entry.signature).unwrap();

    assert!(agent_crypto::signature::verify(jwk, &signature, signing_input.as_bytes()).unwrap());
  }

  #[tokio::test]
  async fn test_send_without_endpoints_fails() {
    let (client, author) = client_with_author().await;

    let result = client
      .send_request(DwnRequest::new(author, MessageType::MessagesQuery))
      .await;
    assert!(matches!(result, Err(Error::EndpointUnreachable(_))));
  }

  #[tokio::test]
  async fn test_missing_parameters_are_rejected() {
    let (client, author) = client_with_author().await;

    let result = client
      .process_message(DwnRequest::new(author, MessageType::RecordsWrite))
      .await;
    assert!(matches!(result, Err(Error::MissingParameter("data"))));
  }
}
