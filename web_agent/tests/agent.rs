// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;

use agent_core::common::Shared;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidJwk;
use agent_did::DidResolver;
use agent_dwn::DwnMessage;
use agent_dwn::MemNode;
use agent_dwn::MessageSink;
use agent_dwn::RemoteTransport;
use agent_dwn::Reply;
use agent_sync::Direction;
use async_trait::async_trait;
use web_agent::Agent;
use web_agent::Error;
use web_agent::Identity;
use web_agent::IdentityMetadata;
use web_agent::PortableIdentity;

// a low work factor keeps the test suite fast
const TEST_WORK_FACTOR: u32 = 1_000;

/// Routes endpoint URLs to in-memory nodes.
struct TestTransport {
  routes: HashMap<String, Arc<MemNode>>,
  requests: Shared<HashMap<String, usize>>,
}

impl TestTransport {
  fn new(routes: Vec<(&str, Arc<MemNode>)>) -> Self {
    Self {
      routes: routes.into_iter().map(|(url, node)| (url.to_owned(), node)).collect(),
      requests: Shared::new(HashMap::new()),
    }
  }

  fn request_count(&self, endpoint: &str) -> usize {
    self.requests.read().unwrap().get(endpoint).copied().unwrap_or(0)
  }
}

#[async_trait]
impl RemoteTransport for TestTransport {
  async fn send(
    &self,
    endpoint: &str,
    target: &Did,
    message: &DwnMessage,
    data: Option<&[u8]>,
  ) -> agent_dwn::Result<Reply> {
    *self
      .requests
      .write()
      .map_err(|_| agent_dwn::Error::EndpointUnreachable("request counter poisoned".to_owned()))?
      .entry(endpoint.to_owned())
      .or_insert(0) += 1;

    let node: &Arc<MemNode> = self
      .routes
      .get(endpoint)
      .ok_or_else(|| agent_dwn::Error::EndpointUnreachable(endpoint.to_owned()))?;
    node.process(target, message.clone(), data.map(<[u8]>::to_vec)).await
  }
}

fn agent() -> Agent {
  Agent::builder().vault_work_factor(TEST_WORK_FACTOR).build().unwrap()
}

#[tokio::test]
async fn test_first_launch_and_password_lifecycle() {
  let agent: Agent = agent();
  assert!(agent.first_launch().await.unwrap());
  assert!(matches!(agent.agent_did(), Err(Error::TenantResolutionFailed)));

  let did: Did = agent.initialize("secret").await.unwrap();
  assert!(!agent.first_launch().await.unwrap());
  assert_eq!(agent.agent_did().unwrap(), did);
  assert_eq!(did.method(), "jwk");

  agent.lock().unwrap();
  assert!(matches!(agent.agent_did(), Err(Error::TenantResolutionFailed)));
  assert!(matches!(
    agent.list_identities().await,
    Err(Error::TenantResolutionFailed)
  ));

  assert!(agent.start("wrong").await.is_err());
  assert_eq!(agent.start("secret").await.unwrap(), did);
  assert_eq!(agent.agent_did().unwrap(), did);
}

#[tokio::test]
async fn test_identity_lifecycle() {
  let agent: Agent = agent();
  agent.initialize("secret").await.unwrap();

  let created: Identity = agent
    .create_identity(
      IdentityMetadata::named("Social"),
      vec!["https://dwn.example".to_owned()],
    )
    .await
    .unwrap();
  assert_eq!(created.metadata.name, "Social");
  assert_eq!(created.portable_did.document.dwn_endpoints(), ["https://dwn.example"]);

  let fetched: Identity = agent.get_identity(&created.did_uri).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(agent.list_identities().await.unwrap(), vec![created.clone()]);

  // renames persist, and a no-op rename is refused without a write
  let tenant: Did = agent.agent_did().unwrap();
  agent
    .identities()
    .set_metadata_name(&tenant, &created.did_uri, "Work")
    .await
    .unwrap();
  assert!(matches!(
    agent.identities().set_metadata_name(&tenant, &created.did_uri, "Work").await,
    Err(Error::NoChangesDetected)
  ));
  assert_eq!(
    agent.get_identity(&created.did_uri).await.unwrap().unwrap().metadata.name,
    "Work"
  );

  assert!(agent.delete_identity(&created.did_uri).await.unwrap());
  assert_eq!(agent.get_identity(&created.did_uri).await.unwrap(), None);
  assert!(!agent.delete_identity(&created.did_uri).await.unwrap());
}

#[tokio::test]
async fn test_set_dwn_endpoints() {
  let agent: Agent = agent();
  agent.initialize("secret").await.unwrap();
  let tenant: Did = agent.agent_did().unwrap();

  let identity: Identity = agent
    .create_identity(IdentityMetadata::named("Plain"), Vec::new())
    .await
    .unwrap();
  assert!(identity.portable_did.document.dwn_endpoints().is_empty());

  let updated: Identity = agent
    .identities()
    .set_dwn_endpoints(&tenant, &identity.did_uri, vec!["https://dwn.example".to_owned()])
    .await
    .unwrap();
  assert_eq!(updated.portable_did.document.dwn_endpoints(), ["https://dwn.example"]);

  assert!(matches!(
    agent
      .identities()
      .set_dwn_endpoints(&tenant, &identity.did_uri, vec!["https://dwn.example".to_owned()])
      .await,
    Err(Error::NoChangesDetected)
  ));

  // the agent resolver serves the amended document, not the bare derivation
  let resolved: DidDocument = agent.resolver().resolve(&identity.did_uri).await.unwrap();
  assert_eq!(resolved.dwn_endpoints(), ["https://dwn.example"]);
  assert!(DidJwk::resolve(&identity.did_uri).unwrap().dwn_endpoints().is_empty());
}

#[tokio::test]
async fn test_export_import_roundtrip() {
  let agent: Agent = agent();
  agent.initialize("secret").await.unwrap();

  let created: Identity = agent
    .create_identity(IdentityMetadata::named("Roaming"), Vec::new())
    .await
    .unwrap();

  let exported: PortableIdentity = agent.export_identity(&created.did_uri).await.unwrap();
  assert_eq!(exported.private_keys.len(), 1);
  assert!(exported.private_keys[0].is_private());

  assert!(agent.delete_identity(&created.did_uri).await.unwrap());

  let imported: Identity = agent.import_identity(exported).await.unwrap();
  assert_eq!(imported, created);
  assert_eq!(agent.get_identity(&created.did_uri).await.unwrap(), Some(created));
}

#[tokio::test]
async fn test_export_unknown_identity() {
  let agent: Agent = agent();
  agent.initialize("secret").await.unwrap();

  let unknown: Did = Did::parse("did:example:unknown").unwrap();
  assert!(matches!(
    agent.export_identity(&unknown).await,
    Err(Error::IdentityNotFound(_))
  ));
}

#[tokio::test]
async fn test_connected_identity() {
  let agent: Agent = agent();
  agent.initialize("secret").await.unwrap();
  let tenant: Did = agent.agent_did().unwrap();

  agent
    .create_identity(IdentityMetadata::named("Plain"), Vec::new())
    .await
    .unwrap();

  let peer: Did = Did::parse("did:example:peer").unwrap();
  let connected: Identity = agent
    .create_identity(
      IdentityMetadata {
        name: "Connected".to_owned(),
        connected_did: Some(peer.clone()),
        tenant: None,
      },
      Vec::new(),
    )
    .await
    .unwrap();

  let found: Option<Identity> = agent.identities().connected_identity(&tenant, Some(&peer)).await.unwrap();
  assert_eq!(found, Some(connected.clone()));

  let any: Option<Identity> = agent.identities().connected_identity(&tenant, None).await.unwrap();
  assert_eq!(any, Some(connected));

  let other: Did = Did::parse("did:example:other").unwrap();
  assert_eq!(
    agent.identities().connected_identity(&tenant, Some(&other)).await.unwrap(),
    None
  );
}

#[tokio::test]
async fn test_identity_records_replicate_to_remote() {
  let remote: Arc<MemNode> = Arc::new(MemNode::new());
  let transport: Arc<TestTransport> = Arc::new(TestTransport::new(vec![("https://remote.dwn.example", remote)]));

  let agent: Agent = Agent::builder()
    .vault_work_factor(TEST_WORK_FACTOR)
    .transport(transport.clone())
    .build()
    .unwrap();
  agent.initialize("secret").await.unwrap();

  let identity: Identity = agent
    .create_identity(
      IdentityMetadata::named("Mirrored"),
      vec!["https://remote.dwn.example".to_owned()],
    )
    .await
    .unwrap();

  agent.register_sync_identity(identity.did_uri.clone()).unwrap();

  // the identity's tenant has no local messages yet: the first tick only
  // reads the remote event log
  agent.sync().push().await.unwrap();
  agent.sync().pull().await.unwrap();

  // nothing was written under the identity tenant yet
  assert!(agent.sync().db().history(&identity.did_uri).unwrap().is_empty());
  assert_eq!(transport.request_count("https://remote.dwn.example"), 1);

  // write a record under the identity and push again
  let payload: Vec<u8> = serde_json::to_vec(&serde_json::json!({"note": "hello"})).unwrap();
  let reply = agent
    .dwn()
    .process_message(
      agent_dwn::DwnRequest::new(identity.did_uri.clone(), agent_dwn::MessageType::RecordsWrite).with_params(
        agent_dwn::MessageParams {
          data: Some(payload),
          ..agent_dwn::MessageParams::default()
        },
      ),
    )
    .await
    .unwrap();
  assert_eq!(reply.reply.status.code, 202);

  agent.sync().push().await.unwrap();
  assert_eq!(
    agent.sync().db().history(&identity.did_uri).unwrap(),
    vec![reply.message_cid]
  );
  assert!(agent.sync().db().queue_items(Direction::Push).unwrap().is_empty());
}
