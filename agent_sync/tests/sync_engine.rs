// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use agent_core::common::Shared;
use agent_did::resolver::DidJwkResolver;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidJwk;
use agent_did::DidResolver;
use agent_dwn::DwnClient;
use agent_dwn::DwnMessage;
use agent_dwn::DwnRequest;
use agent_dwn::MemNode;
use agent_dwn::MessageParams;
use agent_dwn::MessageSink;
use agent_dwn::MessageReply;
use agent_dwn::MessageType;
use agent_dwn::RemoteTransport;
use agent_dwn::Reply;
use agent_keys::KeyAlgorithm;
use agent_keys::KeyManager;
use agent_keys::LocalKeyManager;
use agent_sync::Direction;
use agent_sync::SyncDb;
use agent_sync::SyncEngine;
use agent_sync::SyncKey;
use async_trait::async_trait;

/// Resolves DIDs from a fixed document set, falling back to `did:jwk`
/// derivation for documents that were not overridden.
struct StaticResolver {
  documents: Shared<HashMap<Did, DidDocument>>,
}

impl StaticResolver {
  fn new() -> Self {
    Self {
      documents: Shared::new(HashMap::new()),
    }
  }

  fn insert(&self, document: DidDocument) {
    self.documents.write().unwrap().insert(document.id.clone(), document);
  }
}

#[async_trait]
impl DidResolver for StaticResolver {
  async fn resolve(&self, did: &Did) -> agent_did::Result<DidDocument> {
    let known: Option<DidDocument> = self
      .documents
      .read()
      .map_err(|_| agent_did::Error::ResolutionFailed("resolver poisoned".to_owned()))?
      .get(did)
      .cloned();

    match known {
      Some(document) => Ok(document),
      None => DidJwkResolver::new().resolve(did).await,
    }
  }
}

/// Routes endpoint URLs to in-memory nodes; some endpoints always fail.
struct TestTransport {
  routes: HashMap<String, Arc<MemNode>>,
  failing: HashSet<String>,
  requests: Shared<HashMap<String, usize>>,
}

impl TestTransport {
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

    if self.failing.contains(endpoint) {
      return Err(agent_dwn::Error::EndpointUnreachable(endpoint.to_owned()));
    }

    let node: &Arc<MemNode> = self
      .routes
      .get(endpoint)
      .ok_or_else(|| agent_dwn::Error::EndpointUnreachable(endpoint.to_owned()))?;
    node.process(target, message.clone(), data.map(<[u8]>::to_vec)).await
  }
}

struct Fixture {
  client: DwnClient,
  local: Arc<MemNode>,
  transport: Arc<TestTransport>,
  resolver: Arc<StaticResolver>,
  key_manager: Arc<LocalKeyManager>,
}

impl Fixture {
  async fn new(routes: Vec<(&str, Arc<MemNode>)>, failing: Vec<&str>) -> Self {
    let local: Arc<MemNode> = Arc::new(MemNode::new());
    let key_manager: Arc<LocalKeyManager> = Arc::new(LocalKeyManager::new());
    let resolver: Arc<StaticResolver> = Arc::new(StaticResolver::new());

    let transport: Arc<TestTransport> = Arc::new(TestTransport {
      routes: routes.into_iter().map(|(url, node)| (url.to_owned(), node)).collect(),
      failing: failing.into_iter().map(str::to_owned).collect(),
      requests: Shared::new(HashMap::new()),
    });

    let client: DwnClient = DwnClient::new(
      local.clone(),
      transport.clone(),
      key_manager.clone(),
      resolver.clone(),
    );

    Self {
      client,
      local,
      transport,
      resolver,
      key_manager,
    }
  }

  /// Creates an identity whose document advertises the given DWN endpoints.
  async fn identity(&self, endpoints: &[&str]) -> Did {
    let key_uri = self.key_manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();
    let public = self.key_manager.get_public_key(&key_uri).await.unwrap();
    let did: Did = DidJwk::encode(&public).unwrap();

    let mut document: DidDocument = DidJwk::resolve(&did).unwrap();
    document.set_dwn_endpoints(endpoints.iter().map(|url| (*url).to_owned()).collect());
    self.resolver.insert(document);
    did
  }

  fn engine(&self) -> SyncEngine {
    SyncEngine::new(
      SyncDb::temporary().unwrap(),
      self.client.clone(),
      self.resolver.clone(),
    )
  }

  /// Writes a record on the local node under `tenant`, returning the signed
  /// message and its CID.
  async fn write_local(&self, tenant: &Did, payload: &[u8]) -> (DwnMessage, String) {
    let reply: MessageReply = self
      .client
      .process_message(
        DwnRequest::new(tenant.clone(), MessageType::RecordsWrite).with_params(MessageParams {
          data: Some(payload.to_vec()),
          ..MessageParams::default()
        }),
      )
      .await
      .unwrap();
    assert_eq!(reply.reply.status.code, 202);
    (reply.message, reply.message_cid)
  }
}

#[tokio::test]
async fn test_push_is_at_most_once_per_identity() {
  let shared_remote: Arc<MemNode> = Arc::new(MemNode::new());
  let fixture: Fixture = Fixture::new(
    vec![
      ("https://e1.dwn.example", shared_remote.clone()),
      ("https://e3.dwn.example", shared_remote.clone()),
    ],
    vec!["https://e2.dwn.example"],
  )
  .await;

  let identity_one: Did = fixture.identity(&["https://e1.dwn.example"]).await;
  let identity_two: Did = fixture
    .identity(&["https://e2.dwn.example", "https://e3.dwn.example"])
    .await;

  // the same signed write exists under both tenants, so both share one CID
  let (message, cid) = fixture.write_local(&identity_one, b"{\"v\":1}").await;
  let replay: Reply = fixture
    .client
    .process_raw(&identity_two, message, None)
    .await
    .unwrap();
  assert_eq!(replay.status.code, 202);

  let engine: SyncEngine = fixture.engine();
  engine.register_identity(identity_one.clone()).unwrap();
  engine.register_identity(identity_two.clone()).unwrap();

  engine.push().await.unwrap();

  assert!(engine.db().queue_items(Direction::Push).unwrap().is_empty());
  assert_eq!(engine.db().history(&identity_one).unwrap(), vec![cid.clone()]);
  assert_eq!(engine.db().history(&identity_two).unwrap(), vec![cid.clone()]);
  assert_eq!(fixture.transport.request_count("https://e1.dwn.example"), 1);
  assert_eq!(fixture.transport.request_count("https://e3.dwn.example"), 1);

  // the next tick finds nothing new and sends nothing
  engine.push().await.unwrap();
  assert_eq!(fixture.transport.request_count("https://e1.dwn.example"), 1);
  assert_eq!(fixture.transport.request_count("https://e3.dwn.example"), 1);
}

#[tokio::test]
async fn test_push_advances_cursor_only_on_success() {
  let fixture: Fixture = Fixture::new(vec![], vec!["https://down.dwn.example"]).await;
  let identity: Did = fixture.identity(&["https://down.dwn.example"]).await;

  fixture.write_local(&identity, b"{}").await;

  let engine: SyncEngine = fixture.engine();
  engine.register_identity(identity.clone()).unwrap();
  engine.push().await.unwrap();

  // the local event log was read, so the push cursor advanced, but the
  // unreachable endpoint kept its queue item for the next tick
  assert!(engine
    .db()
    .cursor(&identity, "https://down.dwn.example", Direction::Push)
    .unwrap()
    .is_some());

  let items: Vec<SyncKey> = engine.db().queue_items(Direction::Push).unwrap();
  assert_eq!(items.len(), 1);
  assert!(engine.db().history(&identity).unwrap().is_empty());
}

#[tokio::test]
async fn test_queue_watermarks_are_monotonic() {
  let fixture: Fixture = Fixture::new(vec![], vec!["https://down.dwn.example"]).await;
  let identity: Did = fixture.identity(&["https://down.dwn.example"]).await;

  let (_, first_cid) = fixture.write_local(&identity, b"{\"n\":1}").await;
  let (_, second_cid) = fixture.write_local(&identity, b"{\"n\":2}").await;
  let (_, third_cid) = fixture.write_local(&identity, b"{\"n\":3}").await;

  let engine: SyncEngine = fixture.engine();
  engine.register_identity(identity).unwrap();
  engine.push().await.unwrap();

  let items: Vec<SyncKey> = engine.db().queue_items(Direction::Push).unwrap();
  assert_eq!(items.len(), 3);

  // queue order is event log order, watermarks are sortable and monotonic
  let cids: Vec<&str> = items.iter().map(|item| item.message_cid.as_str()).collect();
  assert_eq!(cids, vec![first_cid.as_str(), second_cid.as_str(), third_cid.as_str()]);
  for pair in items.windows(2) {
    assert!(pair[0].watermark < pair[1].watermark);
  }
  for item in &items {
    assert_eq!(item.watermark.len(), 26);
  }
}

#[tokio::test]
async fn test_pull_mirrors_remote_records() {
  let remote: Arc<MemNode> = Arc::new(MemNode::new());
  let fixture: Fixture = Fixture::new(vec![("https://remote.dwn.example", remote.clone())], vec![]).await;
  let identity: Did = fixture.identity(&["https://remote.dwn.example"]).await;

  // seed the remote node through a client whose "local" node is the remote
  let remote_client: DwnClient = DwnClient::new(
    remote.clone(),
    fixture.transport.clone(),
    fixture.key_manager.clone(),
    fixture.resolver.clone(),
  );
  let reply: MessageReply = remote_client
    .process_message(
      DwnRequest::new(identity.clone(), MessageType::RecordsWrite).with_params(MessageParams {
        data: Some(b"{\"remote\":true}".to_vec()),
        ..MessageParams::default()
      }),
    )
    .await
    .unwrap();
  assert_eq!(reply.reply.status.code, 202);

  let engine: SyncEngine = fixture.engine();
  engine.register_identity(identity.clone()).unwrap();

  engine.pull().await.unwrap();
  assert_eq!(fixture.local.event_count(&identity).unwrap(), 1);
  assert_eq!(engine.db().history(&identity).unwrap(), vec![reply.message_cid.clone()]);
  assert!(engine.db().queue_items(Direction::Pull).unwrap().is_empty());

  // pulling again changes nothing
  engine.pull().await.unwrap();
  assert_eq!(fixture.local.event_count(&identity).unwrap(), 1);
}

#[tokio::test]
async fn test_scheduler_start_stop() {
  let remote: Arc<MemNode> = Arc::new(MemNode::new());
  let fixture: Fixture = Fixture::new(vec![("https://remote.dwn.example", remote.clone())], vec![]).await;
  let identity: Did = fixture.identity(&["https://remote.dwn.example"]).await;
  let (_, cid) = fixture.write_local(&identity, b"{}").await;

  let engine: SyncEngine = fixture.engine();
  engine.register_identity(identity.clone()).unwrap();

  engine.start_sync(Duration::from_millis(10)).unwrap();
  assert!(matches!(
    engine.start_sync(Duration::from_millis(10)),
    Err(agent_sync::Error::AlreadySyncing)
  ));

  tokio::time::sleep(Duration::from_millis(100)).await;
  engine.stop_sync().await.unwrap();

  assert!(engine.db().history(&identity).unwrap().contains(&cid));
  assert_eq!(remote.event_count(&identity).unwrap(), 1);

  // stopping twice is harmless
  engine.stop_sync().await.unwrap();
}
