// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use agent_did::resolver::DidJwkResolver;
use agent_did::Did;
use agent_did::DidJwk;
use agent_dwn::DwnClient;
use agent_dwn::DwnRequest;
use agent_dwn::HttpTransport;
use agent_dwn::MemNode;
use agent_dwn::MessageParams;
use agent_dwn::MessageType;
use agent_dwn::RecordsFilter;
use agent_keys::KeyAlgorithm;
use agent_keys::KeyManager;
use agent_keys::LocalKeyManager;
use agent_store::Collection;
use agent_store::DataStore;
use agent_store::DwnDataStore;
use agent_store::Error;
use agent_store::MemDataStore;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
struct TestObject {
  id: String,
  x: i64,
}

impl TestObject {
  fn new(id: &str, x: i64) -> Self {
    Self {
      id: id.to_owned(),
      x,
    }
  }
}

impl Collection for TestObject {
  const PROTOCOL: &'static str = "https://example.com/protocols/test-objects";
  const PROTOCOL_PATH: &'static str = "object";
  const SCHEMA: &'static str = "https://example.com/schemas/test-object";

  fn object_id(&self) -> String {
    self.id.clone()
  }
}

async fn new_tenant(key_manager: &Arc<LocalKeyManager>) -> Did {
  let key_uri = key_manager.generate_key(KeyAlgorithm::Ed25519).await.unwrap();
  let public = key_manager.get_public_key(&key_uri).await.unwrap();
  DidJwk::encode(&public).unwrap()
}

async fn full_fixture() -> (DwnClient, Did, Arc<LocalKeyManager>) {
  let key_manager: Arc<LocalKeyManager> = Arc::new(LocalKeyManager::new());
  let tenant: Did = new_tenant(&key_manager).await;

  let client: DwnClient = DwnClient::new(
    Arc::new(MemNode::new()),
    Arc::new(HttpTransport::new()),
    key_manager.clone(),
    Arc::new(DidJwkResolver::new()),
  );
  (client, tenant, key_manager)
}

async fn dwn_fixture() -> (DwnClient, Did) {
  let (client, tenant, _) = full_fixture().await;
  (client, tenant)
}

async fn lifecycle(store: &impl DataStore<TestObject>, tenant: &Did) {
  store.set(tenant, "a", &TestObject::new("a", 1), false).await.unwrap();
  store.set(tenant, "b", &TestObject::new("b", 2), false).await.unwrap();
  store.set(tenant, "a", &TestObject::new("a", 3), false).await.unwrap();
  assert!(store.delete(tenant, "b").await.unwrap());

  assert_eq!(store.get(tenant, "a").await.unwrap(), Some(TestObject::new("a", 3)));
  assert_eq!(store.get(tenant, "b").await.unwrap(), None);
  assert_eq!(store.list(tenant).await.unwrap(), vec![TestObject::new("a", 3)]);

  assert!(!store.delete(tenant, "b").await.unwrap());
  assert!(store.delete(tenant, "a").await.unwrap());
  assert_eq!(store.list(tenant).await.unwrap(), Vec::<TestObject>::new());
}

#[tokio::test]
async fn test_mem_store_lifecycle() {
  let store: MemDataStore<TestObject> = MemDataStore::new();
  let tenant: Did = Did::parse("did:example:alice").unwrap();
  lifecycle(&store, &tenant).await;
}

#[tokio::test]
async fn test_dwn_store_lifecycle() {
  let (client, tenant) = dwn_fixture().await;
  let store: DwnDataStore<TestObject> = DwnDataStore::new(client);
  lifecycle(&store, &tenant).await;
}

#[tokio::test]
async fn test_duplicate_prevention() {
  let (client, tenant) = dwn_fixture().await;
  let store: DwnDataStore<TestObject> = DwnDataStore::new(client);

  store.set(&tenant, "a", &TestObject::new("a", 1), true).await.unwrap();
  let error = store.set(&tenant, "a", &TestObject::new("a", 2), true).await.unwrap_err();
  assert!(matches!(error, Error::DuplicateEntry(id) if id == "a"));

  // without prevention the write supersedes
  store.set(&tenant, "a", &TestObject::new("a", 2), false).await.unwrap();
  assert_eq!(store.get(&tenant, "a").await.unwrap(), Some(TestObject::new("a", 2)));
}

#[tokio::test]
async fn test_index_rebuild_from_authoritative_query() {
  let (client, tenant) = dwn_fixture().await;

  let writer: DwnDataStore<TestObject> = DwnDataStore::new(client.clone());
  writer.set(&tenant, "a", &TestObject::new("a", 7), false).await.unwrap();

  // a fresh store over the same DWN has a cold cache and index
  let reader: DwnDataStore<TestObject> = DwnDataStore::new(client);
  assert_eq!(reader.get(&tenant, "a").await.unwrap(), Some(TestObject::new("a", 7)));
  assert_eq!(reader.get(&tenant, "missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_dwn_inconsistency_is_detected() {
  let (client, tenant) = dwn_fixture().await;
  let store: DwnDataStore<TestObject> = DwnDataStore::new(client.clone());
  store.set(&tenant, "a", &TestObject::new("a", 1), false).await.unwrap();

  // find the record id and tombstone it behind the store's back
  let query = client
    .process_message(
      DwnRequest::new(tenant.clone(), MessageType::RecordsQuery).with_params(MessageParams {
        filter: Some(RecordsFilter {
          protocol: Some(TestObject::PROTOCOL.to_owned()),
          ..RecordsFilter::default()
        }),
        ..MessageParams::default()
      }),
    )
    .await
    .unwrap();
  let record_id: String = query.reply.entries.unwrap()[0].record_id.clone().unwrap();

  client
    .process_message(
      DwnRequest::new(tenant.clone(), MessageType::RecordsDelete).with_params(MessageParams {
        record_id: Some(record_id),
        ..MessageParams::default()
      }),
    )
    .await
    .unwrap();

  // evict "a" from the object cache so the read goes through the index
  for n in 0..100 {
    let filler: TestObject = TestObject::new(&format!("filler-{n}"), n);
    store.set(&tenant, &filler.id.clone(), &filler, false).await.unwrap();
  }

  // the index still resolves, the read comes back empty: surface it loudly
  let error = store.get(&tenant, "a").await.unwrap_err();
  assert!(matches!(error, Error::DwnInconsistent(_)));
}

#[tokio::test]
async fn test_oversized_objects_are_rejected_on_list() {
  let (client, tenant) = dwn_fixture().await;
  let store: DwnDataStore<TestObject> = DwnDataStore::new(client);

  let big: TestObject = TestObject {
    id: "big".repeat(20_000),
    x: 1,
  };
  store.set(&tenant, &big.id.clone(), &big, false).await.unwrap();

  let error = store.list(&tenant).await.unwrap_err();
  assert!(matches!(error, Error::ObjectTooLarge(_)));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
  let (client, tenant, key_manager) = full_fixture().await;
  let other: Did = new_tenant(&key_manager).await;
  let store: DwnDataStore<TestObject> = DwnDataStore::new(client);

  store.set(&tenant, "a", &TestObject::new("a", 1), false).await.unwrap();
  assert!(store.list(&other).await.unwrap().is_empty());
  assert_eq!(store.get(&other, "a").await.unwrap(), None);
}
