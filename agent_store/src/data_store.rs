// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::marker::PhantomData;
use core::num::NonZeroUsize;
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::time::Duration;

use agent_core::common::Shared;
use agent_crypto::jwu;
use agent_did::Did;
use agent_dwn::cid;
use agent_dwn::DwnClient;
use agent_dwn::DwnMessage;
use agent_dwn::DwnRequest;
use agent_dwn::MessageParams;
use agent_dwn::MessageReply;
use agent_dwn::MessageType;
use agent_dwn::RecordsFilter;
use async_trait::async_trait;
use lru::LruCache;

use crate::collection::Collection;
use crate::collection::COLLECTION_DATA_FORMAT;
use crate::error::Error;
use crate::error::Result;
use crate::ttl_cache::TtlCache;

/// Default lifetime of record index entries.
pub const DEFAULT_INDEX_TTL: Duration = Duration::from_secs(7200);
/// Capacity of the per-store object cache.
pub const OBJECT_CACHE_CAPACITY: usize = 100;

/// The separator of the `(tenant, id)` composite key. Must never appear in a
/// DID used as a tenant, which the DID grammar guarantees.
pub const TENANT_SEPARATOR: char = '^';

fn composite_key(tenant: &Did, id: &str) -> String {
  format!("{tenant}{TENANT_SEPARATOR}{id}")
}

/// A typed key-value view with tenant isolation.
///
/// The two implementations are [`DwnDataStore`] (authoritative DWN log) and
/// [`MemDataStore`] (plain map).
#[async_trait]
pub trait DataStore<T>: Send + Sync {
  /// Writes `data` under `(tenant, id)`, superseding an existing entry.
  ///
  /// With `prevent_duplicates`, an existing entry fails the call instead.
  async fn set(&self, tenant: &Did, id: &str, data: &T, prevent_duplicates: bool) -> Result<()>;

  /// Returns the object stored under `(tenant, id)`, if any.
  async fn get(&self, tenant: &Did, id: &str) -> Result<Option<T>>;

  /// Returns every object of the collection stored under `tenant`.
  async fn list(&self, tenant: &Did) -> Result<Vec<T>>;

  /// Deletes the object under `(tenant, id)`, returning whether it existed.
  async fn delete(&self, tenant: &Did, id: &str) -> Result<bool>;
}

/// A [`DataStore`] whose objects live as records in a DWN.
///
/// Records are written under the collection's protocol with a record id
/// derived from the object id, so rewrites of the same id supersede earlier
/// records. The TTL index and LRU cache are latency optimizations; the DWN
/// query remains authoritative.
pub struct DwnDataStore<T> {
  dwn: DwnClient,
  index: Shared<TtlCache<String, String>>,
  cache: Shared<LruCache<String, T>>,
  installed: Shared<HashSet<Did>>,
  _marker: PhantomData<fn() -> T>,
}

impl<T: Collection> DwnDataStore<T> {
  /// Creates a store over `dwn` with the default index TTL.
  pub fn new(dwn: DwnClient) -> Self {
    Self::with_index_ttl(dwn, DEFAULT_INDEX_TTL)
  }

  /// Creates a store with an explicit index TTL.
  pub fn with_index_ttl(dwn: DwnClient, index_ttl: Duration) -> Self {
    // safe to unwrap, the capacity is a non-zero constant
    let capacity: NonZeroUsize = NonZeroUsize::new(OBJECT_CACHE_CAPACITY).unwrap();

    Self {
      dwn,
      index: Shared::new(TtlCache::new(index_ttl)),
      cache: Shared::new(LruCache::new(capacity)),
      installed: Shared::new(HashSet::new()),
      _marker: PhantomData,
    }
  }

  fn collection_filter() -> RecordsFilter {
    RecordsFilter {
      protocol: Some(T::PROTOCOL.to_owned()),
      protocol_path: Some(T::PROTOCOL_PATH.to_owned()),
      schema: Some(T::SCHEMA.to_owned()),
      record_id: None,
    }
  }

  fn record_id_for(id: &str) -> Result<String> {
    Ok(cid::compute_cid(&serde_json::json!({
      "protocol": T::PROTOCOL,
      "protocolPath": T::PROTOCOL_PATH,
      "schema": T::SCHEMA,
      "objectId": id,
    }))?)
  }

  fn decode_entry(message: &DwnMessage) -> Result<T> {
    let record_id: &str = message.record_id.as_deref().unwrap_or("unknown");
    let encoded: &str = message
      .encoded_data
      .as_deref()
      .ok_or_else(|| Error::ObjectTooLarge(record_id.to_owned()))?;

    Ok(serde_json::from_slice(&jwu::decode_b64(encoded)?)?)
  }

  /// Installs the collection protocol under `tenant` unless a previous call
  /// or a `ProtocolsQuery` confirms it is already installed.
  async fn ensure_protocol(&self, tenant: &Did) -> Result<()> {
    if self.installed.read()?.contains(tenant) {
      return Ok(());
    }

    let query: DwnRequest = DwnRequest::new(tenant.clone(), MessageType::ProtocolsQuery).with_params(MessageParams {
      filter: Some(RecordsFilter {
        protocol: Some(T::PROTOCOL.to_owned()),
        ..RecordsFilter::default()
      }),
      ..MessageParams::default()
    });
    let reply: MessageReply = self
      .dwn
      .process_message(query)
      .await
      .map_err(|err| Error::ProtocolInstallFailed(err.to_string()))?;
    if !reply.reply.is_success() {
      return Err(Error::ProtocolInstallFailed(reply.reply.status.detail));
    }

    let already_installed: bool = reply.reply.entries.map_or(false, |entries| !entries.is_empty());
    if !already_installed {
      log::debug!("installing protocol {} for {tenant}", T::PROTOCOL);
      let configure: DwnRequest =
        DwnRequest::new(tenant.clone(), MessageType::ProtocolsConfigure).with_params(MessageParams {
          definition: Some(T::protocol_definition()),
          ..MessageParams::default()
        });
      let reply: MessageReply = self
        .dwn
        .process_message(configure)
        .await
        .map_err(|err| Error::ProtocolInstallFailed(err.to_string()))?;
      if !reply.reply.is_synchronized() {
        return Err(Error::ProtocolInstallFailed(reply.reply.status.detail));
      }
    }

    self.installed.write()?.insert(tenant.clone());
    Ok(())
  }

  async fn query_all(&self, tenant: &Did) -> Result<Vec<DwnMessage>> {
    let query: DwnRequest = DwnRequest::new(tenant.clone(), MessageType::RecordsQuery).with_params(MessageParams {
      filter: Some(Self::collection_filter()),
      ..MessageParams::default()
    });

    let reply: MessageReply = self.dwn.process_message(query).await?;
    if reply.reply.status.code != 200 {
      return Err(Error::QueryFailed {
        code: reply.reply.status.code,
        detail: reply.reply.status.detail,
      });
    }

    Ok(reply.reply.entries.unwrap_or_default())
  }

  /// Rebuilds the index for `tenant` from the authoritative record query.
  async fn rebuild_index(&self, tenant: &Did) -> Result<()> {
    let entries: Vec<DwnMessage> = self.query_all(tenant).await?;

    let mut index = self.index.write()?;
    let prefix: String = composite_key(tenant, "");
    index.retain(|key| !key.starts_with(&prefix));

    for message in &entries {
      let object: T = Self::decode_entry(message)?;
      if let Some(record_id) = message.record_id.clone() {
        index.insert(composite_key(tenant, &object.object_id()), record_id);
      }
    }

    Ok(())
  }

  /// Looks up the record id of `(tenant, id)`, rebuilding the index once.
  async fn lookup_record_id(&self, tenant: &Did, id: &str) -> Result<Option<String>> {
    let key: String = composite_key(tenant, id);

    if let Some(record_id) = self.index.write()?.get(&key).cloned() {
      return Ok(Some(record_id));
    }

    self.rebuild_index(tenant).await?;
    Ok(self.index.write()?.get(&key).cloned())
  }
}

#[async_trait]
impl<T: Collection> DataStore<T> for DwnDataStore<T> {
  async fn set(&self, tenant: &Did, id: &str, data: &T, prevent_duplicates: bool) -> Result<()> {
    debug_assert_eq!(data.object_id(), id);
    self.ensure_protocol(tenant).await?;

    if prevent_duplicates && self.lookup_record_id(tenant, id).await?.is_some() {
      return Err(Error::DuplicateEntry(id.to_owned()));
    }

    let record_id: String = Self::record_id_for(id)?;
    let write: DwnRequest = DwnRequest::new(tenant.clone(), MessageType::RecordsWrite).with_params(MessageParams {
      protocol: Some(T::PROTOCOL.to_owned()),
      protocol_path: Some(T::PROTOCOL_PATH.to_owned()),
      schema: Some(T::SCHEMA.to_owned()),
      data_format: Some(COLLECTION_DATA_FORMAT.to_owned()),
      record_id: Some(record_id.clone()),
      data: Some(serde_json::to_vec(data)?),
      ..MessageParams::default()
    });

    let reply: MessageReply = self.dwn.process_message(write).await?;
    if !reply.reply.is_synchronized() {
      return Err(Error::WriteFailed {
        code: reply.reply.status.code,
        detail: reply.reply.status.detail,
      });
    }

    let key: String = composite_key(tenant, id);
    self.index.write()?.insert(key.clone(), record_id);
    self.cache.write()?.put(key, data.clone());
    Ok(())
  }

  async fn get(&self, tenant: &Did, id: &str) -> Result<Option<T>> {
    let key: String = composite_key(tenant, id);

    if let Some(object) = self.cache.write()?.get(&key).cloned() {
      return Ok(Some(object));
    }

    let Some(record_id) = self.lookup_record_id(tenant, id).await? else {
      return Ok(None);
    };

    let read: DwnRequest = DwnRequest::new(tenant.clone(), MessageType::RecordsRead).with_params(MessageParams {
      filter: Some(RecordsFilter {
        record_id: Some(record_id),
        ..RecordsFilter::default()
      }),
      ..MessageParams::default()
    });

    let reply: MessageReply = self.dwn.process_message(read).await?;
    let record: DwnMessage = match reply.reply.status.code {
      200 => match reply.reply.record {
        Some(record) => *record,
        None => return Err(Error::DwnInconsistent(key)),
      },
      // the index resolved but the authoritative read found nothing
      _ => return Err(Error::DwnInconsistent(key)),
    };

    let object: T = Self::decode_entry(&record)?;
    self.cache.write()?.put(key, object.clone());
    Ok(Some(object))
  }

  async fn list(&self, tenant: &Did) -> Result<Vec<T>> {
    let entries: Vec<DwnMessage> = self.query_all(tenant).await?;

    let mut objects: Vec<T> = Vec::with_capacity(entries.len());
    for message in &entries {
      objects.push(Self::decode_entry(message)?);
    }

    let mut index = self.index.write()?;
    let mut cache = self.cache.write()?;
    for (message, object) in entries.iter().zip(&objects) {
      let key: String = composite_key(tenant, &object.object_id());
      if let Some(record_id) = message.record_id.clone() {
        index.insert(key.clone(), record_id);
      }
      cache.put(key, object.clone());
    }

    Ok(objects)
  }

  async fn delete(&self, tenant: &Did, id: &str) -> Result<bool> {
    let Some(record_id) = self.lookup_record_id(tenant, id).await? else {
      return Ok(false);
    };

    let delete: DwnRequest = DwnRequest::new(tenant.clone(), MessageType::RecordsDelete).with_params(MessageParams {
      record_id: Some(record_id),
      ..MessageParams::default()
    });
    let reply: MessageReply = self.dwn.process_message(delete).await?;

    let key: String = composite_key(tenant, id);
    self.index.write()?.remove(&key);
    self.cache.write()?.pop(&key);

    match reply.reply.status.code {
      202 => Ok(true),
      404 => Ok(false),
      code => Err(Error::DeleteFailed {
        code,
        detail: reply.reply.status.detail,
      }),
    }
  }
}

impl<T> core::fmt::Debug for DwnDataStore<T> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("DwnDataStore")
  }
}

/// An in-memory [`DataStore`] over a plain ordered map.
pub struct MemDataStore<T> {
  entries: Shared<BTreeMap<String, T>>,
}

impl<T> MemDataStore<T> {
  /// Creates a new, empty `MemDataStore`.
  pub fn new() -> Self {
    Self {
      entries: Shared::new(BTreeMap::new()),
    }
  }
}

impl<T> Default for MemDataStore<T> {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl<T: Clone + Send + Sync> DataStore<T> for MemDataStore<T> {
  async fn set(&self, tenant: &Did, id: &str, data: &T, prevent_duplicates: bool) -> Result<()> {
    let key: String = composite_key(tenant, id);
    let mut entries = self.entries.write()?;

    if prevent_duplicates && entries.contains_key(&key) {
      return Err(Error::DuplicateEntry(id.to_owned()));
    }

    entries.insert(key, data.clone());
    Ok(())
  }

  async fn get(&self, tenant: &Did, id: &str) -> Result<Option<T>> {
    Ok(self.entries.read()?.get(&composite_key(tenant, id)).cloned())
  }

  async fn list(&self, tenant: &Did) -> Result<Vec<T>> {
    let prefix: String = composite_key(tenant, "");
    Ok(
      self
        .entries
        .read()?
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .map(|(_, value)| value.clone())
        .collect(),
    )
  }

  async fn delete(&self, tenant: &Did, id: &str) -> Result<bool> {
    Ok(self.entries.write()?.remove(&composite_key(tenant, id)).is_some())
  }
}

impl<T> core::fmt::Debug for MemDataStore<T> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("MemDataStore")
  }
}
