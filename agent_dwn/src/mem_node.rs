// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! An in-memory DWN node.
//!
//! This stands in for the external message engine behind [`MessageSink`]:
//! enough of the records, protocols and messages interfaces for the typed
//! data store and the sync engine to be exercised end to end. Schema and
//! permission enforcement are intentionally absent.

use std::collections::HashMap;
use std::collections::HashSet;

use agent_core::common::Shared;
use agent_core::common::Timestamp;
use agent_crypto::jwu;
use agent_did::Did;
use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::message::DwnMessage;
use crate::message::MessageType;
use crate::message::PaginationCursor;
use crate::message::RecordsFilter;
use crate::node::MessageSink;
use crate::reply::MessagesReadEntry;
use crate::reply::Reply;

/// Data larger than this is not inlined into query replies.
pub const MAX_ENCODED_DATA: usize = 50_000;

struct LogEntry {
  cid: String,
  message: DwnMessage,
  data: Option<Vec<u8>>,
}

struct RecordState {
  message: DwnMessage,
  data: Option<Vec<u8>>,
}

#[derive(Default)]
struct TenantState {
  log: Vec<LogEntry>,
  log_cids: HashSet<String>,
  records: HashMap<String, RecordState>,
  // record id -> timestamp of the delete that tombstoned it
  tombstones: HashMap<String, Option<Timestamp>>,
  protocols: HashMap<String, DwnMessage>,
}

/// An in-memory, multi-tenant [`MessageSink`].
#[derive(Default)]
pub struct MemNode {
  tenants: Shared<HashMap<Did, TenantState>>,
}

impl MemNode {
  /// Creates a new, empty `MemNode`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the number of events in a tenant's log, for test assertions.
  pub fn event_count(&self, tenant: &Did) -> Result<usize> {
    Ok(self.tenants.read()?.get(tenant).map(|state| state.log.len()).unwrap_or(0))
  }
}

impl core::fmt::Debug for MemNode {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("MemNode")
  }
}

#[async_trait]
impl MessageSink for MemNode {
  async fn process(&self, target: &Did, message: DwnMessage, data: Option<Vec<u8>>) -> Result<Reply> {
    let Some(message_type) = message.descriptor.message_type() else {
      return Ok(Reply::with_status(400, "unknown interface or method"));
    };

    let cid: String = message.cid()?;
    let mut tenants = self.tenants.write()?;
    let state: &mut TenantState = tenants.entry(target.clone()).or_default();

    match message_type {
      MessageType::RecordsWrite => records_write(state, cid, message, data),
      MessageType::RecordsDelete => records_delete(state, cid, message),
      MessageType::RecordsQuery => records_query(state, &message),
      MessageType::RecordsRead => records_read(state, &message),
      MessageType::RecordsSubscribe => Ok(Reply::with_status(501, "subscriptions are not supported")),
      MessageType::ProtocolsConfigure => protocols_configure(state, cid, message),
      MessageType::ProtocolsQuery => protocols_query(state, &message),
      MessageType::MessagesQuery => messages_query(state, &message),
      MessageType::MessagesRead => messages_read(state, &message),
    }
  }
}

fn extract_data(message: &mut DwnMessage, data: Option<Vec<u8>>) -> Result<Option<Vec<u8>>> {
  // inline data is normalized into a detached payload before storage
  match (data, message.encoded_data.take()) {
    (Some(bytes), _) => Ok(Some(bytes)),
    (None, Some(encoded)) => Ok(Some(jwu::decode_b64(encoded).map_err(Error::CryptoError)?)),
    (None, None) => Ok(None),
  }
}

fn with_inline_data(record: &RecordState) -> DwnMessage {
  let mut message: DwnMessage = record.message.clone();
  if let Some(data) = record.data.as_ref().filter(|data| data.len() <= MAX_ENCODED_DATA) {
    message.encoded_data = Some(jwu::encode_b64(data));
  }
  message
}

fn records_write(state: &mut TenantState, cid: String, mut message: DwnMessage, data: Option<Vec<u8>>) -> Result<Reply> {
  if state.log_cids.contains(&cid) {
    return Ok(Reply::conflict());
  }
  let Some(record_id) = message.record_id.clone() else {
    return Ok(Reply::with_status(400, "record write without a record id"));
  };

  // message order is timestamp order: an older write neither displaces a
  // newer record nor resurrects a record deleted after it was authored
  if let Some(deleted_at) = state.tombstones.get(&record_id) {
    if message.descriptor.message_timestamp < *deleted_at {
      return Ok(Reply::conflict());
    }
    state.tombstones.remove(&record_id);
  }
  if let Some(existing) = state.records.get(&record_id) {
    if message.descriptor.message_timestamp < existing.message.descriptor.message_timestamp {
      return Ok(Reply::conflict());
    }
  }

  let data: Option<Vec<u8>> = extract_data(&mut message, data)?;
  state.records.insert(
    record_id,
    RecordState {
      message: message.clone(),
      data: data.clone(),
    },
  );
  state.log_cids.insert(cid.clone());
  state.log.push(LogEntry { cid, message, data });

  Ok(Reply::accepted())
}

fn records_delete(state: &mut TenantState, cid: String, message: DwnMessage) -> Result<Reply> {
  if state.log_cids.contains(&cid) {
    return Ok(Reply::conflict());
  }
  let Some(record_id) = message.descriptor.record_id.clone() else {
    return Ok(Reply::with_status(400, "record delete without a record id"));
  };

  if state.records.remove(&record_id).is_none() {
    return Ok(Reply::not_found());
  }

  state.tombstones.insert(record_id, message.descriptor.message_timestamp);
  state.log_cids.insert(cid.clone());
  state.log.push(LogEntry {
    cid,
    message,
    data: None,
  });

  Ok(Reply::accepted())
}

fn matches_filter(message: &DwnMessage, filter: &RecordsFilter) -> bool {
  fn check(expected: &Option<String>, actual: &Option<String>) -> bool {
    expected.is_none() || expected == actual
  }

  check(&filter.protocol, &message.descriptor.protocol)
    && check(&filter.protocol_path, &message.descriptor.protocol_path)
    && check(&filter.schema, &message.descriptor.schema)
    && (filter.record_id.is_none() || filter.record_id == message.record_id)
}

fn records_query(state: &TenantState, message: &DwnMessage) -> Result<Reply> {
  let filter: RecordsFilter = message.descriptor.filter.clone().unwrap_or_default();

  let mut entries: Vec<&RecordState> = state
    .records
    .values()
    .filter(|record| matches_filter(&record.message, &filter))
    .collect();
  entries.sort_by(|a, b| {
    (a.message.descriptor.message_timestamp, a.message.record_id.as_ref())
      .cmp(&(b.message.descriptor.message_timestamp, b.message.record_id.as_ref()))
  });

  let mut reply: Reply = Reply::ok();
  reply.entries = Some(entries.into_iter().map(with_inline_data).collect());
  Ok(reply)
}

fn records_read(state: &TenantState, message: &DwnMessage) -> Result<Reply> {
  let record_id: Option<&String> = message
    .descriptor
    .filter
    .as_ref()
    .and_then(|filter| filter.record_id.as_ref());
  let Some(record_id) = record_id else {
    return Ok(Reply::with_status(400, "record read without a record id"));
  };

  match state.records.get(record_id) {
    Some(record) => {
      let mut reply: Reply = Reply::ok();
      reply.record = Some(Box::new(with_inline_data(record)));
      Ok(reply)
    }
    None => Ok(Reply::not_found()),
  }
}

fn protocols_configure(state: &mut TenantState, cid: String, message: DwnMessage) -> Result<Reply> {
  if state.log_cids.contains(&cid) {
    return Ok(Reply::conflict());
  }
  let Some(definition) = message.descriptor.definition.as_ref() else {
    return Ok(Reply::with_status(400, "protocol configure without a definition"));
  };

  state.protocols.insert(definition.protocol.clone(), message.clone());
  state.log_cids.insert(cid.clone());
  state.log.push(LogEntry {
    cid,
    message,
    data: None,
  });

  Ok(Reply::accepted())
}

fn protocols_query(state: &TenantState, message: &DwnMessage) -> Result<Reply> {
  let protocol: Option<&String> = message
    .descriptor
    .filter
    .as_ref()
    .and_then(|filter| filter.protocol.as_ref());

  let entries: Vec<DwnMessage> = state
    .protocols
    .iter()
    .filter(|(uri, _)| protocol.map_or(true, |wanted| wanted == *uri))
    .map(|(_, configure)| configure.clone())
    .collect();

  let mut reply: Reply = Reply::ok();
  reply.entries = Some(entries);
  Ok(reply)
}

fn messages_query(state: &TenantState, message: &DwnMessage) -> Result<Reply> {
  let start: usize = match message.descriptor.cursor.as_ref() {
    Some(cursor) => state
      .log
      .iter()
      .position(|entry| entry.cid == cursor.message_cid)
      .map(|index| index + 1)
      .unwrap_or(0),
    None => 0,
  };

  let mut reply: Reply = Reply::ok();
  reply.message_cids = Some(state.log[start..].iter().map(|entry| entry.cid.clone()).collect());
  reply.cursor = state.log.last().map(|entry| PaginationCursor {
    message_cid: entry.cid.clone(),
  });
  Ok(reply)
}

fn messages_read(state: &TenantState, message: &DwnMessage) -> Result<Reply> {
  let Some(message_cid) = message.descriptor.message_cid.as_ref() else {
    return Ok(Reply::with_status(400, "message read without a message cid"));
  };

  match state.log.iter().find(|entry| &entry.cid == message_cid) {
    Some(entry) => {
      let mut reply: Reply = Reply::ok();
      reply.entry = Some(MessagesReadEntry {
        message: entry.message.clone(),
        data: entry.data.as_ref().map(jwu::encode_b64),
      });
      Ok(reply)
    }
    None => Ok(Reply::not_found()),
  }
}
