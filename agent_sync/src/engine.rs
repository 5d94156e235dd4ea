// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use agent_core::common::Shared;
use agent_crypto::jwu;
use agent_did::Did;
use agent_did::DidDocument;
use agent_did::DidResolver;
use agent_dwn::DwnClient;
use agent_dwn::DwnRequest;
use agent_dwn::MessageParams;
use agent_dwn::MessageReply;
use agent_dwn::MessageType;
use agent_dwn::PaginationCursor;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::db::Direction;
use crate::db::SyncDb;
use crate::db::SyncKey;
use crate::error::Error;
use crate::error::Result;
use crate::send_cache::SendCache;

struct SyncTask {
  stop: watch::Sender<bool>,
  handle: JoinHandle<Result<()>>,
}

struct Inner {
  db: SyncDb,
  dwn: DwnClient,
  resolver: Arc<dyn DidResolver>,
  registered: Shared<HashSet<Did>>,
  generator: Shared<ulid::Generator>,
  send_cache: Shared<SendCache>,
}

/// Mirrors the message log of every registered identity between the local
/// DWN and the remote endpoints in the identity's DID document.
///
/// One tick is `push` then `pull`; ticks never overlap because the next one
/// is scheduled only after the previous completes.
pub struct SyncEngine {
  inner: Arc<Inner>,
  task: Shared<Option<SyncTask>>,
}

impl SyncEngine {
  /// Creates an engine over the given store and collaborators.
  pub fn new(db: SyncDb, dwn: DwnClient, resolver: Arc<dyn DidResolver>) -> Self {
    Self {
      inner: Arc::new(Inner {
        db,
        dwn,
        resolver,
        registered: Shared::new(HashSet::new()),
        generator: Shared::new(ulid::Generator::new()),
        send_cache: Shared::new(SendCache::new()),
      }),
      task: Shared::new(None),
    }
  }

  /// Enrolls `did` for replication from the next tick on.
  pub fn register_identity(&self, did: Did) -> Result<()> {
    self.inner.registered.write()?.insert(did);
    Ok(())
  }

  /// Returns the identities currently enrolled.
  pub fn registered_identities(&self) -> Result<Vec<Did>> {
    Ok(self.inner.registered.read()?.iter().cloned().collect())
  }

  /// The cursor, queue and history store, exposed for inspection.
  pub fn db(&self) -> &SyncDb {
    &self.inner.db
  }

  /// Runs one push phase: enqueue from the local event log, then mirror
  /// queued messages onto remote endpoints.
  pub async fn push(&self) -> Result<()> {
    self.inner.push().await
  }

  /// Runs one pull phase: enqueue from the remote event logs, then replay
  /// queued messages onto the local DWN.
  pub async fn pull(&self) -> Result<()> {
    self.inner.pull().await
  }

  /// Starts the periodic scheduler with the given tick interval.
  ///
  /// A tick failure stops the loop; the error surfaces from
  /// [`SyncEngine::stop_sync`].
  pub fn start_sync(&self, interval: Duration) -> Result<()> {
    let mut guard = self.task.write()?;
    if guard.is_some() {
      return Err(Error::AlreadySyncing);
    }

    let (stop, mut stopped) = watch::channel(false);
    let inner: Arc<Inner> = Arc::clone(&self.inner);
    let handle: JoinHandle<Result<()>> = tokio::spawn(async move {
      loop {
        tokio::select! {
          _ = stopped.changed() => return Ok(()),
          _ = tokio::time::sleep(interval) => {
            inner.push().await?;
            inner.pull().await?;
          }
        }
      }
    });

    *guard = Some(SyncTask { stop, handle });
    Ok(())
  }

  /// Cancels the scheduler. The in-flight tick, if any, completes first;
  /// a tick error that already stopped the loop is surfaced here.
  pub async fn stop_sync(&self) -> Result<()> {
    let task: Option<SyncTask> = self.task.write()?.take();
    let Some(task) = task else {
      return Ok(());
    };

    let _ = task.stop.send(true);
    match task.handle.await {
      Ok(result) => result,
      Err(err) if err.is_cancelled() => Ok(()),
      Err(err) => Err(Error::TaskFailed(err.to_string())),
    }
  }
}

impl core::fmt::Debug for SyncEngine {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("SyncEngine")
  }
}

impl Inner {
  async fn push(&self) -> Result<()> {
    self.enqueue(Direction::Push).await?;
    self.dispatch_push().await
  }

  async fn pull(&self) -> Result<()> {
    self.enqueue(Direction::Pull).await?;
    self.dispatch_pull().await
  }

  fn next_watermark(&self) -> Result<String> {
    let ulid: ulid::Ulid = self
      .generator
      .write()?
      .generate()
      .map_err(|_| Error::WatermarkExhausted)?;
    Ok(ulid.to_string())
  }

  /// Queries the event log of every `(identity, endpoint)` pair and turns
  /// new entries into watermarked queue items. Unreachable peers are
  /// skipped without advancing their cursor, so retries are automatic.
  async fn enqueue(&self, direction: Direction) -> Result<()> {
    let identities: Vec<Did> = self.registered.read()?.iter().cloned().collect();

    for did in identities {
      let document: DidDocument = match self.resolver.resolve(&did).await {
        Ok(document) => document,
        Err(err) => {
          log::warn!("sync: skipping {did} this tick: {err}");
          continue;
        }
      };

      for endpoint in document.dwn_endpoints() {
        let cursor: Option<PaginationCursor> = self
          .db
          .cursor(&did, &endpoint, direction)?
          .map(|message_cid| PaginationCursor { message_cid });
        let query: DwnRequest = DwnRequest::new(did.clone(), MessageType::MessagesQuery).with_params(MessageParams {
          cursor,
          ..MessageParams::default()
        });

        let reply: MessageReply = match direction {
          Direction::Push => self.dwn.process_message(query).await?,
          Direction::Pull => match self.dwn.send_message(&endpoint, query).await {
            Ok(reply) => reply,
            Err(err) => {
              log::warn!("sync: skipping {endpoint} this tick: {err}");
              continue;
            }
          },
        };
        if !reply.reply.is_success() {
          // a remote that answers with an error is skipped like an
          // unreachable one; a refusal from the local engine is fatal
          if direction == Direction::Pull {
            log::warn!(
              "sync: {endpoint} rejected the event query with status {}",
              reply.reply.status.code
            );
            continue;
          }
          return Err(Error::QueryRejected {
            code: reply.reply.status.code,
            detail: reply.reply.status.detail,
          });
        }

        for message_cid in reply.reply.message_cids.unwrap_or_default() {
          let key: SyncKey = SyncKey {
            did: did.clone(),
            endpoint: endpoint.clone(),
            watermark: self.next_watermark()?,
            message_cid,
          };
          self.db.enqueue(direction, &key)?;
        }

        if let Some(cursor) = reply.reply.cursor {
          self.db.set_cursor(&did, &endpoint, direction, &cursor.message_cid)?;
        }
      }
    }

    Ok(())
  }

  /// Mirrors queued local messages onto their remote endpoints, in
  /// watermark order per `(identity, endpoint)` pair.
  async fn dispatch_push(&self) -> Result<()> {
    let items: Vec<SyncKey> = self.db.queue_items(Direction::Push)?;
    let mut failed: HashSet<String> = HashSet::new();
    let mut completed: Vec<SyncKey> = Vec::new();

    for key in &items {
      if failed.contains(&key.endpoint) {
        continue;
      }
      if self.db.history_has(&key.did, &key.message_cid)? {
        completed.push(key.clone());
        continue;
      }

      let read: DwnRequest = DwnRequest::new(key.did.clone(), MessageType::MessagesRead).with_params(MessageParams {
        message_cid: Some(key.message_cid.clone()),
        ..MessageParams::default()
      });
      let reply: MessageReply = self.dwn.process_message(read).await?;

      let Some(entry) = reply.reply.entry else {
        // gone locally, there is nothing left to mirror
        self.db.history_add(&key.did, &key.message_cid)?;
        completed.push(key.clone());
        continue;
      };

      let record_id: Option<String> = entry.message.record_id.clone();
      if let Some(record_id) = record_id.as_deref() {
        let recently_sent: bool = self.send_cache.write()?.check(record_id, &key.endpoint);
        if recently_sent {
          self.db.history_add(&key.did, &key.message_cid)?;
          completed.push(key.clone());
          continue;
        }
      }

      let data: Option<Vec<u8>> = entry.data.as_deref().map(jwu::decode_b64).transpose()?;
      match self
        .dwn
        .send_raw(&key.endpoint, &key.did, &entry.message, data.as_deref())
        .await
      {
        Err(err) => {
          log::warn!("sync: {} unreachable this tick: {err}", key.endpoint);
          failed.insert(key.endpoint.clone());
        }
        Ok(reply) if reply.is_synchronized() => {
          self.db.history_add(&key.did, &key.message_cid)?;
          if let Some(record_id) = record_id.as_deref() {
            self.send_cache.write()?.set(record_id, &key.endpoint);
          }
          completed.push(key.clone());
        }
        Ok(reply) => {
          log::warn!(
            "sync: {} refused {} with status {}",
            key.endpoint,
            key.message_cid,
            reply.status.code
          );
        }
      }
    }

    // items whose cid became synchronized for their DID later in this tick
    for key in &items {
      if !completed.contains(key) && self.db.history_has(&key.did, &key.message_cid)? {
        completed.push(key.clone());
      }
    }

    self.db.remove_batch(Direction::Push, &completed)?;
    Ok(())
  }

  /// Replays queued remote messages onto the local DWN, in watermark order
  /// per `(identity, endpoint)` pair.
  async fn dispatch_pull(&self) -> Result<()> {
    let items: Vec<SyncKey> = self.db.queue_items(Direction::Pull)?;
    let mut failed: HashSet<String> = HashSet::new();
    let mut completed: Vec<SyncKey> = Vec::new();

    for key in &items {
      if failed.contains(&key.endpoint) {
        continue;
      }
      if self.db.history_has(&key.did, &key.message_cid)? {
        completed.push(key.clone());
        continue;
      }

      let read: DwnRequest = DwnRequest::new(key.did.clone(), MessageType::MessagesRead).with_params(MessageParams {
        message_cid: Some(key.message_cid.clone()),
        ..MessageParams::default()
      });
      let entry = match self.dwn.send_message(&key.endpoint, read).await {
        Err(err) => {
          log::warn!("sync: {} unreachable this tick: {err}", key.endpoint);
          failed.insert(key.endpoint.clone());
          continue;
        }
        // the remote confirms the message does not exist
        Ok(reply) => match reply.reply.entry {
          None => {
            self.db.history_add(&key.did, &key.message_cid)?;
            completed.push(key.clone());
            continue;
          }
          Some(entry) => entry,
        },
      };

      let data: Option<Vec<u8>> = entry.data.as_deref().map(jwu::decode_b64).transpose()?;
      let missing_data: bool = entry.message.descriptor.message_type() == Some(MessageType::RecordsWrite)
        && data.is_none()
        && entry.message.descriptor.data_size.unwrap_or(0) > 0;
      if missing_data {
        log::warn!("sync: {} carries no data for {}, skipping", key.endpoint, key.message_cid);
        self.db.history_add(&key.did, &key.message_cid)?;
        completed.push(key.clone());
        continue;
      }

      let reply = self.dwn.process_raw(&key.did, entry.message, data).await?;
      if reply.is_synchronized() {
        self.db.history_add(&key.did, &key.message_cid)?;
        completed.push(key.clone());
      } else {
        log::warn!(
          "sync: local node refused {} with status {}",
          key.message_cid,
          reply.status.code
        );
      }
    }

    for key in &items {
      if !completed.contains(key) && self.db.history_has(&key.did, &key.message_cid)? {
        completed.push(key.clone());
      }
    }

    self.db.remove_batch(Direction::Pull, &completed)?;
    Ok(())
  }
}
