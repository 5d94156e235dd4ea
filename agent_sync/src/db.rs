// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::fmt::Display;
use core::fmt::Formatter;
use std::path::Path;

use agent_did::Did;

use crate::error::Error;
use crate::error::Result;

/// The separator of sync key segments. DIDs, watermarks and message CIDs
/// never contain it; endpoint URLs are therefore parsed from both ends.
const SEPARATOR: char = '~';

/// The direction of one replication flow.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Direction {
  /// Local log entries mirrored onto remote DWNs.
  Push,
  /// Remote log entries mirrored onto the local DWN.
  Pull,
}

impl Direction {
  /// Returns the direction's name, as used in cursor keys.
  pub const fn name(&self) -> &'static str {
    match self {
      Self::Push => "push",
      Self::Pull => "pull",
    }
  }
}

impl Display for Direction {
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(self.name())
  }
}

/// A parsed queue key: `<did>~<dwn_url>~<watermark>~<message_cid>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncKey {
  pub did: Did,
  pub endpoint: String,
  pub watermark: String,
  pub message_cid: String,
}

impl SyncKey {
  /// Assembles the lexicographically sortable queue key.
  pub fn encode(&self) -> String {
    format!(
      "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
      self.did, self.endpoint, self.watermark, self.message_cid
    )
  }

  /// Parses a queue key produced by [`SyncKey::encode`].
  ///
  /// The endpoint may itself contain the separator, so the DID is taken
  /// from the front and the watermark and CID from the back.
  pub fn parse(raw: &str) -> Result<Self> {
    let malformed = || Error::MalformedKey(raw.to_owned());

    let (did, rest) = raw.split_once(SEPARATOR).ok_or_else(malformed)?;
    let (rest, message_cid) = rest.rsplit_once(SEPARATOR).ok_or_else(malformed)?;
    let (endpoint, watermark) = rest.rsplit_once(SEPARATOR).ok_or_else(malformed)?;

    Ok(Self {
      did: Did::parse(did).map_err(|_| malformed())?,
      endpoint: endpoint.to_owned(),
      watermark: watermark.to_owned(),
      message_cid: message_cid.to_owned(),
    })
  }
}

/// The embedded ordered-key store holding cursors, the two queues and the
/// de-duplication history.
///
/// Named trees:
///   cursors     — `did~url~direction` bytes → cursor bytes
///   push_queue  — queue key bytes          → [] (ordered set)
///   pull_queue  — queue key bytes          → [] (ordered set)
///   history     — `did~cid` bytes          → [] (membership set)
pub struct SyncDb {
  _db: sled::Db,
  cursors: sled::Tree,
  push_queue: sled::Tree,
  pull_queue: sled::Tree,
  history: sled::Tree,
}

impl SyncDb {
  /// Opens or creates the sync database at `path`.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    Self::from_db(sled::open(path)?)
  }

  /// Creates a temporary database that is removed on drop.
  pub fn temporary() -> Result<Self> {
    Self::from_db(sled::Config::new().temporary(true).open()?)
  }

  fn from_db(db: sled::Db) -> Result<Self> {
    let cursors: sled::Tree = db.open_tree("cursors")?;
    let push_queue: sled::Tree = db.open_tree("push_queue")?;
    let pull_queue: sled::Tree = db.open_tree("pull_queue")?;
    let history: sled::Tree = db.open_tree("history")?;

    Ok(Self {
      _db: db,
      cursors,
      push_queue,
      pull_queue,
      history,
    })
  }

  fn queue(&self, direction: Direction) -> &sled::Tree {
    match direction {
      Direction::Push => &self.push_queue,
      Direction::Pull => &self.pull_queue,
    }
  }

  fn cursor_key(did: &Did, endpoint: &str, direction: Direction) -> Vec<u8> {
    format!("{did}{SEPARATOR}{endpoint}{SEPARATOR}{direction}").into_bytes()
  }

  /// Returns the persisted cursor for `(did, endpoint, direction)`.
  pub fn cursor(&self, did: &Did, endpoint: &str, direction: Direction) -> Result<Option<String>> {
    let value: Option<sled::IVec> = self.cursors.get(Self::cursor_key(did, endpoint, direction))?;
    Ok(value.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
  }

  /// Persists the cursor for `(did, endpoint, direction)`.
  pub fn set_cursor(&self, did: &Did, endpoint: &str, direction: Direction, cursor: &str) -> Result<()> {
    self
      .cursors
      .insert(Self::cursor_key(did, endpoint, direction), cursor.as_bytes())?;
    Ok(())
  }

  /// Appends a queue item; the value is empty, the key is the payload.
  pub fn enqueue(&self, direction: Direction, key: &SyncKey) -> Result<()> {
    self.queue(direction).insert(key.encode().into_bytes(), vec![])?;
    Ok(())
  }

  /// Returns all queue items in lexicographic (oldest-first) order.
  pub fn queue_items(&self, direction: Direction) -> Result<Vec<SyncKey>> {
    let mut items: Vec<SyncKey> = Vec::new();
    for entry in self.queue(direction).iter() {
      let (raw, _) = entry?;
      items.push(SyncKey::parse(&String::from_utf8_lossy(&raw))?);
    }
    Ok(items)
  }

  /// Removes a batch of processed queue items in one atomic commit.
  pub fn remove_batch(&self, direction: Direction, keys: &[SyncKey]) -> Result<()> {
    let mut batch: sled::Batch = sled::Batch::default();
    for key in keys {
      batch.remove(key.encode().into_bytes());
    }
    self.queue(direction).apply_batch(batch)?;
    Ok(())
  }

  /// Returns `true` if `message_cid` is already synchronized for `did`.
  pub fn history_has(&self, did: &Did, message_cid: &str) -> Result<bool> {
    Ok(self.history.contains_key(format!("{did}{SEPARATOR}{message_cid}").into_bytes())?)
  }

  /// Records `message_cid` as synchronized for `did`. Purely additive.
  pub fn history_add(&self, did: &Did, message_cid: &str) -> Result<()> {
    self
      .history
      .insert(format!("{did}{SEPARATOR}{message_cid}").into_bytes(), vec![])?;
    Ok(())
  }

  /// Returns the synchronized CIDs of `did`, for assertions and inspection.
  pub fn history(&self, did: &Did) -> Result<Vec<String>> {
    let prefix: String = format!("{did}{SEPARATOR}");
    let mut cids: Vec<String> = Vec::new();
    for entry in self.history.scan_prefix(prefix.as_bytes()) {
      let (raw, _) = entry?;
      cids.push(String::from_utf8_lossy(&raw[prefix.len()..]).into_owned());
    }
    Ok(cids)
  }
}

impl core::fmt::Debug for SyncDb {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("SyncDb")
  }
}
