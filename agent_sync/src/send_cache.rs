// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::num::NonZeroUsize;

use lru::LruCache;

/// Entries kept per axis of the send cache.
pub const SEND_CACHE_CAPACITY: usize = 100;

/// Remembers recent successful `(record_id, destination)` sends so a record
/// is not re-delivered to the same destination within this process.
///
/// Both axes are bounded LRUs, so the cache can only suppress resends, never
/// grow without bound.
pub struct SendCache {
  entries: LruCache<String, LruCache<String, ()>>,
}

impl SendCache {
  /// Creates an empty cache.
  pub fn new() -> Self {
    Self {
      entries: LruCache::new(Self::capacity()),
    }
  }

  fn capacity() -> NonZeroUsize {
    // safe to unwrap, the capacity is a non-zero constant
    NonZeroUsize::new(SEND_CACHE_CAPACITY).unwrap()
  }

  /// Returns `true` if `record_id` was recently sent to `destination`.
  pub fn check(&mut self, record_id: &str, destination: &str) -> bool {
    self
      .entries
      .get_mut(record_id)
      .map_or(false, |destinations| destinations.get(destination).is_some())
  }

  /// Records a successful send of `record_id` to `destination`.
  pub fn set(&mut self, record_id: &str, destination: &str) {
    let destinations: &mut LruCache<String, ()> = self
      .entries
      .get_or_insert_mut(record_id.to_owned(), || LruCache::new(Self::capacity()));
    destinations.put(destination.to_owned(), ());
  }
}

impl Default for SendCache {
  fn default() -> Self {
    Self::new()
  }
}

impl core::fmt::Debug for SendCache {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_str("SendCache")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_check_and_set() {
    let mut cache: SendCache = SendCache::new();
    assert!(!cache.check("record-1", "https://dwn.example"));

    cache.set("record-1", "https://dwn.example");
    assert!(cache.check("record-1", "https://dwn.example"));
    assert!(!cache.check("record-1", "https://other.example"));
    assert!(!cache.check("record-2", "https://dwn.example"));
  }

  #[test]
  fn test_record_axis_is_bounded() {
    let mut cache: SendCache = SendCache::new();
    for n in 0..=SEND_CACHE_CAPACITY {
      cache.set(&format!("record-{n}"), "https://dwn.example");
    }

    // the oldest record entry has been evicted
    assert!(!cache.check("record-0", "https://dwn.example"));
    assert!(cache.check(&format!("record-{SEND_CACHE_CAPACITY}"), "https://dwn.example"));
  }
}
