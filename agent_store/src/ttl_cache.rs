// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use core::hash::Hash;
use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

/// A map whose entries expire a fixed duration after insertion.
///
/// Used for the record index: correctness never depends on it, it only
/// short-circuits the authoritative DWN query.
#[derive(Debug)]
pub struct TtlCache<K, V> {
  ttl: Duration,
  entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
  /// Creates a cache whose entries live for `ttl`.
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: HashMap::new(),
    }
  }

  /// Returns the live value for `key`, evicting it when expired.
  pub fn get(&mut self, key: &K) -> Option<&V> {
    let expired: bool = match self.entries.get(key) {
      Some((inserted, _)) => inserted.elapsed() >= self.ttl,
      None => return None,
    };

    if expired {
      self.entries.remove(key);
      return None;
    }

    self.entries.get(key).map(|(_, value)| value)
  }

  /// Inserts `value`, restarting the clock for `key`.
  pub fn insert(&mut self, key: K, value: V) {
    self.entries.insert(key, (Instant::now(), value));
  }

  /// Removes the entry for `key`.
  pub fn remove(&mut self, key: &K) -> Option<V> {
    self.entries.remove(key).map(|(_, value)| value)
  }

  /// Keeps only the entries whose key satisfies the predicate.
  pub fn retain(&mut self, mut predicate: impl FnMut(&K) -> bool) {
    self.entries.retain(|key, _| predicate(key));
  }

  /// Drops every entry.
  pub fn clear(&mut self) {
    self.entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_entries_live_within_ttl() {
    let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
    cache.insert("a", 1);
    assert_eq!(cache.get(&"a"), Some(&1));
    assert_eq!(cache.get(&"b"), None);

    cache.remove(&"a");
    assert_eq!(cache.get(&"a"), None);
  }

  #[test]
  fn test_entries_expire() {
    let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_millis(0));
    cache.insert("a", 1);
    assert_eq!(cache.get(&"a"), None);
  }
}
