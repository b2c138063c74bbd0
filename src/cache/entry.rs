//! Envelope codec and expiry policy over a raw store.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::slot::Slot;
use super::store::{CacheStore, StoreError};

/// Stored form of a cache entry: the payload plus its write time.
/// Serialized as `{"payload": ..., "writtenAt": <epoch millis>}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
  payload: T,
  written_at: i64,
}

/// Reads and writes enveloped entries under one namespace.
///
/// Storage trouble never escapes this type. Reads treat broken or
/// expired entries as misses and evict them; writes respond to a full
/// store by clearing the namespace once and retrying, then give up
/// quietly.
#[derive(Clone)]
pub struct EntryManager {
  store: Arc<dyn CacheStore>,
  namespace: String,
}

impl EntryManager {
  pub fn new(store: Arc<dyn CacheStore>, namespace: impl Into<String>) -> Self {
    Self {
      store,
      namespace: namespace.into(),
    }
  }

  fn storage_key(&self, slot: &Slot) -> String {
    format!("{}_{}", self.namespace, slot.suffix())
  }

  fn prefix(&self) -> String {
    format!("{}_", self.namespace)
  }

  /// Read a live entry, returning the payload and its write time.
  ///
  /// Expired and undecodable entries are deleted on the way out so the
  /// next write starts clean.
  pub fn read_entry<T: DeserializeOwned>(&self, slot: &Slot) -> Option<(T, i64)> {
    let key = self.storage_key(slot);

    let raw = match self.store.get(&key) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(key = %key, error = %e, "cache read failed");
        return None;
      }
    };

    let envelope: Envelope<T> = match serde_json::from_str(&raw) {
      Ok(envelope) => envelope,
      Err(e) => {
        debug!(key = %key, error = %e, "evicting corrupt cache entry");
        let _ = self.store.remove(&key);
        return None;
      }
    };

    let age = Utc::now().timestamp_millis() - envelope.written_at;
    if age > slot.ttl().num_milliseconds() {
      debug!(key = %key, age_ms = age, "evicting expired cache entry");
      let _ = self.store.remove(&key);
      return None;
    }

    Some((envelope.payload, envelope.written_at))
  }

  /// Read a live entry's payload.
  pub fn read<T: DeserializeOwned>(&self, slot: &Slot) -> Option<T> {
    self.read_entry(slot).map(|(payload, _)| payload)
  }

  /// Write a payload stamped with the current time.
  ///
  /// Infallible by contract: a full store triggers one namespace clear
  /// and a retry; any remaining failure is logged and the write dropped.
  pub fn write<T: Serialize>(&self, slot: &Slot, payload: &T) {
    let key = self.storage_key(slot);
    let envelope = Envelope {
      payload,
      written_at: Utc::now().timestamp_millis(),
    };

    let raw = match serde_json::to_string(&envelope) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key = %key, error = %e, "cache entry failed to serialize");
        return;
      }
    };

    match self.store.put(&key, &raw) {
      Ok(()) => {}
      Err(StoreError::Quota) => {
        warn!(key = %key, "cache store full, clearing namespace and retrying");
        if let Err(e) = self.store.clear_prefix(&self.prefix()) {
          warn!(error = %e, "namespace clear failed");
          return;
        }
        if let Err(e) = self.store.put(&key, &raw) {
          warn!(key = %key, error = %e, "cache write dropped after clearing");
        }
      }
      Err(e) => {
        warn!(key = %key, error = %e, "cache write dropped");
      }
    }
  }

  /// Delete one entry.
  pub fn evict(&self, slot: &Slot) {
    let key = self.storage_key(slot);
    if let Err(e) = self.store.remove(&key) {
      warn!(key = %key, error = %e, "cache evict failed");
    }
  }

  /// Delete every entry in this namespace.
  pub fn clear(&self) {
    if let Err(e) = self.store.clear_prefix(&self.prefix()) {
      warn!(error = %e, "cache clear failed");
    }
  }

  /// Seed an entry with an explicit write time.
  #[cfg(test)]
  pub(crate) fn write_at<T: Serialize>(&self, slot: &Slot, payload: &T, written_at: i64) {
    let envelope = Envelope {
      payload,
      written_at,
    };
    let raw = serde_json::to_string(&envelope).unwrap();
    self.store.put(&self.storage_key(slot), &raw).unwrap();
  }
}
