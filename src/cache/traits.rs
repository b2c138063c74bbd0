//! Contracts between the cache and the data it carries.

use serde::{de::DeserializeOwned, Serialize};

/// A value the cache can hold.
///
/// Payloads round-trip through JSON in the store and are compared with
/// `PartialEq` to decide whether reconciliation produced anything new.
pub trait Payload: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {}

impl<T> Payload for T where T: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {}

/// A typed record served by the platform.
///
/// The cache itself treats payloads as opaque; this contract is for the
/// layers above that sort, slice, and dedupe records.
pub trait Record {
  /// Stable identifier within the record's collection.
  fn id(&self) -> &str;

  /// Creation time in epoch milliseconds.
  /// Zero when the backend sent no timestamp, so undated records sort last
  /// under newest-first ordering.
  fn created_at_millis(&self) -> i64;
}

/// One emission of usable data during a load cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
  pub data: T,
  /// Where the data came from.
  pub source: SnapshotSource,
  /// True when the data may be out of date (served from the local store
  /// before or instead of reconciliation).
  pub stale: bool,
}

impl<T> Snapshot<T> {
  /// A snapshot served from the local store.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: SnapshotSource::Cache,
      stale: true,
    }
  }

  /// A snapshot fresh from the backend.
  pub fn from_remote(data: T) -> Self {
    Self {
      data,
      source: SnapshotSource::Remote,
      stale: false,
    }
  }
}

/// Origin of a snapshot's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
  Cache,
  Remote,
}
