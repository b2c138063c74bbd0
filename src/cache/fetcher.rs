//! The reconciling fetch cycle.
//!
//! One cycle serves whatever the local store holds immediately, then
//! reconciles with the backend: fetch, diff against the served data,
//! re-emit and persist only when something actually changed. Offline or
//! failing backends degrade to the cached emission instead of an error
//! screen whenever there is anything cached at all.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::entry::EntryManager;
use super::slot::Slot;
use super::traits::{Payload, Snapshot};
use crate::net::connectivity::ConnectivityHandle;
use crate::net::source::RemoteError;

/// Default time budget for one remote reconciliation.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(8);

/// One event in a load cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent<T> {
  /// Usable data. Emitted zero, one, or two times per cycle, cached
  /// data always before remote data.
  Snapshot(Snapshot<T>),
  /// The cycle finished; nothing follows this.
  Settled(LoadOutcome),
}

/// Terminal state of a load cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
  /// Remote data arrived and differed from cache, or nothing was cached.
  Fresh,
  /// Remote data matched the cache; the earlier snapshot stands.
  Unchanged,
  /// The backend was unreachable but cached data was served.
  OfflineCached,
  /// No usable data at all.
  Unavailable(RemoteError),
}

/// Receiving side of a load cycle.
///
/// Dropping it abandons interest in the result; the background task
/// still finishes, so a completed fetch lands in the store either way.
pub struct LoadCycle<T> {
  rx: mpsc::UnboundedReceiver<LoadEvent<T>>,
}

impl<T> LoadCycle<T> {
  /// Next event, or `None` once the cycle has settled and drained.
  pub async fn next(&mut self) -> Option<LoadEvent<T>> {
    self.rx.recv().await
  }

  /// Non-blocking poll for the render tick loop.
  pub fn try_next(&mut self) -> Option<LoadEvent<T>> {
    self.rx.try_recv().ok()
  }
}

impl<T> std::fmt::Debug for LoadCycle<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoadCycle").finish_non_exhaustive()
  }
}

/// Drives load cycles over one entry manager and one connectivity feed.
#[derive(Clone)]
pub struct Fetcher {
  entries: EntryManager,
  connectivity: ConnectivityHandle,
  remote_timeout: Duration,
}

impl Fetcher {
  pub fn new(entries: EntryManager, connectivity: ConnectivityHandle) -> Self {
    Self {
      entries,
      connectivity,
      remote_timeout: DEFAULT_REMOTE_TIMEOUT,
    }
  }

  /// Override the remote reconciliation budget.
  pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
    self.remote_timeout = timeout;
    self
  }

  /// Direct access to the entries, for layers that derive data from
  /// cached payloads without running a cycle.
  pub fn entries(&self) -> &EntryManager {
    &self.entries
  }

  /// Current connectivity belief.
  pub fn is_online(&self) -> bool {
    self.connectivity.is_online()
  }

  /// Start a full load cycle: cached snapshot first when one is live,
  /// then remote reconciliation.
  pub fn load<T, F, Fut>(&self, slot: &Slot, fetch: F) -> LoadCycle<T>
  where
    T: Payload,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
  {
    self.start(slot, fetch, true)
  }

  /// Reconcile without re-serving the cached snapshot.
  ///
  /// The cache still participates in diffing, so an unchanged backend
  /// settles quietly and the consumer keeps whatever it is showing.
  pub fn retry<T, F, Fut>(&self, slot: &Slot, fetch: F) -> LoadCycle<T>
  where
    T: Payload,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
  {
    self.start(slot, fetch, false)
  }

  /// Drop a slot's entry so the next load starts from the backend.
  pub fn invalidate(&self, slot: &Slot) {
    debug!(slot = %slot, "invalidating cache slot");
    self.entries.evict(slot);
  }

  fn start<T, F, Fut>(&self, slot: &Slot, fetch: F, emit_cached: bool) -> LoadCycle<T>
  where
    T: Payload,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    let entries = self.entries.clone();
    let connectivity = self.connectivity.clone();
    let slot = slot.clone();
    let timeout = self.remote_timeout;

    tokio::spawn(async move {
      let outcome =
        run_cycle(&entries, &connectivity, &slot, fetch, emit_cached, timeout, &tx).await;
      // The receiver may be gone already; the cache write has landed
      // by this point regardless.
      let _ = tx.send(LoadEvent::Settled(outcome));
    });

    LoadCycle { rx }
  }
}

async fn run_cycle<T, F, Fut>(
  entries: &EntryManager,
  connectivity: &ConnectivityHandle,
  slot: &Slot,
  fetch: F,
  emit_cached: bool,
  timeout: Duration,
  tx: &mpsc::UnboundedSender<LoadEvent<T>>,
) -> LoadOutcome
where
  T: Payload,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T, RemoteError>>,
{
  let cached: Option<T> = entries.read(slot);
  let have_cache = cached.is_some();

  if emit_cached {
    if let Some(data) = cached.clone() {
      let _ = tx.send(LoadEvent::Snapshot(Snapshot::from_cache(data)));
    }
  }

  // Connectivity is captured here, not when the cycle was created.
  if !connectivity.is_online() {
    return if have_cache {
      LoadOutcome::OfflineCached
    } else {
      LoadOutcome::Unavailable(RemoteError::Offline)
    };
  }

  let fetched = match tokio::time::timeout(timeout, fetch()).await {
    Ok(result) => result,
    Err(_) => Err(RemoteError::Timeout),
  };

  match fetched {
    Ok(fresh) => {
      if cached.as_ref() == Some(&fresh) {
        debug!(slot = %slot, "reconciled without changes");
        LoadOutcome::Unchanged
      } else {
        let _ = tx.send(LoadEvent::Snapshot(Snapshot::from_remote(fresh.clone())));
        entries.write(slot, &fresh);
        LoadOutcome::Fresh
      }
    }
    Err(e) => {
      warn!(slot = %slot, error = %e, "reconciliation failed");
      if have_cache {
        LoadOutcome::OfflineCached
      } else {
        LoadOutcome::Unavailable(e)
      }
    }
  }
}
