//! Poll-driven wrappers that connect load cycles to the render loop.
//!
//! A view owns a `Query<T>` per piece of content it shows. Each tick it
//! calls `poll()`, which drains whatever the cycle has produced so far
//! and folds it into renderable state; once the cycle settles it is
//! dropped on the spot.
//!
//! # Example
//!
//! ```ignore
//! let mut query = Query::idle();
//! query.follow(service.load_articles());
//!
//! // In the event loop tick
//! if query.poll() {
//!     // State changed, re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Ready { snapshot, .. } => render_list(&snapshot.data),
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Unavailable(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

use std::future::Future;
use tokio::sync::mpsc;

use crate::cache::{LoadCycle, LoadEvent, LoadOutcome, Payload, Snapshot};
use crate::net::source::RemoteError;

/// Where the shown data stands relative to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
  /// Reconciliation still running; the data may yet be replaced.
  Reconciling,
  /// The backend confirmed this data, or produced it.
  Synced,
  /// The backend is unreachable; this is cached data.
  Offline,
}

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Nothing requested yet
  Idle,
  /// A cycle is running and nothing is shown yet
  Loading,
  /// Usable data, with its standing
  Ready {
    snapshot: Snapshot<T>,
    status: SyncStatus,
  },
  /// The cycle ended with nothing to show
  Unavailable(String),
}

/// Renderable state over one load cycle at a time.
pub struct Query<T> {
  state: QueryState<T>,
  cycle: Option<LoadCycle<T>>,
}

impl<T: Payload> Query<T> {
  pub fn idle() -> Self {
    Self {
      state: QueryState::Idle,
      cycle: None,
    }
  }

  /// Follow a new cycle, replacing any previous one.
  ///
  /// Data already on screen stays on screen; it drops back to
  /// `Reconciling` until the new cycle settles.
  pub fn follow(&mut self, cycle: LoadCycle<T>) {
    self.cycle = Some(cycle);
    self.state = match std::mem::replace(&mut self.state, QueryState::Idle) {
      QueryState::Ready { snapshot, .. } => QueryState::Ready {
        snapshot,
        status: SyncStatus::Reconciling,
      },
      _ => QueryState::Loading,
    };
  }

  /// Show a snapshot obtained outside any cycle, dropping whatever
  /// cycle was running. Used when data arrives through a side door,
  /// like slug resolution.
  pub fn supply(&mut self, snapshot: Snapshot<T>, status: SyncStatus) {
    self.cycle = None;
    self.state = QueryState::Ready { snapshot, status };
  }

  /// Mark the query failed without running a cycle.
  pub fn fail(&mut self, error: impl Into<String>) {
    self.cycle = None;
    self.state = QueryState::Unavailable(error.into());
  }

  /// Whether a cycle is still running.
  pub fn in_flight(&self) -> bool {
    self.cycle.is_some()
  }

  /// Drain pending events. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(mut cycle) = self.cycle.take() else {
      return false;
    };

    let mut changed = false;
    loop {
      match cycle.try_next() {
        Some(LoadEvent::Snapshot(snapshot)) => {
          self.state = QueryState::Ready {
            snapshot,
            status: SyncStatus::Reconciling,
          };
          changed = true;
        }
        Some(LoadEvent::Settled(outcome)) => {
          self.settle(outcome);
          // Nothing follows a settle; the cycle drops here.
          return true;
        }
        None => {
          self.cycle = Some(cycle);
          return changed;
        }
      }
    }
  }

  fn settle(&mut self, outcome: LoadOutcome) {
    match outcome {
      LoadOutcome::Fresh | LoadOutcome::Unchanged => {
        if let QueryState::Ready { status, .. } = &mut self.state {
          *status = SyncStatus::Synced;
        }
      }
      LoadOutcome::OfflineCached => {
        if let QueryState::Ready { status, .. } = &mut self.state {
          *status = SyncStatus::Offline;
        }
      }
      LoadOutcome::Unavailable(e) => {
        self.state = QueryState::Unavailable(e.to_string());
      }
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    match &self.state {
      QueryState::Ready { snapshot, .. } => Some(&snapshot.data),
      _ => None,
    }
  }

  pub fn status(&self) -> Option<SyncStatus> {
    match &self.state {
      QueryState::Ready { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.state, QueryState::Loading)
  }

  pub fn error(&self) -> Option<&str> {
    match &self.state {
      QueryState::Unavailable(e) => Some(e),
      _ => None,
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("in_flight", &self.cycle.is_some())
      .finish_non_exhaustive()
  }
}

/// The state of a one-shot backend operation
#[derive(Debug, Clone)]
pub enum CallState<T> {
  Idle,
  Running,
  Done(T),
  Failed(String),
}

/// A single backend operation polled from the render loop, for things
/// the cache has no business holding: posting, subscribing, live reads.
pub struct Call<T> {
  state: CallState<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, RemoteError>>>,
}

impl<T: Send + 'static> Call<T> {
  pub fn idle() -> Self {
    Self {
      state: CallState::Idle,
      receiver: None,
    }
  }

  /// Run the operation, replacing any one still in flight.
  pub fn start<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = CallState::Running;

    tokio::spawn(async move {
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(future.await);
    });
  }

  /// Poll for the result. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(value)) => {
        self.state = CallState::Done(value);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = CallState::Failed(error.to_string());
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = CallState::Failed("operation stopped".to_string());
        self.receiver = None;
        true
      }
    }
  }

  pub fn state(&self) -> &CallState<T> {
    &self.state
  }

  pub fn is_running(&self) -> bool {
    matches!(self.state, CallState::Running)
  }

  /// Consume a finished result, resetting to idle. `None` while idle
  /// or still running.
  pub fn take_settled(&mut self) -> Option<Result<T, String>> {
    match std::mem::replace(&mut self.state, CallState::Idle) {
      CallState::Done(value) => Some(Ok(value)),
      CallState::Failed(error) => Some(Err(error)),
      other => {
        self.state = other;
        None
      }
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Call<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Call").field("state", &self.state).finish()
  }
}
