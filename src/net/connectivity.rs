//! Online/offline tracking.
//!
//! A watch channel carries the current belief about connectivity; a
//! background prober keeps it honest by hitting the backend's health
//! endpoint. Subscribers wake only on flips, never on repeats.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use super::http::HttpSource;

/// Shared source of truth for connectivity.
pub struct ConnectivityOracle {
  tx: watch::Sender<bool>,
}

impl ConnectivityOracle {
  /// Create an oracle with an initial belief.
  pub fn new(online: bool) -> Self {
    let (tx, _rx) = watch::channel(online);
    Self { tx }
  }

  /// Record an observation. Subscribers are only notified on change.
  pub fn set_online(&self, online: bool) {
    self.tx.send_if_modified(|current| {
      if *current == online {
        false
      } else {
        *current = online;
        true
      }
    });
  }

  pub fn is_online(&self) -> bool {
    *self.tx.borrow()
  }

  /// Cheap clonable read handle for anything that needs to ask
  /// "are we online right now".
  pub fn handle(&self) -> ConnectivityHandle {
    ConnectivityHandle {
      rx: self.tx.subscribe(),
    }
  }

  /// Receiver for transition notifications.
  pub fn subscribe(&self) -> watch::Receiver<bool> {
    self.tx.subscribe()
  }
}

/// Read-only view of the oracle.
#[derive(Clone)]
pub struct ConnectivityHandle {
  rx: watch::Receiver<bool>,
}

impl ConnectivityHandle {
  pub fn is_online(&self) -> bool {
    *self.rx.borrow()
  }
}

/// Probe cadence and per-probe budget.
#[derive(Debug, Clone, Copy)]
pub struct ProbeConfig {
  pub interval: Duration,
  pub timeout: Duration,
}

impl Default for ProbeConfig {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(30),
      timeout: Duration::from_secs(5),
    }
  }
}

/// Probe the backend's health endpoint on an interval and feed the
/// oracle. The first probe fires immediately so a wrong initial belief
/// is corrected fast.
pub fn spawn_prober(
  oracle: Arc<ConnectivityOracle>,
  source: HttpSource,
  config: ProbeConfig,
) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
      ticker.tick().await;
      let online = source.probe(config.timeout).await;
      if online != oracle.is_online() {
        info!(online, "connectivity changed");
      }
      oracle.set_online(online);
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_handle_tracks_oracle() {
    let oracle = ConnectivityOracle::new(true);
    let handle = oracle.handle();
    assert!(handle.is_online());

    oracle.set_online(false);
    assert!(!handle.is_online());

    oracle.set_online(true);
    assert!(handle.is_online());
  }

  #[test]
  fn test_subscribers_wake_only_on_flips() {
    let oracle = ConnectivityOracle::new(true);
    let mut rx = oracle.subscribe();
    rx.borrow_and_update();

    oracle.set_online(true);
    assert!(!rx.has_changed().unwrap());

    oracle.set_online(false);
    assert!(rx.has_changed().unwrap());
    assert!(!*rx.borrow_and_update());
  }

  #[test]
  fn test_handle_outlives_flips() {
    let oracle = ConnectivityOracle::new(false);
    let a = oracle.handle();
    let b = a.clone();
    oracle.set_online(true);
    assert!(a.is_online());
    assert!(b.is_online());
  }
}
