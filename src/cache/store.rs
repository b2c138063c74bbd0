//! Storage backends for the local cache.
//!
//! A store is a raw string key-value surface; envelopes, expiry, and
//! namespacing live above it in [`super::entry`]. Keeping the trait
//! untyped makes it object safe, so the rest of the crate can hold an
//! `Arc<dyn CacheStore>` and tests can swap in [`MemoryStore`].

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, ErrorCode};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Errors surfaced by a cache store.
///
/// Callers treat `Quota` specially (clear and retry); everything else
/// is logged and absorbed.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("cache store is full")]
  Quota,
  #[error("cache store error: {0}")]
  Backend(String),
}

/// Raw key-value surface backing the cache.
pub trait CacheStore: Send + Sync {
  /// Read a value. `Ok(None)` is an ordinary miss.
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Write a value, replacing any previous one atomically.
  fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

  /// Delete a value. Deleting a missing key is not an error.
  fn remove(&self, key: &str) -> Result<(), StoreError>;

  /// Delete every key starting with `prefix`.
  fn clear_prefix(&self, prefix: &str) -> Result<(), StoreError>;
}

/// Store that keeps nothing.
/// Used when no persistent store is available - reads miss, writes vanish.
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
    Ok(None) // Always miss
  }

  fn put(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> Result<(), StoreError> {
    Ok(())
  }

  fn clear_prefix(&self, _prefix: &str) -> Result<(), StoreError> {
    Ok(())
  }
}

/// SQLite-backed store, the default for real runs.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    let path = Self::default_path()?;
    Self::open_at(&path)
  }

  /// Open or create the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Open an in-memory store. Handy for tests and throwaway sessions.
  pub fn in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory store: {}", e))?;
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("liseuse").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    self
      .conn
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Map a SQLite failure onto the store taxonomy.
fn map_sqlite(e: rusqlite::Error) -> StoreError {
  match &e {
    rusqlite::Error::SqliteFailure(code, _) if code.code == ErrorCode::DiskFull => StoreError::Quota,
    _ => StoreError::Backend(e.to_string()),
  }
}

impl CacheStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let conn = self.lock()?;
    let mut stmt = conn
      .prepare("SELECT value FROM kv_cache WHERE key = ?")
      .map_err(map_sqlite)?;

    let mut rows = stmt.query(params![key]).map_err(map_sqlite)?;
    match rows.next().map_err(map_sqlite)? {
      Some(row) => {
        let value: String = row.get(0).map_err(map_sqlite)?;
        Ok(Some(value))
      }
      None => Ok(None),
    }
  }

  fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO kv_cache (key, value) VALUES (?, ?)",
        params![key, value],
      )
      .map_err(map_sqlite)?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM kv_cache WHERE key = ?", params![key])
      .map_err(map_sqlite)?;
    Ok(())
  }

  fn clear_prefix(&self, prefix: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    let pattern = format!("{}%", escape_like(prefix));
    conn
      .execute(
        "DELETE FROM kv_cache WHERE key LIKE ? ESCAPE '\\'",
        params![pattern],
      )
      .map_err(map_sqlite)?;
    Ok(())
  }
}

/// Escape LIKE metacharacters so a prefix matches literally.
/// Namespaces contain underscores, which LIKE would treat as wildcards.
fn escape_like(s: &str) -> String {
  s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// In-memory store with an optional byte budget.
///
/// The budget makes quota behavior reproducible: once the summed size
/// of keys and values would pass it, writes fail with `Quota` the way
/// a full disk would.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
  capacity: Option<usize>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a store that refuses writes past `bytes` of content.
  pub fn with_capacity(bytes: usize) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      capacity: Some(bytes),
    }
  }

  /// Number of stored entries.
  pub fn len(&self) -> usize {
    self.entries.lock().map(|m| m.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn used(map: &HashMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
    self
      .entries
      .lock()
      .map_err(|e| StoreError::Backend(format!("lock poisoned: {}", e)))
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut map = self.lock()?;
    if let Some(capacity) = self.capacity {
      let replaced = map.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
      let after = Self::used(&map) - replaced + key.len() + value.len();
      if after > capacity {
        return Err(StoreError::Quota);
      }
    }
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    self.lock()?.remove(key);
    Ok(())
  }

  fn clear_prefix(&self, prefix: &str) -> Result<(), StoreError> {
    self.lock()?.retain(|k, _| !k.starts_with(prefix));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_roundtrip() {
    let store = SqliteStore::in_memory().unwrap();
    assert_eq!(store.get("a").unwrap(), None);

    store.put("a", "one").unwrap();
    assert_eq!(store.get("a").unwrap(), Some("one".to_string()));

    store.put("a", "two").unwrap();
    assert_eq!(store.get("a").unwrap(), Some("two".to_string()));

    store.remove("a").unwrap();
    assert_eq!(store.get("a").unwrap(), None);
  }

  #[test]
  fn test_sqlite_remove_missing_is_ok() {
    let store = SqliteStore::in_memory().unwrap();
    store.remove("never-written").unwrap();
  }

  #[test]
  fn test_sqlite_clear_prefix() {
    let store = SqliteStore::in_memory().unwrap();
    store.put("app_articles", "x").unwrap();
    store.put("app_popular", "y").unwrap();
    store.put("other_articles", "z").unwrap();

    store.clear_prefix("app_").unwrap();

    assert_eq!(store.get("app_articles").unwrap(), None);
    assert_eq!(store.get("app_popular").unwrap(), None);
    assert_eq!(store.get("other_articles").unwrap(), Some("z".to_string()));
  }

  #[test]
  fn test_clear_prefix_underscore_is_literal() {
    let store = SqliteStore::in_memory().unwrap();
    // LIKE treats "_" as a wildcard; "appx..." must survive an "app_" clear.
    store.put("app_one", "x").unwrap();
    store.put("appxone", "y").unwrap();

    store.clear_prefix("app_").unwrap();

    assert_eq!(store.get("app_one").unwrap(), None);
    assert_eq!(store.get("appxone").unwrap(), Some("y".to_string()));
  }

  #[test]
  fn test_memory_quota() {
    let store = MemoryStore::with_capacity(16);
    store.put("k", "small").unwrap();

    let err = store.put("big", "XXXXXXXXXXXXXXXXXXXXXXXX").unwrap_err();
    assert!(matches!(err, StoreError::Quota));

    // The failed write must not have landed.
    assert_eq!(store.get("big").unwrap(), None);
    assert_eq!(store.get("k").unwrap(), Some("small".to_string()));
  }

  #[test]
  fn test_memory_quota_counts_replacement() {
    let store = MemoryStore::with_capacity(10);
    store.put("k", "123456789").unwrap();
    // Replacing should account for the bytes being freed.
    store.put("k", "987654321").unwrap();
    assert_eq!(store.get("k").unwrap(), Some("987654321".to_string()));
  }

  #[test]
  fn test_memory_clear_prefix() {
    let store = MemoryStore::new();
    store.put("ns_a", "1").unwrap();
    store.put("ns_b", "2").unwrap();
    store.put("other", "3").unwrap();

    store.clear_prefix("ns_").unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("other").unwrap(), Some("3".to_string()));
  }

  #[test]
  fn test_noop_store() {
    let store = NoopStore;
    store.put("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
    store.remove("k").unwrap();
    store.clear_prefix("k").unwrap();
  }

  #[test]
  fn test_escape_like() {
    assert_eq!(escape_like("app_"), "app\\_");
    assert_eq!(escape_like("50%"), "50\\%");
    assert_eq!(escape_like("plain"), "plain");
  }
}
