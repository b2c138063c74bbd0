//! Offline cache: a key-value store, timestamped entries with TTLs,
//! and the reconciling fetch cycle on top of them.

pub mod entry;
pub mod fetcher;
pub mod slot;
pub mod store;
pub mod traits;

pub use entry::EntryManager;
pub use fetcher::{Fetcher, LoadCycle, LoadEvent, LoadOutcome, DEFAULT_REMOTE_TIMEOUT};
pub use slot::Slot;
pub use store::{CacheStore, MemoryStore, NoopStore, SqliteStore, StoreError};
pub use traits::{Payload, Record, Snapshot, SnapshotSource};
