//! Remote backend contract and error taxonomy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failures from the backend or the path to it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
  /// The connectivity oracle said offline before any request was made.
  #[error("offline")]
  Offline,
  /// The request ran past its time budget.
  #[error("request timed out")]
  Timeout,
  /// The backend could not be reached or refused the request.
  #[error("backend unavailable: {0}")]
  Unavailable(String),
  /// The requested document does not exist.
  #[error("not found: {0}")]
  NotFound(String),
  /// The backend answered with something that does not parse.
  #[error("invalid response: {0}")]
  InvalidData(String),
}

/// An untyped document from the backend: its id plus raw fields.
///
/// Typed decoding happens in the content layer; this shape survives
/// any field the backend grows without a schema change here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id: String,
  #[serde(flatten)]
  pub fields: serde_json::Map<String, Value>,
}

impl Document {
  pub fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }
}

/// Ordering direction for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
  Asc,
  Desc,
}

/// A filtered, ordered, limited read against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
  pub order_by: Option<(String, SortDir)>,
  /// Equality filters, field = value.
  pub filters: Vec<(String, String)>,
  pub limit: Option<usize>,
}

impl QuerySpec {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn order_by(mut self, field: &str, dir: SortDir) -> Self {
    self.order_by = Some((field.to_string(), dir));
    self
  }

  pub fn filter(mut self, field: &str, value: &str) -> Self {
    self.filters.push((field.to_string(), value.to_string()));
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

/// What the platform backend can do for us.
///
/// One implementation speaks REST; tests script their own.
#[async_trait]
pub trait RemoteSource: Send + Sync {
  /// Read documents from a collection.
  async fn query(&self, collection: &str, spec: QuerySpec) -> Result<Vec<Document>, RemoteError>;

  /// Read one document by id. `Ok(None)` means the id does not exist.
  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError>;

  /// Create a document, returning its assigned id.
  async fn create(&self, collection: &str, fields: Value) -> Result<String, RemoteError>;

  /// Atomically add `delta` to a numeric field of a document.
  async fn increment(
    &self,
    collection: &str,
    id: &str,
    field: &str,
    delta: i64,
  ) -> Result<(), RemoteError>;
}
