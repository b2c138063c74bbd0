//! Slot identity and key discipline.

use chrono::Duration;
use sha2::{Digest, Sha256};

/// A named cache location with its expiry policy.
///
/// A slot is a resource class ("articles") plus an optional instance
/// ("article_xyz"). The TTL travels with the slot so every reader and
/// writer agrees on when an entry dies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
  class: &'static str,
  instance: Option<String>,
  ttl: Duration,
}

impl Slot {
  /// A class-wide slot, one entry for the whole resource class.
  pub fn new(class: &'static str, ttl: Duration) -> Self {
    Self {
      class,
      instance: None,
      ttl,
    }
  }

  /// A per-instance slot within a class.
  pub fn instance(class: &'static str, id: &str, ttl: Duration) -> Self {
    Self {
      class,
      instance: Some(key_safe(id)),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Key suffix for this slot; the entry manager prepends its namespace.
  pub fn suffix(&self) -> String {
    match &self.instance {
      Some(id) => format!("{}_{}", self.class, id),
      None => self.class.to_string(),
    }
  }
}

impl std::fmt::Display for Slot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.suffix())
  }
}

/// Instance ids longer than this get digested.
const MAX_VERBATIM_LEN: usize = 64;

/// Make an arbitrary instance id safe for use inside a store key.
///
/// Backend ids are short alphanumerics and pass through unchanged.
/// Anything long or containing characters outside [A-Za-z0-9_-] is
/// replaced by a SHA-256 digest so keys stay bounded and unambiguous.
fn key_safe(id: &str) -> String {
  let plain = id.len() <= MAX_VERBATIM_LEN
    && id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

  if plain {
    id.to_string()
  } else {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hex::encode(hasher.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_class_slot_suffix() {
    let slot = Slot::new("articles", Duration::hours(24));
    assert_eq!(slot.suffix(), "articles");
  }

  #[test]
  fn test_instance_slot_suffix() {
    let slot = Slot::instance("article", "abc123", Duration::hours(24));
    assert_eq!(slot.suffix(), "article_abc123");
  }

  #[test]
  fn test_plain_id_passes_through() {
    assert_eq!(key_safe("a1-B2_c3"), "a1-B2_c3");
  }

  #[test]
  fn test_odd_id_is_digested() {
    let digested = key_safe("articles?slug=prise-connectée");
    assert_eq!(digested.len(), 64);
    assert!(digested.chars().all(|c| c.is_ascii_hexdigit()));
    // Digesting is deterministic.
    assert_eq!(digested, key_safe("articles?slug=prise-connectée"));
  }

  #[test]
  fn test_long_id_is_digested() {
    let long = "x".repeat(200);
    assert_eq!(key_safe(&long).len(), 64);
  }
}
