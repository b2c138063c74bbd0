use chrono::Duration;

use crate::cache::Slot;
use crate::config::CacheConfig;

/// Cache slot definitions for the content domain.
///
/// Lists of writing keep for a day, the popularity ranking for a week,
/// the course catalogue for ten minutes. Every layer that touches the
/// cache goes through these constructors so a slot's TTL is defined in
/// exactly one place.
#[derive(Debug, Clone)]
pub struct ContentSlots {
  article_ttl: Duration,
  popular_ttl: Duration,
  course_ttl: Duration,
}

impl Default for ContentSlots {
  fn default() -> Self {
    Self {
      article_ttl: Duration::hours(24),
      popular_ttl: Duration::days(7),
      course_ttl: Duration::minutes(10),
    }
  }
}

impl ContentSlots {
  /// The full published article list.
  pub fn article_list(&self) -> Slot {
    Slot::new("articles", self.article_ttl)
  }

  /// One article by backend id.
  pub fn article(&self, id: &str) -> Slot {
    Slot::instance("article", id, self.article_ttl)
  }

  /// The most-viewed ranking.
  pub fn popular(&self) -> Slot {
    Slot::new("popular", self.popular_ttl)
  }

  /// The course catalogue.
  pub fn courses(&self) -> Slot {
    Slot::new("courses", self.course_ttl)
  }
}

impl From<&CacheConfig> for ContentSlots {
  fn from(config: &CacheConfig) -> Self {
    Self {
      article_ttl: Duration::hours(config.article_ttl_hours),
      popular_ttl: Duration::days(config.popular_ttl_days),
      course_ttl: Duration::minutes(config.course_ttl_minutes),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slot_suffixes() {
    let slots = ContentSlots::default();
    assert_eq!(slots.article_list().suffix(), "articles");
    assert_eq!(slots.article("abc").suffix(), "article_abc");
    assert_eq!(slots.popular().suffix(), "popular");
    assert_eq!(slots.courses().suffix(), "courses");
  }

  #[test]
  fn test_ttls_follow_config() {
    let config = CacheConfig {
      namespace: "electroinfo".into(),
      article_ttl_hours: 2,
      popular_ttl_days: 1,
      course_ttl_minutes: 5,
    };
    let slots = ContentSlots::from(&config);
    assert_eq!(slots.article_list().ttl(), Duration::hours(2));
    assert_eq!(slots.popular().ttl(), Duration::days(1));
    assert_eq!(slots.courses().ttl(), Duration::minutes(5));
  }
}
