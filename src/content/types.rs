use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::Record;
use crate::net::api_types::{millis_field, string_field, u64_field};
use crate::net::source::Document;

/// Backend collection names.
pub mod collections {
  pub const ARTICLES: &str = "articles";
  pub const COURSES: &str = "courses";
  pub const COMMENTS: &str = "comments";
  pub const NEWSLETTER: &str = "newsletter";
}

/// Publication states an article can be in.
pub mod status {
  pub const DRAFT: &str = "draft";
  pub const PUBLISHED: &str = "published";
  pub const SCHEDULED: &str = "scheduled";
  pub const ARCHIVED: &str = "archived";
}

/// The platform's fixed category set.
pub const CATEGORIES: &[&str] = &["INNOVATION", "SÉCURITÉ", "NOUVEAUTÉ", "TUTO", "DOMOTIQUE"];

/// A published piece of writing.
///
/// Serialized form matches the backend's camelCase wire format, so the
/// same shape lands in the cache and diffs cleanly against fresh
/// fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub slug: String,
  #[serde(default)]
  pub category: String,
  #[serde(default = "default_status")]
  pub status: String,
  #[serde(default)]
  pub excerpt: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub image_url: String,
  #[serde(default)]
  pub author: String,
  #[serde(default)]
  pub views: u64,
  #[serde(default)]
  pub comments_count: u64,
  pub created_at: Option<i64>,
}

fn default_status() -> String {
  status::PUBLISHED.to_owned()
}

impl Article {
  /// Decode a backend document, or `None` when it lacks the fields an
  /// article cannot render without.
  pub fn from_document(doc: &Document) -> Option<Self> {
    let title = match string_field(doc, "title") {
      Some(title) => title,
      None => {
        warn!(id = %doc.id, "skipping article without title");
        return None;
      }
    };

    Some(Self {
      id: doc.id.clone(),
      title,
      slug: string_field(doc, "slug").unwrap_or_default(),
      category: string_field(doc, "category").unwrap_or_default(),
      status: string_field(doc, "status").unwrap_or_else(default_status),
      excerpt: string_field(doc, "excerpt").unwrap_or_default(),
      content: string_field(doc, "content").unwrap_or_default(),
      image_url: string_field(doc, "imageUrl").unwrap_or_default(),
      author: string_field(doc, "author").unwrap_or_default(),
      views: u64_field(doc, "views").unwrap_or(0),
      comments_count: u64_field(doc, "commentsCount").unwrap_or(0),
      created_at: millis_field(doc, "createdAt"),
    })
  }

  pub fn is_published(&self) -> bool {
    self.status == status::PUBLISHED
  }
}

impl Record for Article {
  fn id(&self) -> &str {
    &self.id
  }

  fn created_at_millis(&self) -> i64 {
    // Undated records sort oldest.
    self.created_at.unwrap_or(0)
  }
}

/// One course in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub diploma: String,
  #[serde(default)]
  pub duration: String,
  pub created_at: Option<i64>,
}

impl CourseSummary {
  pub fn from_document(doc: &Document) -> Option<Self> {
    let title = match string_field(doc, "title") {
      Some(title) => title,
      None => {
        warn!(id = %doc.id, "skipping course without title");
        return None;
      }
    };

    Some(Self {
      id: doc.id.clone(),
      title,
      description: string_field(doc, "description").unwrap_or_default(),
      diploma: string_field(doc, "diploma").unwrap_or_default(),
      duration: string_field(doc, "duration").unwrap_or_default(),
      created_at: millis_field(doc, "createdAt"),
    })
  }
}

impl Record for CourseSummary {
  fn id(&self) -> &str {
    &self.id
  }

  fn created_at_millis(&self) -> i64 {
    self.created_at.unwrap_or(0)
  }
}

/// A reader comment on an article. Never cached, so no serde.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
  pub id: String,
  pub article_id: String,
  pub author: String,
  pub text: String,
  pub created_at: Option<i64>,
}

impl Comment {
  pub fn from_document(doc: &Document) -> Option<Self> {
    let text = string_field(doc, "content")?;

    Some(Self {
      id: doc.id.clone(),
      article_id: string_field(doc, "articleId").unwrap_or_default(),
      author: string_field(doc, "name").unwrap_or_else(|| "anonymous".to_owned()),
      text,
      created_at: millis_field(doc, "createdAt"),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn doc(value: serde_json::Value) -> Document {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn test_article_from_document() {
    let article = Article::from_document(&doc(json!({
      "id": "a1",
      "title": "Relais 12V",
      "slug": "relais-12v",
      "category": "DOMOTIQUE",
      "status": "published",
      "views": 7,
      "commentsCount": 2,
      "createdAt": {"seconds": 1700000000, "nanoseconds": 0},
    })))
    .unwrap();

    assert_eq!(article.id, "a1");
    assert_eq!(article.slug, "relais-12v");
    assert_eq!(article.views, 7);
    assert_eq!(article.created_at, Some(1700000000000));
    assert!(article.is_published());
  }

  #[test]
  fn test_article_without_title_is_skipped() {
    assert!(Article::from_document(&doc(json!({"id": "a2", "views": 3}))).is_none());
  }

  #[test]
  fn test_article_defaults() {
    let article = Article::from_document(&doc(json!({"id": "a3", "title": "Untitled fields"})))
      .unwrap();

    assert_eq!(article.status, status::PUBLISHED);
    assert_eq!(article.views, 0);
    assert_eq!(article.created_at, None);
    assert_eq!(article.created_at_millis(), 0);
  }

  #[test]
  fn test_article_cache_roundtrip_uses_wire_names() {
    let article = Article::from_document(&doc(json!({
      "id": "a4",
      "title": "Camel case survives",
      "imageUrl": "https://img/4.jpg",
      "commentsCount": 5,
      "createdAt": 1700000000000i64,
    })))
    .unwrap();

    let value = serde_json::to_value(&article).unwrap();
    assert_eq!(value["imageUrl"], "https://img/4.jpg");
    assert_eq!(value["commentsCount"], 5);
    assert_eq!(value["createdAt"], 1700000000000i64);

    let back: Article = serde_json::from_value(value).unwrap();
    assert_eq!(back, article);
  }

  #[test]
  fn test_comment_author_fallback() {
    let comment = Comment::from_document(&doc(json!({
      "id": "c1",
      "articleId": "a1",
      "content": "Merci pour l'article",
    })))
    .unwrap();

    assert_eq!(comment.author, "anonymous");
    assert_eq!(comment.text, "Merci pour l'article");
  }

  #[test]
  fn test_comment_without_content_is_skipped() {
    assert!(Comment::from_document(&doc(json!({"id": "c2", "name": "Luc"}))).is_none());
  }
}
