//! Content operations over the cache and the backend.
//!
//! Every read that deserves offline support runs through a fetch
//! cycle; reads that must be live (comments) and all writes talk to
//! the backend directly and fail cleanly when it is unreachable.

use chrono::Utc;
use serde_json::json;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, warn};

use super::slots::ContentSlots;
use super::types::{collections, Article, Comment, CourseSummary};
use crate::cache::{Fetcher, LoadCycle, Record, Snapshot};
use crate::net::source::{Document, QuerySpec, RemoteError, RemoteSource, SortDir};

/// Articles shown in the latest section of the home screen.
pub const LATEST_COUNT: usize = 6;
/// Entries in the most-viewed ranking.
pub const POPULAR_COUNT: usize = 5;
/// Suggestions under an article.
pub const RELATED_COUNT: usize = 3;
/// Articles per page in the full list.
pub const PAGE_SIZE: usize = 9;

/// Ranking over-fetch, so unpublished entries can be dropped without
/// coming up short.
const POPULAR_FETCH_LIMIT: usize = 20;

/// Result of a newsletter signup attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscribeOutcome {
  Subscribed,
  AlreadySubscribed,
}

#[derive(Clone)]
pub struct ContentService {
  remote: Arc<dyn RemoteSource>,
  fetcher: Fetcher,
  slots: ContentSlots,
}

impl ContentService {
  pub fn new(remote: Arc<dyn RemoteSource>, fetcher: Fetcher, slots: ContentSlots) -> Self {
    Self {
      remote,
      fetcher,
      slots,
    }
  }

  pub fn is_online(&self) -> bool {
    self.fetcher.is_online()
  }

  /// All published articles, newest first.
  pub fn load_articles(&self) -> LoadCycle<Vec<Article>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .load(&self.slots.article_list(), move || query_articles(remote))
  }

  pub fn retry_articles(&self) -> LoadCycle<Vec<Article>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .retry(&self.slots.article_list(), move || query_articles(remote))
  }

  /// Drop the cached list and load from the backend.
  pub fn reload_articles(&self) -> LoadCycle<Vec<Article>> {
    self.fetcher.invalidate(&self.slots.article_list());
    self.load_articles()
  }

  pub fn load_article(&self, id: &str) -> LoadCycle<Article> {
    let remote = self.remote.clone();
    let id = id.to_owned();
    self
      .fetcher
      .load(&self.slots.article(&id), move || get_article(remote, id))
  }

  pub fn retry_article(&self, id: &str) -> LoadCycle<Article> {
    let remote = self.remote.clone();
    let id = id.to_owned();
    self
      .fetcher
      .retry(&self.slots.article(&id), move || get_article(remote, id))
  }

  /// Resolve an article by its url slug.
  ///
  /// Slugs have no cache slot of their own. Online, the backend
  /// resolves the slug and the article is stored under its id; offline
  /// or on failure, the cached article list is scanned instead.
  pub async fn article_by_slug(&self, slug: &str) -> Result<Snapshot<Article>, RemoteError> {
    let slug = slug.trim();
    if !self.is_online() {
      return self
        .slug_from_cached_list(slug)
        .map(Snapshot::from_cache)
        .ok_or(RemoteError::Offline);
    }

    let spec = QuerySpec::new().filter("slug", slug).limit(1);
    match self.remote.query(collections::ARTICLES, spec).await {
      Ok(docs) => {
        let article = docs
          .first()
          .and_then(Article::from_document)
          .filter(Article::is_published)
          .ok_or_else(|| RemoteError::NotFound(format!("articles?slug={slug}")))?;
        self
          .fetcher
          .entries()
          .write(&self.slots.article(&article.id), &article);
        Ok(Snapshot::from_remote(article))
      }
      Err(e) => self
        .slug_from_cached_list(slug)
        .map(Snapshot::from_cache)
        .ok_or(e),
    }
  }

  fn slug_from_cached_list(&self, slug: &str) -> Option<Article> {
    let cached: Vec<Article> = self.fetcher.entries().read(&self.slots.article_list())?;
    cached.into_iter().find(|a| a.slug == slug)
  }

  /// The most-viewed ranking.
  pub fn load_popular(&self) -> LoadCycle<Vec<Article>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .load(&self.slots.popular(), move || query_popular(remote))
  }

  pub fn retry_popular(&self) -> LoadCycle<Vec<Article>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .retry(&self.slots.popular(), move || query_popular(remote))
  }

  pub fn reload_popular(&self) -> LoadCycle<Vec<Article>> {
    self.fetcher.invalidate(&self.slots.popular());
    self.load_popular()
  }

  /// Rank whatever article list is cached, for when the popular slot
  /// itself cannot be served.
  pub fn popular_from_cached_list(&self) -> Vec<Article> {
    let cached: Vec<Article> = self
      .fetcher
      .entries()
      .read(&self.slots.article_list())
      .unwrap_or_default();
    let mut ranked = rank_by_views(published_articles(cached));
    ranked.truncate(POPULAR_COUNT);
    ranked
  }

  /// Articles from the same category, excluding the one being read.
  pub async fn related(&self, article: &Article) -> Vec<Article> {
    if article.category.is_empty() {
      return Vec::new();
    }

    if self.is_online() {
      let spec = QuerySpec::new()
        .filter("category", &article.category)
        .order_by("createdAt", SortDir::Desc)
        .limit(RELATED_COUNT + 1);
      match self.remote.query(collections::ARTICLES, spec).await {
        Ok(docs) => {
          let mut related: Vec<Article> = published_articles(decode_articles(docs))
            .into_iter()
            .filter(|a| a.id != article.id)
            .collect();
          related.truncate(RELATED_COUNT);
          return related;
        }
        Err(e) => {
          warn!(article = %article.id, error = %e, "related query failed, deriving from cache");
        }
      }
    }

    self.related_from_cached_list(article)
  }

  fn related_from_cached_list(&self, article: &Article) -> Vec<Article> {
    let cached: Vec<Article> = self
      .fetcher
      .entries()
      .read(&self.slots.article_list())
      .unwrap_or_default();
    let mut related: Vec<Article> = cached
      .into_iter()
      .filter(|a| a.is_published() && a.category == article.category && a.id != article.id)
      .collect();
    related.sort_by_key(|a| Reverse(a.created_at_millis()));
    related.truncate(RELATED_COUNT);
    related
  }

  /// The course catalogue.
  pub fn load_courses(&self) -> LoadCycle<Vec<CourseSummary>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .load(&self.slots.courses(), move || query_courses(remote))
  }

  pub fn retry_courses(&self) -> LoadCycle<Vec<CourseSummary>> {
    let remote = self.remote.clone();
    self
      .fetcher
      .retry(&self.slots.courses(), move || query_courses(remote))
  }

  pub fn reload_courses(&self) -> LoadCycle<Vec<CourseSummary>> {
    self.fetcher.invalidate(&self.slots.courses());
    self.load_courses()
  }

  /// Comments for an article, newest first. Always live: stale
  /// conversation under a fresh article reads as broken, so there is
  /// no cache slot for these.
  pub async fn comments(&self, article_id: &str) -> Result<Vec<Comment>, RemoteError> {
    if !self.is_online() {
      return Err(RemoteError::Offline);
    }
    let spec = QuerySpec::new()
      .filter("articleId", article_id)
      .order_by("createdAt", SortDir::Desc);
    let docs = self.remote.query(collections::COMMENTS, spec).await?;
    Ok(docs.iter().filter_map(Comment::from_document).collect())
  }

  pub async fn post_comment(
    &self,
    article_id: &str,
    author: &str,
    text: &str,
  ) -> Result<(), RemoteError> {
    if !self.is_online() {
      return Err(RemoteError::Offline);
    }
    let fields = json!({
      "articleId": article_id,
      "name": author.trim(),
      "content": text.trim(),
      "createdAt": Utc::now().timestamp_millis(),
    });
    self.remote.create(collections::COMMENTS, fields).await?;

    // The counter is denormalized display data; the comment itself is
    // what matters.
    if let Err(e) = self
      .remote
      .increment(collections::ARTICLES, article_id, "commentsCount", 1)
      .await
    {
      warn!(article = %article_id, error = %e, "comment counter increment failed");
    }
    Ok(())
  }

  /// Sign an address up for the newsletter, once.
  pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, RemoteError> {
    if !self.is_online() {
      return Err(RemoteError::Offline);
    }
    let email = email.trim().to_lowercase();
    let spec = QuerySpec::new().filter("email", &email).limit(1);
    let existing = self.remote.query(collections::NEWSLETTER, spec).await?;
    if !existing.is_empty() {
      return Ok(SubscribeOutcome::AlreadySubscribed);
    }

    let fields = json!({
      "email": email,
      "subscribedAt": Utc::now().timestamp_millis(),
    });
    self.remote.create(collections::NEWSLETTER, fields).await?;
    Ok(SubscribeOutcome::Subscribed)
  }

  /// Count a read. Fire and forget: a lost increment is invisible,
  /// a blocked reader is not.
  pub fn record_view(&self, article_id: &str) {
    if !self.is_online() {
      return;
    }
    let remote = self.remote.clone();
    let id = article_id.to_owned();
    tokio::spawn(async move {
      if let Err(e) = remote.increment(collections::ARTICLES, &id, "views", 1).await {
        debug!(article = %id, error = %e, "view increment dropped");
      }
    });
  }
}

async fn query_articles(remote: Arc<dyn RemoteSource>) -> Result<Vec<Article>, RemoteError> {
  let spec = QuerySpec::new().order_by("createdAt", SortDir::Desc);
  let docs = remote.query(collections::ARTICLES, spec).await?;
  Ok(published_articles(decode_articles(docs)))
}

async fn get_article(remote: Arc<dyn RemoteSource>, id: String) -> Result<Article, RemoteError> {
  let doc = remote
    .get(collections::ARTICLES, &id)
    .await?
    .ok_or_else(|| RemoteError::NotFound(format!("articles/{id}")))?;
  Article::from_document(&doc)
    .ok_or_else(|| RemoteError::InvalidData(format!("article {id} is missing required fields")))
}

async fn query_popular(remote: Arc<dyn RemoteSource>) -> Result<Vec<Article>, RemoteError> {
  let spec = QuerySpec::new()
    .order_by("views", SortDir::Desc)
    .limit(POPULAR_FETCH_LIMIT);
  let docs = remote.query(collections::ARTICLES, spec).await?;
  let mut ranked = published_articles(decode_articles(docs));
  ranked.truncate(POPULAR_COUNT);
  Ok(ranked)
}

async fn query_courses(remote: Arc<dyn RemoteSource>) -> Result<Vec<CourseSummary>, RemoteError> {
  let spec = QuerySpec::new().order_by("createdAt", SortDir::Desc);
  let docs = remote.query(collections::COURSES, spec).await?;
  Ok(docs.iter().filter_map(CourseSummary::from_document).collect())
}

fn decode_articles(docs: Vec<Document>) -> Vec<Article> {
  docs.iter().filter_map(Article::from_document).collect()
}

fn published_articles(articles: Vec<Article>) -> Vec<Article> {
  articles.into_iter().filter(Article::is_published).collect()
}

fn rank_by_views(mut articles: Vec<Article>) -> Vec<Article> {
  articles.sort_by_key(|a| Reverse(a.views));
  articles
}

#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  /// A backend double fed with canned responses.
  pub struct ScriptedRemote {
    queries: Mutex<VecDeque<Result<Vec<Document>, RemoteError>>>,
    gets: Mutex<VecDeque<Result<Option<Document>, RemoteError>>>,
    pub query_log: Mutex<Vec<(String, QuerySpec)>>,
    pub created: Mutex<Vec<(String, serde_json::Value)>>,
    pub increments: Mutex<Vec<(String, String, String, i64)>>,
  }

  impl ScriptedRemote {
    pub fn new() -> Self {
      Self {
        queries: Mutex::new(VecDeque::new()),
        gets: Mutex::new(VecDeque::new()),
        query_log: Mutex::new(Vec::new()),
        created: Mutex::new(Vec::new()),
        increments: Mutex::new(Vec::new()),
      }
    }

    pub fn push_query(&self, result: Result<Vec<Document>, RemoteError>) {
      self.queries.lock().unwrap().push_back(result);
    }

    pub fn push_get(&self, result: Result<Option<Document>, RemoteError>) {
      self.gets.lock().unwrap().push_back(result);
    }
  }

  #[async_trait::async_trait]
  impl RemoteSource for ScriptedRemote {
    async fn query(&self, collection: &str, spec: QuerySpec) -> Result<Vec<Document>, RemoteError> {
      self
        .query_log
        .lock()
        .unwrap()
        .push((collection.to_owned(), spec));
      self
        .queries
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(RemoteError::Unavailable("unscripted query".into())))
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, RemoteError> {
      self
        .gets
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(RemoteError::Unavailable("unscripted get".into())))
    }

    async fn create(
      &self,
      collection: &str,
      fields: serde_json::Value,
    ) -> Result<String, RemoteError> {
      self
        .created
        .lock()
        .unwrap()
        .push((collection.to_owned(), fields));
      Ok("new-id".to_owned())
    }

    async fn increment(
      &self,
      collection: &str,
      id: &str,
      field: &str,
      delta: i64,
    ) -> Result<(), RemoteError> {
      self.increments.lock().unwrap().push((
        collection.to_owned(),
        id.to_owned(),
        field.to_owned(),
        delta,
      ));
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::ScriptedRemote;
  use super::*;
  use crate::cache::{CacheStore, EntryManager, LoadEvent, MemoryStore};
  use crate::net::connectivity::ConnectivityOracle;
  use serde_json::json;
  use std::time::Duration;

  fn fixture(
    online: bool,
  ) -> (
    ContentService,
    Arc<ScriptedRemote>,
    Arc<MemoryStore>,
    ConnectivityOracle,
  ) {
    let remote = Arc::new(ScriptedRemote::new());
    let store = Arc::new(MemoryStore::new());
    let entries = EntryManager::new(store.clone() as Arc<dyn CacheStore>, "test");
    let oracle = ConnectivityOracle::new(online);
    let fetcher = Fetcher::new(entries, oracle.handle());
    let service = ContentService::new(remote.clone(), fetcher, ContentSlots::default());
    (service, remote, store, oracle)
  }

  fn article_doc(id: &str, title: &str, status: &str, views: u64) -> serde_json::Value {
    json!({
      "id": id,
      "title": title,
      "slug": format!("{id}-slug"),
      "category": "DOMOTIQUE",
      "status": status,
      "views": views,
      "createdAt": 1700000000000i64 + views as i64,
    })
  }

  fn seeded_article(id: &str, category: &str, views: u64, created_at: i64) -> Article {
    Article {
      id: id.to_owned(),
      title: format!("Article {id}"),
      slug: format!("{id}-slug"),
      category: category.to_owned(),
      status: "published".to_owned(),
      excerpt: String::new(),
      content: String::new(),
      image_url: String::new(),
      author: String::new(),
      views,
      comments_count: 0,
      created_at: Some(created_at),
    }
  }

  async fn final_data<T: crate::cache::Payload>(mut cycle: LoadCycle<T>) -> Option<T> {
    let mut data = None;
    while let Some(event) = cycle.next().await {
      if let LoadEvent::Snapshot(snapshot) = event {
        data = Some(snapshot.data);
      }
    }
    data
  }

  #[tokio::test]
  async fn test_articles_drop_unpublished_and_malformed() {
    let (service, remote, _, _oracle) = fixture(true);
    let docs: Vec<Document> = vec![
      serde_json::from_value(article_doc("a1", "Published", "published", 1)).unwrap(),
      serde_json::from_value(article_doc("a2", "Draft", "draft", 2)).unwrap(),
      serde_json::from_value(json!({"id": "a3", "views": 9})).unwrap(),
    ];
    remote.push_query(Ok(docs));

    let articles = final_data(service.load_articles()).await.unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, "a1");

    let (collection, spec) = remote.query_log.lock().unwrap()[0].clone();
    assert_eq!(collection, "articles");
    assert_eq!(
      spec.order_by,
      Some(("createdAt".to_owned(), SortDir::Desc))
    );
  }

  #[tokio::test]
  async fn test_popular_truncates_overfetched_ranking() {
    let (service, remote, _, _oracle) = fixture(true);
    let docs: Vec<Document> = (0..8)
      .map(|i| {
        serde_json::from_value(article_doc(
          &format!("a{i}"),
          "Ranked",
          "published",
          100 - i as u64,
        ))
        .unwrap()
      })
      .collect();
    remote.push_query(Ok(docs));

    let popular = final_data(service.load_popular()).await.unwrap();
    assert_eq!(popular.len(), POPULAR_COUNT);
    assert_eq!(popular[0].id, "a0");

    let (_, spec) = remote.query_log.lock().unwrap()[0].clone();
    assert_eq!(spec.order_by, Some(("views".to_owned(), SortDir::Desc)));
    assert_eq!(spec.limit, Some(POPULAR_FETCH_LIMIT));
  }

  #[tokio::test]
  async fn test_popular_fallback_ranks_cached_list() {
    let (service, _, _, _oracle) = fixture(false);
    let list: Vec<Article> = vec![
      seeded_article("a1", "TUTO", 3, 1),
      seeded_article("a2", "TUTO", 10, 2),
      seeded_article("a3", "TUTO", 7, 3),
      seeded_article("a4", "TUTO", 1, 4),
      seeded_article("a5", "TUTO", 9, 5),
      seeded_article("a6", "TUTO", 2, 6),
    ];
    service
      .fetcher
      .entries()
      .write(&service.slots.article_list(), &list);

    let ranked = service.popular_from_cached_list();
    let ids: Vec<&str> = ranked.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a2", "a5", "a3", "a1", "a6"]);
  }

  #[tokio::test]
  async fn test_popular_fallback_without_cache_is_empty() {
    let (service, _, _, _oracle) = fixture(false);
    assert!(service.popular_from_cached_list().is_empty());
  }

  #[tokio::test]
  async fn test_related_excludes_self_and_limits() {
    let (service, remote, _, _oracle) = fixture(true);
    let current = seeded_article("a1", "DOMOTIQUE", 5, 10);
    let docs: Vec<Document> = ["a1", "a2", "a3", "a4"]
      .iter()
      .map(|id| serde_json::from_value(article_doc(id, "Sibling", "published", 1)).unwrap())
      .collect();
    remote.push_query(Ok(docs));

    let related = service.related(&current).await;
    assert_eq!(related.len(), RELATED_COUNT);
    assert!(related.iter().all(|a| a.id != "a1"));

    let (_, spec) = remote.query_log.lock().unwrap()[0].clone();
    assert!(spec
      .filters
      .contains(&("category".to_owned(), "DOMOTIQUE".to_owned())));
    assert_eq!(spec.limit, Some(RELATED_COUNT + 1));
  }

  #[tokio::test]
  async fn test_related_offline_derives_from_cached_list() {
    let (service, _, _, _oracle) = fixture(false);
    let current = seeded_article("a1", "TUTO", 0, 50);
    let list = vec![
      seeded_article("a1", "TUTO", 0, 50),
      seeded_article("a2", "TUTO", 0, 10),
      seeded_article("a3", "SÉCURITÉ", 0, 99),
      seeded_article("a4", "TUTO", 0, 30),
    ];
    service
      .fetcher
      .entries()
      .write(&service.slots.article_list(), &list);

    let related = service.related(&current).await;
    let ids: Vec<&str> = related.iter().map(|a| a.id.as_str()).collect();
    // Same category only, newest first, never the article itself.
    assert_eq!(ids, vec!["a4", "a2"]);
  }

  #[tokio::test]
  async fn test_related_without_category_is_empty() {
    let (service, _, _, _oracle) = fixture(true);
    let current = seeded_article("a1", "", 0, 0);
    assert!(service.related(&current).await.is_empty());
  }

  #[tokio::test]
  async fn test_subscribe_normalizes_and_creates() {
    let (service, remote, _, _oracle) = fixture(true);
    remote.push_query(Ok(Vec::new()));

    let outcome = service.subscribe("  Reader@Example.COM ").await.unwrap();
    assert_eq!(outcome, SubscribeOutcome::Subscribed);

    let (_, spec) = remote.query_log.lock().unwrap()[0].clone();
    assert!(spec
      .filters
      .contains(&("email".to_owned(), "reader@example.com".to_owned())));

    let created = remote.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].0, "newsletter");
    assert_eq!(created[0].1["email"], "reader@example.com");
    assert!(created[0].1["subscribedAt"].is_i64());
  }

  #[tokio::test]
  async fn test_subscribe_reports_duplicate_without_creating() {
    let (service, remote, _, _oracle) = fixture(true);
    let existing: Document =
      serde_json::from_value(json!({"id": "n1", "email": "reader@example.com"})).unwrap();
    remote.push_query(Ok(vec![existing]));

    let outcome = service.subscribe("reader@example.com").await.unwrap();
    assert_eq!(outcome, SubscribeOutcome::AlreadySubscribed);
    assert!(remote.created.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_post_comment_bumps_counter() {
    let (service, remote, _, _oracle) = fixture(true);

    service
      .post_comment("a1", "Luc", "  Très clair, merci.  ")
      .await
      .unwrap();

    let created = remote.created.lock().unwrap();
    assert_eq!(created[0].0, "comments");
    assert_eq!(created[0].1["articleId"], "a1");
    assert_eq!(created[0].1["content"], "Très clair, merci.");

    let increments = remote.increments.lock().unwrap();
    assert_eq!(
      increments[0],
      (
        "articles".to_owned(),
        "a1".to_owned(),
        "commentsCount".to_owned(),
        1
      )
    );
  }

  #[tokio::test]
  async fn test_comments_never_touch_cache() {
    let (service, remote, store, _oracle) = fixture(true);
    let doc: Document = serde_json::from_value(json!({
      "id": "c1",
      "articleId": "a1",
      "name": "Luc",
      "content": "Bien vu",
    }))
    .unwrap();
    remote.push_query(Ok(vec![doc]));

    let comments = service.comments("a1").await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, "Luc");
    assert!(store.is_empty());
  }

  #[tokio::test]
  async fn test_comments_offline_fail_fast() {
    let (service, _, _, _oracle) = fixture(false);
    assert_eq!(service.comments("a1").await, Err(RemoteError::Offline));
  }

  #[tokio::test]
  async fn test_writes_offline_fail_fast() {
    let (service, remote, _, _oracle) = fixture(false);
    assert_eq!(
      service.subscribe("reader@example.com").await,
      Err(RemoteError::Offline)
    );
    assert_eq!(
      service.post_comment("a1", "Luc", "Bonjour").await,
      Err(RemoteError::Offline)
    );
    assert!(remote.created.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_slug_resolution_caches_under_id() {
    let (service, remote, store, _oracle) = fixture(true);
    let doc: Document =
      serde_json::from_value(article_doc("a9", "Par slug", "published", 4)).unwrap();
    remote.push_query(Ok(vec![doc]));

    let snapshot = service.article_by_slug("a9-slug").await.unwrap();
    assert_eq!(snapshot.data.id, "a9");
    assert!(!snapshot.stale);
    assert!(store.get("test_article_a9").unwrap().is_some());
  }

  #[tokio::test]
  async fn test_slug_resolution_offline_scans_cached_list() {
    let (service, _, _, _oracle) = fixture(false);
    let list = vec![seeded_article("a7", "TUTO", 0, 1)];
    service
      .fetcher
      .entries()
      .write(&service.slots.article_list(), &list);

    let snapshot = service.article_by_slug("a7-slug").await.unwrap();
    assert_eq!(snapshot.data.id, "a7");
    assert!(snapshot.stale);
  }

  #[tokio::test]
  async fn test_slug_resolution_unknown_is_not_found() {
    let (service, remote, _, _oracle) = fixture(true);
    remote.push_query(Ok(Vec::new()));

    let result = service.article_by_slug("missing").await;
    assert!(matches!(result, Err(RemoteError::NotFound(_))));
  }

  #[tokio::test]
  async fn test_record_view_skipped_offline() {
    let (service, remote, _, _oracle) = fixture(false);
    service.record_view("a1");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(remote.increments.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_record_view_increments_in_background() {
    let (service, remote, _, _oracle) = fixture(true);
    service.record_view("a1");
    tokio::time::sleep(Duration::from_millis(20)).await;
    let increments = remote.increments.lock().unwrap();
    assert_eq!(
      increments[0],
      (
        "articles".to_owned(),
        "a1".to_owned(),
        "views".to_owned(),
        1
      )
    );
  }

  #[tokio::test]
  async fn test_courses_decode_and_cache() {
    let (service, remote, _, _oracle) = fixture(true);
    let doc: Document = serde_json::from_value(json!({
      "id": "f1",
      "title": "Habilitation électrique",
      "diploma": "B1V",
      "duration": "3 jours",
    }))
    .unwrap();
    remote.push_query(Ok(vec![doc]));

    let courses = final_data(service.load_courses()).await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].diploma, "B1V");

    let cached: Option<Vec<CourseSummary>> =
      service.fetcher.entries().read(&service.slots.courses());
    assert_eq!(cached.unwrap()[0].id, "f1");
  }
}
