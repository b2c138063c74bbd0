//! HTTP implementation of the content backend.
//!
//! The backend exposes collections under `v1/{collection}`. List
//! queries take `orderBy`, `dir` and `limit` as reserved parameters;
//! any other pair is a field equality filter.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::source::{Document, QuerySpec, RemoteError, RemoteSource, SortDir};

const USER_AGENT: &str = concat!("liseuse/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
  #[serde(default)]
  documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
  id: String,
}

/// HTTP client for the content backend.
#[derive(Clone)]
pub struct HttpSource {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl HttpSource {
  pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
    let mut base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid backend url {}: {}", base_url, e))?;
    // Url::join replaces the last path segment unless the base ends
    // with a slash.
    if !base.path().ends_with('/') {
      base.set_path(&format!("{}/", base.path()));
    }

    let client = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .timeout(timeout)
      .build()
      .map_err(|e| eyre!("Failed to create http client: {}", e))?;

    Ok(Self {
      client,
      base,
      token,
    })
  }

  /// One cheap request to decide whether the backend is reachable.
  pub async fn probe(&self, timeout: Duration) -> bool {
    let url = match self.base.join("v1/healthz") {
      Ok(url) => url,
      Err(_) => return false,
    };
    match self.client.get(url).timeout(timeout).send().await {
      Ok(response) => response.status().is_success(),
      Err(_) => false,
    }
  }

  fn url(&self, path: &str) -> Result<Url, RemoteError> {
    self
      .base
      .join(path)
      .map_err(|e| RemoteError::Unavailable(format!("bad url {path}: {e}")))
  }

  fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  async fn send(
    &self,
    path: &str,
    builder: reqwest::RequestBuilder,
  ) -> Result<reqwest::Response, RemoteError> {
    let response = self.request(builder).send().await.map_err(|e| {
      if e.is_timeout() {
        RemoteError::Timeout
      } else {
        RemoteError::Unavailable(e.to_string())
      }
    })?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(RemoteError::NotFound(path.to_owned()));
    }
    if !status.is_success() {
      return Err(RemoteError::Unavailable(format!(
        "backend returned {status}"
      )));
    }
    Ok(response)
  }

  async fn send_json<T: serde::de::DeserializeOwned>(
    &self,
    path: &str,
    builder: reqwest::RequestBuilder,
  ) -> Result<T, RemoteError> {
    let response = self.send(path, builder).await?;
    response
      .json()
      .await
      .map_err(|e| RemoteError::InvalidData(e.to_string()))
  }
}

fn query_url(base: &Url, collection: &str, spec: &QuerySpec) -> Result<Url, RemoteError> {
  let mut url = base
    .join(&format!("v1/{collection}"))
    .map_err(|e| RemoteError::Unavailable(format!("bad url v1/{collection}: {e}")))?;

  let has_params = spec.order_by.is_some() || !spec.filters.is_empty() || spec.limit.is_some();
  if has_params {
    let mut pairs = url.query_pairs_mut();
    if let Some((field, dir)) = &spec.order_by {
      pairs.append_pair("orderBy", field);
      pairs.append_pair(
        "dir",
        match dir {
          SortDir::Asc => "asc",
          SortDir::Desc => "desc",
        },
      );
    }
    for (field, value) in &spec.filters {
      pairs.append_pair(field, value);
    }
    if let Some(limit) = spec.limit {
      pairs.append_pair("limit", &limit.to_string());
    }
  }

  Ok(url)
}

#[async_trait]
impl RemoteSource for HttpSource {
  async fn query(&self, collection: &str, spec: QuerySpec) -> Result<Vec<Document>, RemoteError> {
    let url = query_url(&self.base, collection, &spec)?;
    let path = format!("v1/{collection}");
    let response: DocumentsResponse = self.send_json(&path, self.client.get(url)).await?;
    Ok(response.documents)
  }

  async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, RemoteError> {
    let path = format!("v1/{collection}/{id}");
    let url = self.url(&path)?;
    match self.send_json::<Document>(&path, self.client.get(url)).await {
      Ok(doc) => Ok(Some(doc)),
      Err(RemoteError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn create(&self, collection: &str, fields: Value) -> Result<String, RemoteError> {
    let path = format!("v1/{collection}");
    let url = self.url(&path)?;
    let response: CreatedResponse = self
      .send_json(&path, self.client.post(url).json(&fields))
      .await?;
    Ok(response.id)
  }

  async fn increment(
    &self,
    collection: &str,
    id: &str,
    field: &str,
    delta: i64,
  ) -> Result<(), RemoteError> {
    let path = format!("v1/{collection}/{id}/increment");
    let url = self.url(&path)?;
    let body = serde_json::json!({ "field": field, "delta": delta });
    self.send(&path, self.client.post(url).json(&body)).await?;
    Ok(())
  }
}
