use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub backend: BackendConfig,
  pub cache: CacheConfig,
  pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
  /// Base url of the content backend
  pub url: String,
}

impl Default for BackendConfig {
  fn default() -> Self {
    Self {
      url: "https://api.electroinfo.online".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Key prefix, so several deployments can share one store
  pub namespace: String,
  pub article_ttl_hours: i64,
  pub popular_ttl_days: i64,
  pub course_ttl_minutes: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      namespace: "electroinfo".to_string(),
      article_ttl_hours: 24,
      popular_ttl_days: 7,
      course_ttl_minutes: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
  /// Time budget for one remote reconciliation, in seconds
  pub remote_timeout_secs: u64,
  pub probe_interval_secs: u64,
  pub probe_timeout_secs: u64,
}

impl Default for NetworkConfig {
  fn default() -> Self {
    Self {
      remote_timeout_secs: 8,
      probe_interval_secs: 30,
      probe_timeout_secs: 5,
    }
  }
}

impl NetworkConfig {
  pub fn remote_timeout(&self) -> Duration {
    Duration::from_secs(self.remote_timeout_secs)
  }

  pub fn probe_interval(&self) -> Duration {
    Duration::from_secs(self.probe_interval_secs)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_secs)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./liseuse.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/liseuse/config.yaml
  /// 4. ~/.config/liseuse/config.yaml
  ///
  /// No file at all is fine: every setting has a default and the
  /// backend is public.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("liseuse.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("liseuse").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Optional bearer token for the backend, from LISEUSE_API_TOKEN.
  /// The public read endpoints work without one.
  pub fn api_token() -> Option<String> {
    std::env::var("LISEUSE_API_TOKEN")
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_gets_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.backend.url, "https://api.electroinfo.online");
    assert_eq!(config.cache.namespace, "electroinfo");
    assert_eq!(config.cache.article_ttl_hours, 24);
    assert_eq!(config.network.remote_timeout(), Duration::from_secs(8));
  }

  #[test]
  fn test_partial_config_overrides_only_named_fields() {
    let config: Config = serde_yaml::from_str(
      "backend:\n  url: http://localhost:4000\ncache:\n  course_ttl_minutes: 2\n",
    )
    .unwrap();
    assert_eq!(config.backend.url, "http://localhost:4000");
    assert_eq!(config.cache.course_ttl_minutes, 2);
    // Untouched fields keep their defaults.
    assert_eq!(config.cache.popular_ttl_days, 7);
    assert_eq!(config.network.probe_interval(), Duration::from_secs(30));
  }
}
