use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  /// Hosted backing store; absent means local-only mode
  pub remote: Option<RemoteConfig>,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Project URL, e.g. https://<project>.supabase.co
  #[serde(default)]
  pub url: String,
  /// Database schema exposed by the REST endpoint
  #[serde(default = "default_schema")]
  pub schema: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_schema() -> String {
  "public".to_string()
}

fn default_timeout_secs() -> u64 {
  10
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  /// Override for the cache database location
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  #[serde(default = "default_log_level")]
  pub level: String,
  /// When set, logs go to a daily rolling file in this directory
  pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./vouchers.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/vouchers/config.yaml
  ///
  /// Without any config file the app runs on defaults in local-only mode.
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
    let local = PathBuf::from("vouchers.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("vouchers").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file parses as null
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  /// Get the remote API key from environment variables.
  ///
  /// Checks VOUCHERS_REMOTE_KEY first, then SUPABASE_ANON_KEY as fallback.
  pub fn get_remote_key() -> Option<String> {
    std::env::var("VOUCHERS_REMOTE_KEY")
      .or_else(|_| std::env::var("SUPABASE_ANON_KEY"))
      .ok()
      .filter(|k| !k.trim().is_empty())
  }

  /// Remote settings, only when both a URL and a key are available
  pub fn remote_credentials(&self, key: Option<String>) -> Option<(RemoteConfig, String)> {
    let remote = self.remote.as_ref().filter(|r| !r.url.trim().is_empty())?;
    Some((remote.clone(), key?))
  }
}
