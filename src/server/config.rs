use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::store::{StoreUrl, StoreUrlError};

/// Expand environment variables in a string.
/// Supports $VAR_NAME and ${VAR_NAME} syntax; unset variables expand to "".
fn expand_env_vars(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(pos) = rest.find('$') {
    out.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    if let Some(braced) = after.strip_prefix('{') {
      if let Some(end) = braced.find('}') {
        out.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
        rest = &braced[end + 1..];
        continue;
      }
      out.push('$');
      rest = after;
      continue;
    }

    let len = after
      .chars()
      .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
      .count();
    if len == 0 {
      out.push('$');
    } else {
      out.push_str(&std::env::var(&after[..len]).unwrap_or_default());
    }
    rest = &after[len..];
  }

  out.push_str(rest);
  out
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("invalid config: {0}")]
  Parse(#[from] serde_yaml::Error),
  #[error("invalid store url: {0}")]
  StoreUrl(#[from] StoreUrlError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
  #[serde(default)]
  pub server: ServerSection,
  #[serde(default)]
  pub store: StoreSection,
  #[serde(default, rename = "static")]
  pub static_files: StaticSection,
  #[serde(default)]
  pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  /// CORS allowed origins. `["*"]` (or empty) means permissive.
  #[serde(default = "default_cors_origins")]
  pub cors_origins: Vec<String>,
}

fn default_host() -> String {
  "0.0.0.0".into()
}
fn default_port() -> u16 {
  3000
}
fn default_cors_origins() -> Vec<String> {
  vec!["*".to_string()]
}

impl Default for ServerSection {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      cors_origins: default_cors_origins(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
  /// Connection string, see [`StoreUrl`].
  #[serde(default = "default_store_url")]
  pub url: String,
}

fn default_store_url() -> String {
  "sqlite://cadtrack.db".into()
}

impl Default for StoreSection {
  fn default() -> Self {
    Self {
      url: default_store_url(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticSection {
  /// Directory holding the front end; `index.html` is served for `/`.
  #[serde(default = "default_static_dir")]
  pub dir: String,
}

fn default_static_dir() -> String {
  "public".into()
}

impl Default for StaticSection {
  fn default() -> Self {
    Self {
      dir: default_static_dir(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
  #[serde(default = "default_level")]
  pub level: String,
}

fn default_level() -> String {
  "info".into()
}

impl Default for LoggingSection {
  fn default() -> Self {
    Self {
      level: default_level(),
    }
  }
}

impl ServerConfig {
  pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_yaml::from_str(&expand_env_vars(content))?)
  }

  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_yaml(&content)
  }

  pub fn find_and_load() -> Result<Option<Self>, ConfigError> {
    for p in ["cadtrack.yaml", "cadtrack.yml"] {
      if Path::new(p).exists() {
        tracing::info!("Loading config from {}", p);
        return Ok(Some(Self::from_file(p)?));
      }
    }
    Ok(None)
  }

  pub fn store_url(&self) -> Result<StoreUrl, ConfigError> {
    Ok(self.store.url.parse()?)
  }

  /// `host:port` as handed to the listener; hostnames are resolved at bind.
  pub fn address(&self) -> String {
    format!("{}:{}", self.server.host, self.server.port)
  }

  pub fn index_file(&self) -> PathBuf {
    Path::new(&self.static_files.dir).join("index.html")
  }
}
