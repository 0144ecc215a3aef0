//! Client configuration: defaults, then the TOML file, then `COURTSIDE_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use courtside_http::ApiConfig;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "COURTSIDE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
  /// Root of the Courtside server; `/api/...` is appended.
  pub api_url:              String,
  /// SQLite file holding the persisted session. `~/` is expanded.
  pub state_path:           PathBuf,
  pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      api_url:              ApiConfig::default().base_url,
      state_path:           PathBuf::from("~/.local/share/courtside/session.db"),
      request_timeout_secs: 30,
    }
  }
}

impl ClientConfig {
  /// Load from `path` (optional) and the process environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_sources(path, config::Environment::with_prefix(ENV_PREFIX))
  }

  fn from_sources(path: &Path, env: config::Environment) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(env.try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise ClientConfig")
  }

  pub fn api(&self) -> ApiConfig {
    ApiConfig {
      base_url: self.api_url.clone(),
      timeout:  Duration::from_secs(self.request_timeout_secs),
    }
  }

  pub fn state_path(&self) -> PathBuf { expand_tilde(&self.state_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn no_env() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX).source(Some(HashMap::new()))
  }

  fn env(vars: &[(&str, &str)]) -> config::Environment {
    let map = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
  }

  fn write_toml(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir()
      .join(format!("courtside-{name}-{}.toml", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn missing_file_gives_defaults() {
    let cfg = ClientConfig::from_sources(Path::new("/nonexistent/courtside.toml"), no_env())
      .unwrap();
    assert_eq!(cfg, ClientConfig::default());
  }

  #[test]
  fn file_overrides_defaults() {
    let path = write_toml(
      "file",
      "api_url = \"https://courtside.example\"\nrequest_timeout_secs = 5\n",
    );
    let cfg = ClientConfig::from_sources(&path, no_env()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.api_url, "https://courtside.example");
    assert_eq!(cfg.api().timeout, Duration::from_secs(5));
    assert_eq!(cfg.state_path, ClientConfig::default().state_path);
  }

  #[test]
  fn environment_overrides_file() {
    let path = write_toml("env", "api_url = \"https://from-file.example\"\n");
    let cfg = ClientConfig::from_sources(
      &path,
      env(&[
        ("COURTSIDE_API_URL", "https://from-env.example"),
        ("COURTSIDE_REQUEST_TIMEOUT_SECS", "12"),
      ]),
    )
    .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.api_url, "https://from-env.example");
    assert_eq!(cfg.request_timeout_secs, 12);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/state.db")),
      PathBuf::from(home).join("state.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs/state.db")), PathBuf::from("/abs/state.db"));
  }
}
