//! Loading shell configuration from TOML, with environment overrides.
//!
//! See `ShellConfig` for the expected schema. Every field has a default, so an
//! empty file (or no file at all) is a valid configuration.

use std::net::SocketAddr;

use serde::Deserialize;
use tracing::{error, info};

use crate::presentation::Mode;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
  /// Base URL of the quiz service (validate-url, generate-quiz, quizzes).
  pub api_url: String,
  pub port: u16,
  /// Client-side timeout for title previews. Generation has none.
  pub preview_timeout_secs: u64,
  pub user_agent: String,
  pub modes: InitialModes,
}

/// Which mode the presentation engine opens in, per quiz origin.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InitialModes {
  pub generated: Mode,
  pub history: Mode,
}

impl Default for InitialModes {
  fn default() -> Self {
    Self { generated: Mode::Take, history: Mode::Review }
  }
}

impl Default for ShellConfig {
  fn default() -> Self {
    Self {
      api_url: DEFAULT_API_URL.into(),
      port: DEFAULT_PORT,
      preview_timeout_secs: 10,
      user_agent: concat!("intelliquiz-shell/", env!("CARGO_PKG_VERSION")).into(),
      modes: InitialModes::default(),
    }
  }
}

impl ShellConfig {
  pub fn listen_addr(&self) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], self.port))
  }

  /// Apply QUIZ_API_URL / PORT on top of whatever the file said.
  fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
    if let Some(url) = lookup("QUIZ_API_URL").filter(|u| !u.trim().is_empty()) {
      self.api_url = url;
    }
    if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
      self.port = port;
    }
    self.api_url = self.api_url.trim_end_matches('/').to_string();
    self
  }
}

fn parse(raw: &str) -> Result<ShellConfig, toml::de::Error> {
  toml::from_str::<ShellConfig>(raw)
}

/// Load from INTELLIQUIZ_CONFIG_PATH if set. IO/parse errors are logged and defaults are used.
pub fn load_from_env() -> ShellConfig {
  let file_cfg = match std::env::var("INTELLIQUIZ_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse(&s) {
        Ok(cfg) => {
          info!(target: "intelliquiz", %path, "Loaded shell config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "intelliquiz", %path, error = %e, "Failed to parse TOML config; using defaults");
          ShellConfig::default()
        }
      },
      Err(e) => {
        error!(target: "intelliquiz", %path, error = %e, "Failed to read TOML config file; using defaults");
        ShellConfig::default()
      }
    },
    Err(_) => ShellConfig::default(),
  };

  file_cfg.apply_overrides(|k| std::env::var(k).ok())
}
