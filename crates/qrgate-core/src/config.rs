//! qrgate configuration.
//!
//! Loads `${QRGATE_HOME}/config.toml`, falling back to defaults, then applies
//! `QRGATE_AUTH_URL` and `QRGATE_ANON_KEY` from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const AUTH_URL_ENV: &str = "QRGATE_AUTH_URL";
pub const ANON_KEY_ENV: &str = "QRGATE_ANON_KEY";

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_secs: u64,
}

impl AuthConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory receiving `qrcode.png`. Empty means the current directory.
    pub directory: String,
}

/// `config.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub export: ExportConfig,
    pub log_file: Option<PathBuf>,
}

pub mod paths {
    //! Path resolution for qrgate's configuration and session files.
    //!
    //! QRGATE_HOME resolution order:
    //! 1. QRGATE_HOME environment variable (if set)
    //! 2. ~/.config/qrgate (default)
    //! 3. ./.qrgate when no home directory is known

    use std::path::PathBuf;

    pub fn qrgate_home() -> PathBuf {
        if let Ok(home) = std::env::var("QRGATE_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".qrgate"),
            |h| h.join(".config").join("qrgate"),
        )
    }

    pub fn config_path() -> PathBuf {
        qrgate_home().join("config.toml")
    }

    pub fn session_path() -> PathBuf {
        qrgate_home().join("session.json")
    }
}

impl Config {
    /// Loads `config.toml` from the qrgate home and applies env overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&paths::config_path())?.with_env_overrides())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// `QRGATE_AUTH_URL` and `QRGATE_ANON_KEY` take precedence over the file.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(AUTH_URL_ENV) {
            self.auth.url = url;
        }
        if let Some(key) = non_empty_env(ANON_KEY_ENV) {
            self.auth.anon_key = key;
        }
        self
    }

    /// The validated auth base URL.
    ///
    /// # Errors
    /// Returns an error if no URL is configured or it is not http(s).
    pub fn auth_url(&self) -> Result<Url> {
        let raw = self.auth.url.trim();
        if raw.is_empty() {
            anyhow::bail!("No auth URL configured. Set {AUTH_URL_ENV} or url in [auth].");
        }
        let url = Url::parse(raw).with_context(|| format!("Invalid auth URL '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("Invalid auth URL '{raw}': expected http or https");
        }
        Ok(url)
    }

    /// The anon key. May be empty for a self-hosted GoTrue without a gateway.
    pub fn anon_key(&self) -> &str {
        self.auth.anon_key.trim()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_secs.max(1))
    }

    /// Directory for exports; the current directory when unset.
    pub fn export_dir(&self) -> PathBuf {
        let dir = self.export.directory.trim();
        if dir.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(dir)
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
