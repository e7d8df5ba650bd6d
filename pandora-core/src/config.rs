use crate::error::PandoraError;
use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PandoraConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Build-time style environment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// When true, log entries are only kept in memory and never mirrored to the console.
    #[serde(default)]
    pub production: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// Domains the auth token may be sent to. Empty means `[host]`.
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

/// Where the key-value store lives and which slot holds the show list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_shows_key")]
    pub shows_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_api_url() -> String { "http://localhost:3000/api".into() }
fn default_host() -> String { "localhost:3000".into() }
fn default_state_file() -> PathBuf { PathBuf::from("data/pandora-state.json") }
fn default_shows_key() -> String { "PANDORA_SHOWS".into() }
fn default_log_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for PandoraConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            production: false,
            api_url: default_api_url(),
            host: default_host(),
            allowed_domains: Vec::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            shows_key: default_shows_key(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl EnvironmentConfig {
    /// Domains eligible for the auth token; falls back to the configured host.
    pub fn effective_allowed_domains(&self) -> Vec<String> {
        if self.allowed_domains.is_empty() {
            vec![self.host.clone()]
        } else {
            self.allowed_domains.clone()
        }
    }

    /// Join the API base URL and a request path without doubling slashes.
    pub fn api_endpoint(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

impl PandoraConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Environment variables use the `PANDORA_` prefix and `__` as the
    /// nesting separator, e.g. `PANDORA_ENVIRONMENT__PRODUCTION=true`.
    pub fn load(path: &Path) -> Result<Self, PandoraError> {
        Self::figment(path)
            .extract()
            .map_err(|e| PandoraError::ConfigError(e.to_string()))
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PANDORA_").split("__"))
    }
}
