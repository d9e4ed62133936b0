use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KindredConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub completion: CompletionConfig,
    pub search: SearchConfig,
    pub progression: ProgressionConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Shared secret for admin endpoints. Admin calls are always rejected when unset.
    pub admin_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    pub base_url: String,
    /// When unset the server falls back to the echo provider.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Base points for one chat turn, before the streak multiplier.
    pub chat_points: i64,
    /// Points granted for a correct daily question answer.
    pub question_reward: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub default_window: u32,
    pub fade_after_days: i64,
    pub forget_after_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            log_level: "info".into(),
            admin_token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_kindred_dir()
            .join("kindred.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-4o".into(),
            max_tokens: 400,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.tavily.com/search".into(),
            api_key: None,
            timeout_secs: 8,
        }
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            chat_points: 10,
            question_reward: 20,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            default_window: 30,
            fade_after_days: 3,
            forget_after_days: 7,
        }
    }
}

/// Returns `~/.kindred/`
pub fn default_kindred_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kindred")
}

/// Returns the default config file path: `~/.kindred/config.toml`
pub fn default_config_path() -> PathBuf {
    default_kindred_dir().join("config.toml")
}

impl KindredConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            KindredConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KINDRED_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("KINDRED_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("KINDRED_HOST") {
            self.server.host = val;
        }
        if let Some(port) = std::env::var("KINDRED_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Some(token) = non_empty_env("KINDRED_ADMIN_TOKEN") {
            self.server.admin_token = Some(token);
        }
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("KINDRED_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
