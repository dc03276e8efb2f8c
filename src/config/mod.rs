use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var naming the TOML config file
pub const CONFIG_PATH_ENV: &str = "HOOKLOG_CONFIG";

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Bodies larger than this are rejected with 413
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_body_limit() -> usize {
    1_048_576 // 1 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Platform handshake configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret for the subscribe handshake. Unset refuses every handshake.
    #[serde(default)]
    pub verify_token: Option<String>,
}

/// Message log configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    /// Sync each appended batch to disk before acknowledging
    #[serde(default = "default_fsync")]
    pub fsync: bool,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("instagram_messages.csv")
}

fn default_fsync() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            fsync: default_fsync(),
        }
    }
}

impl ServiceConfig {
    /// Load from `HOOKLOG_CONFIG` (if set), then apply env var overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => load_config(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `HOOKLOG_*` overrides. Values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("HOOKLOG_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("HOOKLOG_BODY_LIMIT_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                self.server.body_limit_bytes = n;
            }
        }
        if let Some(v) = lookup("HOOKLOG_VERIFY_TOKEN") {
            self.webhook.verify_token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = lookup("HOOKLOG_LOG_PATH") {
            self.log.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("HOOKLOG_LOG_FSYNC") {
            if let Ok(b) = v.parse::<bool>() {
                self.log.fsync = b;
            }
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<ServiceConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ServiceConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}
