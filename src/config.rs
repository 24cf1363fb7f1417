//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (channel token, channel secret, CWA key) are referenced by
//! env-var name in the config and resolved once at startup.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub line: LineConfig,
    pub cwa: CwaConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// Any of these substrings in a text message triggers a forecast reply.
    pub trigger_keywords: Vec<String>,
    pub default_region: String,
    pub max_reply_chars: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "WEATHERBOT".to_string(),
            trigger_keywords: vec!["天氣".to_string()],
            default_region: "宜蘭縣".to_string(),
            max_reply_chars: 5000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Env var that overrides `port` when set (hosting platforms inject `PORT`).
    pub port_env: Option<String>,
    pub webhook_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            port_env: Some("PORT".to_string()),
            webhook_path: "/webhook".to_string(),
        }
    }
}

impl ServerConfig {
    /// Listen port after applying the env override.
    pub fn effective_port(&self) -> u16 {
        self.port_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LineConfig {
    pub channel_access_token_env: String,
    pub channel_secret_env: String,
    pub reply_url: String,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token_env: "LINE_CHANNEL_ACCESS_TOKEN".to_string(),
            channel_secret_env: "LINE_CHANNEL_SECRET".to_string(),
            reply_url: "https://api.line.me/v2/bot/message/reply".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CwaConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Region-local UTC offset. Taiwan has no DST.
    pub utc_offset_hours: i32,
    pub near_term: DatasetConfig,
    pub five_day: DatasetConfig,
}

impl Default for CwaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opendata.cwa.gov.tw/api/v1/rest/datastore".to_string(),
            api_key_env: "CWA_API_KEY".to_string(),
            timeout_secs: 10,
            utc_offset_hours: 8,
            near_term: DatasetConfig {
                id: "F-C0032-001".to_string(),
                elements: ["Wx", "PoP", "MinT", "MaxT"].map(String::from).to_vec(),
            },
            five_day: DatasetConfig {
                id: "F-D0047-003".to_string(),
                elements: Vec::new(),
            },
        }
    }
}

impl CwaConfig {
    /// The region's fixed UTC offset.
    pub fn region_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).with_context(|| {
            format!("Invalid utc_offset_hours: {}", self.utc_offset_hours)
        })
    }
}

/// One CWA catalog entry.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct DatasetConfig {
    pub id: String,
    /// Sent as `elementName=` when non-empty. Newer datasets use Chinese
    /// element names, so filtering is opt-in per dataset.
    pub elements: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub bucket_hours: u32,
    pub bucket_count: usize,
    pub days: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bucket_hours: 2,
            bucket_count: 3,
            days: 5,
        }
    }
}

/// Secrets resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub channel_access_token: SecretString,
    pub channel_secret: SecretString,
    pub cwa_api_key: SecretString,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise use built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Resolve every secret the bot needs; all of them are required.
    pub fn resolve_secrets(&self) -> Result<Secrets> {
        Ok(Secrets {
            channel_access_token: SecretString::new(Self::resolve_env(
                &self.line.channel_access_token_env,
            )?),
            channel_secret: SecretString::new(Self::resolve_env(&self.line.channel_secret_env)?),
            cwa_api_key: SecretString::new(Self::resolve_env(&self.cwa.api_key_env)?),
        })
    }
}
