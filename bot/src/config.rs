use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::service::like_client::ApiCredential;

/// Default config file looked up by the binary.
pub const DEFAULT_CONFIG_PATH: &str = "likebot.toml";

/// Top-level process configuration, loaded from likebot.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BotConfig {
    pub like_service: LikeServiceSection,
    pub cooldown: CooldownSection,
    pub storage: StorageSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LikeServiceSection {
    pub base_url: String,
    /// When set, requests carry the API key and host headers.
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LikeServiceSection {
    fn default() -> Self {
        Self {
            base_url: "https://dfadads.vercel.app".into(),
            api_key: None,
            api_host: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CooldownSection {
    pub window_hours: i64,
    /// User ids that are never put on cooldown.
    pub privileged_users: Vec<String>,
}

impl Default for CooldownSection {
    fn default() -> Self {
        Self {
            window_hours: 24,
            privileged_users: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// JSON file holding the per-server access rules.
    pub access_file: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            access_file: "like_channels.json".into(),
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file. Falls back to defaults if the file doesn't exist.
    /// Environment variables override TOML values.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::from_toml(&contents)
                .with_context(|| format!("failed to parse config file {path}"))?
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LIKE_API_BASE_URL") {
            self.like_service.base_url = v;
        }
        if let Ok(v) = std::env::var("RAPIDAPI_KEY")
            && !v.is_empty()
        {
            self.like_service.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("RAPIDAPI_HOST")
            && !v.is_empty()
        {
            self.like_service.api_host = Some(v);
        }
        if let Ok(v) = std::env::var("LIKE_API_TIMEOUT_SECS")
            && let Ok(secs) = v.parse()
        {
            self.like_service.timeout_secs = secs;
        }
        if let Ok(v) = std::env::var("COOLDOWN_HOURS")
            && let Ok(hours) = v.parse()
        {
            self.cooldown.window_hours = hours;
        }
        if let Ok(v) = std::env::var("PRIVILEGED_USERS") {
            self.cooldown.privileged_users = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("ACCESS_FILE") {
            self.storage.access_file = v;
        }
    }

    pub fn credential(&self) -> Option<ApiCredential> {
        self.like_service
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|key| ApiCredential {
                key: key.clone(),
                host: self.like_service.api_host.clone(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.like_service.timeout_secs)
    }

    /// Cooldown window, saturating for out-of-range hour counts.
    pub fn cooldown_window(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.cooldown.window_hours).unwrap_or(chrono::Duration::MAX)
    }

    pub fn privileged_users(&self) -> HashSet<String> {
        self.cooldown.privileged_users.iter().cloned().collect()
    }
}
