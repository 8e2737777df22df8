use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OpsdeskError, Result};

/// Reply given in place of the assistant's answer when the gateway fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, the assistant is unavailable right now. Please try again in a moment.";

/// Longest summary window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Top-level configuration for the Opsdesk service.
///
/// Loaded from `~/.opsdesk/config.toml` by default. Environment variables
/// prefixed with `OPSDESK_` override file values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpsdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl OpsdeskConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OpsdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| OpsdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply `OPSDESK_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary key lookup.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup("OPSDESK_AUTH_SECRET") {
            self.auth.secret = secret;
        }
        if let Some(url) = lookup("OPSDESK_AI_GATEWAY_URL") {
            self.ai.gateway_url = url;
        }
        if let Some(url) = lookup("OPSDESK_APP_BASE_URL") {
            self.general.app_base_url = url;
        }
        if let Some(port) = lookup("OPSDESK_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.general.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid OPSDESK_PORT"),
            }
        }
        if let Some(timeout) = lookup("OPSDESK_AI_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.ai.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring invalid OPSDESK_AI_TIMEOUT_SECS"),
            }
        }
    }

    /// Check the settings the server cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.trim().is_empty() {
            return Err(OpsdeskError::Config(
                "auth.secret must be set (or OPSDESK_AUTH_SECRET)".to_string(),
            ));
        }
        if self.ai.timeout_secs == 0 {
            return Err(OpsdeskError::Config(
                "ai.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.chat.default_window_days == 0 || self.chat.default_window_days > MAX_WINDOW_DAYS {
            return Err(OpsdeskError::Config(format!(
                "chat.default_window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
        if self.chat.max_message_length == 0 {
            return Err(OpsdeskError::Config(
                "chat.max_message_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
    /// Public base URL, used only for links in outbound notifications.
    pub app_base_url: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.opsdesk/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
            app_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// External text-generation gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Endpoint receiving `POST {"prompt": ...}`.
    pub gateway_url: String,
    /// Upper bound on a single gateway call.
    pub timeout_secs: u64,
    /// Reply substituted when the gateway is unavailable.
    pub fallback_reply: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8787/generate".to_string(),
            timeout_secs: 20,
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_string(),
        }
    }
}

/// Identity-token verification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret used to sign and verify identity tokens.
    pub secret: String,
}

/// Conversation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Window used when a question names no day count.
    pub default_window_days: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            default_window_days: 30,
        }
    }
}
