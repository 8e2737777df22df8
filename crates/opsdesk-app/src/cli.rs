//! CLI argument definitions for the Opsdesk server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use opsdesk_core::config::OpsdeskConfig;

/// Opsdesk - business operations API with a conversational assistant.
#[derive(Parser, Debug)]
#[command(name = "opsdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// AI gateway endpoint.
    #[arg(long = "gateway-url")]
    pub gateway_url: Option<String>,

    /// Print an identity token for this user id and exit.
    #[arg(long = "issue-token", value_name = "USER_ID")]
    pub issue_token: Option<uuid::Uuid>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OPSDESK_CONFIG env var > ~/.opsdesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OPSDESK_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply_to(&self, config: &mut OpsdeskConfig) {
        if let Some(port) = self.port {
            config.general.port = port;
        }
        if let Some(ref dir) = self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref url) = self.gateway_url {
            config.ai.gateway_url = url.clone();
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".opsdesk").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".opsdesk").join("config.toml");
    }
    PathBuf::from("config.toml")
}
