//! Opsdesk application binary - composition root.
//!
//! 1. Load configuration (file, then `OPSDESK_*` env, then CLI flags)
//! 2. Open the SQLite database
//! 3. Build the AI gateway client and the shared API state
//! 4. Serve the axum REST API

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use opsdesk_api::auth::issue_token;
use opsdesk_api::routes;
use opsdesk_api::state::AppState;
use opsdesk_chat::AiGateway;
use opsdesk_core::config::OpsdeskConfig;
use opsdesk_core::types::UserId;
use opsdesk_storage::Database;

use crate::cli::CliArgs;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = OpsdeskConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    args.apply_to(&mut config);

    // Tracing: RUST_LOG wins, else the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    if let Some(user) = args.issue_token {
        let token = issue_token(&config.auth.secret, UserId(user))
            .ok_or("auth.secret is empty; set OPSDESK_AUTH_SECRET")?;
        println!("{}", token);
        return Ok(());
    }

    config.validate()?;
    tracing::info!("Starting Opsdesk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let db_path = data_dir.join("opsdesk.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // AI gateway.
    let gateway = AiGateway::new(
        config.ai.gateway_url.clone(),
        Duration::from_secs(config.ai.timeout_secs),
    )?;
    tracing::info!(
        url = %config.ai.gateway_url,
        timeout_secs = config.ai.timeout_secs,
        "AI gateway configured"
    );

    let state = AppState::new(config.clone(), db, Arc::new(gateway));

    // === API server ===

    let addr = format!("127.0.0.1:{}", config.general.port);
    let router = routes::create_router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind - is another instance running?");
            tracing::error!("Try: opsdesk --port {}", config.general.port.saturating_add(1));
            return Err(e.into());
        }
    };

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}
