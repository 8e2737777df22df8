//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression,
//! identity-token auth and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use opsdesk_core::config::OpsdeskConfig;
use opsdesk_core::error::OpsdeskError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS: the front-end origin from config plus localhost on our own port.
    let port = state.config.general.port;
    let origins: Vec<HeaderValue> = [
        state.config.general.app_base_url.trim_end_matches('/').to_string(),
        format!("http://127.0.0.1:{}", port),
        format!("http://localhost:{}", port),
    ]
    .iter()
    .filter_map(|origin| match origin.parse::<HeaderValue>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%origin, "Ignoring invalid CORS origin");
            None
        }
    })
    .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require authentication.
    let public_routes = Router::new().route("/health", get(handlers::health));

    let protected_routes = Router::new()
        .route(
            "/chat-sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/chat-sessions/{id}",
            get(handlers::get_session)
                .patch(handlers::rename_session)
                .delete(handlers::delete_session),
        )
        .route("/ai/chat", post(handlers::ai_chat))
        .route(
            "/batches/{id}/profitability",
            get(handlers::batch_profitability),
        )
        .route("/insights/{domain}", get(handlers::insight))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured port.
///
/// Binds to 127.0.0.1 (localhost only).
pub async fn start_server(config: &OpsdeskConfig, state: AppState) -> Result<(), OpsdeskError> {
    let addr = format!("127.0.0.1:{}", config.general.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OpsdeskError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| OpsdeskError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
