//! Route handler functions for all API endpoints.
//!
//! Each handler extracts the verified caller and any path, query or body
//! parameters, calls into the services on [`AppState`], and returns JSON.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use opsdesk_chat::types::Intent;
use opsdesk_core::types::ChatSession;
use opsdesk_insight::BatchProfitability;
use opsdesk_storage::{SessionDetail, SessionSummary};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub title: Option<String>,
}

/// Request body for POST /ai/chat.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub session_id: Option<Uuid>,
}

/// Response for POST /ai/chat. `success` stays true when the assistant
/// fell back to the canned reply; `degraded` says so.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub intent: Intent,
    pub degraded: bool,
    pub persisted: bool,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub days: Option<u32>,
}

// =============================================================================
// Health
// =============================================================================

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// =============================================================================
// Chat sessions
// =============================================================================

/// GET /chat-sessions - the caller's sessions, most recently active first.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(state.conversations.list_sessions(user)?))
}

/// POST /chat-sessions - create a session; the body is optional.
pub async fn create_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<ChatSession>), ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let session = state
        .conversations
        .create_session(user, request.title.as_deref())?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /chat-sessions/{id} - one session with its messages.
pub async fn get_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDetail>, ApiError> {
    Ok(Json(state.conversations.get_session(user, id)?))
}

/// PATCH /chat-sessions/{id} - rename.
pub async fn rename_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameSessionRequest>,
) -> Result<Json<ChatSession>, ApiError> {
    let title = body
        .title
        .ok_or_else(|| ApiError::BadRequest("'title' is required".to_string()))?;
    Ok(Json(state.conversations.rename_session(user, id, &title)?))
}

/// DELETE /chat-sessions/{id} - delete with its messages.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.conversations.delete_session(user, id)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Assistant
// =============================================================================

/// POST /ai/chat - answer a business question.
pub async fn ai_chat(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = body
        .message
        .ok_or_else(|| ApiError::BadRequest("'message' is required".to_string()))?;

    let turn = state
        .orchestrator
        .handle_message(Some(user), &message, body.session_id)
        .await?;

    Ok(Json(ChatResponse {
        success: true,
        response: turn.reply,
        intent: turn.intent,
        degraded: turn.degraded,
        persisted: turn.persisted,
    }))
}

// =============================================================================
// Insights
// =============================================================================

/// GET /batches/{id}/profitability
pub async fn batch_profitability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BatchProfitability>, ApiError> {
    Ok(Json(state.insights.batch_profitability(id)?))
}

/// GET /insights/{domain}?days=N - one domain aggregate.
///
/// `days` applies to sales, expenses and dashboard and defaults to the
/// configured window.
pub async fn insight(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Value>, ApiError> {
    let days = params
        .days
        .unwrap_or(state.config.chat.default_window_days);
    let insights = &state.insights;

    let value = match domain.as_str() {
        "sales" => serde_json::to_value(insights.sales(days)?),
        "expenses" => serde_json::to_value(insights.expenses(days)?),
        "tasks" => serde_json::to_value(insights.tasks()?),
        "products" => serde_json::to_value(insights.products()?),
        "dashboard" => serde_json::to_value(insights.dashboard(days)?),
        other => {
            return Err(ApiError::NotFound(format!("Unknown insight domain: {}", other)));
        }
    }
    .map_err(|e| ApiError::Internal(format!("Failed to serialize insight: {}", e)))?;

    Ok(Json(value))
}
