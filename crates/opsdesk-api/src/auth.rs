//! Identity tokens and the middleware that checks them.
//!
//! A token is `<user-uuid>.<hex HMAC-SHA256(secret, user-uuid)>`. The
//! middleware validates `Authorization: Bearer <token>` and hands the
//! verified [`AuthUser`] to handlers as a request extension.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use opsdesk_core::types::UserId;

use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// The caller identity established by [`require_auth`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

fn mac_for(secret: &str, user: &str) -> Option<HmacSha256> {
    if secret.is_empty() {
        return None;
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(user.as_bytes());
    Some(mac)
}

/// Sign an identity token for `user`. `None` when `secret` is empty.
pub fn issue_token(secret: &str, user: UserId) -> Option<String> {
    let subject = user.0.to_string();
    let mac = mac_for(secret, &subject)?;
    Some(format!(
        "{}.{}",
        subject,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a token's signature and return the identity it names.
pub fn verify_token(secret: &str, token: &str) -> Option<UserId> {
    let (subject, signature) = token.split_once('.')?;
    let user = Uuid::parse_str(subject).ok()?;
    let sig_bytes = hex::decode(signature).ok()?;
    // Constant-time comparison
    mac_for(secret, subject)?.verify_slice(&sig_bytes).ok()?;
    Some(UserId(user))
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

/// Middleware that validates bearer identity tokens.
///
/// Returns 401 if the header is missing, malformed or carries a token not
/// signed with the configured secret.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(value) = req.headers().get("authorization") else {
        return unauthorized("Missing Authorization header");
    };
    let Ok(value_str) = value.to_str() else {
        return unauthorized("Invalid Authorization header encoding");
    };
    let Some(token) = value_str.strip_prefix("Bearer ") else {
        return unauthorized("Expected a bearer token");
    };

    match verify_token(&state.config.auth.secret, token.trim()) {
        Some(user) => {
            req.extensions_mut().insert(AuthUser(user));
            next.run(req).await
        }
        None => {
            tracing::debug!("Rejected identity token");
            unauthorized("Invalid identity token")
        }
    }
}
