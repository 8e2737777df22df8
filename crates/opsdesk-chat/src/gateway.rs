//! Adapter for the external text-generation gateway.
//!
//! The gateway takes `POST {"prompt": "..."}` and answers `{"reply": "..."}`.
//! Every way that exchange can go wrong collapses into
//! [`UpstreamUnavailable`]; the cause is logged here and goes no further.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use opsdesk_core::error::OpsdeskError;

/// The gateway could not produce a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("AI gateway unavailable")]
pub struct UpstreamUnavailable;

/// Something that turns a prompt into a reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, UpstreamUnavailable>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    reply: Option<String>,
}

/// HTTP client for the gateway.
pub struct AiGateway {
    client: reqwest::Client,
    url: String,
}

impl AiGateway {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OpsdeskError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OpsdeskError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for AiGateway {
    async fn ask(&self, prompt: &str) -> Result<String, UpstreamUnavailable> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "AI gateway request failed");
                UpstreamUnavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "AI gateway returned error status");
            return Err(UpstreamUnavailable);
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            warn!(url = %self.url, error = %e, "AI gateway returned unreadable body");
            UpstreamUnavailable
        })?;

        match body.reply {
            Some(reply) if !reply.trim().is_empty() => {
                debug!(reply_len = reply.len(), "AI gateway replied");
                Ok(reply)
            }
            _ => {
                warn!(url = %self.url, "AI gateway response has no reply");
                Err(UpstreamUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve `app` on an ephemeral port and return its URL.
    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/generate", addr)
    }

    fn gateway(url: String) -> AiGateway {
        AiGateway::new(url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_reply_returned() {
        let app = Router::new().route(
            "/generate",
            post(|Json(body): Json<Value>| async move {
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                Json(json!({ "reply": format!("echo: {}", prompt) }))
            }),
        );
        let url = spawn(app).await;
        let reply = gateway(url).ask("hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let app = Router::new().route(
            "/generate",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({ "reply": "nope" }))) }),
        );
        let url = spawn(app).await;
        assert_eq!(gateway(url).ask("hi").await, Err(UpstreamUnavailable));
    }

    #[tokio::test]
    async fn test_missing_reply_is_unavailable() {
        let app = Router::new().route(
            "/generate",
            post(|| async { Json(json!({ "text": "wrong field" })) }),
        );
        let url = spawn(app).await;
        assert_eq!(gateway(url).ask("hi").await, Err(UpstreamUnavailable));
    }

    #[tokio::test]
    async fn test_non_json_body_is_unavailable() {
        let app = Router::new().route("/generate", post(|| async { "plain text" }));
        let url = spawn(app).await;
        assert_eq!(gateway(url).ask("hi").await, Err(UpstreamUnavailable));
    }

    #[tokio::test]
    async fn test_blank_reply_is_unavailable() {
        let app = Router::new().route(
            "/generate",
            post(|| async { Json(json!({ "reply": "   " })) }),
        );
        let url = spawn(app).await;
        assert_eq!(gateway(url).ask("hi").await, Err(UpstreamUnavailable));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let app = Router::new().route(
            "/generate",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "reply": "late" }))
            }),
        );
        let url = spawn(app).await;
        let slow = AiGateway::new(url, Duration::from_millis(200)).unwrap();
        assert_eq!(slow.ask("hi").await, Err(UpstreamUnavailable));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let result = gateway(format!("http://{}/generate", addr)).ask("hi").await;
        assert_eq!(result, Err(UpstreamUnavailable));
    }
}
