//! Opsdesk API crate - axum HTTP server and route handlers.
//!
//! Exposes the conversational assistant, chat-session management, batch
//! profitability and the insight aggregates over REST.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
