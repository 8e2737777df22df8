//! Conversational business assistant for Opsdesk.
//!
//! Classifies free-text questions into a business domain and window,
//! renders the matching aggregate into a bounded prompt, asks the external
//! text-generation gateway, and saves the exchange to the caller's session.

pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod types;

pub use error::ChatError;
pub use gateway::{AiGateway, TextGenerator, UpstreamUnavailable};
pub use orchestrator::{ChatOrchestrator, FALLBACK_REPLY};
pub use parser::IntentClassifier;
pub use prompt::Aggregate;
pub use types::{ChatTurn, Intent, IntentKind};
