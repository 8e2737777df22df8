//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use opsdesk_chat::{ChatOrchestrator, TextGenerator};
use opsdesk_core::config::OpsdeskConfig;
use opsdesk_insight::Insights;
use opsdesk_storage::{ConversationStore, Database};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<OpsdeskConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub conversations: Arc<ConversationStore>,
    pub insights: Arc<Insights>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Wire the services over `database`, answering chat turns with
    /// `generator`.
    pub fn new(
        config: OpsdeskConfig,
        database: Database,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let database = Arc::new(database);
        let orchestrator = ChatOrchestrator::from_config(database.clone(), generator, &config);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            conversations: Arc::new(ConversationStore::new(database.clone())),
            insights: Arc::new(Insights::new(database.clone())),
            database,
            start_time: Instant::now(),
        }
    }
}
