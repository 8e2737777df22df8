//! Chat orchestrator: classifies a question, gathers the matching
//! aggregate, asks the gateway and saves the exchange.
//!
//! A turn moves through received, classified, aggregated, synthesized,
//! gateway-called, persisted and responded. A gateway failure jumps to the
//! response with the fallback reply; it is never reported as an error.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use opsdesk_core::config::{OpsdeskConfig, DEFAULT_FALLBACK_REPLY};
use opsdesk_core::error::OpsdeskError;
use opsdesk_core::types::UserId;
use opsdesk_insight::Insights;
use opsdesk_storage::{ConversationStore, Database};

use crate::error::ChatError;
use crate::gateway::TextGenerator;
use crate::parser::{IntentClassifier, DEFAULT_WINDOW_DAYS};
use crate::prompt::{self, Aggregate};
use crate::types::{ChatTurn, Intent, IntentKind};

/// Reply substituted when the gateway is unavailable.
pub const FALLBACK_REPLY: &str = DEFAULT_FALLBACK_REPLY;

/// Maximum message length in characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

pub struct ChatOrchestrator {
    classifier: IntentClassifier,
    insights: Insights,
    store: ConversationStore,
    generator: Arc<dyn TextGenerator>,
    max_message_length: usize,
    fallback_reply: String,
}

impl ChatOrchestrator {
    /// Create an orchestrator with default limits.
    pub fn new(db: Arc<Database>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            classifier: IntentClassifier::new(DEFAULT_WINDOW_DAYS),
            insights: Insights::new(db.clone()),
            store: ConversationStore::new(db),
            generator,
            max_message_length: MAX_MESSAGE_LENGTH,
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }

    /// Create an orchestrator using the limits and fallback text in `config`.
    pub fn from_config(
        db: Arc<Database>,
        generator: Arc<dyn TextGenerator>,
        config: &OpsdeskConfig,
    ) -> Self {
        let mut orchestrator = Self::new(db, generator);
        orchestrator.classifier = IntentClassifier::new(config.chat.default_window_days);
        orchestrator.max_message_length = config.chat.max_message_length;
        if !config.ai.fallback_reply.trim().is_empty() {
            orchestrator.fallback_reply = config.ai.fallback_reply.clone();
        }
        orchestrator
    }

    /// Answer `message` for `user`, saving the exchange to `session_id` when
    /// the user owns that session.
    ///
    /// Fails only before the gateway is called: missing identity, invalid
    /// message, or a store error while aggregating. Once a reply exists
    /// (real or fallback) the turn succeeds even if saving it fails.
    pub async fn handle_message(
        &self,
        user: Option<UserId>,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<ChatTurn, ChatError> {
        let started = Instant::now();
        let user = user.ok_or(ChatError::Unauthorized)?;

        let question = message.trim();
        if question.is_empty() {
            return Err(ChatError::Validation("message cannot be empty".to_string()));
        }
        if question.chars().count() > self.max_message_length {
            return Err(ChatError::Validation(format!(
                "message exceeds maximum length of {} characters",
                self.max_message_length
            )));
        }

        let intent = self.classifier.classify(question);
        debug!(intent = %intent.kind, days = ?intent.days, "Classified question");

        let prompt = match self.aggregate(intent)? {
            Some(aggregate) => prompt::synthesize(&aggregate, question),
            None => prompt::general(question),
        };

        let (reply, degraded) = match self.generator.ask(&prompt).await {
            Ok(reply) => (reply, false),
            Err(_) => (self.fallback_reply.clone(), true),
        };

        let persisted = match session_id {
            Some(id) => self.persist(user, id, question, &reply, degraded),
            None => false,
        };

        info!(
            user_id = %user,
            intent = %intent.kind,
            degraded,
            persisted,
            latency_ms = started.elapsed().as_millis() as u64,
            "Chat turn handled"
        );

        Ok(ChatTurn {
            reply,
            intent,
            degraded,
            persisted,
            session_id: if persisted { session_id } else { None },
        })
    }

    /// Aggregate for the intent's domain; `None` for general questions.
    fn aggregate(&self, intent: Intent) -> Result<Option<Aggregate>, ChatError> {
        let days = intent.days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let aggregate = match intent.kind {
            IntentKind::Sales => Aggregate::Sales(self.insights.sales(days)?),
            IntentKind::Expenses => Aggregate::Expenses(self.insights.expenses(days)?),
            IntentKind::Tasks => Aggregate::Tasks(self.insights.tasks()?),
            IntentKind::Products => Aggregate::Products(self.insights.products()?),
            IntentKind::Dashboard => Aggregate::Dashboard(self.insights.dashboard(days)?),
            IntentKind::General => return Ok(None),
        };
        Ok(Some(aggregate))
    }

    /// Save the exchange. Unknown or foreign sessions are skipped; other
    /// failures are logged and swallowed.
    fn persist(
        &self,
        user: UserId,
        session_id: Uuid,
        question: &str,
        reply: &str,
        degraded: bool,
    ) -> bool {
        match self
            .store
            .append_turn(user, session_id, question, reply, degraded)
        {
            Ok(_) => true,
            Err(OpsdeskError::NotFound(_)) => {
                debug!(%session_id, "Session not owned by caller, turn not saved");
                false
            }
            Err(e) => {
                warn!(%session_id, error = %e, "Failed to save chat turn");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use opsdesk_core::types::{
        Batch, BatchStatus, ChatRole, Product, Sale, SalesLocation,
    };
    use opsdesk_storage::{
        BatchRepository, LocationRepository, OutboxRepository, ProductRepository, SalesRepository,
    };
    use rust_decimal_macros::dec;

    use crate::gateway::UpstreamUnavailable;

    /// Replies with a fixed text and records every prompt.
    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn ask(&self, prompt: &str) -> Result<String, UpstreamUnavailable> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Down;

    #[async_trait]
    impl TextGenerator for Down {
        async fn ask(&self, _prompt: &str) -> Result<String, UpstreamUnavailable> {
            Err(UpstreamUnavailable)
        }
    }

    fn setup(generator: Arc<dyn TextGenerator>) -> (Arc<Database>, ChatOrchestrator) {
        let db = Arc::new(Database::in_memory().unwrap());
        let orchestrator = ChatOrchestrator::new(db.clone(), generator);
        (db, orchestrator)
    }

    fn seed_cap_sale(db: &Arc<Database>) {
        let market = SalesLocation {
            id: Uuid::new_v4(),
            name: "Market".into(),
            is_active: true,
        };
        LocationRepository::new(db.clone()).save(&market).unwrap();
        let cap = Product {
            id: Uuid::new_v4(),
            name: "Cap".into(),
            description: None,
            formula: None,
            cost: dec!(2),
            price: dec!(5),
        };
        ProductRepository::new(db.clone()).save(&cap).unwrap();
        let batch = Batch {
            id: Uuid::new_v4(),
            name: "Run".into(),
            status: BatchStatus::InProgress,
            start_date: None,
            end_date: None,
            target_segments: None,
            target_sales_locations: None,
        };
        BatchRepository::new(db.clone()).create(&batch, &[]).unwrap();
        let sale = Sale::new(
            batch.id,
            cap.id,
            market.id,
            10,
            dec!(5),
            Utc::now() - Duration::days(1),
        )
        .unwrap();
        SalesRepository::new(db.clone()).save(&sale).unwrap();
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let generator = Canned::new("ok");
        let (_db, orch) = setup(generator.clone());
        let result = orch.handle_message(None, "sales?", None).await;
        assert!(matches!(result, Err(ChatError::Unauthorized)));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let (_db, orch) = setup(Canned::new("ok"));
        let result = orch.handle_message(Some(UserId::new()), "   ", None).await;
        assert!(matches!(result, Err(ChatError::Validation(_))));
    }

    #[tokio::test]
    async fn test_message_length_limit() {
        let (_db, orch) = setup(Canned::new("ok"));
        let user = Some(UserId::new());

        let at_limit = "a".repeat(MAX_MESSAGE_LENGTH);
        assert!(orch.handle_message(user, &at_limit, None).await.is_ok());

        let over = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        let result = orch.handle_message(user, &over, None).await;
        assert!(matches!(result, Err(ChatError::Validation(ref m)) if m.contains("2000")));
    }

    // ---- Routing ----

    #[tokio::test]
    async fn test_sales_question_grounded_in_aggregate() {
        let generator = Canned::new("You sold 10 caps.");
        let (db, orch) = setup(generator.clone());
        seed_cap_sale(&db);

        let turn = orch
            .handle_message(Some(UserId::new()), "How were sales in the last 7 days?", None)
            .await
            .unwrap();

        assert_eq!(turn.reply, "You sold 10 caps.");
        assert_eq!(turn.intent.kind, IntentKind::Sales);
        assert_eq!(turn.intent.days, Some(7));
        assert!(!turn.degraded);
        assert!(!turn.persisted);

        let prompt = generator.last_prompt();
        assert!(prompt.starts_with("Sales over the last 7 days:"));
        assert!(prompt.contains("- Revenue: 50.00"));
        assert!(prompt.contains("- Cap: 50.00 (10 units)"));
    }

    #[tokio::test]
    async fn test_general_question_skips_aggregation() {
        let generator = Canned::new("Hello!");
        let (_db, orch) = setup(generator.clone());
        let turn = orch
            .handle_message(Some(UserId::new()), "good morning", None)
            .await
            .unwrap();
        assert_eq!(turn.intent.kind, IntentKind::General);
        assert_eq!(turn.intent.days, None);
        assert!(generator.last_prompt().ends_with("Question: good morning"));
    }

    // ---- Degradation ----

    #[tokio::test]
    async fn test_gateway_failure_returns_fallback() {
        let (_db, orch) = setup(Arc::new(Down));
        let turn = orch
            .handle_message(Some(UserId::new()), "any overdue tasks?", None)
            .await
            .unwrap();
        assert_eq!(turn.reply, FALLBACK_REPLY);
        assert!(turn.degraded);
    }

    #[tokio::test]
    async fn test_configured_fallback_reply() {
        let db = Arc::new(Database::in_memory().unwrap());
        let mut config = OpsdeskConfig::default();
        config.ai.fallback_reply = "Asisten sedang tidak tersedia.".into();
        let orch = ChatOrchestrator::from_config(db, Arc::new(Down), &config);
        let turn = orch
            .handle_message(Some(UserId::new()), "halo", None)
            .await
            .unwrap();
        assert_eq!(turn.reply, "Asisten sedang tidak tersedia.");
    }

    // ---- Persistence ----

    #[tokio::test]
    async fn test_turn_saved_to_owned_session() {
        let (db, orch) = setup(Canned::new("All good."));
        let store = ConversationStore::new(db.clone());
        let user = UserId::new();
        let session = store.create_session(user, None).unwrap();

        let turn = orch
            .handle_message(Some(user), "  dashboard please  ", Some(session.id))
            .await
            .unwrap();
        assert!(turn.persisted);
        assert_eq!(turn.session_id, Some(session.id));

        let detail = store.get_session(user, session.id).unwrap();
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0].role, ChatRole::User);
        assert_eq!(detail.messages[0].content, "dashboard please");
        assert_eq!(detail.messages[1].role, ChatRole::Assistant);
        assert_eq!(detail.messages[1].content, "All good.");
    }

    #[tokio::test]
    async fn test_degraded_turn_saved_the_same_way() {
        let (db, orch) = setup(Arc::new(Down));
        let store = ConversationStore::new(db.clone());
        let user = UserId::new();
        let session = store.create_session(user, None).unwrap();

        let turn = orch
            .handle_message(Some(user), "expenses", Some(session.id))
            .await
            .unwrap();
        assert!(turn.degraded);
        assert!(turn.persisted);

        let detail = store.get_session(user, session.id).unwrap();
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[1].content, FALLBACK_REPLY);

        let outbox = OutboxRepository::new(db);
        assert_eq!(outbox.pending_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_session_skipped_silently() {
        let (db, orch) = setup(Canned::new("ok"));
        let store = ConversationStore::new(db.clone());
        let owner = UserId::new();
        let session = store.create_session(owner, None).unwrap();

        let intruder = UserId::new();
        let turn = orch
            .handle_message(Some(intruder), "sales", Some(session.id))
            .await
            .unwrap();
        assert_eq!(turn.reply, "ok");
        assert!(!turn.persisted);
        assert_eq!(turn.session_id, None);
        assert!(store.get_session(owner, session.id).unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_reply() {
        let (db, orch) = setup(Canned::new("Still here."));
        let store = ConversationStore::new(db.clone());
        let user = UserId::new();
        let session = store.create_session(user, None).unwrap();
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE outbox")
                .map_err(|e| OpsdeskError::Storage(e.to_string()))
        })
        .unwrap();

        let turn = orch
            .handle_message(Some(user), "sales", Some(session.id))
            .await
            .unwrap();
        assert_eq!(turn.reply, "Still here.");
        assert!(!turn.degraded);
        assert!(!turn.persisted);
        assert_eq!(turn.session_id, None);
        // The failed write leaves no partial turn behind
        assert!(store.get_session(user, session.id).unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_skipped_silently() {
        let (_db, orch) = setup(Canned::new("ok"));
        let turn = orch
            .handle_message(Some(UserId::new()), "sales", Some(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(!turn.persisted);
    }
}
