//! Opsdesk Storage crate - SQLite persistence for business records,
//! chat conversations and the event outbox.
//!
//! Provides a WAL-mode SQLite database with migrations, repositories for
//! products/batches/expenses/sales/tasks, the per-user conversation store,
//! and an outbox table written inside the same transactions as the rows
//! its events describe.

pub mod chat;
pub mod db;
pub mod migrations;
pub mod outbox;
pub mod repository;
mod rows;

pub use chat::{ConversationStore, SessionDetail, SessionSummary, DEFAULT_SESSION_TITLE};
pub use db::Database;
pub use outbox::{OutboxEntry, OutboxRepository};
pub use repository::{
    BatchLine, BatchRepository, ExpenseRepository, LocationRepository, ProductRepository,
    SaleLine, SalesRepository, TaskMention, TaskRepository, UserRepository,
};
