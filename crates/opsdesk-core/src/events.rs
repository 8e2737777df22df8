use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Timestamp;

/// Post-persistence events recorded in the outbox.
///
/// Each event is written in the same transaction as the rows it describes,
/// so a consumer (e.g. an email notifier) never sees an event for data that
/// was rolled back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    /// A task was created, possibly mentioning other users.
    TaskCreated {
        task_id: Uuid,
        created_by_id: Uuid,
        assigned_to_id: Option<Uuid>,
        mentioned_user_ids: Vec<Uuid>,
        timestamp: Timestamp,
    },

    /// A comment was added to a task.
    CommentAdded {
        task_id: Uuid,
        comment_id: Uuid,
        author_id: Uuid,
        mentioned_user_ids: Vec<Uuid>,
        timestamp: Timestamp,
    },

    /// A question and its reply were saved to a chat session.
    ChatTurnPersisted {
        session_id: Uuid,
        user_id: Uuid,
        degraded: bool,
        timestamp: Timestamp,
    },
}

impl DomainEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            DomainEvent::TaskCreated { timestamp, .. }
            | DomainEvent::CommentAdded { timestamp, .. }
            | DomainEvent::ChatTurnPersisted { timestamp, .. } => *timestamp,
        }
    }

    /// Stable name used as the outbox `event_type` column.
    pub fn event_name(&self) -> &'static str {
        match self {
            DomainEvent::TaskCreated { .. } => "task_created",
            DomainEvent::CommentAdded { .. } => "comment_added",
            DomainEvent::ChatTurnPersisted { .. } => "chat_turn_persisted",
        }
    }

    /// Identifier of the record the event is about.
    pub fn aggregate_id(&self) -> Uuid {
        match self {
            DomainEvent::TaskCreated { task_id, .. } => *task_id,
            DomainEvent::CommentAdded { comment_id, .. } => *comment_id,
            DomainEvent::ChatTurnPersisted { session_id, .. } => *session_id,
        }
    }
}
