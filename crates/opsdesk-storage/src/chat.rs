//! Conversation store: chat sessions and their messages.
//!
//! Every operation takes the caller's [`UserId`] and scopes its SQL to
//! sessions owned by that user. A session belonging to someone else is
//! reported as `NotFound`, the same as one that does not exist.

use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use opsdesk_core::error::OpsdeskError;
use opsdesk_core::events::DomainEvent;
use opsdesk_core::types::{ChatMessage, ChatRole, ChatSession, Timestamp, UserId};

use crate::db::Database;
use crate::outbox;
use crate::rows::{collect, get, get_datetime, get_enum, get_uuid, storage_err, OptionalExt};

/// Title given to sessions created without one.
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Characters of the first message shown in session listings.
const PREVIEW_CHARS: usize = 80;

/// A session as shown in the sidebar listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: ChatSession,
    pub preview: Option<String>,
    pub message_count: u64,
}

/// A session with its full message history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: ChatSession,
    pub messages: Vec<ChatMessage>,
}

pub struct ConversationStore {
    db: Arc<Database>,
}

impl ConversationStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a session owned by `owner`. Blank titles fall back to
    /// [`DEFAULT_SESSION_TITLE`].
    pub fn create_session(
        &self,
        owner: UserId,
        title: Option<&str>,
    ) -> Result<ChatSession, OpsdeskError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SESSION_TITLE);
        let now = Timestamp::now().to_datetime();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: owner.0,
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    session.id.to_string(),
                    session.user_id.to_string(),
                    session.title,
                    session.created_at.timestamp(),
                    session.updated_at.timestamp(),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to create session: {}", e)))?;
            Ok(())
        })?;

        info!(session_id = %session.id, user_id = %owner, "Chat session created");
        Ok(session)
    }

    /// Sessions owned by `owner`, most recently updated first.
    pub fn list_sessions(&self, owner: UserId) -> Result<Vec<SessionSummary>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT s.id, s.user_id, s.title, s.created_at, s.updated_at,
                            (SELECT m.content FROM chat_messages m
                              WHERE m.session_id = s.id
                              ORDER BY m.created_at ASC, m.seq ASC LIMIT 1) AS preview,
                            (SELECT COUNT(*) FROM chat_messages m
                              WHERE m.session_id = s.id) AS message_count,
                            (SELECT COALESCE(MAX(m.seq), 0) FROM chat_messages m
                              WHERE m.session_id = s.id) AS last_seq
                     FROM chat_sessions s
                     WHERE s.user_id = ?1
                     ORDER BY s.updated_at DESC, last_seq DESC, s.rowid DESC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([owner.0.to_string()], |row| Ok(row_to_summary(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    /// Fetch one session with its messages in conversation order.
    pub fn get_session(&self, owner: UserId, id: Uuid) -> Result<SessionDetail, OpsdeskError> {
        self.db.with_conn(|conn| {
            let session = find_owned(conn, owner, id)?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, session_id, user_id, role, content, created_at, seq
                     FROM chat_messages WHERE session_id = ?1
                     ORDER BY created_at ASC, seq ASC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([id.to_string()], |row| Ok(row_to_message(row)))
                .map_err(storage_err)?;
            let messages = collect(rows)?;
            Ok(SessionDetail { session, messages })
        })
    }

    pub fn rename_session(
        &self,
        owner: UserId,
        id: Uuid,
        title: &str,
    ) -> Result<ChatSession, OpsdeskError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OpsdeskError::Validation("title is required".into()));
        }
        let now = Timestamp::now().0;

        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE chat_sessions SET title = ?1, updated_at = ?2
                     WHERE id = ?3 AND user_id = ?4",
                    rusqlite::params![title, now, id.to_string(), owner.0.to_string()],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Err(session_not_found(id));
            }
            find_owned(conn, owner, id)
        })
    }

    /// Delete a session and, by cascade, its messages.
    pub fn delete_session(&self, owner: UserId, id: Uuid) -> Result<(), OpsdeskError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "DELETE FROM chat_sessions WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![id.to_string(), owner.0.to_string()],
                )
                .map_err(storage_err)?;
            if changed == 0 {
                return Err(session_not_found(id));
            }
            info!(session_id = %id, user_id = %owner, "Chat session deleted");
            Ok(())
        })
    }

    /// Persist a question and its reply as two ordered messages, bump the
    /// session's `updated_at`, and record a `ChatTurnPersisted` event. All
    /// of it commits or none of it does.
    pub fn append_turn(
        &self,
        owner: UserId,
        session_id: Uuid,
        question: &str,
        reply: &str,
        degraded: bool,
    ) -> Result<Vec<ChatMessage>, OpsdeskError> {
        let now = Timestamp::now();

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            find_owned(&tx, owner, session_id)?;

            let mut saved = Vec::with_capacity(2);
            for (role, content) in [(ChatRole::User, question), (ChatRole::Assistant, reply)] {
                let id = Uuid::new_v4();
                tx.execute(
                    "INSERT INTO chat_messages (id, session_id, user_id, role, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        id.to_string(),
                        session_id.to_string(),
                        owner.0.to_string(),
                        role.to_string(),
                        content,
                        now.0,
                    ],
                )
                .map_err(|e| OpsdeskError::Storage(format!("Failed to save message: {}", e)))?;
                saved.push(ChatMessage {
                    id,
                    session_id,
                    user_id: owner.0,
                    role,
                    content: content.to_string(),
                    created_at: now.to_datetime(),
                    seq: tx.last_insert_rowid(),
                });
            }

            tx.execute(
                "UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now.0, session_id.to_string()],
            )
            .map_err(storage_err)?;

            outbox::enqueue(
                &tx,
                &DomainEvent::ChatTurnPersisted {
                    session_id,
                    user_id: owner.0,
                    degraded,
                    timestamp: now,
                },
            )?;

            tx.commit().map_err(storage_err)?;
            debug!(%session_id, "Chat turn persisted");
            Ok(saved)
        })
    }
}

fn session_not_found(id: Uuid) -> OpsdeskError {
    OpsdeskError::NotFound(format!("chat session {}", id))
}

fn find_owned(conn: &Connection, owner: UserId, id: Uuid) -> Result<ChatSession, OpsdeskError> {
    conn.query_row(
        "SELECT id, user_id, title, created_at, updated_at
         FROM chat_sessions WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![id.to_string(), owner.0.to_string()],
        |row| Ok(row_to_session(row)),
    )
    .optional()
    .map_err(storage_err)?
    .transpose()?
    .ok_or_else(|| session_not_found(id))
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<ChatSession, OpsdeskError> {
    Ok(ChatSession {
        id: get_uuid(row, 0)?,
        user_id: get_uuid(row, 1)?,
        title: get(row, 2)?,
        created_at: get_datetime(row, 3)?,
        updated_at: get_datetime(row, 4)?,
    })
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> Result<SessionSummary, OpsdeskError> {
    let preview: Option<String> = get(row, 5)?;
    let count: i64 = get(row, 6)?;
    Ok(SessionSummary {
        session: row_to_session(row)?,
        preview: preview.map(|p| truncate_chars(&p, PREVIEW_CHARS)),
        message_count: count as u64,
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<ChatMessage, OpsdeskError> {
    Ok(ChatMessage {
        id: get_uuid(row, 0)?,
        session_id: get_uuid(row, 1)?,
        user_id: get_uuid(row, 2)?,
        role: get_enum(row, 3)?,
        content: get(row, 4)?,
        created_at: get_datetime(row, 5)?,
        seq: get(row, 6)?,
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::OutboxRepository;

    fn make_store() -> (Arc<Database>, ConversationStore) {
        let db = Arc::new(Database::in_memory().unwrap());
        (db.clone(), ConversationStore::new(db))
    }

    // ---- Sessions ----

    #[test]
    fn test_create_session_default_title() {
        let (_, store) = make_store();
        let owner = UserId::new();

        let session = store.create_session(owner, None).unwrap();
        assert_eq!(session.title, "New Chat");
        assert_eq!(session.user_id, owner.0);

        let blank = store.create_session(owner, Some("   ")).unwrap();
        assert_eq!(blank.title, "New Chat");

        let named = store.create_session(owner, Some("Q3 numbers")).unwrap();
        assert_eq!(named.title, "Q3 numbers");
    }

    #[test]
    fn test_list_only_own_sessions() {
        let (_, store) = make_store();
        let ana = UserId::new();
        let budi = UserId::new();
        store.create_session(ana, Some("mine")).unwrap();
        store.create_session(budi, Some("theirs")).unwrap();

        let listed = store.list_sessions(ana).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].session.title, "mine");
        assert_eq!(listed[0].message_count, 0);
        assert!(listed[0].preview.is_none());
    }

    #[test]
    fn test_list_orders_recent_activity_first() {
        let (_, store) = make_store();
        let owner = UserId::new();
        let first = store.create_session(owner, Some("first")).unwrap();
        let _second = store.create_session(owner, Some("second")).unwrap();

        store
            .append_turn(owner, first.id, "how were sales?", "fine", false)
            .unwrap();

        let listed = store.list_sessions(owner).unwrap();
        assert_eq!(listed[0].session.id, first.id);
        assert_eq!(listed[0].message_count, 2);
        assert_eq!(listed[0].preview.as_deref(), Some("how were sales?"));
    }

    #[test]
    fn test_preview_is_truncated() {
        let (_, store) = make_store();
        let owner = UserId::new();
        let session = store.create_session(owner, None).unwrap();
        let long = "a".repeat(200);
        store.append_turn(owner, session.id, &long, "ok", false).unwrap();

        let listed = store.list_sessions(owner).unwrap();
        let preview = listed[0].preview.clone().unwrap();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }

    // ---- Ownership ----

    #[test]
    fn test_foreign_session_is_not_found() {
        let (_, store) = make_store();
        let ana = UserId::new();
        let mallory = UserId::new();
        let session = store.create_session(ana, None).unwrap();

        assert!(matches!(
            store.get_session(mallory, session.id),
            Err(OpsdeskError::NotFound(_))
        ));
        assert!(matches!(
            store.rename_session(mallory, session.id, "pwned"),
            Err(OpsdeskError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_session(mallory, session.id),
            Err(OpsdeskError::NotFound(_))
        ));
        assert!(matches!(
            store.append_turn(mallory, session.id, "q", "a", false),
            Err(OpsdeskError::NotFound(_))
        ));

        // Owner's data is untouched
        let detail = store.get_session(ana, session.id).unwrap();
        assert_eq!(detail.session.title, "New Chat");
        assert!(detail.messages.is_empty());
    }

    // ---- Messages ----

    #[test]
    fn test_append_turn_orders_messages() {
        let (_, store) = make_store();
        let owner = UserId::new();
        let session = store.create_session(owner, None).unwrap();

        store.append_turn(owner, session.id, "q1", "a1", false).unwrap();
        store.append_turn(owner, session.id, "q2", "a2", true).unwrap();

        let detail = store.get_session(owner, session.id).unwrap();
        let contents: Vec<&str> = detail.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2"]);
        assert_eq!(detail.messages[0].role, ChatRole::User);
        assert_eq!(detail.messages[1].role, ChatRole::Assistant);
        assert!(detail.messages.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn test_append_turn_bumps_updated_at_and_enqueues_event() {
        let (db, store) = make_store();
        let owner = UserId::new();
        let session = store.create_session(owner, None).unwrap();

        db.with_conn(|conn| {
            conn.execute(
                "UPDATE chat_sessions SET updated_at = 0 WHERE id = ?1",
                [session.id.to_string()],
            )
            .map_err(storage_err)
        })
        .unwrap();

        store.append_turn(owner, session.id, "q", "a", true).unwrap();

        let detail = store.get_session(owner, session.id).unwrap();
        assert!(detail.session.updated_at.timestamp() > 0);

        let pending = OutboxRepository::new(db).pending_events(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(matches!(
            pending[0].event,
            DomainEvent::ChatTurnPersisted { degraded: true, .. }
        ));
    }

    #[test]
    fn test_rename_and_delete() {
        let (_, store) = make_store();
        let owner = UserId::new();
        let session = store.create_session(owner, None).unwrap();
        store.append_turn(owner, session.id, "q", "a", false).unwrap();

        let renamed = store.rename_session(owner, session.id, "  Margins ").unwrap();
        assert_eq!(renamed.title, "Margins");
        assert!(matches!(
            store.rename_session(owner, session.id, ""),
            Err(OpsdeskError::Validation(_))
        ));

        store.delete_session(owner, session.id).unwrap();
        assert!(matches!(
            store.get_session(owner, session.id),
            Err(OpsdeskError::NotFound(_))
        ));
        assert!(store.list_sessions(owner).unwrap().is_empty());
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo", 2), "hé...");
    }
}
