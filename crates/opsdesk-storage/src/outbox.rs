//! Transactional outbox for post-persistence events.
//!
//! Writers call [`enqueue`] on the same connection (and inside the same
//! transaction) as the rows an event describes. A notifier polls
//! [`OutboxRepository::pending_events`] and acknowledges each entry with
//! [`OutboxRepository::mark_delivered`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use opsdesk_core::error::OpsdeskError;
use opsdesk_core::events::DomainEvent;

use crate::db::Database;
use crate::rows::{collect, get, get_datetime, get_uuid, storage_err};

/// A stored event awaiting (or past) delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxEntry {
    pub seq: i64,
    pub id: Uuid,
    pub event: DomainEvent,
    pub created_at: DateTime<Utc>,
}

/// Append an event to the outbox on an open connection.
pub(crate) fn enqueue(conn: &Connection, event: &DomainEvent) -> Result<Uuid, OpsdeskError> {
    let id = Uuid::new_v4();
    let payload = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO outbox (id, event_type, aggregate_id, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            id.to_string(),
            event.event_name(),
            event.aggregate_id().to_string(),
            payload,
            event.timestamp().0,
        ],
    )
    .map_err(|e| OpsdeskError::Storage(format!("Failed to enqueue event: {}", e)))?;
    debug!(event = event.event_name(), %id, "Event enqueued");
    Ok(id)
}

pub struct OutboxRepository {
    db: Arc<Database>,
}

impl OutboxRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Undelivered events in insertion order.
    pub fn pending_events(&self, limit: u32) -> Result<Vec<OutboxEntry>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT seq, id, payload, created_at FROM outbox
                     WHERE delivered_at IS NULL
                     ORDER BY seq ASC
                     LIMIT ?1",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([limit], |row| Ok(row_to_entry(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    /// Mark one event delivered. Returns false if it was unknown or
    /// already delivered.
    pub fn mark_delivered(&self, id: Uuid) -> Result<bool, OpsdeskError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE outbox SET delivered_at = strftime('%s', 'now')
                     WHERE id = ?1 AND delivered_at IS NULL",
                    [id.to_string()],
                )
                .map_err(storage_err)?;
            Ok(changed == 1)
        })
    }

    pub fn pending_count(&self) -> Result<u64, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM outbox WHERE delivered_at IS NULL",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as u64)
            .map_err(storage_err)
        })
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<OutboxEntry, OpsdeskError> {
    let payload: String = get(row, 2)?;
    Ok(OutboxEntry {
        seq: get(row, 0)?,
        id: get_uuid(row, 1)?,
        event: serde_json::from_str(&payload)?,
        created_at: get_datetime(row, 3)?,
    })
}
