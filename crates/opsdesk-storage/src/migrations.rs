//! Database schema migrations.
//!
//! Money columns are TEXT holding a decimal string; timestamps are INTEGER
//! epoch seconds; identifiers are TEXT UUIDs.

use rusqlite::Connection;
use tracing::info;

use opsdesk_core::error::OpsdeskError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), OpsdeskError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| OpsdeskError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| OpsdeskError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: records, conversations and outbox.
fn apply_v1(conn: &Connection) -> Result<(), OpsdeskError> {
    conn.execute_batch(
        "
        BEGIN;

        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS sales_locations (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS products (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            description TEXT,
            formula     TEXT,
            cost        TEXT NOT NULL DEFAULT '0',
            price       TEXT NOT NULL DEFAULT '0',
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS batches (
            id                      TEXT PRIMARY KEY NOT NULL,
            name                    TEXT NOT NULL,
            status                  TEXT NOT NULL DEFAULT 'pending'
                                    CHECK (status IN ('pending', 'in-progress', 'completed', 'cancelled')),
            start_date              INTEGER,
            end_date                INTEGER,
            target_segments         TEXT,
            target_sales_locations  TEXT,
            created_at              INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE TABLE IF NOT EXISTS batch_products (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_id    TEXT NOT NULL REFERENCES batches(id) ON DELETE CASCADE,
            product_id  TEXT NOT NULL REFERENCES products(id),
            quantity    INTEGER NOT NULL CHECK (quantity >= 0),
            cost        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_batch_products_batch
            ON batch_products (batch_id);

        CREATE INDEX IF NOT EXISTS idx_batch_products_product
            ON batch_products (product_id);

        CREATE TABLE IF NOT EXISTS expenses (
            id          TEXT PRIMARY KEY NOT NULL,
            type        TEXT NOT NULL,
            amount      TEXT NOT NULL,
            date        INTEGER NOT NULL,
            notes       TEXT,
            batch_id    TEXT REFERENCES batches(id) ON DELETE SET NULL,
            product_id  TEXT REFERENCES products(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expenses_date
            ON expenses (date DESC);

        CREATE INDEX IF NOT EXISTS idx_expenses_batch
            ON expenses (batch_id)
            WHERE batch_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS sales (
            id          TEXT PRIMARY KEY NOT NULL,
            batch_id    TEXT NOT NULL REFERENCES batches(id),
            product_id  TEXT NOT NULL REFERENCES products(id),
            location_id TEXT NOT NULL REFERENCES sales_locations(id),
            quantity    INTEGER NOT NULL CHECK (quantity > 0),
            unit_price  TEXT NOT NULL,
            total_price TEXT NOT NULL,
            sale_date   INTEGER NOT NULL,
            notes       TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sales_date
            ON sales (sale_date DESC);

        CREATE INDEX IF NOT EXISTS idx_sales_product
            ON sales (product_id, sale_date DESC);

        CREATE INDEX IF NOT EXISTS idx_sales_batch
            ON sales (batch_id);

        CREATE TABLE IF NOT EXISTS tasks (
            id              TEXT PRIMARY KEY NOT NULL,
            title           TEXT NOT NULL,
            description     TEXT,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'in-progress', 'completed')),
            priority        TEXT NOT NULL DEFAULT 'medium'
                            CHECK (priority IN ('low', 'medium', 'high')),
            due_date        INTEGER,
            assigned_to_id  TEXT REFERENCES users(id),
            created_by_id   TEXT NOT NULL REFERENCES users(id),
            product_id      TEXT REFERENCES products(id) ON DELETE SET NULL,
            batch_id        TEXT REFERENCES batches(id) ON DELETE SET NULL,
            created_at      INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_comments (
            id          TEXT PRIMARY KEY NOT NULL,
            task_id     TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            author_id   TEXT NOT NULL REFERENCES users(id),
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_task_comments_task
            ON task_comments (task_id, created_at ASC);

        -- comment_id is NULL for task-level mentions.
        CREATE TABLE IF NOT EXISTS task_mentions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id     TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            comment_id  TEXT REFERENCES task_comments(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id)
        );

        CREATE INDEX IF NOT EXISTS idx_task_mentions_task
            ON task_mentions (task_id);

        CREATE TABLE IF NOT EXISTS chat_sessions (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            title       TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chat_sessions_user
            ON chat_sessions (user_id, updated_at DESC);

        CREATE TABLE IF NOT EXISTS chat_messages (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            session_id  TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_session
            ON chat_messages (session_id, created_at ASC, seq ASC);

        CREATE TABLE IF NOT EXISTS outbox (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            id              TEXT NOT NULL UNIQUE,
            event_type      TEXT NOT NULL,
            aggregate_id    TEXT NOT NULL,
            payload         TEXT NOT NULL,
            created_at      INTEGER NOT NULL,
            delivered_at    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_outbox_pending
            ON outbox (seq ASC)
            WHERE delivered_at IS NULL;

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');

        COMMIT;
        ",
    )
    .map_err(|e| OpsdeskError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
