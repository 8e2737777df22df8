//! Repository implementations for the business records.
//!
//! Each repository wraps the shared [`Database`] and speaks raw SQL. Reads
//! used by the aggregators return joined row types ([`SaleLine`],
//! [`BatchLine`]) carrying display names, so callers never issue follow-up
//! lookups per row.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::ToSql;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use opsdesk_core::error::OpsdeskError;
use opsdesk_core::events::DomainEvent;
use opsdesk_core::types::{
    Batch, BatchProduct, Expense, Product, Sale, SalesLocation, Task, TaskComment, Timestamp,
    User,
};

use crate::db::Database;
use crate::outbox;
use crate::rows::{
    collect, get, get_datetime, get_decimal, get_enum, get_opt_datetime, get_opt_uuid, get_uuid,
    storage_err, OptionalExt,
};

// ============================================================================
// Joined row types
// ============================================================================

/// A sale joined with its product and location names.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub sale_id: Uuid,
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
}

/// A batch cost line joined with its product name.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub cost: Decimal,
}

/// A mention of a user on a task, or on one of its comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMention {
    pub comment_id: Option<Uuid>,
    pub user_id: Uuid,
}

const SALE_LINE_SELECT: &str = "SELECT s.id, s.batch_id, s.product_id, p.name, s.location_id, l.name,
            s.quantity, s.unit_price, s.total_price, s.sale_date
     FROM sales s
     JOIN products p ON p.id = s.product_id
     JOIN sales_locations l ON l.id = s.location_id";

// ============================================================================
// Users and locations
// ============================================================================

pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn save(&self, user: &User) -> Result<(), OpsdeskError> {
        if user.email.trim().is_empty() {
            return Err(OpsdeskError::Validation("user email is required".into()));
        }
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)",
                rusqlite::params![user.id.to_string(), user.name, user.email],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save user: {}", e)))?;
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                [id.to_string()],
                |row| Ok(row_to_user(row)),
            )
            .optional()
            .map_err(storage_err)?
            .transpose()
        })
    }
}

pub struct LocationRepository {
    db: Arc<Database>,
}

impl LocationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn save(&self, location: &SalesLocation) -> Result<(), OpsdeskError> {
        if location.name.trim().is_empty() {
            return Err(OpsdeskError::Validation("location name is required".into()));
        }
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sales_locations (id, name, is_active) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    location.id.to_string(),
                    location.name,
                    location.is_active as i32
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save location: {}", e)))?;
            Ok(())
        })
    }

    pub fn list_active(&self) -> Result<Vec<SalesLocation>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, is_active FROM sales_locations WHERE is_active = 1 ORDER BY name")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_location(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }
}

// ============================================================================
// Products
// ============================================================================

pub struct ProductRepository {
    db: Arc<Database>,
}

impl ProductRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn save(&self, product: &Product) -> Result<(), OpsdeskError> {
        product.validate()?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO products (id, name, description, formula, cost, price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    product.id.to_string(),
                    product.name,
                    product.description,
                    product.formula,
                    product.cost.to_string(),
                    product.price.to_string(),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save product: {}", e)))?;
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, description, formula, cost, price FROM products WHERE id = ?1",
                [id.to_string()],
                |row| Ok(row_to_product(row)),
            )
            .optional()
            .map_err(storage_err)?
            .transpose()
        })
    }

    /// All products ordered by name.
    pub fn list_all(&self) -> Result<Vec<Product>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, description, formula, cost, price
                     FROM products ORDER BY name ASC, id ASC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_product(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    pub fn count(&self) -> Result<u64, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get::<_, i64>(0))
                .map(|n| n as u64)
                .map_err(storage_err)
        })
    }

    /// Number of batch cost lines referencing each product.
    ///
    /// Products never used in a batch are absent from the map.
    pub fn component_counts(&self) -> Result<HashMap<Uuid, u32>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT product_id, COUNT(*) FROM batch_products GROUP BY product_id")
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(get_uuid(row, 0).and_then(|id| Ok((id, get::<u32>(row, 1)?))))
                })
                .map_err(storage_err)?;
            Ok(collect(rows)?.into_iter().collect())
        })
    }
}

// ============================================================================
// Batches
// ============================================================================

pub struct BatchRepository {
    db: Arc<Database>,
}

impl BatchRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a batch and its cost lines in one transaction.
    pub fn create(&self, batch: &Batch, lines: &[BatchProduct]) -> Result<(), OpsdeskError> {
        if batch.name.trim().is_empty() {
            return Err(OpsdeskError::Validation("batch name is required".into()));
        }
        for line in lines {
            line.validate()?;
        }

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            tx.execute(
                "INSERT INTO batches (id, name, status, start_date, end_date, target_segments, target_sales_locations)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    batch.id.to_string(),
                    batch.name,
                    batch.status.to_string(),
                    batch.start_date.map(|d| d.timestamp()),
                    batch.end_date.map(|d| d.timestamp()),
                    batch.target_segments,
                    batch.target_sales_locations,
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save batch: {}", e)))?;

            for line in lines {
                tx.execute(
                    "INSERT INTO batch_products (batch_id, product_id, quantity, cost)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        batch.id.to_string(),
                        line.product_id.to_string(),
                        line.quantity,
                        line.cost.to_string(),
                    ],
                )
                .map_err(|e| OpsdeskError::Storage(format!("Failed to save batch line: {}", e)))?;
            }

            tx.commit().map_err(storage_err)?;
            info!(batch_id = %batch.id, lines = lines.len(), "Batch created");
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Batch>, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, status, start_date, end_date, target_segments, target_sales_locations
                 FROM batches WHERE id = ?1",
                [id.to_string()],
                |row| Ok(row_to_batch(row)),
            )
            .optional()
            .map_err(storage_err)?
            .transpose()
        })
    }

    /// Cost lines of one batch, in entry order.
    pub fn lines(&self, batch_id: Uuid) -> Result<Vec<BatchLine>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT bp.product_id, p.name, bp.quantity, bp.cost
                     FROM batch_products bp
                     JOIN products p ON p.id = bp.product_id
                     WHERE bp.batch_id = ?1
                     ORDER BY bp.id ASC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([batch_id.to_string()], |row| Ok(row_to_batch_line(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }
}

// ============================================================================
// Expenses
// ============================================================================

pub struct ExpenseRepository {
    db: Arc<Database>,
}

impl ExpenseRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn save(&self, expense: &Expense) -> Result<(), OpsdeskError> {
        expense.validate()?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO expenses (id, type, amount, date, notes, batch_id, product_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    expense.id.to_string(),
                    expense.expense_type,
                    expense.amount.to_string(),
                    expense.date.timestamp(),
                    expense.notes,
                    expense.batch_id.map(|id| id.to_string()),
                    expense.product_id.map(|id| id.to_string()),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save expense: {}", e)))?;
            Ok(())
        })
    }

    /// Expenses dated at or after `start`, newest first.
    pub fn find_since(&self, start: DateTime<Utc>) -> Result<Vec<Expense>, OpsdeskError> {
        self.query(
            "SELECT id, type, amount, date, notes, batch_id, product_id
             FROM expenses WHERE date >= ?1 ORDER BY date DESC, rowid DESC",
            &start.timestamp(),
        )
    }

    pub fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<Expense>, OpsdeskError> {
        self.query(
            "SELECT id, type, amount, date, notes, batch_id, product_id
             FROM expenses WHERE batch_id = ?1 ORDER BY date ASC, rowid ASC",
            &batch_id.to_string(),
        )
    }

    fn query(&self, sql: &str, param: &dyn ToSql) -> Result<Vec<Expense>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql).map_err(storage_err)?;
            let rows = stmt
                .query_map([param], |row| Ok(row_to_expense(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }
}

// ============================================================================
// Sales
// ============================================================================

pub struct SalesRepository {
    db: Arc<Database>,
}

impl SalesRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a sale. The stored total is always `quantity * unit_price`.
    pub fn save(&self, sale: &Sale) -> Result<(), OpsdeskError> {
        let total = Decimal::from(sale.quantity).checked_mul(sale.unit_price);
        if total != Some(sale.total_price) {
            return Err(OpsdeskError::Validation(
                "sale total does not match quantity times unit price".into(),
            ));
        }
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sales (id, batch_id, product_id, location_id, quantity, unit_price, total_price, sale_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    sale.id.to_string(),
                    sale.batch_id.to_string(),
                    sale.product_id.to_string(),
                    sale.location_id.to_string(),
                    sale.quantity,
                    sale.unit_price.to_string(),
                    total.expect("total checked above").to_string(),
                    sale.sale_date.timestamp(),
                    sale.notes,
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save sale: {}", e)))?;
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, batch_id, product_id, location_id, quantity, unit_price, total_price, sale_date, notes
                 FROM sales WHERE id = ?1",
                [id.to_string()],
                |row| Ok(row_to_sale(row)),
            )
            .optional()
            .map_err(storage_err)?
            .transpose()
        })
    }

    /// Change a sale's quantity and unit price, recomputing its total.
    pub fn update_pricing(
        &self,
        id: Uuid,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<Sale, OpsdeskError> {
        let mut sale = self
            .find_by_id(id)?
            .ok_or_else(|| OpsdeskError::NotFound(format!("sale {}", id)))?;
        sale.reprice(quantity, unit_price)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sales SET quantity = ?1, unit_price = ?2, total_price = ?3 WHERE id = ?4",
                rusqlite::params![
                    sale.quantity,
                    sale.unit_price.to_string(),
                    sale.total_price.to_string(),
                    id.to_string(),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to update sale: {}", e)))?;
            Ok(())
        })?;
        debug!(sale_id = %id, total = %sale.total_price, "Sale repriced");
        Ok(sale)
    }

    /// Sales dated at or after `start`, newest first.
    pub fn find_since(&self, start: DateTime<Utc>) -> Result<Vec<SaleLine>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "{} WHERE s.sale_date >= ?1 ORDER BY s.sale_date DESC, s.rowid DESC",
                SALE_LINE_SELECT
            );
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map([start.timestamp()], |row| Ok(row_to_sale_line(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    pub fn find_by_batch(&self, batch_id: Uuid) -> Result<Vec<SaleLine>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "{} WHERE s.batch_id = ?1 ORDER BY s.sale_date ASC, s.rowid ASC",
                SALE_LINE_SELECT
            );
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map([batch_id.to_string()], |row| Ok(row_to_sale_line(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    /// The `limit` most recent sales of one product.
    pub fn recent_for_product(
        &self,
        product_id: Uuid,
        limit: u32,
    ) -> Result<Vec<SaleLine>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "{} WHERE s.product_id = ?1 ORDER BY s.sale_date DESC, s.rowid DESC LIMIT ?2",
                SALE_LINE_SELECT
            );
            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let rows = stmt
                .query_map(rusqlite::params![product_id.to_string(), limit], |row| {
                    Ok(row_to_sale_line(row))
                })
                .map_err(storage_err)?;
            collect(rows)
        })
    }
}

// ============================================================================
// Tasks
// ============================================================================

pub struct TaskRepository {
    db: Arc<Database>,
}

impl TaskRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a task with its task-level mentions and a `TaskCreated`
    /// outbox event, all in one transaction.
    pub fn create(&self, task: &Task, mentions: &[Uuid]) -> Result<(), OpsdeskError> {
        if task.title.trim().is_empty() {
            return Err(OpsdeskError::Validation("task title is required".into()));
        }
        let mentions = dedup(mentions);

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            tx.execute(
                "INSERT INTO tasks (id, title, description, status, priority, due_date,
                                    assigned_to_id, created_by_id, product_id, batch_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    task.id.to_string(),
                    task.title,
                    task.description,
                    task.status.to_string(),
                    task.priority.to_string(),
                    task.due_date.map(|d| d.timestamp()),
                    task.assigned_to_id.map(|id| id.to_string()),
                    task.created_by_id.to_string(),
                    task.product_id.map(|id| id.to_string()),
                    task.batch_id.map(|id| id.to_string()),
                    task.created_at.timestamp(),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save task: {}", e)))?;

            for user_id in &mentions {
                tx.execute(
                    "INSERT INTO task_mentions (task_id, comment_id, user_id) VALUES (?1, NULL, ?2)",
                    rusqlite::params![task.id.to_string(), user_id.to_string()],
                )
                .map_err(|e| OpsdeskError::Storage(format!("Failed to save mention: {}", e)))?;
            }

            outbox::enqueue(
                &tx,
                &DomainEvent::TaskCreated {
                    task_id: task.id,
                    created_by_id: task.created_by_id,
                    assigned_to_id: task.assigned_to_id,
                    mentioned_user_ids: mentions.clone(),
                    timestamp: Timestamp::now(),
                },
            )?;

            tx.commit().map_err(storage_err)?;
            info!(task_id = %task.id, mentions = mentions.len(), "Task created");
            Ok(())
        })
    }

    /// Insert a comment with its mentions and a `CommentAdded` outbox
    /// event, all in one transaction.
    pub fn add_comment(
        &self,
        comment: &TaskComment,
        mentions: &[Uuid],
    ) -> Result<(), OpsdeskError> {
        if comment.content.trim().is_empty() {
            return Err(OpsdeskError::Validation("comment content is required".into()));
        }
        let mentions = dedup(mentions);

        self.db.with_conn(|conn| {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                    [comment.task_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(storage_err)?;
            if !exists {
                return Err(OpsdeskError::NotFound(format!("task {}", comment.task_id)));
            }

            let tx = conn.unchecked_transaction().map_err(storage_err)?;
            tx.execute(
                "INSERT INTO task_comments (id, task_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    comment.id.to_string(),
                    comment.task_id.to_string(),
                    comment.author_id.to_string(),
                    comment.content,
                    comment.created_at.timestamp(),
                ],
            )
            .map_err(|e| OpsdeskError::Storage(format!("Failed to save comment: {}", e)))?;

            for user_id in &mentions {
                tx.execute(
                    "INSERT INTO task_mentions (task_id, comment_id, user_id) VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        comment.task_id.to_string(),
                        comment.id.to_string(),
                        user_id.to_string()
                    ],
                )
                .map_err(|e| OpsdeskError::Storage(format!("Failed to save mention: {}", e)))?;
            }

            outbox::enqueue(
                &tx,
                &DomainEvent::CommentAdded {
                    task_id: comment.task_id,
                    comment_id: comment.id,
                    author_id: comment.author_id,
                    mentioned_user_ids: mentions.clone(),
                    timestamp: Timestamp::now(),
                },
            )?;

            tx.commit().map_err(storage_err)?;
            info!(task_id = %comment.task_id, comment_id = %comment.id, "Comment added");
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, OpsdeskError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, description, status, priority, due_date, assigned_to_id,
                        created_by_id, product_id, batch_id, created_at
                 FROM tasks WHERE id = ?1",
                [id.to_string()],
                |row| Ok(row_to_task(row)),
            )
            .optional()
            .map_err(storage_err)?
            .transpose()
        })
    }

    /// Every task, newest first.
    pub fn list_all(&self) -> Result<Vec<Task>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, description, status, priority, due_date, assigned_to_id,
                            created_by_id, product_id, batch_id, created_at
                     FROM tasks ORDER BY created_at DESC, rowid DESC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([], |row| Ok(row_to_task(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    pub fn comments(&self, task_id: Uuid) -> Result<Vec<TaskComment>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, task_id, author_id, content, created_at
                     FROM task_comments WHERE task_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([task_id.to_string()], |row| Ok(row_to_comment(row)))
                .map_err(storage_err)?;
            collect(rows)
        })
    }

    pub fn mentions(&self, task_id: Uuid) -> Result<Vec<TaskMention>, OpsdeskError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT comment_id, user_id FROM task_mentions
                     WHERE task_id = ?1 ORDER BY id ASC",
                )
                .map_err(storage_err)?;
            let rows = stmt
                .query_map([task_id.to_string()], |row| {
                    Ok(get_opt_uuid(row, 0).and_then(|comment_id| {
                        Ok(TaskMention {
                            comment_id,
                            user_id: get_uuid(row, 1)?,
                        })
                    }))
                })
                .map_err(storage_err)?;
            collect(rows)
        })
    }
}

fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, OpsdeskError> {
    Ok(User {
        id: get_uuid(row, 0)?,
        name: get(row, 1)?,
        email: get(row, 2)?,
    })
}

fn row_to_location(row: &rusqlite::Row<'_>) -> Result<SalesLocation, OpsdeskError> {
    let active: i32 = get(row, 2)?;
    Ok(SalesLocation {
        id: get_uuid(row, 0)?,
        name: get(row, 1)?,
        is_active: active != 0,
    })
}

fn row_to_product(row: &rusqlite::Row<'_>) -> Result<Product, OpsdeskError> {
    Ok(Product {
        id: get_uuid(row, 0)?,
        name: get(row, 1)?,
        description: get(row, 2)?,
        formula: get(row, 3)?,
        cost: get_decimal(row, 4)?,
        price: get_decimal(row, 5)?,
    })
}

fn row_to_batch(row: &rusqlite::Row<'_>) -> Result<Batch, OpsdeskError> {
    Ok(Batch {
        id: get_uuid(row, 0)?,
        name: get(row, 1)?,
        status: get_enum(row, 2)?,
        start_date: get_opt_datetime(row, 3)?,
        end_date: get_opt_datetime(row, 4)?,
        target_segments: get(row, 5)?,
        target_sales_locations: get(row, 6)?,
    })
}

fn row_to_batch_line(row: &rusqlite::Row<'_>) -> Result<BatchLine, OpsdeskError> {
    Ok(BatchLine {
        product_id: get_uuid(row, 0)?,
        product_name: get(row, 1)?,
        quantity: get(row, 2)?,
        cost: get_decimal(row, 3)?,
    })
}

fn row_to_expense(row: &rusqlite::Row<'_>) -> Result<Expense, OpsdeskError> {
    Ok(Expense {
        id: get_uuid(row, 0)?,
        expense_type: get(row, 1)?,
        amount: get_decimal(row, 2)?,
        date: get_datetime(row, 3)?,
        notes: get(row, 4)?,
        batch_id: get_opt_uuid(row, 5)?,
        product_id: get_opt_uuid(row, 6)?,
    })
}

fn row_to_sale(row: &rusqlite::Row<'_>) -> Result<Sale, OpsdeskError> {
    Ok(Sale {
        id: get_uuid(row, 0)?,
        batch_id: get_uuid(row, 1)?,
        product_id: get_uuid(row, 2)?,
        location_id: get_uuid(row, 3)?,
        quantity: get(row, 4)?,
        unit_price: get_decimal(row, 5)?,
        total_price: get_decimal(row, 6)?,
        sale_date: get_datetime(row, 7)?,
        notes: get(row, 8)?,
    })
}

fn row_to_sale_line(row: &rusqlite::Row<'_>) -> Result<SaleLine, OpsdeskError> {
    Ok(SaleLine {
        sale_id: get_uuid(row, 0)?,
        batch_id: get_uuid(row, 1)?,
        product_id: get_uuid(row, 2)?,
        product_name: get(row, 3)?,
        location_id: get_uuid(row, 4)?,
        location_name: get(row, 5)?,
        quantity: get(row, 6)?,
        unit_price: get_decimal(row, 7)?,
        total_price: get_decimal(row, 8)?,
        sale_date: get_datetime(row, 9)?,
    })
}

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, OpsdeskError> {
    Ok(Task {
        id: get_uuid(row, 0)?,
        title: get(row, 1)?,
        description: get(row, 2)?,
        status: get_enum(row, 3)?,
        priority: get_enum(row, 4)?,
        due_date: get_opt_datetime(row, 5)?,
        assigned_to_id: get_opt_uuid(row, 6)?,
        created_by_id: get_uuid(row, 7)?,
        product_id: get_opt_uuid(row, 8)?,
        batch_id: get_opt_uuid(row, 9)?,
        created_at: get_datetime(row, 10)?,
    })
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> Result<TaskComment, OpsdeskError> {
    Ok(TaskComment {
        id: get_uuid(row, 0)?,
        task_id: get_uuid(row, 1)?,
        author_id: get_uuid(row, 2)?,
        content: get(row, 3)?,
        created_at: get_datetime(row, 4)?,
    })
}
