use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OpsdeskError, Result};

// =============================================================================
// Enums
// =============================================================================

/// Production batch lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::InProgress => write!(f, "in-progress"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchStatus::Pending),
            "in-progress" => Ok(BatchStatus::InProgress),
            "completed" => Ok(BatchStatus::Completed),
            "cancelled" => Ok(BatchStatus::Cancelled),
            _ => Err(format!("Unknown batch status: {}", s)),
        }
    }
}

/// Task workflow states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in-progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(format!("Unknown task priority: {}", s)),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            _ => Err(format!("Unknown chat role: {}", s)),
        }
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Identity of the authenticated caller.
///
/// Passed explicitly into every operation that enforces ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A place where sales happen (shop, market stall, online channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesLocation {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub formula: Option<String>,
    pub cost: Decimal,
    pub price: Decimal,
}

impl Product {
    /// Per-unit profit. Negative when the product sells below cost.
    pub fn profit(&self) -> Decimal {
        self.price - self.cost
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(OpsdeskError::Validation("product name is required".into()));
        }
        if self.cost.is_sign_negative() || self.price.is_sign_negative() {
            return Err(OpsdeskError::Validation(
                "product cost and price must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// A production run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: Uuid,
    pub name: String,
    pub status: BatchStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub target_segments: Option<String>,
    pub target_sales_locations: Option<String>,
}

/// One product line within a batch, carrying its total cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProduct {
    pub product_id: Uuid,
    pub quantity: u32,
    pub cost: Decimal,
}

impl BatchProduct {
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(OpsdeskError::Validation(
                "batch line quantity must be positive".into(),
            ));
        }
        if self.cost.is_sign_negative() {
            return Err(OpsdeskError::Validation(
                "batch line cost must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub batch_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

impl Expense {
    pub fn validate(&self) -> Result<()> {
        if self.expense_type.trim().is_empty() {
            return Err(OpsdeskError::Validation("expense type is required".into()));
        }
        if self.amount.is_sign_negative() {
            return Err(OpsdeskError::Validation(
                "expense amount must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// A recorded sale.
///
/// Invariant: `total_price == quantity * unit_price`. Construct through
/// [`Sale::new`] and change pricing through [`Sale::reprice`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub location_id: Uuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sale_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Sale {
    pub fn new(
        batch_id: Uuid,
        product_id: Uuid,
        location_id: Uuid,
        quantity: u32,
        unit_price: Decimal,
        sale_date: DateTime<Utc>,
    ) -> Result<Self> {
        let total_price = sale_total(quantity, unit_price)?;
        Ok(Self {
            id: Uuid::new_v4(),
            batch_id,
            product_id,
            location_id,
            quantity,
            unit_price,
            total_price,
            sale_date,
            notes: None,
        })
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Change quantity and unit price, recomputing the total.
    pub fn reprice(&mut self, quantity: u32, unit_price: Decimal) -> Result<()> {
        let total_price = sale_total(quantity, unit_price)?;
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.total_price = total_price;
        Ok(())
    }
}

/// Validated `quantity * unit_price`.
fn sale_total(quantity: u32, unit_price: Decimal) -> Result<Decimal> {
    if quantity == 0 {
        return Err(OpsdeskError::Validation(
            "sale quantity must be positive".into(),
        ));
    }
    if unit_price.is_sign_negative() {
        return Err(OpsdeskError::Validation(
            "sale unit price must not be negative".into(),
        ));
    }
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or_else(|| OpsdeskError::Validation("sale total is out of range".into()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub product_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A task is overdue when it is unfinished and its due date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Insertion sequence; breaks ties between messages with equal timestamps.
    pub seq: i64,
}
