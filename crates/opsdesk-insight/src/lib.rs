//! Opsdesk Insight crate - business aggregates and batch profitability.
//!
//! Provides:
//! - Pure folds turning windowed sales, expenses, tasks and products into
//!   bounded summary structures
//! - A dashboard combining them over one window
//! - A per-batch profitability report
//! - The [`Insights`] service that reads the record store and applies the folds

pub mod aggregate;
pub mod error;
pub mod profitability;
pub mod service;
pub mod types;

pub use error::InsightError;
pub use profitability::{BatchProfitability, LineCost};
pub use service::Insights;
pub use types::{
    DashboardSummary, ExpenseBucket, ExpenseSummary, ProductInsight, ProductSummary, RankedEntry,
    SalesBucket, SalesSummary, TaskSummary,
};
