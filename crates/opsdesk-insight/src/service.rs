//! Insights service: reads windowed rows from the record store and hands
//! them to the folds.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use opsdesk_storage::{
    BatchRepository, Database, ExpenseRepository, ProductRepository, SalesRepository,
    TaskRepository,
};

use crate::aggregate;
use crate::error::InsightError;
use crate::profitability::{self, BatchProfitability};
use crate::types::{DashboardSummary, ExpenseSummary, ProductSummary, SalesSummary, TaskSummary};

/// Recent sales considered per product in the product summary.
pub const RECENT_SALES_PER_PRODUCT: u32 = 50;

pub use opsdesk_core::config::MAX_WINDOW_DAYS;

pub struct Insights {
    sales: SalesRepository,
    expenses: ExpenseRepository,
    products: ProductRepository,
    tasks: TaskRepository,
    batches: BatchRepository,
}

impl Insights {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            sales: SalesRepository::new(db.clone()),
            expenses: ExpenseRepository::new(db.clone()),
            products: ProductRepository::new(db.clone()),
            tasks: TaskRepository::new(db.clone()),
            batches: BatchRepository::new(db),
        }
    }

    pub fn sales(&self, days: u32) -> Result<SalesSummary, InsightError> {
        let start = window_start(days)?;
        let lines = self.sales.find_since(start)?;
        debug!(days, rows = lines.len(), "Folding sales");
        Ok(aggregate::fold_sales(&lines, days))
    }

    pub fn expenses(&self, days: u32) -> Result<ExpenseSummary, InsightError> {
        let start = window_start(days)?;
        let rows = self.expenses.find_since(start)?;
        debug!(days, rows = rows.len(), "Folding expenses");
        Ok(aggregate::fold_expenses(&rows, days))
    }

    /// Summary over every task; tasks have no window.
    pub fn tasks(&self) -> Result<TaskSummary, InsightError> {
        let tasks = self.tasks.list_all()?;
        Ok(aggregate::fold_tasks(&tasks, Utc::now()))
    }

    /// Summary over every product, using each one's most recent sales.
    pub fn products(&self) -> Result<ProductSummary, InsightError> {
        let products = self.products.list_all()?;
        let components = self.products.component_counts()?;

        let mut insights = Vec::with_capacity(products.len());
        for product in &products {
            let recent = self
                .sales
                .recent_for_product(product.id, RECENT_SALES_PER_PRODUCT)?;
            let count = components.get(&product.id).copied().unwrap_or(0);
            insights.push(aggregate::product_insight(product, &recent, count));
        }
        Ok(ProductSummary { products: insights })
    }

    pub fn dashboard(&self, days: u32) -> Result<DashboardSummary, InsightError> {
        let sales = self.sales(days)?;
        let expenses = self.expenses(days)?;
        let tasks = self.tasks()?;
        let product_count = self.products.count()?;
        Ok(aggregate::compose_dashboard(
            &sales,
            &expenses,
            &tasks,
            product_count,
        ))
    }

    pub fn batch_profitability(&self, batch_id: Uuid) -> Result<BatchProfitability, InsightError> {
        let batch = self
            .batches
            .find_by_id(batch_id)?
            .ok_or_else(|| InsightError::NotFound(format!("batch {}", batch_id)))?;
        let lines = self.batches.lines(batch_id)?;
        let expenses = self.expenses.find_by_batch(batch_id)?;
        let sales = self.sales.find_by_batch(batch_id)?;
        Ok(profitability::compute(&batch, &lines, &expenses, &sales))
    }
}

fn window_start(days: u32) -> Result<chrono::DateTime<Utc>, InsightError> {
    if days == 0 || days > MAX_WINDOW_DAYS {
        return Err(InsightError::InvalidWindow(format!(
            "days must be between 1 and {}, got {}",
            MAX_WINDOW_DAYS, days
        )));
    }
    Ok(Utc::now() - Duration::days(i64::from(days)))
}
