//! Typed aggregate structures returned by the folds.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use opsdesk_core::types::{TaskPriority, TaskStatus};

/// Maximum entries in any ranked view.
pub const TOP_N: usize = 5;

/// Quantity and revenue accumulated for one product or location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesBucket {
    pub quantity: u64,
    pub revenue: Decimal,
}

/// Count and total accumulated for one expense type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpenseBucket {
    pub count: u64,
    pub total: Decimal,
}

/// One row of a ranked (top-N) view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub quantity: u64,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub days: u32,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub total_quantity: u64,
    pub product_breakdown: BTreeMap<String, SalesBucket>,
    pub location_breakdown: BTreeMap<String, SalesBucket>,
}

impl SalesSummary {
    /// Best-selling products by revenue, at most [`TOP_N`].
    pub fn top_products(&self) -> Vec<RankedEntry> {
        rank_sales(&self.product_breakdown)
    }

    /// Best-performing locations by revenue, at most [`TOP_N`].
    pub fn top_locations(&self) -> Vec<RankedEntry> {
        rank_sales(&self.location_breakdown)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub days: u32,
    pub total_expenses: Decimal,
    pub expense_count: u64,
    pub breakdown: BTreeMap<String, ExpenseBucket>,
}

impl ExpenseSummary {
    /// Largest expense types by total, at most [`TOP_N`].
    pub fn top_expense_types(&self) -> Vec<RankedEntry> {
        rank(
            self.breakdown
                .iter()
                .map(|(name, b)| (name, b.count, b.total)),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub overdue_tasks: u64,
    /// Percentage with one decimal, e.g. `"66.7%"`.
    pub completion_rate: String,
    pub status_breakdown: BTreeMap<TaskStatus, u64>,
    pub priority_breakdown: BTreeMap<TaskPriority, u64>,
}

impl TaskSummary {
    /// Tasks not yet completed.
    pub fn open_tasks(&self) -> u64 {
        self.total_tasks - self.completed_tasks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInsight {
    pub product_id: Uuid,
    pub name: String,
    pub selling_price: Decimal,
    pub cost: Decimal,
    pub profit: Decimal,
    /// Profit over cost, in percent. `None` when cost is zero.
    pub profit_margin: Option<Decimal>,
    /// Units sold across the product's most recent sales.
    pub total_sold: u64,
    pub revenue: Decimal,
    /// Number of batch cost lines using this product.
    pub component_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub products: Vec<ProductInsight>,
}

impl ProductSummary {
    /// Products ranked by recent revenue, ties by name, at most [`TOP_N`].
    pub fn top_by_revenue(&self) -> Vec<&ProductInsight> {
        let mut ranked: Vec<&ProductInsight> = self.products.iter().collect();
        ranked.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(TOP_N);
        ranked
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub days: u32,
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net_profit: Decimal,
    /// Net profit over revenue, in percent. Zero when there is no revenue,
    /// `None` when the ratio is out of range.
    pub profit_margin: Option<Decimal>,
    pub sales_count: u64,
    pub expense_count: u64,
    pub product_count: u64,
    pub pending_tasks: u64,
    pub completion_rate: String,
    pub top_products: Vec<RankedEntry>,
}

fn rank_sales(map: &BTreeMap<String, SalesBucket>) -> Vec<RankedEntry> {
    rank(map.iter().map(|(name, b)| (name, b.quantity, b.revenue)))
}

/// Sort by amount descending, break ties by name, keep [`TOP_N`].
fn rank<'a, I>(entries: I) -> Vec<RankedEntry>
where
    I: Iterator<Item = (&'a String, u64, Decimal)>,
{
    let mut ranked: Vec<RankedEntry> = entries
        .map(|(name, quantity, amount)| RankedEntry {
            name: name.clone(),
            quantity,
            amount,
        })
        .collect();
    ranked.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bucket(quantity: u64, revenue: Decimal) -> SalesBucket {
        SalesBucket { quantity, revenue }
    }

    #[test]
    fn test_top_products_sorted_and_capped() {
        let mut summary = SalesSummary::default();
        for (i, name) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
            summary
                .product_breakdown
                .insert(name.to_string(), bucket(1, Decimal::from(i as u32 * 10)));
        }
        let top = summary.top_products();
        assert_eq!(top.len(), TOP_N);
        assert_eq!(top[0].name, "g");
        assert_eq!(top[4].name, "c");
    }

    #[test]
    fn test_ties_broken_by_name() {
        let mut summary = SalesSummary::default();
        summary
            .location_breakdown
            .insert("Stall".into(), bucket(1, dec!(10)));
        summary
            .location_breakdown
            .insert("Online".into(), bucket(2, dec!(10)));
        let top = summary.top_locations();
        assert_eq!(top[0].name, "Online");
        assert_eq!(top[1].name, "Stall");
    }

    #[test]
    fn test_top_expense_types() {
        let mut summary = ExpenseSummary::default();
        summary.breakdown.insert(
            "rent".into(),
            ExpenseBucket {
                count: 1,
                total: dec!(500),
            },
        );
        summary.breakdown.insert(
            "packaging".into(),
            ExpenseBucket {
                count: 4,
                total: dec!(80),
            },
        );
        let top = summary.top_expense_types();
        assert_eq!(top[0].name, "rent");
        assert_eq!(top[1].quantity, 4);
    }

    #[test]
    fn test_products_ranked_by_revenue() {
        let make_insight = |name: &str, revenue: Decimal| ProductInsight {
            product_id: Uuid::new_v4(),
            name: name.into(),
            selling_price: dec!(5),
            cost: dec!(2),
            profit: dec!(3),
            profit_margin: Some(dec!(150)),
            total_sold: 1,
            revenue,
            component_count: 0,
        };
        let summary = ProductSummary {
            products: (0..8u32)
                .map(|i| make_insight(&format!("p{i}"), Decimal::from(i % 4)))
                .collect(),
        };
        let top: Vec<&str> = summary
            .top_by_revenue()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(top, ["p3", "p7", "p2", "p6", "p1"]);
    }

    #[test]
    fn test_task_breakdown_serializes_enum_keys() {
        let mut summary = TaskSummary::default();
        summary.status_breakdown.insert(TaskStatus::InProgress, 2);
        summary.priority_breakdown.insert(TaskPriority::High, 1);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["statusBreakdown"]["in-progress"], 2);
        assert_eq!(json["priorityBreakdown"]["high"], 1);
    }
}
