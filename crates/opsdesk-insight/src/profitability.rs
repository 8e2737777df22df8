//! Batch profitability: cost lines, expenses and sales of one batch folded
//! into a profit report.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use opsdesk_core::types::{Batch, BatchStatus, Expense};
use opsdesk_storage::{BatchLine, SaleLine};

use crate::aggregate::percent;
use crate::types::SalesBucket;

/// A batch cost line with its derived unit cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub cost: Decimal,
    /// `cost / quantity` to four places; `None` when quantity is zero.
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProfitability {
    pub batch_id: Uuid,
    pub batch_name: String,
    pub status: BatchStatus,
    pub product_costs: Decimal,
    pub total_expenses: Decimal,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
    pub total_quantity_sold: u64,
    pub sales_count: u64,
    pub profit: Decimal,
    /// Profit over revenue, in percent. Zero when there is no revenue,
    /// `None` when the ratio is out of range.
    pub profit_margin: Option<Decimal>,
    pub lines: Vec<LineCost>,
    pub sales_by_product: BTreeMap<String, SalesBucket>,
    pub sales_by_location: BTreeMap<String, SalesBucket>,
}

/// Build the report from rows already loaded for `batch`.
pub fn compute(
    batch: &Batch,
    lines: &[BatchLine],
    expenses: &[Expense],
    sales: &[SaleLine],
) -> BatchProfitability {
    let product_costs: Decimal = lines.iter().map(|l| l.cost).sum();
    let total_expenses: Decimal = expenses.iter().map(|e| e.amount).sum();
    let total_cost = product_costs + total_expenses;

    let mut total_revenue = Decimal::ZERO;
    let mut total_quantity_sold = 0u64;
    let mut sales_by_product: BTreeMap<String, SalesBucket> = BTreeMap::new();
    let mut sales_by_location: BTreeMap<String, SalesBucket> = BTreeMap::new();
    for sale in sales {
        let quantity = u64::from(sale.quantity);
        total_revenue += sale.total_price;
        total_quantity_sold += quantity;
        for bucket in [
            sales_by_product.entry(sale.product_name.clone()).or_default(),
            sales_by_location.entry(sale.location_name.clone()).or_default(),
        ] {
            bucket.quantity += quantity;
            bucket.revenue += sale.total_price;
        }
    }

    let profit = total_revenue - total_cost;

    BatchProfitability {
        batch_id: batch.id,
        batch_name: batch.name.clone(),
        status: batch.status,
        product_costs,
        total_expenses,
        total_cost,
        total_revenue,
        total_quantity_sold,
        sales_count: sales.len() as u64,
        profit,
        profit_margin: percent(profit, total_revenue),
        lines: lines.iter().map(line_cost).collect(),
        sales_by_product,
        sales_by_location,
    }
}

fn line_cost(line: &BatchLine) -> LineCost {
    let unit_cost = if line.quantity == 0 {
        None
    } else {
        Some((line.cost / Decimal::from(line.quantity)).round_dp(4))
    };
    LineCost {
        product_id: line.product_id,
        product_name: line.product_name.clone(),
        quantity: line.quantity,
        cost: line.cost,
        unit_cost,
    }
}
