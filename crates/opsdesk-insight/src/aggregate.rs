//! Pure folds from record rows to summary structures.
//!
//! Nothing here touches storage or the clock; callers pass rows already
//! restricted to the window and, for tasks, the instant to judge overdue
//! against.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use opsdesk_core::types::{Expense, Product, Task, TaskStatus};
use opsdesk_storage::SaleLine;

use crate::types::{
    DashboardSummary, ExpenseSummary, ProductInsight, SalesSummary, TaskSummary,
};

/// `part / whole * 100`, rounded to two places. Zero when `whole` is zero,
/// `None` when the ratio does not fit in a `Decimal`.
pub fn percent(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        return Some(Decimal::ZERO);
    }
    part.checked_div(whole)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(2))
}

/// Completion rate formatted with one decimal, `"0.0%"` for no tasks.
pub fn completion_rate(completed: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", completed as f64 / total as f64 * 100.0)
}

pub fn fold_sales(lines: &[SaleLine], days: u32) -> SalesSummary {
    let mut summary = SalesSummary {
        days,
        ..SalesSummary::default()
    };
    for line in lines {
        let quantity = u64::from(line.quantity);
        summary.total_sales += 1;
        summary.total_revenue += line.total_price;
        summary.total_quantity += quantity;

        let product = summary
            .product_breakdown
            .entry(line.product_name.clone())
            .or_default();
        product.quantity += quantity;
        product.revenue += line.total_price;

        let location = summary
            .location_breakdown
            .entry(line.location_name.clone())
            .or_default();
        location.quantity += quantity;
        location.revenue += line.total_price;
    }
    summary
}

pub fn fold_expenses(expenses: &[Expense], days: u32) -> ExpenseSummary {
    let mut summary = ExpenseSummary {
        days,
        ..ExpenseSummary::default()
    };
    for expense in expenses {
        summary.total_expenses += expense.amount;
        summary.expense_count += 1;
        let bucket = summary
            .breakdown
            .entry(expense.expense_type.clone())
            .or_default();
        bucket.count += 1;
        bucket.total += expense.amount;
    }
    summary
}

pub fn fold_tasks(tasks: &[Task], now: DateTime<Utc>) -> TaskSummary {
    let mut summary = TaskSummary::default();
    for task in tasks {
        summary.total_tasks += 1;
        if task.status == TaskStatus::Completed {
            summary.completed_tasks += 1;
        }
        if task.is_overdue(now) {
            summary.overdue_tasks += 1;
        }
        *summary.status_breakdown.entry(task.status).or_default() += 1;
        *summary.priority_breakdown.entry(task.priority).or_default() += 1;
    }
    summary.completion_rate = completion_rate(summary.completed_tasks, summary.total_tasks);
    summary
}

/// Summarize one product from its recent sales and batch usage.
pub fn product_insight(
    product: &Product,
    recent_sales: &[SaleLine],
    component_count: u32,
) -> ProductInsight {
    let profit = product.profit();
    let profit_margin = if product.cost > Decimal::ZERO {
        percent(profit, product.cost)
    } else {
        None
    };
    ProductInsight {
        product_id: product.id,
        name: product.name.clone(),
        selling_price: product.price,
        cost: product.cost,
        profit,
        profit_margin,
        total_sold: recent_sales.iter().map(|s| u64::from(s.quantity)).sum(),
        revenue: recent_sales.iter().map(|s| s.total_price).sum(),
        component_count,
    }
}

/// Combine window summaries into the dashboard view.
pub fn compose_dashboard(
    sales: &SalesSummary,
    expenses: &ExpenseSummary,
    tasks: &TaskSummary,
    product_count: u64,
) -> DashboardSummary {
    let net_profit = sales.total_revenue - expenses.total_expenses;
    DashboardSummary {
        days: sales.days,
        revenue: sales.total_revenue,
        expenses: expenses.total_expenses,
        net_profit,
        profit_margin: percent(net_profit, sales.total_revenue),
        sales_count: sales.total_sales,
        expense_count: expenses.expense_count,
        product_count,
        pending_tasks: tasks.open_tasks(),
        completion_rate: tasks.completion_rate.clone(),
        top_products: sales.top_products(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use opsdesk_core::types::TaskPriority;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sale(product: &str, location: &str, quantity: u32, unit_price: Decimal) -> SaleLine {
        SaleLine {
            sale_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_name: product.to_string(),
            location_id: Uuid::new_v4(),
            location_name: location.to_string(),
            quantity,
            unit_price,
            total_price: Decimal::from(quantity) * unit_price,
            sale_date: Utc::now(),
        }
    }

    fn expense(kind: &str, amount: Decimal) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            expense_type: kind.to_string(),
            amount,
            date: Utc::now(),
            notes: None,
            batch_id: None,
            product_id: None,
        }
    }

    fn task(status: TaskStatus, priority: TaskPriority) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: None,
            status,
            priority,
            due_date: None,
            assigned_to_id: None,
            created_by_id: Uuid::new_v4(),
            product_id: None,
            batch_id: None,
            created_at: Utc::now(),
        }
    }

    fn product(cost: Decimal, price: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cap".into(),
            description: None,
            formula: None,
            cost,
            price,
        }
    }

    // ---- Percentages ----

    #[test]
    fn test_percent_zero_whole() {
        assert_eq!(percent(dec!(10), Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(percent(dec!(80), dec!(200)), Some(dec!(40)));
        assert_eq!(percent(dec!(1), dec!(3)), Some(dec!(33.33)));
    }

    #[test]
    fn test_percent_out_of_range_is_none() {
        assert_eq!(percent(dec!(100000000000000000000), dec!(0.0000000001)), None);
        assert_eq!(percent(Decimal::MAX, dec!(0.5)), None);
        assert_eq!(percent(Decimal::MAX, Decimal::MAX), Some(dec!(100)));
    }

    #[test]
    fn test_completion_rate_formatting() {
        assert_eq!(completion_rate(0, 0), "0.0%");
        assert_eq!(completion_rate(3, 3), "100.0%");
        assert_eq!(completion_rate(2, 3), "66.7%");
    }

    // ---- Sales ----

    #[test]
    fn test_single_cap_sale() {
        let summary = fold_sales(&[sale("Cap", "Market", 10, dec!(5))], 30);
        assert_eq!(summary.total_revenue, dec!(50));
        assert_eq!(summary.total_quantity, 10);
        assert_eq!(summary.total_sales, 1);
        let cap = &summary.product_breakdown["Cap"];
        assert_eq!(cap.quantity, 10);
        assert_eq!(cap.revenue, dec!(50));
        assert_eq!(summary.product_breakdown.len(), 1);
    }

    #[test]
    fn test_breakdowns_sum_to_totals() {
        let lines = vec![
            sale("Cap", "Market", 10, dec!(5)),
            sale("Mug", "Market", 3, dec!(12.50)),
            sale("Cap", "Online", 2, dec!(5.25)),
            sale("Tote", "Online", 7, dec!(0)),
            sale("Mug", "Stall", 1, dec!(13)),
        ];
        let summary = fold_sales(&lines, 30);

        let product_revenue: Decimal = summary.product_breakdown.values().map(|b| b.revenue).sum();
        let product_quantity: u64 = summary.product_breakdown.values().map(|b| b.quantity).sum();
        let location_revenue: Decimal =
            summary.location_breakdown.values().map(|b| b.revenue).sum();

        assert_eq!(product_revenue, summary.total_revenue);
        assert_eq!(product_quantity, summary.total_quantity);
        assert_eq!(location_revenue, summary.total_revenue);
        assert_eq!(summary.total_revenue, dec!(111.00));
    }

    #[test]
    fn test_empty_sales() {
        let summary = fold_sales(&[], 7);
        assert_eq!(summary.days, 7);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert!(summary.top_products().is_empty());
    }

    // ---- Expenses ----

    #[test]
    fn test_expense_breakdown() {
        let summary = fold_expenses(
            &[
                expense("packaging", dec!(20)),
                expense("packaging", dec!(5.50)),
                expense("rent", dec!(300)),
            ],
            30,
        );
        assert_eq!(summary.total_expenses, dec!(325.50));
        assert_eq!(summary.expense_count, 3);
        assert_eq!(summary.breakdown["packaging"].count, 2);
        assert_eq!(summary.breakdown["packaging"].total, dec!(25.50));
    }

    // ---- Tasks ----

    #[test]
    fn test_task_summary_empty() {
        let summary = fold_tasks(&[], Utc::now());
        assert_eq!(summary.completion_rate, "0.0%");
        assert_eq!(summary.total_tasks, 0);
    }

    #[test]
    fn test_task_summary_all_completed() {
        let tasks = vec![
            task(TaskStatus::Completed, TaskPriority::Low),
            task(TaskStatus::Completed, TaskPriority::High),
        ];
        let summary = fold_tasks(&tasks, Utc::now());
        assert_eq!(summary.completion_rate, "100.0%");
        assert_eq!(summary.priority_breakdown[&TaskPriority::High], 1);
    }

    #[test]
    fn test_task_summary_mixed_and_overdue() {
        let now = Utc::now();
        let mut late = task(TaskStatus::InProgress, TaskPriority::High);
        late.due_date = Some(now - Duration::days(2));
        let tasks = vec![
            late,
            task(TaskStatus::Pending, TaskPriority::Medium),
            task(TaskStatus::Completed, TaskPriority::Medium),
        ];
        let summary = fold_tasks(&tasks, now);
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.overdue_tasks, 1);
        assert_eq!(summary.completion_rate, "33.3%");
        assert_eq!(summary.status_breakdown[&TaskStatus::InProgress], 1);
        assert_eq!(summary.priority_breakdown[&TaskPriority::Medium], 2);
        assert_eq!(summary.open_tasks(), 2);
    }

    // ---- Products ----

    #[test]
    fn test_product_insight_margin_on_cost() {
        let p = product(dec!(4), dec!(5));
        let sales = vec![sale("Cap", "Market", 10, dec!(5)), sale("Cap", "Stall", 2, dec!(5))];
        let insight = product_insight(&p, &sales, 3);
        assert_eq!(insight.profit, dec!(1));
        assert_eq!(insight.profit_margin, Some(dec!(25)));
        assert_eq!(insight.total_sold, 12);
        assert_eq!(insight.revenue, dec!(60));
        assert_eq!(insight.component_count, 3);
    }

    #[test]
    fn test_product_insight_zero_cost_has_no_margin() {
        let insight = product_insight(&product(Decimal::ZERO, dec!(5)), &[], 0);
        assert_eq!(insight.profit_margin, None);
        assert_eq!(insight.total_sold, 0);
    }

    #[test]
    fn test_product_insight_negative_profit() {
        let insight = product_insight(&product(dec!(10), dec!(8)), &[], 0);
        assert_eq!(insight.profit, dec!(-2));
        assert_eq!(insight.profit_margin, Some(dec!(-20)));
    }

    #[test]
    fn test_product_insight_tiny_cost_huge_price_has_no_margin() {
        let p = product(dec!(0.0000000001), dec!(100000000000000000000));
        let insight = product_insight(&p, &[], 0);
        assert_eq!(insight.profit_margin, None);
        assert!(insight.profit > Decimal::ZERO);
    }

    // ---- Dashboard ----

    #[test]
    fn test_dashboard_composition() {
        let sales = fold_sales(&[sale("Cap", "Market", 10, dec!(5))], 30);
        let expenses = fold_expenses(&[expense("rent", dec!(20))], 30);
        let tasks = fold_tasks(&[task(TaskStatus::Pending, TaskPriority::Low)], Utc::now());

        let dashboard = compose_dashboard(&sales, &expenses, &tasks, 4);
        assert_eq!(dashboard.revenue, dec!(50));
        assert_eq!(dashboard.expenses, dec!(20));
        assert_eq!(dashboard.net_profit, dec!(30));
        assert_eq!(dashboard.profit_margin, Some(dec!(60)));
        assert_eq!(dashboard.product_count, 4);
        assert_eq!(dashboard.pending_tasks, 1);
        assert_eq!(dashboard.top_products[0].name, "Cap");
    }

    #[test]
    fn test_dashboard_no_revenue_margin_is_zero() {
        let sales = fold_sales(&[], 30);
        let expenses = fold_expenses(&[expense("rent", dec!(20))], 30);
        let tasks = fold_tasks(&[], Utc::now());

        let dashboard = compose_dashboard(&sales, &expenses, &tasks, 0);
        assert_eq!(dashboard.net_profit, dec!(-20));
        assert_eq!(dashboard.profit_margin, Some(Decimal::ZERO));
    }

    #[test]
    fn test_dashboard_margin_out_of_range_is_none() {
        let sales = fold_sales(&[sale("Cap", "Market", 1, dec!(0.0000000001))], 30);
        let expenses = fold_expenses(&[expense("rent", dec!(100000000000000000000))], 30);
        let tasks = fold_tasks(&[], Utc::now());

        let dashboard = compose_dashboard(&sales, &expenses, &tasks, 1);
        assert!(dashboard.net_profit < Decimal::ZERO);
        assert_eq!(dashboard.profit_margin, None);
    }
}
