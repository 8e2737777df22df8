//! Prompt synthesis.
//!
//! Renders an aggregate into a short text block used as grounding context
//! for the text-generation gateway. Every list is capped at [`TOP_N`]
//! entries and free text is truncated, so a prompt's size does not grow
//! with the data.

use std::fmt::Write;

use rust_decimal::Decimal;

use opsdesk_insight::types::{RankedEntry, TOP_N};
use opsdesk_insight::{DashboardSummary, ExpenseSummary, ProductSummary, SalesSummary, TaskSummary};

/// Longest question passed through, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

/// Longest product, location or expense-type name rendered.
pub const MAX_NAME_CHARS: usize = 60;

const INSTRUCTION: &str =
    "Answer the question using only the data above. Be concise and reply in the language of the question.";

const GENERAL_INSTRUCTION: &str =
    "You are an assistant for a small manufacturing and retail business. Answer concisely.";

/// The aggregate gathered for a classified question.
#[derive(Debug, Clone)]
pub enum Aggregate {
    Sales(SalesSummary),
    Expenses(ExpenseSummary),
    Tasks(TaskSummary),
    Products(ProductSummary),
    Dashboard(DashboardSummary),
}

/// Render `aggregate` followed by the question and the answer instruction.
pub fn synthesize(aggregate: &Aggregate, question: &str) -> String {
    let mut out = match aggregate {
        Aggregate::Sales(s) => sales_block(s),
        Aggregate::Expenses(e) => expenses_block(e),
        Aggregate::Tasks(t) => tasks_block(t),
        Aggregate::Products(p) => products_block(p),
        Aggregate::Dashboard(d) => dashboard_block(d),
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "Question: {}", truncate(question.trim(), MAX_QUESTION_CHARS));
    out.push_str(INSTRUCTION);
    out
}

/// Prompt for a question outside the business domains.
pub fn general(question: &str) -> String {
    format!(
        "{}\n\nQuestion: {}",
        GENERAL_INSTRUCTION,
        truncate(question.trim(), MAX_QUESTION_CHARS)
    )
}

// =============================================================================
// Per-domain blocks
// =============================================================================

fn sales_block(s: &SalesSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sales over the last {} days:", s.days);
    let _ = writeln!(out, "- Transactions: {}", s.total_sales);
    let _ = writeln!(out, "- Units sold: {}", s.total_quantity);
    let _ = writeln!(out, "- Revenue: {}", money(s.total_revenue));
    ranked_section(&mut out, "Top products by revenue", &s.top_products(), "units");
    ranked_section(&mut out, "Top locations by revenue", &s.top_locations(), "units");
    out
}

fn expenses_block(e: &ExpenseSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Expenses over the last {} days:", e.days);
    let _ = writeln!(out, "- Entries: {}", e.expense_count);
    let _ = writeln!(out, "- Total: {}", money(e.total_expenses));
    ranked_section(&mut out, "Largest expense types", &e.top_expense_types(), "entries");
    out
}

fn tasks_block(t: &TaskSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tasks:");
    let _ = writeln!(out, "- Total: {}", t.total_tasks);
    let _ = writeln!(out, "- Completed: {} ({})", t.completed_tasks, t.completion_rate);
    let _ = writeln!(out, "- Overdue: {}", t.overdue_tasks);
    if !t.status_breakdown.is_empty() {
        let _ = writeln!(out, "By status:");
        for (status, count) in &t.status_breakdown {
            let _ = writeln!(out, "- {}: {}", status, count);
        }
    }
    if !t.priority_breakdown.is_empty() {
        let _ = writeln!(out, "By priority:");
        for (priority, count) in t.priority_breakdown.iter().rev() {
            let _ = writeln!(out, "- {}: {}", priority, count);
        }
    }
    out
}

fn products_block(p: &ProductSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Products: {}", p.products.len());

    let ranked = p.top_by_revenue();
    if !ranked.is_empty() {
        let _ = writeln!(out, "Top products by recent revenue:");
    }
    for product in ranked {
        let margin = product
            .profit_margin
            .map(|m| format!("{}%", m.round_dp(2)))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "- {}: price {}, cost {}, profit {}, margin {}, sold {}, revenue {}",
            truncate(&product.name, MAX_NAME_CHARS),
            money(product.selling_price),
            money(product.cost),
            money(product.profit),
            margin,
            product.total_sold,
            money(product.revenue),
        );
    }
    out
}

fn dashboard_block(d: &DashboardSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Business overview for the last {} days:", d.days);
    let _ = writeln!(out, "- Revenue: {}", money(d.revenue));
    let _ = writeln!(out, "- Expenses: {}", money(d.expenses));
    let margin = d
        .profit_margin
        .map(|m| format!("{}%", m))
        .unwrap_or_else(|| "N/A".to_string());
    let _ = writeln!(out, "- Net profit: {} ({} margin)", money(d.net_profit), margin);
    let _ = writeln!(out, "- Sales: {}, expense entries: {}", d.sales_count, d.expense_count);
    let _ = writeln!(out, "- Products: {}", d.product_count);
    let _ = writeln!(
        out,
        "- Pending tasks: {}, completion rate {}",
        d.pending_tasks, d.completion_rate
    );
    ranked_section(&mut out, "Top products by revenue", &d.top_products, "units");
    out
}

fn ranked_section(out: &mut String, heading: &str, entries: &[RankedEntry], unit: &str) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for entry in entries.iter().take(TOP_N) {
        let _ = writeln!(
            out,
            "- {}: {} ({} {})",
            truncate(&entry.name, MAX_NAME_CHARS),
            money(entry.amount),
            entry.quantity,
            unit
        );
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Cut `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(max).collect();
    cut.push_str("...");
    cut
}
