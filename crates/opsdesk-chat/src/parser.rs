//! Question classifier.
//!
//! Maps a free-text question to a business domain and a day window using
//! bilingual (English and Indonesian) keyword sets checked in a fixed
//! priority order.

use regex::Regex;
use std::sync::LazyLock;

use opsdesk_insight::service::MAX_WINDOW_DAYS;

use crate::types::{Intent, IntentKind};

/// Window used when the question names no day count.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

static DAYS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,6})\s*(?:days?|hari)\b").unwrap());

/// Keyword sets in priority order. The first set that matches wins, so a
/// question mentioning both sales and tasks is a sales question.
static DOMAIN_PATTERNS: LazyLock<Vec<(IntentKind, Regex)>> = LazyLock::new(|| {
    let mk = |words: &[&str]| -> Regex {
        Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("Invalid domain regex")
    };

    vec![
        (
            IntentKind::Sales,
            mk(&[
                "sales?", "sold", "selling", "revenue", "income", "penjualan", "jual",
                "terjual", "omzet", "omset", "pendapatan",
            ]),
        ),
        (
            IntentKind::Expenses,
            mk(&[
                "expenses?", "spending", "spent", "spend", "costs", "pengeluaran", "biaya",
                "belanja",
            ]),
        ),
        (
            IntentKind::Tasks,
            mk(&[
                "tasks?", "todos?", "to-do", "assignments?", "overdue", "deadlines?",
                "tugas", "pekerjaan", "tenggat",
            ]),
        ),
        (
            IntentKind::Products,
            mk(&[
                "products?", "items?", "formula", "margins?", "produk", "barang",
            ]),
        ),
        (
            IntentKind::Dashboard,
            mk(&[
                "dashboard", "overview", "summary", "overall", "business", "performance",
                "profits?", "profitability", "loss(?:es)?", "ringkasan", "ikhtisar", "bisnis",
                "kinerja", "laba", "rugi", "keuntungan",
            ]),
        ),
    ]
});

// =============================================================================
// Classifier
// =============================================================================

/// Deterministic keyword classifier.
#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    default_days: u32,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl IntentClassifier {
    pub fn new(default_days: u32) -> Self {
        Self {
            default_days: default_days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    /// Classify `question`. General questions carry no day window.
    pub fn classify(&self, question: &str) -> Intent {
        let lowered = question.to_lowercase();

        let kind = DOMAIN_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(&lowered))
            .map(|(kind, _)| *kind)
            .unwrap_or(IntentKind::General);

        let days = match kind {
            IntentKind::General => None,
            _ => Some(self.extract_days(&lowered)),
        };

        Intent { kind, days }
    }

    /// First `<N> day(s)` / `<N> hari` in the text. Zero falls back to the
    /// default; anything beyond the longest window is clamped to it.
    fn extract_days(&self, lowered: &str) -> u32 {
        DAYS_PATTERN
            .captures(lowered)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|&n| n > 0)
            .map(|n| n.min(MAX_WINDOW_DAYS))
            .unwrap_or(self.default_days)
    }
}
