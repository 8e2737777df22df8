//! Types shared by the chat pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Business domain a question is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    Sales,
    Expenses,
    Tasks,
    Products,
    Dashboard,
    General,
}

impl IntentKind {
    /// Whether the domain reads its rows over a day window.
    pub fn is_windowed(self) -> bool {
        matches!(self, Self::Sales | Self::Expenses | Self::Dashboard)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sales => "sales",
            Self::Expenses => "expenses",
            Self::Tasks => "tasks",
            Self::Products => "products",
            Self::Dashboard => "dashboard",
            Self::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for IntentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(Self::Sales),
            "expenses" => Ok(Self::Expenses),
            "tasks" => Ok(Self::Tasks),
            "products" => Ok(Self::Products),
            "dashboard" => Ok(Self::Dashboard),
            "general" => Ok(Self::General),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

/// A classified question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    /// Day window; `None` for general questions.
    pub days: Option<u32>,
}

/// Result of one handled message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub reply: String,
    pub intent: Intent,
    /// The gateway failed and `reply` is the fallback text.
    pub degraded: bool,
    /// The exchange was saved to `session_id`.
    pub persisted: bool,
    pub session_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_kind_roundtrip() {
        for kind in [
            IntentKind::Sales,
            IntentKind::Expenses,
            IntentKind::Tasks,
            IntentKind::Products,
            IntentKind::Dashboard,
            IntentKind::General,
        ] {
            assert_eq!(kind.to_string().parse::<IntentKind>().unwrap(), kind);
        }
        assert!("weather".parse::<IntentKind>().is_err());
    }

    #[test]
    fn test_windowed_domains() {
        assert!(IntentKind::Sales.is_windowed());
        assert!(IntentKind::Dashboard.is_windowed());
        assert!(!IntentKind::Tasks.is_windowed());
        assert!(!IntentKind::General.is_windowed());
    }

    #[test]
    fn test_intent_serializes_lowercase() {
        let intent = Intent {
            kind: IntentKind::Expenses,
            days: Some(7),
        };
        let json = serde_json::to_value(intent).unwrap();
        assert_eq!(json["kind"], "expenses");
        assert_eq!(json["days"], 7);
    }
}
