//! Error types for the conversational interface.

use opsdesk_core::error::OpsdeskError;
use opsdesk_insight::InsightError;

/// Errors from the chat engine.
///
/// A gateway failure is not among them: the orchestrator absorbs it and
/// answers with the fallback reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<OpsdeskError> for ChatError {
    fn from(err: OpsdeskError) -> Self {
        match err {
            OpsdeskError::NotFound(what) => ChatError::NotFound(what),
            OpsdeskError::Validation(msg) => ChatError::Validation(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

impl From<InsightError> for ChatError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::NotFound(what) => ChatError::NotFound(what),
            InsightError::InvalidWindow(msg) => ChatError::Validation(msg),
            InsightError::Storage(msg) => ChatError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::Validation("message cannot be empty".to_string());
        assert_eq!(err.to_string(), "validation error: message cannot be empty");

        let err = ChatError::Unauthorized;
        assert_eq!(err.to_string(), "unauthorized");

        let err = ChatError::NotFound("session 42".to_string());
        assert_eq!(err.to_string(), "not found: session 42");

        let err = ChatError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_chat_error_from_opsdesk_error() {
        let chat_err: ChatError = OpsdeskError::Storage("connection lost".to_string()).into();
        assert!(matches!(chat_err, ChatError::Storage(_)));
        assert!(chat_err.to_string().contains("connection lost"));

        let chat_err: ChatError = OpsdeskError::NotFound("session".to_string()).into();
        assert!(matches!(chat_err, ChatError::NotFound(_)));

        let chat_err: ChatError = OpsdeskError::Validation("title".to_string()).into();
        assert!(matches!(chat_err, ChatError::Validation(_)));
    }

    #[test]
    fn test_chat_error_from_insight_error() {
        let chat_err: ChatError = InsightError::InvalidWindow("0 days".to_string()).into();
        assert!(matches!(chat_err, ChatError::Validation(ref m) if m == "0 days"));

        let chat_err: ChatError = InsightError::Storage("locked".to_string()).into();
        assert!(matches!(chat_err, ChatError::Storage(_)));
    }

    #[test]
    fn test_chat_error_unicode_inner_messages() {
        let err = ChatError::Validation("pesan kosong: \u{00e9}".to_string());
        assert!(err.to_string().contains("\u{00e9}"));
    }
}
