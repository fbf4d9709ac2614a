//! Error types for Skratime.

use thiserror::Error;

/// Common error type for Skratime.
#[derive(Error, Debug)]
pub enum SkratimeError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Feed fetching or parsing error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Text-generation model error.
    #[error("model error: {0}")]
    Model(String),

    /// Speech synthesis error.
    #[error("speech error: {0}")]
    Speech(String),

    /// Object storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Message queue error.
    #[error("queue error: {0}")]
    Queue(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for SkratimeError {
    fn from(e: sqlx::Error) -> Self {
        SkratimeError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for SkratimeError {
    fn from(e: serde_json::Error) -> Self {
        SkratimeError::Validation(format!("invalid JSON: {e}"))
    }
}

/// Result type alias for Skratime operations.
pub type Result<T> = std::result::Result<T, SkratimeError>;

/// Returns true if a sqlx error is a unique constraint violation.
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_display() {
        let err = SkratimeError::Auth("invalid password".to_string());
        assert_eq!(err.to_string(), "authentication error: invalid password");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = SkratimeError::NotFound("Category".to_string());
        assert_eq!(err.to_string(), "Category not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = SkratimeError::Conflict("name taken".to_string());
        assert_eq!(err.to_string(), "conflict: name taken");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SkratimeError = io_err.into();
        assert!(matches!(err, SkratimeError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SkratimeError = json_err.into();
        assert!(matches!(err, SkratimeError::Validation(_)));
    }

    #[test]
    fn test_feed_error_display() {
        let err = SkratimeError::Feed("feed parsing failed".to_string());
        assert_eq!(err.to_string(), "feed error: feed parsing failed");
    }
}
