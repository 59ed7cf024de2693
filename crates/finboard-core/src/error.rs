//! Error types for finboard-core
//!
//! Two families live here. `FetchError` is the taxonomy of things that can
//! go wrong between a view and the backend: cancellation (silent), network
//! or server failure (transient banner, previous rows kept) and malformed
//! responses (logged, surfaced as an error state). `CoreError` covers
//! everything else the core does: parsing user input, sessions, export.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Cancelled,
    NetworkError,
    ServerError,
    MalformedResponse,
    InvalidMonth,
    InvalidDate,
    InvalidKind,
    ExportError,
    SessionError,
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Cancelled => write!(f, "CANCELLED"),
            ErrorCode::NetworkError => write!(f, "NETWORK_ERROR"),
            ErrorCode::ServerError => write!(f, "SERVER_ERROR"),
            ErrorCode::MalformedResponse => write!(f, "MALFORMED_RESPONSE"),
            ErrorCode::InvalidMonth => write!(f, "INVALID_MONTH"),
            ErrorCode::InvalidDate => write!(f, "INVALID_DATE"),
            ErrorCode::InvalidKind => write!(f, "INVALID_KIND"),
            ErrorCode::ExportError => write!(f, "EXPORT_ERROR"),
            ErrorCode::SessionError => write!(f, "SESSION_ERROR"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Expected, never shown to the user
    Debug,
    Info,
    /// Operation failed but the view keeps working on previous data
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Detailed error information for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Failure of a single backend request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request cancelled")]
    Cancelled,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {message}")]
    Malformed { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        FetchError::Malformed {
            message: message.into(),
        }
    }

    /// Cancellation is expected and never user-visible
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FetchError::Cancelled => ErrorCode::Cancelled,
            FetchError::Network { .. } => ErrorCode::NetworkError,
            FetchError::Server { .. } => ErrorCode::ServerError,
            FetchError::Malformed { .. } => ErrorCode::MalformedResponse,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FetchError::Cancelled => ErrorSeverity::Debug,
            FetchError::Network { .. } => ErrorSeverity::Warning,
            FetchError::Server { status, .. } if *status >= 500 => ErrorSeverity::Error,
            FetchError::Server { .. } => ErrorSeverity::Warning,
            FetchError::Malformed { .. } => ErrorSeverity::Error,
        }
    }

    /// Short text for the error banner
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Cancelled => String::new(),
            FetchError::Network { .. } => {
                "Could not reach the server. Showing the last loaded data.".to_string()
            }
            FetchError::Server { status: 401, .. } => {
                "Your session has expired. Please log in again.".to_string()
            }
            FetchError::Server { status, .. } => {
                format!("The server rejected the request ({}).", status)
            }
            FetchError::Malformed { .. } => {
                "The server sent data in an unexpected format.".to_string()
            }
        }
    }
}

/// Main error type for finboard-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid month: {value}")]
    InvalidMonth { value: String },

    #[error("Invalid date: {value}")]
    InvalidDate { value: String },

    #[error("Unknown activity kind: {code}")]
    InvalidKind { code: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::InvalidMonth { .. } => ErrorCode::InvalidMonth,
            CoreError::InvalidDate { .. } => ErrorCode::InvalidDate,
            CoreError::InvalidKind { .. } => ErrorCode::InvalidKind,
            CoreError::Export { .. } => ErrorCode::ExportError,
            CoreError::Session { .. } => ErrorCode::SessionError,
            CoreError::Io(_) => ErrorCode::IoError,
            CoreError::Fetch(e) => e.code(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::InvalidMonth { .. }
            | CoreError::InvalidDate { .. }
            | CoreError::InvalidKind { .. } => ErrorSeverity::Warning,
            CoreError::Export { .. } | CoreError::Io(_) => ErrorSeverity::Error,
            CoreError::Session { .. } => ErrorSeverity::Warning,
            CoreError::Fetch(e) => e.severity(),
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::InvalidMonth { value } => {
                details = details.with_detail(serde_json::json!({ "input": value }));
                details = details.with_suggestion("Months are written as YYYY-MM, e.g. 2025-07.".to_string());
            }
            CoreError::InvalidDate { .. } => {
                details = details.with_suggestion("Dates are written as YYYY-MM-DD.".to_string());
            }
            CoreError::InvalidKind { code } => {
                details = details.with_detail(serde_json::json!({ "code": code }));
                details = details.with_suggestion(
                    "The backend may have added a new kind; update the kind table.".to_string(),
                );
            }
            CoreError::Session { .. } => {
                details = details.with_suggestion("Run `finboard login` again.".to_string());
            }
            CoreError::Fetch(FetchError::Network { .. }) => {
                details = details.with_suggestion(
                    "Check backend.base_url and that the server is running.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Request generation of the view that failed
    pub generation: Option<u64>,
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            generation: None,
            data: serde_json::json!({}),
        }
    }

    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    fn log_fetch_error(&self, error: &FetchError, context: &ErrorContext);
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using the log crate
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_fetch_error(&self, error: &FetchError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Debug | ErrorSeverity::Info => log::debug!(
                target: "finboard::fetch",
                "{} - Operation: {} - Generation: {:?}",
                error,
                context.operation,
                context.generation
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "finboard::fetch",
                "[{}] {} - Operation: {} - Generation: {:?}",
                error.code(),
                error,
                context.operation,
                context.generation
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => log::error!(
                target: "finboard::fetch",
                "[{}] {} - Operation: {} - Generation: {:?} - Data: {}",
                error.code(),
                error,
                context.operation,
                context.generation,
                context.data
            ),
        }
    }

    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::error!(
            target: "finboard::error",
            "ERROR [{}] {} - Operation: {}",
            error.code(),
            error.to_details(),
            context.operation
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NetworkError.to_string(), "NETWORK_ERROR");
        assert_eq!(ErrorCode::MalformedResponse.to_string(), "MALFORMED_RESPONSE");
        assert_eq!(ErrorCode::InvalidMonth.to_string(), "INVALID_MONTH");
    }

    #[test]
    fn test_fetch_error_taxonomy() {
        assert!(FetchError::Cancelled.is_cancellation());
        assert!(!FetchError::network("timed out").is_cancellation());

        assert_eq!(FetchError::Cancelled.severity(), ErrorSeverity::Debug);
        assert_eq!(FetchError::network("reset").severity(), ErrorSeverity::Warning);
        assert_eq!(FetchError::malformed("data").severity(), ErrorSeverity::Error);
        assert_eq!(
            FetchError::Server { status: 503, message: String::new() }.severity(),
            ErrorSeverity::Error
        );
    }

    #[test]
    fn test_user_message_never_empty_for_visible_errors() {
        assert!(FetchError::Cancelled.user_message().is_empty());
        assert!(!FetchError::network("x").user_message().is_empty());
        assert!(FetchError::Server { status: 401, message: String::new() }
            .user_message()
            .contains("log in"));
    }

    #[test]
    fn test_core_error_wraps_fetch_error() {
        let error: CoreError = FetchError::network("refused").into();
        assert_eq!(error.code(), ErrorCode::NetworkError);
        assert!(!error.to_details().suggestions.is_empty());
    }

    #[test]
    fn test_error_details_invalid_month() {
        let details = CoreError::InvalidMonth { value: "2025-13".to_string() }.to_details();
        assert_eq!(details.code, ErrorCode::InvalidMonth);
        assert!(details.details.is_some());
        assert!(details.to_string().contains("YYYY-MM"));
    }

    #[test]
    fn test_error_context() {
        let context = ErrorContext::new("list_transactions")
            .with_generation(7)
            .with_data("page", serde_json::json!(2));

        assert_eq!(context.operation, "list_transactions");
        assert_eq!(context.generation, Some(7));
        assert_eq!(context.data["page"], 2);
    }
}
