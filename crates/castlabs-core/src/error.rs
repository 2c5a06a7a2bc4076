//! Error types module
//!
//! All SDK failures are unified under [`PlatformError`]. GraphQL errors returned by
//! the platform are mapped onto dedicated variants by their `errorType`, keeping the
//! raw error object for inspection.

use serde_json::Value;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like lookups that found nothing
    Debug,
    /// Warning level - for recoverable issues like timeouts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be handled by callers
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "PROCESS_NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether repeating the operation may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// GraphQL `Unauthorized` error
    #[error("{message}")]
    Authorization { message: String, data: Value },

    /// GraphQL `MalformedHttpRequestException` error
    #[error("{message}")]
    MalformedRequest { message: String, data: Value },

    /// Any other GraphQL error; displays the platform's message
    #[error("{message}")]
    GraphQl {
        error_type: Option<String>,
        message: String,
        data: Value,
    },

    #[error("Response contains no data for '{0}'")]
    MissingData(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Storage location with name {0} not found")]
    StorageLocationNotFound(String),

    #[error("Process not found: {process} in group {group}")]
    ProcessNotFound { group: String, process: String },

    #[error("Unknown process action: {0}")]
    UnknownAction(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for SDK operations
pub type PlatformResult<T> = Result<T, PlatformError>;

impl PlatformError {
    /// Map a single GraphQL error object onto a typed error by its `errorType`.
    pub fn from_graphql(error: Value) -> Self {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown GraphQL error")
            .to_string();
        let error_type = error
            .get("errorType")
            .and_then(Value::as_str)
            .map(String::from);

        match error_type.as_deref() {
            Some("MalformedHttpRequestException") => PlatformError::MalformedRequest {
                message,
                data: error,
            },
            Some("Unauthorized") => PlatformError::Authorization {
                message,
                data: error,
            },
            _ => PlatformError::GraphQl {
                error_type,
                message,
                data: error,
            },
        }
    }

    /// Raw GraphQL error object, for the GraphQL variants
    pub fn graphql_data(&self) -> Option<&Value> {
        match self {
            PlatformError::Authorization { data, .. }
            | PlatformError::MalformedRequest { data, .. }
            | PlatformError::GraphQl { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PlatformError::ProcessNotFound { .. } | PlatformError::StorageLocationNotFound(_)
        )
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn platform_error_static_metadata(err: &PlatformError) -> (&'static str, bool, LogLevel) {
    match err {
        PlatformError::Config(_) => ("CONFIG_ERROR", false, LogLevel::Error),
        PlatformError::InvalidInput(_) => ("INVALID_INPUT", false, LogLevel::Debug),
        PlatformError::Network(_) => ("NETWORK_ERROR", true, LogLevel::Warn),
        PlatformError::Http { status, .. } if *status >= 500 => {
            ("HTTP_ERROR", true, LogLevel::Error)
        }
        PlatformError::Http { .. } => ("HTTP_ERROR", false, LogLevel::Warn),
        PlatformError::Authentication(_) => ("AUTHENTICATION_FAILED", false, LogLevel::Error),
        PlatformError::Authorization { .. } => ("UNAUTHORIZED", false, LogLevel::Warn),
        PlatformError::MalformedRequest { .. } => ("MALFORMED_REQUEST", false, LogLevel::Error),
        PlatformError::GraphQl { .. } => ("GRAPHQL_ERROR", false, LogLevel::Error),
        PlatformError::MissingData(_) => ("MISSING_DATA", false, LogLevel::Error),
        PlatformError::UnexpectedResponse(_) => ("UNEXPECTED_RESPONSE", false, LogLevel::Error),
        PlatformError::StorageLocationNotFound(_) => {
            ("STORAGE_LOCATION_NOT_FOUND", false, LogLevel::Debug)
        }
        PlatformError::ProcessNotFound { .. } => ("PROCESS_NOT_FOUND", true, LogLevel::Debug),
        PlatformError::UnknownAction(_) => ("UNKNOWN_ACTION", false, LogLevel::Error),
        PlatformError::Timeout(_) => ("TIMEOUT", true, LogLevel::Warn),
        PlatformError::Storage(_) => ("STORAGE_ERROR", true, LogLevel::Error),
        PlatformError::Io(_) => ("IO_ERROR", false, LogLevel::Error),
        PlatformError::Json(_) => ("JSON_ERROR", false, LogLevel::Error),
    }
}

impl ErrorMetadata for PlatformError {
    fn error_code(&self) -> &'static str {
        platform_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        platform_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        platform_error_static_metadata(self).2
    }
}
