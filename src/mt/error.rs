//! Error types for the translation pipeline

use std::fmt;
use thiserror::Error;

/// Coarse classification of a backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Authentication,
    RateLimited,
    InvalidRequest,
    Server,
    Network,
    Timeout,
    Cancelled,
    Unknown,
}

impl StatusCategory {
    /// Classify an HTTP status code
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => StatusCategory::Authentication,
            429 => StatusCategory::RateLimited,
            400..=499 => StatusCategory::InvalidRequest,
            500..=599 => StatusCategory::Server,
            _ => StatusCategory::Unknown,
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCategory::Authentication => "authentication",
            StatusCategory::RateLimited => "rate limited",
            StatusCategory::InvalidRequest => "invalid request",
            StatusCategory::Server => "server",
            StatusCategory::Network => "network",
            StatusCategory::Timeout => "timeout",
            StatusCategory::Cancelled => "cancelled",
            StatusCategory::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Errors raised by the translation pipeline and its backends
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Missing credential, malformed options or client settings
    #[error("Configuration error: {0}")]
    Config(String),
    /// Locale tag that cannot be used
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Input that cannot be turned into a content tree
    #[error("Invalid content: {0}")]
    InvalidContent(String),
    /// The translation backend rejected or failed the request
    #[error("Backend error ({status}): {message}")]
    Backend {
        status: StatusCategory,
        message: String,
        code: Option<String>,
    },
    /// The backend answered with a different number of texts than it was sent
    #[error("Backend returned {actual} translations for {expected} texts ({locale})")]
    BatchLengthMismatch {
        locale: String,
        expected: usize,
        actual: usize,
    },
    /// A target locale failed; `source` holds the underlying error
    #[error("Translation to '{locale}' failed: {source}")]
    LocaleFailed {
        locale: String,
        #[source]
        source: Box<MtError>,
    },
}

impl MtError {
    pub fn backend(status: StatusCategory, message: impl Into<String>) -> Self {
        MtError::Backend {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Machine-readable backend code, looking through locale wrappers
    pub fn code(&self) -> Option<&str> {
        match self {
            MtError::Backend { code, .. } => code.as_deref(),
            MtError::LocaleFailed { source, .. } => source.code(),
            _ => None,
        }
    }

    /// Backend status category, looking through locale wrappers
    pub fn status(&self) -> Option<StatusCategory> {
        match self {
            MtError::Backend { status, .. } => Some(*status),
            MtError::LocaleFailed { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Errors raised before any traversal or backend call
    pub fn is_configuration(&self) -> bool {
        matches!(self, MtError::Config(_) | MtError::InvalidLocale(_))
    }
}

/// Result type for pipeline operations
pub type MtResult<T> = Result<T, MtError>;
