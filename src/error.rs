//! Error types for the doc-chat library.
//!
//! Every failure a request can hit is a variant of [`ChatError`]. Handlers turn
//! them into the uniform JSON envelope at the boundary, using [`ChatError::code`]
//! for the nonzero `errcode`.

use thiserror::Error;

/// Errors that can occur while serving chat messages.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Missing or malformed input (empty content, missing parameter, oversized field)
    #[error("{0}")]
    Validation(String),

    /// Referenced document, message, book or member does not exist
    #[error("{0}")]
    NotFound(String),

    /// Comment policy violation, disabled member, insufficient role or missing login
    #[error("{0}")]
    PermissionDenied(String),

    /// Transport failure talking to the inference service
    #[error("Inference service error: {0}")]
    Inference(#[from] reqwest::Error),

    /// Inference service answered with a non-success status
    #[error("Inference service returned {status}: {body}")]
    InferenceStatus {
        /// HTTP status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// Database-related errors
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors while preparing the database location
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse error taxonomy shared by all operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input
    Validation,
    /// Missing entity
    NotFound,
    /// Refused by policy or role
    PermissionDenied,
    /// Inference service failure
    Inference,
    /// Persistence failure
    Storage,
    /// Configuration missing or invalid
    Config,
}

impl ErrorKind {
    /// Label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::Inference => "inference",
            Self::Storage => "storage",
            Self::Config => "config",
        }
    }
}

impl ChatError {
    /// Shorthand for a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Shorthand for a permission error
    pub fn denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Which part of the taxonomy this error belongs to
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Inference(_) | Self::InferenceStatus { .. } => ErrorKind::Inference,
            Self::Storage(_) | Self::Pool(_) | Self::Io(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Nonzero envelope code, mirrored in the HTTP status
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::PermissionDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Storage => 500,
            ErrorKind::Inference => 502,
            ErrorKind::Config => 503,
        }
    }
}

/// Convenience type alias for Result with `ChatError`
pub type Result<T> = std::result::Result<T, ChatError>;
