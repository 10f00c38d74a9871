//! Error types for the document model, the query builder and the client facade.

use std::fmt;

use serde_json::Value;

/// Errors that can occur while building, resolving or persisting resources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller supplied missing or malformed arguments.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the misuse.
        message: String,
    },

    /// No resource matched a fetch, or a reference cannot be resolved.
    #[error("Resource not found: {message}")]
    NotFound {
        /// What was being looked up.
        message: String,
    },

    /// A single-result lookup matched more than one resource.
    #[error("Multiple resources found for {resource_type}: expected one")]
    MultipleResults {
        /// The resource type that was searched.
        resource_type: String,
    },

    /// The backend rejected a write with a structured outcome.
    #[error("Validation failed: {message}")]
    Validation {
        /// Diagnostics collected from the outcome issues.
        message: String,
        /// The OperationOutcome payload returned by the backend.
        outcome: Value,
    },

    /// A path accessor walked into a value of the wrong shape.
    #[error("Invalid path: {message}")]
    InvalidPath {
        /// Description of where the path broke.
        message: String,
    },

    /// The transport failed or the backend answered with an unexpected status.
    #[error("Transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates a new `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error for a `(type, id)` pair.
    #[must_use]
    pub fn resource_not_found(resource_type: &str, id: &str) -> Self {
        Self::not_found(format!("{resource_type}/{id}"))
    }

    /// Creates a new `MultipleResults` error.
    #[must_use]
    pub fn multiple_results(resource_type: impl Into<String>) -> Self {
        Self::MultipleResults {
            resource_type: resource_type.into(),
        }
    }

    /// Creates a new `Validation` error carrying the backend outcome.
    #[must_use]
    pub fn validation(message: impl Into<String>, outcome: Value) -> Self {
        Self::Validation {
            message: message.into(),
            outcome,
        }
    }

    /// Creates a new `InvalidPath` error.
    #[must_use]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an argument error.
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    /// Returns `true` if the backend rejected the payload.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if a single-result lookup was ambiguous.
    #[must_use]
    pub fn is_multiple_results(&self) -> bool {
        matches!(self, Self::MultipleResults { .. })
    }

    /// The structured outcome attached to a validation error.
    #[must_use]
    pub fn outcome(&self) -> Option<&Value> {
        match self {
            Self::Validation { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } | Self::InvalidPath { .. } => ErrorCategory::Argument,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::MultipleResults { .. } => ErrorCategory::MultipleResults,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Json(_) | Self::Url(_) => ErrorCategory::Serialization,
        }
    }
}

/// Categories of errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Argument,
    NotFound,
    MultipleResults,
    Validation,
    Transport,
    Serialization,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argument => write!(f, "argument"),
            Self::NotFound => write!(f, "not_found"),
            Self::MultipleResults => write!(f, "multiple_results"),
            Self::Validation => write!(f, "validation"),
            Self::Transport => write!(f, "transport"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
