//! Venue error types with error classification for retry logic.
//!
//! Every failure the request pipeline can produce is one of these variants.
//! They travel inside [`RequestResult`](super::http::RequestResult) rather than
//! being thrown, so callers branch on [`VenueError::kind`].

use std::time::Duration;
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Result type for venue operations that do not carry transport metadata.
pub type VenueResult<T> = Result<T, VenueError>;

/// Errors that can occur during venue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VenueError {
    /// A required parameter was missing or empty. Raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Measuring the clock drift against the server failed.
    #[error("Time sync failed: {0}")]
    TimeSync(Box<VenueError>),

    /// Network failure, timeout, or unreadable response stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("API error (HTTP {status}, code {code:?}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Venue error code, when the body carried one
        code: Option<i32>,
        /// Venue error message or raw body
        message: String,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// A 2xx body could not be decoded into the expected type.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Client construction or configuration failed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Discriminant of [`VenueError`] for callers that branch on the failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    TimeSync,
    Transport,
    Api,
    Cancelled,
    Deserialization,
    Configuration,
}

impl ErrorClassification for VenueError {
    fn category(&self) -> ErrorCategory {
        match self {
            VenueError::Validation(_) => ErrorCategory::Permanent,
            VenueError::TimeSync(inner) => match inner.category() {
                // The server was unreachable or busy; a later sync may work
                ErrorCategory::Permanent | ErrorCategory::Internal => ErrorCategory::Transient,
                other => other,
            },
            VenueError::Transport(_) => ErrorCategory::Transient,
            VenueError::Api { status, code, .. } => match (*status, *code) {
                (429 | 418, _) | (_, Some(-1003)) => ErrorCategory::ResourceExhausted,
                (401, _) | (_, Some(-2014 | -2015)) => ErrorCategory::Configuration,
                // Timestamp outside recvWindow; a resync fixes it
                (_, Some(-1021)) => ErrorCategory::Transient,
                (500..=599, _) => ErrorCategory::Transient,
                _ => ErrorCategory::Permanent,
            },
            VenueError::Cancelled(_) => ErrorCategory::Permanent,
            VenueError::Deserialization(_) => ErrorCategory::Permanent,
            VenueError::Configuration(_) => ErrorCategory::Configuration,
        }
    }

    fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            VenueError::Transport(_) => Some(Duration::from_millis(500)),
            VenueError::TimeSync(_) => Some(Duration::from_secs(1)),
            VenueError::Api { status: 429, .. } => Some(Duration::from_secs(60)),
            VenueError::Api {
                status: 418, ..
            } => Some(Duration::from_secs(120)),
            VenueError::Api {
                code: Some(-1021), ..
            } => Some(Duration::from_millis(100)),
            _ => match self.category() {
                ErrorCategory::Transient => Some(Duration::from_millis(100)),
                ErrorCategory::ResourceExhausted => Some(Duration::from_secs(1)),
                _ => None,
            },
        }
    }
}

impl VenueError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled(message.into())
    }

    /// Wrap a failure of the server time request.
    ///
    /// Cancellation is passed through unchanged so callers still see
    /// [`ErrorKind::Cancelled`].
    pub fn time_sync(inner: VenueError) -> Self {
        match inner {
            VenueError::Cancelled(_) | VenueError::TimeSync(_) => inner,
            other => Self::TimeSync(Box::new(other)),
        }
    }

    /// Convert a reqwest failure into a transport error.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("request timed out: {}", err))
        } else if err.is_connect() {
            Self::Transport(format!("connection failed: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VenueError::Validation(_) => ErrorKind::Validation,
            VenueError::TimeSync(_) => ErrorKind::TimeSync,
            VenueError::Transport(_) => ErrorKind::Transport,
            VenueError::Api { .. } => ErrorKind::Api,
            VenueError::Cancelled(_) => ErrorKind::Cancelled,
            VenueError::Deserialization(_) => ErrorKind::Deserialization,
            VenueError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if this is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VenueError::Cancelled(_))
    }

    /// Returns true if the venue rejected the credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            VenueError::Api { status: 401, .. }
                | VenueError::Api {
                    code: Some(-2014 | -2015),
                    ..
                }
        )
    }

    /// Returns the venue error code if available.
    pub fn error_code(&self) -> Option<i32> {
        match self {
            VenueError::Api { code, .. } => *code,
            VenueError::TimeSync(inner) => inner.error_code(),
            _ => None,
        }
    }
}
