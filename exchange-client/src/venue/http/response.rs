//! Uniform outcome type for every request made through the pipeline.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::venue::error::{ErrorKind, VenueError, VenueResult};

/// Outcome of a REST call: decoded data or an error, plus the transport
/// metadata of the response that produced it.
///
/// Status and headers are `None` when no response was received (validation
/// failure, cancellation before dispatch, connection error).
///
/// # Example
///
/// ```ignore
/// let result = user_stream.start_user_stream(&cancel).await;
/// if result.is_success() {
///     println!("listen key: {}", result.data().unwrap());
/// } else if result.error_kind() == Some(ErrorKind::Cancelled) {
///     return;
/// }
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct RequestResult<T> {
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
    outcome: VenueResult<T>,
}

impl<T> RequestResult<T> {
    /// A successful result.
    pub fn success(status: Option<StatusCode>, headers: Option<HeaderMap>, data: T) -> Self {
        Self {
            status,
            headers,
            outcome: Ok(data),
        }
    }

    /// A failed result carrying response metadata.
    pub fn failure(status: Option<StatusCode>, headers: Option<HeaderMap>, error: VenueError) -> Self {
        Self {
            status,
            headers,
            outcome: Err(error),
        }
    }

    /// A failed result with no response behind it.
    pub fn from_error(error: VenueError) -> Self {
        Self::failure(None, None, error)
    }

    /// Returns true when the call produced data.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers, if a response was received.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn data(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&VenueError> {
        self.outcome.as_ref().err()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(VenueError::kind)
    }

    /// Transform the data, keeping status, headers and any error.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestResult<U> {
        RequestResult {
            status: self.status,
            headers: self.headers,
            outcome: self.outcome.map(f),
        }
    }

    /// Split into status, headers and outcome.
    pub fn into_parts(self) -> (Option<StatusCode>, Option<HeaderMap>, VenueResult<T>) {
        (self.status, self.headers, self.outcome)
    }

    /// Drop the transport metadata.
    pub fn into_result(self) -> VenueResult<T> {
        self.outcome
    }
}
