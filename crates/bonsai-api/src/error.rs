//! Error types for the Bonsai API client

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cancel::CancelReason;
use crate::credential::CredentialError;
use crate::response::Response;
use crate::transport::TransportError;

/// HTTP statuses the API documents as distinct failure modes.
///
/// Compare errors against these with [`Error::is`] or [`ResponseError::is`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiStatus {
    Unauthorized,
    PaymentRequired,
    Forbidden,
    NotFound,
    UnprocessableEntity,
    TooManyRequests,
}

impl ApiStatus {
    pub const fn code(self) -> u16 {
        match self {
            ApiStatus::Unauthorized => 401,
            ApiStatus::PaymentRequired => 402,
            ApiStatus::Forbidden => 403,
            ApiStatus::NotFound => 404,
            ApiStatus::UnprocessableEntity => 422,
            ApiStatus::TooManyRequests => 429,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            401 => Some(ApiStatus::Unauthorized),
            402 => Some(ApiStatus::PaymentRequired),
            403 => Some(ApiStatus::Forbidden),
            404 => Some(ApiStatus::NotFound),
            422 => Some(ApiStatus::UnprocessableEntity),
            429 => Some(ApiStatus::TooManyRequests),
            _ => None,
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ApiStatus::Unauthorized => "unauthorized",
            ApiStatus::PaymentRequired => "payment required",
            ApiStatus::Forbidden => "forbidden",
            ApiStatus::NotFound => "not found",
            ApiStatus::UnprocessableEntity => "unprocessable entity",
            ApiStatus::TooManyRequests => "too many requests",
        };
        write!(f, "{text} ({})", self.code())
    }
}

/// Error body returned by the API for `>= 400` responses.
///
/// ```json
/// {"errors": ["Cluster not found."], "status": 404}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseError {
    pub errors: Vec<String>,
    pub status: u16,
}

impl ResponseError {
    pub fn new(status: u16) -> Self {
        Self {
            errors: Vec::new(),
            status,
        }
    }

    pub fn with_errors(status: u16, errors: Vec<String>) -> Self {
        Self { errors, status }
    }

    pub fn is(&self, status: ApiStatus) -> bool {
        self.status == status.code()
    }

    pub fn api_status(&self) -> Option<ApiStatus> {
        ApiStatus::from_code(self.status)
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "request failed with status {}", self.status)
        } else {
            write!(f, "{} ({})", self.errors.join("; "), self.status)
        }
    }
}

impl std::error::Error for ResponseError {}

/// Failure while waiting on a rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("cancelled while waiting for a rate limit token")]
    Cancelled,

    #[error("deadline exceeded while waiting for a rate limit token")]
    DeadlineExceeded,

    /// The next token arrives after the caller's deadline.
    #[error("next rate limit token in {wait:?} would exceed the deadline")]
    WouldExceedDeadline { wait: Duration },
}

impl From<CancelReason> for RateLimitError {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => RateLimitError::Cancelled,
            CancelReason::DeadlineExceeded => RateLimitError::DeadlineExceeded,
        }
    }
}

/// Errors that can occur when using the Bonsai API client
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(#[from] CredentialError),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("rate limiter: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("{0}")]
    Cancelled(#[from] CancelReason),

    #[error("API error: {source}")]
    Api {
        #[source]
        source: ResponseError,
        response: Box<Response>,
    },

    #[error("failed to decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to encode query string: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    #[error("{operation} {url}: {source}")]
    Request {
        operation: String,
        url: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, skipping [`Error::Request`] context wrappers.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Request { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn response_error(&self) -> Option<&ResponseError> {
        match self.root() {
            Error::Api { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The HTTP response that produced this error, when one was received.
    pub fn response(&self) -> Option<&Response> {
        match self.root() {
            Error::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.response_error().map(|err| err.status)
    }

    /// Compare against a status sentinel, looking through context wrappers.
    pub fn is(&self, status: ApiStatus) -> bool {
        self.response_error().is_some_and(|err| err.is(status))
    }

    pub fn is_not_found(&self) -> bool {
        self.is(ApiStatus::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.is(ApiStatus::Unauthorized)
    }

    pub fn is_forbidden(&self) -> bool {
        self.is(ApiStatus::Forbidden)
    }

    pub fn is_payment_required(&self) -> bool {
        self.is(ApiStatus::PaymentRequired)
    }

    pub fn is_unprocessable(&self) -> bool {
        self.is(ApiStatus::UnprocessableEntity)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.is(ApiStatus::TooManyRequests)
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }

    /// True for cancellation or deadline expiry, including while rate limited.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled(_) | Error::RateLimit(_))
    }

    pub(crate) fn with_context(self, operation: &str, url: &str) -> Self {
        Error::Request {
            operation: operation.to_string(),
            url: url.to_string(),
            source: Box::new(self),
        }
    }
}

/// Result type for Bonsai API operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            ApiStatus::Unauthorized,
            ApiStatus::PaymentRequired,
            ApiStatus::Forbidden,
            ApiStatus::NotFound,
            ApiStatus::UnprocessableEntity,
            ApiStatus::TooManyRequests,
        ] {
            assert_eq!(ApiStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(ApiStatus::from_code(500), None);
    }

    #[test]
    fn test_response_error_display() {
        let err = ResponseError::with_errors(
            404,
            vec!["Cluster x not found.".into(), "Try again.".into()],
        );
        assert_eq!(err.to_string(), "Cluster x not found.; Try again. (404)");

        assert_eq!(
            ResponseError::new(502).to_string(),
            "request failed with status 502"
        );
    }

    #[test]
    fn test_response_error_decodes_partial_body() {
        let err: ResponseError = serde_json::from_str(r#"{"errors":["nope"]}"#).unwrap();
        assert_eq!(err.errors, vec!["nope"]);
        assert_eq!(err.status, 0);
    }

    #[test]
    fn test_response_error_is() {
        let err = ResponseError::new(422);
        assert!(err.is(ApiStatus::UnprocessableEntity));
        assert!(!err.is(ApiStatus::NotFound));
        assert_eq!(err.api_status(), Some(ApiStatus::UnprocessableEntity));
    }

    #[test]
    fn test_cancel_reason_maps_to_rate_limit_error() {
        assert_eq!(
            RateLimitError::from(CancelReason::Cancelled),
            RateLimitError::Cancelled
        );
        assert_eq!(
            RateLimitError::from(CancelReason::DeadlineExceeded),
            RateLimitError::DeadlineExceeded
        );
    }

    #[test]
    fn test_context_wrapper_is_transparent_to_root() {
        let err = Error::InvalidInput("name can't be empty".into())
            .with_context("create cluster", "https://api.bonsai.io/clusters");

        assert!(matches!(err.root(), Error::InvalidInput(_)));
        assert!(err.to_string().starts_with("create cluster https://api.bonsai.io/clusters"));
        assert!(err.status().is_none());
    }

    #[test]
    fn test_cancellation_classification() {
        assert!(Error::from(CancelReason::DeadlineExceeded).is_cancelled());
        assert!(Error::from(RateLimitError::Cancelled).is_cancelled());
        assert!(!Error::InvalidInput("x".into()).is_cancelled());
    }
}
