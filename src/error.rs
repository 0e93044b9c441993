//! Error types for watson-sdk.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use thiserror::Error;

/// Broad classification of an [`Error`].
///
/// Every error a call can produce falls into exactly one kind, so callers can
/// decide on retry or reporting without matching individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or builder misuse, caught before any I/O.
    Validation,
    /// A credential could not be obtained or refreshed.
    Authentication,
    /// Network-level failure; no status code available.
    Transport,
    /// The service answered with a non-2xx status.
    Service,
    /// A 2xx body did not match the expected result type.
    Deserialization,
    /// Local configuration or file problem.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Transport => "transport",
            Self::Service => "service",
            Self::Deserialization => "deserialization",
            Self::Configuration => "configuration",
        };
        f.write_str(name)
    }
}

/// A non-2xx answer from a Watson service.
#[derive(Debug, Clone)]
pub struct ServiceError {
    /// HTTP status code.
    pub status: u16,
    /// Message extracted from the error body, or `HTTP {status}`.
    pub message: String,
    /// Service-specific error code, when the body carried one.
    pub code: Option<String>,
    /// Raw response body.
    pub body: Bytes,
    /// Response headers.
    pub headers: HeaderMap,
}

impl ServiceError {
    /// Raw body as (lossy) UTF-8 text.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `X-Global-Transaction-Id` IBM Cloud attaches to responses, if any.
    pub fn transaction_id(&self) -> Option<&str> {
        self.headers
            .get("x-global-transaction-id")
            .and_then(|v| v.to_str().ok())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// The main error type for watson-sdk.
#[derive(Debug, Error)]
pub enum Error {
    // ── Validation ───────────────────────────────────────────────────────────
    /// A required argument was missing or empty.
    #[error("Missing required argument '{name}'")]
    MissingArgument {
        /// Parameter name as seen by the caller.
        name: String,
    },

    /// An argument was present but unusable.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request builder was used incorrectly.
    #[error("Invalid request state: {0}")]
    InvalidRequestState(String),

    // ── Authentication ───────────────────────────────────────────────────────
    /// A credential could not be obtained or refreshed.
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Description of the failure.
        message: String,
        /// Status returned by the token endpoint, if it answered.
        status: Option<u16>,
    },

    // ── Transport ────────────────────────────────────────────────────────────
    /// The request did not complete in time.
    #[error("Request timed out{}", timeout_suffix(.after))]
    Timeout {
        /// The timeout that was exceeded, when known.
        after: Option<Duration>,
    },

    /// Network/HTTP error from the underlying client.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Transport failure from a non-reqwest transport.
    #[error("Transport error: {0}")]
    Transport(String),

    // ── Service ──────────────────────────────────────────────────────────────
    /// The service responded with a non-2xx status.
    #[error("Service error {0}")]
    Service(ServiceError),

    // ── Deserialization ──────────────────────────────────────────────────────
    /// A 2xx body could not be decoded into the expected type.
    #[error("Failed to decode response ({status}): {message}")]
    Deserialization {
        /// HTTP status of the otherwise-successful response.
        status: u16,
        /// Decoder message.
        message: String,
        /// Raw response body.
        body: Bytes,
    },

    // ── Configuration ────────────────────────────────────────────────────────
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// General I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ── Context ──────────────────────────────────────────────────────────────
    /// Any of the above, tagged with the operation that produced it.
    #[error("{operation}: {source}")]
    Operation {
        /// Operation id, e.g. `create_session`.
        operation: String,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a missing-argument error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingArgument { name: name.into() }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Authentication {
            message: message.into(),
            status,
        }
    }

    /// Tags the error with an operation id. Already-tagged errors are left alone.
    #[must_use]
    pub fn in_operation(self, operation: &str) -> Self {
        match self {
            Self::Operation { .. } => self,
            other => Self::Operation {
                operation: operation.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The untagged error underneath any operation context.
    pub fn root(&self) -> &Error {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Operation id this error was tagged with, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Operation { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::MissingArgument { .. }
            | Self::InvalidArgument { .. }
            | Self::InvalidRequestState(_) => ErrorKind::Validation,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Timeout { .. } | Self::Network(_) | Self::Transport(_) => ErrorKind::Transport,
            Self::Service(_) => ErrorKind::Service,
            Self::Deserialization { .. } => ErrorKind::Deserialization,
            Self::Config(_) | Self::Io(_) => ErrorKind::Configuration,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// HTTP status associated with the error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Service(e) => Some(e.status),
            Self::Deserialization { status, .. } => Some(*status),
            Self::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body, for service and deserialization failures.
    pub fn body(&self) -> Option<&Bytes> {
        match self.root() {
            Self::Service(e) => Some(&e.body),
            Self::Deserialization { body, .. } => Some(body),
            _ => None,
        }
    }

    /// The service error payload, if this is a service failure.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self.root() {
            Self::Service(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true for failures a caller may reasonably retry:
    /// transport errors, 429 and 5xx service responses.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::Timeout { .. } | Self::Network(_) | Self::Transport(_) => true,
            Self::Service(e) => e.status == 429 || (500..600).contains(&e.status),
            _ => false,
        }
    }

    /// Returns true if this error indicates re-authentication is needed.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        match self.root() {
            Self::Authentication { .. } => true,
            Self::Service(e) => e.status == 401,
            _ => false,
        }
    }
}

fn timeout_suffix(after: &Option<Duration>) -> String {
    after
        .map(|d| format!(" after {}ms", d.as_millis()))
        .unwrap_or_default()
}

/// Convenience type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn service(status: u16) -> Error {
        Error::Service(ServiceError {
            status,
            message: format!("HTTP {status}"),
            code: None,
            body: Bytes::from_static(b"{}"),
            headers: HeaderMap::new(),
        })
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Error::missing("collection_id").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::InvalidRequestState("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::authentication("bad key", Some(400)).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(Error::Timeout { after: None }.kind(), ErrorKind::Transport);
        assert_eq!(service(404).kind(), ErrorKind::Service);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::Timeout { after: None }.is_retryable());
        assert!(Error::Transport("reset".into()).is_retryable());
        assert!(service(500).is_retryable());
        assert!(service(503).is_retryable());
        assert!(service(429).is_retryable());

        assert!(!service(400).is_retryable());
        assert!(!service(404).is_retryable());
        assert!(!Error::missing("id").is_retryable());
        assert!(!Error::authentication("nope", None).is_retryable());
    }

    #[test]
    fn test_operation_context_preserves_kind_and_payload() {
        let err = service(404).in_operation("get_collection");
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.operation(), Some("get_collection"));
        assert_eq!(err.body().map(|b| b.as_ref()), Some(&b"{}"[..]));

        let twice = err.in_operation("outer");
        assert_eq!(twice.operation(), Some("get_collection"));
    }

    #[test]
    fn test_requires_reauth() {
        assert!(Error::authentication("expired", None).requires_reauth());
        assert!(service(401).requires_reauth());
        assert!(!service(403).requires_reauth());
        assert!(!Error::Timeout { after: None }.requires_reauth());
    }

    #[test]
    fn test_error_display() {
        let err = Error::missing("collection_id");
        assert_eq!(err.to_string(), "Missing required argument 'collection_id'");

        let err = Error::Timeout {
            after: Some(Duration::from_millis(250)),
        };
        assert_eq!(err.to_string(), "Request timed out after 250ms");

        assert_eq!(service(500).to_string(), "Service error 500: HTTP 500");
    }
}
