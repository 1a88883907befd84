//! Error types for API calls.
//!
//! Every failure mode of the request pipeline surfaces as one variant of
//! [`Error`], preserving the data a caller needs to react: HTTP status codes,
//! raw response bodies, and for API-level errors the full parsed envelope.
//! Nothing is retried and nothing is swallowed; precondition failures (id
//! validity, format, auth configuration) are reported before any network
//! activity happens.

use crate::response::ResponseEnvelope;
use http::StatusCode;
use std::time::Duration;

/// The error type for API calls.
///
/// # Examples
///
/// ```no_run
/// use flora_client::{Client, Error, Request};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.execute(Request::new("user").with_id(1337)).await {
///     Ok(envelope) => println!("data: {:?}", envelope.data),
///     Err(Error::Api { message, response, .. }) => {
///         eprintln!("API rejected the request: {message}");
///         eprintln!("full envelope: {response:?}");
///     }
///     Err(e) => eprintln!("transport problem: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A request id was present but neither a string nor a finite number.
    #[error("Request id must be a string or a finite number")]
    InvalidRequestId,

    /// A response format other than JSON was requested.
    #[error("Only JSON format supported, got \"{0}\"")]
    UnsupportedFormat(String),

    /// The request asked for authentication but the client has no
    /// authentication handler configured.
    #[error("Authenticated requests require an authentication handler")]
    AuthNotConfigured,

    /// Convenience variant for authentication handlers that fail.
    ///
    /// Handlers return [`Error`](crate::Error) directly, so whatever they
    /// report is propagated to the caller unwrapped; this variant merely
    /// saves handler authors from defining their own.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A network-level error (connection refused, reset, DNS failure).
    ///
    /// Surfaced as-is from the transport adapter.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The adapter exceeded the configured timeout.
    #[error("Request timed out after {} milliseconds", .timeout.as_millis())]
    Timeout {
        /// The configured timeout that was exceeded.
        timeout: Duration,
    },

    /// The response did not carry a JSON content type.
    ///
    /// The status code tells whether the server considered the request a
    /// success and still broke the contract, or failed outright.
    #[error("Invalid content type \"{content_type}\" ({status})")]
    InvalidContentType {
        /// The offending `Content-Type` header value.
        content_type: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The response claimed JSON but the body failed to parse, or an
    /// envelope payload did not match the expected shape.
    #[error("Failed to parse response (status {status}): {serde_error}")]
    ParseFailed {
        /// The raw body that failed to parse.
        raw_response: String,
        /// The serde error message.
        serde_error: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The API answered with status >= 400 and a valid JSON envelope.
    ///
    /// The message is the envelope's `error.message`, or `"error"` when the
    /// envelope does not carry one.
    #[error("{message}")]
    Api {
        /// The API-reported error message.
        message: String,
        /// The HTTP status code of the response.
        status: StatusCode,
        /// The full envelope, for caller inspection.
        response: ResponseEnvelope,
    },

    /// Invalid client or request configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided or assembled.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request `data` payload could not be serialized to JSON.
    #[error("Failed to serialize request data: {0}")]
    Serialization(String),
}

impl Error {
    /// Returns the HTTP status code if this error carries one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::ParseFailed { status, .. } => Some(*status),
            Error::InvalidContentType { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the attached response envelope for API-level errors.
    pub fn response(&self) -> Option<&ResponseEnvelope> {
        match self {
            Error::Api { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Returns the raw response body if this error preserves one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::ParseFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns `true` for timeout-classified errors.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// A specialized `Result` type for API calls.
pub type Result<T> = std::result::Result<T, Error>;
