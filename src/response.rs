//! The uniform JSON envelope returned by Flora APIs.
//!
//! Every response body, success or error, is the same wrapper object
//! `{meta, data, error?, cursor?}`. Successful calls resolve with the parsed
//! [`ResponseEnvelope`]; responses with status >= 400 reject with
//! [`Error::Api`](crate::Error::Api), which carries the full envelope for
//! caller inspection.

use crate::Error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parsed response envelope.
///
/// # Examples
///
/// ```
/// use flora_client::ResponseEnvelope;
///
/// let envelope: ResponseEnvelope =
///     serde_json::from_str(r#"{"meta":{},"data":[{"id":1337}]}"#).unwrap();
///
/// assert!(envelope.error.is_none());
/// assert_eq!(envelope.data[0]["id"], 1337);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Response metadata.
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// The payload. `null` for error responses.
    #[serde(default)]
    pub data: Value,

    /// Error details, present on error responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,

    /// Pagination cursor, present on paginated result sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Value>,
}

impl ResponseEnvelope {
    /// The error message reported by the API, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref()?.message.as_deref()
    }

    /// Deserializes the `data` payload into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseFailed`] when the payload does not match the
    /// expected shape; the raw payload is preserved for debugging.
    ///
    /// # Examples
    ///
    /// ```
    /// use flora_client::ResponseEnvelope;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct User {
    ///     id: u64,
    ///     lastname: String,
    /// }
    ///
    /// let envelope: ResponseEnvelope = serde_json::from_str(
    ///     r#"{"meta":{},"data":[{"id":1337,"lastname":"Doe"}]}"#,
    /// ).unwrap();
    ///
    /// let users: Vec<User> = envelope.data_as().unwrap();
    /// assert_eq!(users[0].lastname, "Doe");
    /// ```
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(self.data.clone()).map_err(|e| Error::ParseFailed {
            raw_response: self.data.to_string(),
            serde_error: e.to_string(),
            status: http::StatusCode::OK,
        })
    }
}

/// The `error` object of an envelope.
///
/// Beyond `message`, APIs may attach arbitrary additional fields; those are
/// preserved verbatim in `additional`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    pub additional: Map<String, Value>,
}
