//! Transport adapters and the finalized request they consume.
//!
//! The client never talks to the network itself. The assembly pipeline
//! produces a [`TransportRequest`] and hands it to whichever [`Adapter`] the
//! client was built with; the adapter performs the call under the request's
//! timeout and normalizes the outcome into a [`ResponseEnvelope`] or a
//! classified [`Error`]. [`HttpAdapter`] is the in-process implementation on
//! top of `reqwest`; tests swap in mock adapters through
//! [`ClientBuilder::adapter`](crate::ClientBuilder::adapter).

use crate::query;
use crate::response::ResponseEnvelope;
use crate::{Error, Result};
use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// A fully assembled request, ready for the wire.
///
/// At most one of `form_params` and `json_body` is present; whichever it is
/// becomes the request body. Parameters not routed to the body are already
/// part of `url`'s query string.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Full request URL including the assembled query string.
    pub url: Url,

    /// The resolved HTTP method.
    pub method: Method,

    /// Headers to send as given.
    pub headers: HeaderMap,

    /// Form-encoded body parameters for POST requests without a JSON body.
    pub form_params: Option<BTreeMap<String, String>>,

    /// Pre-serialized JSON body.
    pub json_body: Option<String>,

    /// Timeout the adapter must enforce for the whole exchange.
    pub timeout: Duration,
}

/// Performs the network call for a finalized request.
///
/// Implementations must enforce `request.timeout` (rejecting with a
/// timeout-classified error), gate JSON parsing on the response content
/// type, and turn status >= 400 envelopes into [`Error::Api`] rejections
/// carrying the parsed envelope.
#[async_trait]
pub trait Adapter: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<ResponseEnvelope>;
}

/// In-process HTTP adapter backed by a pooled [`reqwest::Client`].
pub struct HttpAdapter {
    http: reqwest::Client,
}

impl HttpAdapter {
    /// Creates an adapter with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the underlying HTTP client cannot
    /// be constructed.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wraps an existing `reqwest` client, preserving its pool and settings.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn dispatch(&self, request: TransportRequest) -> Result<ResponseEnvelope> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Sending HTTP request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers);

        if let Some(json) = request.json_body {
            builder = builder.body(json);
        } else if let Some(params) = &request.form_params {
            // Form params ride in the body only for POST; other methods have
            // their parameters in the query string already.
            if request.method == Method::POST {
                builder = builder.body(query::urlencode(params));
            }
        }

        let response = builder.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(status = status.as_u16(), "Received HTTP response");

        if !content_type.starts_with("application/json") {
            tracing::warn!(
                status = status.as_u16(),
                content_type = %content_type,
                "Response content type is not JSON"
            );
            return Err(Error::InvalidContentType {
                content_type,
                status,
            });
        }

        let raw_body = response.text().await?;
        let envelope: ResponseEnvelope =
            serde_json::from_str(&raw_body).map_err(|e| Error::ParseFailed {
                raw_response: raw_body,
                serde_error: e.to_string(),
                status,
            })?;

        if status.as_u16() >= 400 {
            let message = envelope.error_message().unwrap_or("error").to_string();
            tracing::warn!(
                status = status.as_u16(),
                message = %message,
                "API returned an error envelope"
            );
            return Err(Error::Api {
                message,
                status,
                response: envelope,
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl Adapter for HttpAdapter {
    async fn send(&self, request: TransportRequest) -> Result<ResponseEnvelope> {
        let timeout = request.timeout;
        match tokio::time::timeout(timeout, self.dispatch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { timeout }),
        }
    }
}
