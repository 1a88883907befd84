//! # flora-client - a client library for Flora-style REST APIs
//!
//! flora-client turns a declarative request description into a single HTTP
//! call, normalizes the response into the uniform `{meta, data, error?,
//! cursor?}` envelope, and abstracts the transport behind a pluggable
//! adapter. It handles the fiddly parts of the wire protocol for you:
//! GET/POST inference, deterministic (cache-friendly) query-string ordering,
//! select-expression serialization, forced query-string parameters, and
//! cache breakers.
//!
//! ## Quick Start
//!
//! ```no_run
//! use flora_client::{Client, Request, Select};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), flora_client::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .default_param("client_id", "my-app")
//!         .build()?;
//!
//!     // Fetch selected attributes of a single item
//!     let envelope = client
//!         .execute(
//!             Request::new("user")
//!                 .with_id(1337)
//!                 .with_select(Select::list(["id", "firstname", "lastname"])),
//!         )
//!         .await?;
//!     println!("user: {:?}", envelope.data);
//!
//!     // Invoke a non-default action with a JSON payload
//!     client
//!         .execute(
//!             Request::new("article")
//!                 .with_action("create")
//!                 .with_data(serde_json::json!({"title": "Lorem Ipsum"})),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Declarative requests** - Describe what to fetch; URL, method, headers
//!   and body are derived for you
//! - **Method inference** - JSON payloads, non-default actions and oversized
//!   query strings switch to POST automatically; explicit overrides win
//! - **Deterministic query strings** - Keys are sorted, so identical requests
//!   are byte-identical and HTTP-cacheable
//! - **Select expressions** - Build nested attribute selections as data and
//!   serialize them to the compact `a,b[c,d],e.f` grammar
//! - **Pluggable transport** - The bundled [`HttpAdapter`] runs on `reqwest`;
//!   any [`Adapter`] implementation can replace it
//! - **Authentication hooks** - An async [`Authenticator`] mutates requests
//!   before dispatch (bearer headers, access-token parameters, ...)
//! - **Classified errors** - Timeouts, content-type violations, parse
//!   failures and API error envelopes are distinct [`Error`] variants
//!
//! ## Error Handling
//!
//! API-level errors keep the full response envelope for inspection:
//!
//! ```no_run
//! use flora_client::{Client, Error, Request};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.execute(Request::new("user").with_id(1337).with_action("lock")).await {
//!     Ok(envelope) => println!("locked: {:?}", envelope.data),
//!     Err(Error::Api { message, response, .. }) => {
//!         eprintln!("API error: {message}");
//!         eprintln!("envelope: {response:?}");
//!     }
//!     Err(e) if e.is_timeout() => eprintln!("slow API: {e}"),
//!     Err(e) => eprintln!("request failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod client;
mod error;
mod query;
mod request;
mod response;
mod select;
pub mod transport;

pub use auth::{AccessToken, Authenticator, BearerToken};
pub use client::{Client, ClientBuilder, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use request::{ParamValue, Request, RequestId};
pub use response::{ApiErrorBody, ResponseEnvelope};
pub use select::Select;
pub use transport::{Adapter, HttpAdapter, TransportRequest};
