//! Authentication hooks that run before request dispatch.
//!
//! When a request is marked [`authenticated`](crate::Request::authenticated),
//! the client invokes its configured [`Authenticator`] with the in-flight
//! descriptor before assembly. The hook typically injects an `Authorization`
//! header or an `access_token` parameter; it may perform its own I/O (e.g.
//! refresh a token) since it is async. The transport call is dispatched only
//! after the hook resolves, and a failing hook rejects the whole call with
//! the hook's error, unwrapped.

use crate::request::Request;
use crate::{Error, Result};
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::HeaderValue;

/// Mutates a request with authentication state before it is assembled.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use flora_client::{Authenticator, Request, Result};
///
/// struct StaticToken;
///
/// #[async_trait]
/// impl Authenticator for StaticToken {
///     async fn authenticate(&self, request: &mut Request) -> Result<()> {
///         request.params.insert("access_token".into(), "__token__".into());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Applies authentication state to the request.
    ///
    /// # Errors
    ///
    /// Any error returned here rejects the call before the transport is
    /// invoked.
    async fn authenticate(&self, request: &mut Request) -> Result<()>;
}

/// Sends a fixed token as `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for BearerToken {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        let value = HeaderValue::try_from(format!("Bearer {}", self.token))
            .map_err(|e| Error::AuthenticationFailed(format!("invalid token: {e}")))?;
        request.http_headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// Injects a fixed token as the `access_token` parameter.
///
/// `access_token` is in the forced-query-string base set, so the token always
/// travels in the URL regardless of HTTP method.
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: String,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl Authenticator for AccessToken {
    async fn authenticate(&self, request: &mut Request) -> Result<()> {
        request
            .params
            .insert("access_token".to_string(), self.token.clone().into());
        Ok(())
    }
}
