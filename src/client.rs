//! The API client and its request-assembly pipeline.
//!
//! [`Client`] is the main entry point. It owns the endpoint configuration
//! (base URL, default parameters, forced query-string parameters, optional
//! authentication handler, timeout, transport adapter) and exposes a single
//! operation, [`Client::execute`], which turns a [`Request`] descriptor into
//! one HTTP call and resolves with the parsed response envelope.

use crate::auth::Authenticator;
use crate::query;
use crate::request::{ParamValue, Request};
use crate::response::ResponseEnvelope;
use crate::transport::{Adapter, HttpAdapter, TransportRequest};
use crate::{Error, Result};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Default request timeout enforced by adapters.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Parameters that are always sent in the query string, regardless of the
/// HTTP method. Callers can extend the set via
/// [`ClientBuilder::force_query_param`].
const BASE_FORCE_QUERY_PARAMS: [&str; 3] = ["client_id", "action", "access_token"];

/// Query strings longer than this flip parameter-only requests to POST,
/// protecting against URL length limits in servers and intermediaries.
const MAX_QUERY_STRING_LEN: usize = 2000;

/// A client for one Flora API endpoint.
///
/// The client is created once per endpoint and reused across calls; it holds
/// no per-call mutable state, so any number of [`execute`](Client::execute)
/// calls may be in flight concurrently. Cloning is cheap and shares the
/// underlying configuration and connection pool.
///
/// # Examples
///
/// ```no_run
/// use flora_client::{Client, Request, Select};
///
/// # async fn example() -> Result<(), flora_client::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .default_param("client_id", "my-app")
///     .build()?;
///
/// let envelope = client
///     .execute(
///         Request::new("user")
///             .with_id(1337)
///             .with_select(Select::list(["id", "firstname", "lastname"])),
///     )
///     .await?;
///
/// println!("user: {:?}", envelope.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: String,
    default_params: BTreeMap<String, ParamValue>,
    force_query_params: Vec<String>,
    auth: Option<Box<dyn Authenticator>>,
    timeout: Duration,
    adapter: Box<dyn Adapter>,
}

impl Client {
    /// Creates a new [`ClientBuilder`] for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Executes a request against the configured endpoint.
    ///
    /// The pipeline validates the request id, runs the authentication
    /// handler when the request asks for it, assembles URL, method, headers
    /// and body, and dispatches through the transport adapter. All failure
    /// modes surface as [`Error`] values; nothing is retried.
    ///
    /// # Errors
    ///
    /// See [`Error`] for the full taxonomy. Precondition violations
    /// (invalid id, unsupported format, missing authentication handler)
    /// are reported before any network activity.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flora_client::{Client, Request};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), flora_client::Error> {
    /// # let client = Client::builder().base_url("https://api.example.com")?.build()?;
    /// let envelope = client
    ///     .execute(
    ///         Request::new("article")
    ///             .with_action("create")
    ///             .with_data(json!({"title": "Lorem Ipsum"})),
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(&self, request: Request) -> Result<ResponseEnvelope> {
        if let Some(id) = &request.id {
            if !id.is_valid() {
                return Err(Error::InvalidRequestId);
            }
        }

        let mut request = request;
        if request.authenticate {
            let auth = self
                .inner
                .auth
                .as_deref()
                .ok_or(Error::AuthNotConfigured)?;
            auth.authenticate(&mut request).await?;
        }

        if let Some(format) = &request.format {
            if !format.eq_ignore_ascii_case("json") {
                return Err(Error::UnsupportedFormat(format.clone()));
            }
        }

        let transport = self.assemble(request)?;

        tracing::debug!(
            method = %transport.method,
            url = %transport.url,
            "Dispatching request"
        );

        self.inner.adapter.send(transport).await
    }

    /// Turns a validated descriptor into a transport-ready request.
    fn assemble(&self, request: Request) -> Result<TransportRequest> {
        let Request {
            resource,
            id,
            format,
            action,
            select,
            filter,
            order,
            search,
            limit,
            page,
            data,
            cache,
            http_method,
            http_headers: mut headers,
            authenticate: _,
            mut params,
        } = request;

        let mut url = format!(
            "{}{}/{}",
            self.inner.base_url,
            resource,
            id.map(|id| id.to_string()).unwrap_or_default()
        );

        let json_body = match data {
            Some(data) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                Some(serde_json::to_string(&data).map_err(|e| Error::Serialization(e.to_string()))?)
            }
            None => None,
        };

        // Typed descriptor fields join the free-form parameters; reserved
        // fields (resource, id, cache, data, authenticate, http_headers,
        // http_method) never do.
        if let Some(format) = format {
            params.insert("format".to_string(), format.into());
        }
        if let Some(action) = action {
            params.insert("action".to_string(), action.into());
        }
        if let Some(select) = select {
            params.insert("select".to_string(), select.to_string().into());
        }
        if let Some(filter) = filter {
            params.insert("filter".to_string(), filter.into());
        }
        if let Some(order) = order {
            params.insert("order".to_string(), order.into());
        }
        if let Some(search) = search {
            params.insert("search".to_string(), search.into());
        }
        if let Some(limit) = limit {
            params.insert("limit".to_string(), limit.into());
        }
        if let Some(page) = page {
            params.insert("page".to_string(), page.into());
        }

        for (key, value) in &self.inner.default_params {
            if !params.contains_key(key) {
                params.insert(key.clone(), value.clone());
            }
        }

        // "retrieve" is the implicit default action and is never transmitted.
        if params.get("action").and_then(ParamValue::as_str) == Some("retrieve") {
            params.remove("action");
        }

        let method = match http_method {
            Some(method) => method,
            None => infer_method(&params, json_body.is_some()),
        };

        if method == Method::POST && json_body.is_none() {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            );
        }

        // Forced parameters move to the query string when they hold a
        // truthy value, regardless of method.
        let mut query_params: BTreeMap<String, String> = BTreeMap::new();
        for key in &self.inner.force_query_params {
            if let Some(value) = params.get(key) {
                if value.is_truthy() {
                    let value = value.to_string();
                    params.remove(key);
                    query_params.insert(key.clone(), value);
                }
            }
        }

        // A JSON body or a GET request pushes every remaining parameter to
        // the query string; only POST without JSON keeps a form body.
        let form_params = if json_body.is_some() || method == Method::GET {
            for (key, value) in std::mem::take(&mut params) {
                query_params.insert(key, value.to_string());
            }
            None
        } else if params.is_empty() {
            None
        } else {
            Some(
                params
                    .into_iter()
                    .map(|(key, value)| (key, value.to_string()))
                    .collect(),
            )
        };

        // BTreeMap iteration is ascending by key, so semantically identical
        // requests always produce byte-identical query strings.
        if !query_params.is_empty() {
            url.push('?');
            url.push_str(&query::urlencode(&query_params));
        }

        if !cache {
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str("_=");
            url.push_str(&timestamp.to_string());
        }

        Ok(TransportRequest {
            url: Url::parse(&url)?,
            method,
            headers,
            form_params,
            json_body,
            timeout: self.inner.timeout,
        })
    }
}

/// Decides GET vs. POST from the parameter set and body presence.
///
/// Explicit method overrides on the request skip this entirely.
fn infer_method(params: &BTreeMap<String, ParamValue>, has_json_body: bool) -> Method {
    if has_json_body {
        return Method::POST;
    }
    if let Some(action) = params.get("action") {
        if action.as_str() != Some("retrieve") {
            return Method::POST;
        }
    }
    let encoded = query::urlencode(params.iter().map(|(k, v)| (k.as_str(), v.to_string())));
    if encoded.len() > MAX_QUERY_STRING_LEN {
        return Method::POST;
    }
    Method::GET
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use flora_client::{AccessToken, ClientBuilder};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), flora_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .default_param("client_id", "my-app")
///     .force_query_param("portal_id")
///     .timeout(Duration::from_secs(5))
///     .authenticator(Box::new(AccessToken::new("__token__")))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<String>,
    default_params: BTreeMap<String, ParamValue>,
    force_query_params: Vec<String>,
    auth: Option<Box<dyn Authenticator>>,
    timeout: Duration,
    adapter: Option<Box<dyn Adapter>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_params: BTreeMap::new(),
            force_query_params: BASE_FORCE_QUERY_PARAMS
                .iter()
                .map(|key| key.to_string())
                .collect(),
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            adapter: None,
        }
    }

    /// Sets the URL of the API instance. Required.
    ///
    /// The URL is normalized to end with a single trailing slash.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or cannot be parsed.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let raw = url.as_ref();
        if raw.is_empty() {
            return Err(Error::Configuration("API base URL must not be empty".to_string()));
        }
        Url::parse(raw)?;
        self.base_url = Some(if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        });
        Ok(self)
    }

    /// Adds a parameter sent with every request.
    ///
    /// Request-supplied parameters of the same name always win over
    /// defaults.
    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.default_params.insert(key.into(), value.into());
        self
    }

    /// Adds several default parameters at once.
    pub fn default_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.default_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds a parameter to the forced-query-string set.
    ///
    /// The base set `client_id`, `action` and `access_token` is always
    /// present; duplicates are ignored.
    pub fn force_query_param(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.force_query_params.contains(&key) {
            self.force_query_params.push(key);
        }
        self
    }

    /// Sets the authentication handler invoked for requests marked
    /// [`authenticated`](crate::Request::authenticated).
    pub fn authenticator(mut self, auth: Box<dyn Authenticator>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets the request timeout. Defaults to [`DEFAULT_TIMEOUT`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Swaps in a custom transport adapter.
    ///
    /// Defaults to [`HttpAdapter`] when not set.
    pub fn adapter(mut self, adapter: Box<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the default adapter
    /// cannot be constructed.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Configuration("API base URL is required".to_string()))?;

        let adapter = match self.adapter {
            Some(adapter) => adapter,
            None => Box::new(HttpAdapter::new()?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                base_url,
                default_params: self.default_params,
                force_query_params: self.force_query_params,
                auth: self.auth,
                timeout: self.timeout,
                adapter,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Select;
    use serde_json::json;

    fn client() -> Client {
        Client::builder()
            .base_url("http://api.example.com")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn default_timeout_is_fifteen_seconds() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_millis(15_000));
        assert_eq!(client().inner.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn base_url_gains_a_trailing_slash() {
        assert_eq!(client().inner.base_url, "http://api.example.com/");

        let already_slashed = Client::builder()
            .base_url("http://api.example.com/")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(already_slashed.inner.base_url, "http://api.example.com/");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            Client::builder().base_url(""),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn missing_base_url_fails_the_build() {
        assert!(matches!(
            Client::builder().build(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn resource_and_id_form_the_path() {
        let transport = client().assemble(Request::new("user")).unwrap();
        assert_eq!(transport.url.as_str(), "http://api.example.com/user/");
        assert_eq!(transport.method, Method::GET);

        let transport = client()
            .assemble(Request::new("user").with_id(1337))
            .unwrap();
        assert_eq!(transport.url.as_str(), "http://api.example.com/user/1337");
        assert!(transport.url.query().is_none());
    }

    #[test]
    fn retrieve_action_is_not_transmitted() {
        let transport = client()
            .assemble(Request::new("user").with_action("retrieve"))
            .unwrap();
        assert_eq!(transport.url.query(), None);
        assert_eq!(transport.method, Method::GET);
    }

    #[test]
    fn non_retrieve_actions_switch_to_post_via_query_string() {
        let transport = client()
            .assemble(Request::new("user").with_id(1337).with_action("lock"))
            .unwrap();
        assert_eq!(transport.method, Method::POST);
        assert_eq!(transport.url.query(), Some("action=lock"));
        assert!(transport.form_params.is_none());
        assert_eq!(
            transport.headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn json_data_posts_with_all_params_in_the_query_string() {
        let transport = client()
            .assemble(
                Request::new("article")
                    .with_action("create")
                    .with_data(json!({"title": "Lorem Ipsum"})),
            )
            .unwrap();

        assert_eq!(transport.method, Method::POST);
        assert_eq!(transport.url.query(), Some("action=create"));
        assert_eq!(transport.json_body.as_deref(), Some(r#"{"title":"Lorem Ipsum"}"#));
        assert!(transport.form_params.is_none());
        assert_eq!(transport.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn query_string_keys_are_sorted_ascending() {
        let transport = client()
            .assemble(
                Request::new("user")
                    .with_param("zulu", "3")
                    .with_param("alpha", "1")
                    .with_param("mike", "2"),
            )
            .unwrap();
        assert_eq!(transport.url.query(), Some("alpha=1&mike=2&zulu=3"));
    }

    #[test]
    fn select_trees_serialize_into_the_query_string() {
        let transport = client()
            .assemble(Request::new("user").with_select(Select::list([
                Select::field("id"),
                Select::group([("address", Select::list(["city", "zip"]))]),
            ])))
            .unwrap();
        assert_eq!(transport.url.query(), Some("select=id%2Caddress%5Bcity%2Czip%5D"));
    }

    #[test]
    fn cache_false_appends_a_cache_breaker() {
        let transport = client()
            .assemble(Request::new("user").with_cache(false))
            .unwrap();
        let query = transport.url.query().unwrap();
        assert!(query.starts_with("_="), "unexpected query: {query}");
        assert!(!query.contains("cache"));

        let transport = client()
            .assemble(Request::new("user").with_limit(15).with_cache(false))
            .unwrap();
        let query = transport.url.query().unwrap();
        assert!(query.starts_with("limit=15&_="), "unexpected query: {query}");
    }

    #[test]
    fn default_params_lose_against_request_params() {
        let client = Client::builder()
            .base_url("http://api.example.com")
            .unwrap()
            .default_param("param", "abc")
            .build()
            .unwrap();

        let transport = client.assemble(Request::new("user").with_id(1337)).unwrap();
        assert_eq!(transport.url.query(), Some("param=abc"));

        let transport = client
            .assemble(Request::new("user").with_id(1337).with_param("param", "xyz"))
            .unwrap();
        assert_eq!(transport.url.query(), Some("param=xyz"));
    }

    #[test]
    fn forced_params_ride_the_query_string_on_json_posts() {
        let client = Client::builder()
            .base_url("http://api.example.com")
            .unwrap()
            .default_param("client_id", 1)
            .build()
            .unwrap();

        let transport = client
            .assemble(
                Request::new("article")
                    .with_action("create")
                    .with_data(json!({"title": "Lorem Ipsum"})),
            )
            .unwrap();

        assert_eq!(transport.method, Method::POST);
        assert_eq!(transport.url.query(), Some("action=create&client_id=1"));
    }

    #[test]
    fn caller_extensions_to_the_forced_set_are_honored() {
        let client = Client::builder()
            .base_url("http://api.example.com")
            .unwrap()
            .force_query_param("portal_id")
            .build()
            .unwrap();

        let transport = client
            .assemble(
                Request::new("user")
                    .with_action("update")
                    .with_param("portal_id", "9")
                    .with_param("note", "kept in body"),
            )
            .unwrap();

        assert_eq!(transport.method, Method::POST);
        assert_eq!(transport.url.query(), Some("action=update&portal_id=9"));
        let form = transport.form_params.unwrap();
        assert_eq!(form.get("note").map(String::as_str), Some("kept in body"));
    }

    #[test]
    fn falsy_forced_params_stay_with_the_remaining_set() {
        let transport = client()
            .assemble(
                Request::new("user")
                    .with_action("update")
                    .with_param("client_id", ""),
            )
            .unwrap();

        // Empty client_id is not forced into the query string; as a body
        // parameter it survives in the form set of the POST.
        assert_eq!(transport.url.query(), Some("action=update"));
        let form = transport.form_params.unwrap();
        assert_eq!(form.get("client_id").map(String::as_str), Some(""));
    }

    #[test]
    fn large_query_strings_switch_to_post() {
        let request = Request::new("user")
            .with_select("select".repeat(150))
            .with_filter("filter".repeat(150))
            .with_search("search term".repeat(150))
            .with_limit(100)
            .with_page(10);

        let transport = client().assemble(request).unwrap();
        assert_eq!(transport.method, Method::POST);
        assert!(transport.url.query().is_none());

        let form = transport.form_params.unwrap();
        assert!(form.get("select").unwrap().starts_with("selectselect"));
        assert_eq!(form.get("limit").map(String::as_str), Some("100"));
    }

    #[test]
    fn explicit_http_method_skips_inference() {
        let transport = client()
            .assemble(Request::new("user").with_id(1337).with_http_method(Method::HEAD))
            .unwrap();
        assert_eq!(transport.method, Method::HEAD);
    }

    #[test]
    fn method_inference_rules() {
        let no_params = BTreeMap::new();
        assert_eq!(infer_method(&no_params, true), Method::POST);
        assert_eq!(infer_method(&no_params, false), Method::GET);

        let mut action = BTreeMap::new();
        action.insert("action".to_string(), ParamValue::from("retrieve"));
        assert_eq!(infer_method(&action, false), Method::GET);
        action.insert("action".to_string(), ParamValue::from("lock"));
        assert_eq!(infer_method(&action, false), Method::POST);

        let mut huge = BTreeMap::new();
        huge.insert("filter".to_string(), ParamValue::from("x".repeat(2100)));
        assert_eq!(infer_method(&huge, false), Method::POST);
    }

    #[test]
    fn format_json_is_accepted_and_transmitted() {
        let transport = client()
            .assemble(Request::new("user").with_format("json"))
            .unwrap();
        assert_eq!(transport.url.query(), Some("format=json"));
    }
}
