//! Request descriptors and their building blocks.
//!
//! A [`Request`] describes one API call declaratively: which resource, which
//! item, which attributes, and how to transport it. The client turns the
//! descriptor into a finalized [`TransportRequest`](crate::TransportRequest)
//! without mutating caller-owned data — `execute` takes the descriptor by
//! value and the assembly pipeline works on that owned copy.

use crate::select::Select;
use crate::Error;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a single item within a resource.
///
/// Strings of any content and finite numbers are accepted. Non-finite floats
/// (NaN, ±infinity) fail validation before any network activity.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestId {
    Str(String),
    Int(i64),
    Float(f64),
}

impl RequestId {
    pub(crate) fn is_valid(&self) -> bool {
        match self {
            RequestId::Float(value) => value.is_finite(),
            RequestId::Str(_) | RequestId::Int(_) => true,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Str(value) => f.write_str(value),
            RequestId::Int(value) => write!(f, "{value}"),
            RequestId::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::Str(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        RequestId::Str(value)
    }
}

impl From<i32> for RequestId {
    fn from(value: i32) -> Self {
        RequestId::Int(value.into())
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Int(value)
    }
}

impl From<u32> for RequestId {
    fn from(value: u32) -> Self {
        RequestId::Int(value.into())
    }
}

impl From<f64> for RequestId {
    fn from(value: f64) -> Self {
        RequestId::Float(value)
    }
}

/// Value of an API parameter.
///
/// Parameters are strings or numbers on the wire; both render through
/// `Display` when the query string or form body is assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Empty strings, zero and NaN count as falsy, mirroring the truthiness
    /// rule the forced-query-string routing is defined in terms of.
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Str(value) => !value.is_empty(),
            ParamValue::Int(value) => *value != 0,
            ParamValue::Float(value) => *value != 0.0 && !value.is_nan(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// Declarative description of one API call.
///
/// Only `resource` is required. Everything else either shapes the URL
/// (`id`), the parameter set (`action`, `select`, `filter`, `order`,
/// `search`, `limit`, `page` and free-form `params`), or the transport
/// (`data`, `cache`, `http_method`, `http_headers`, `authenticate`).
///
/// # Examples
///
/// ```
/// use flora_client::{Request, Select};
///
/// let request = Request::new("user")
///     .with_id(1337)
///     .with_select(Select::list(["id", "lastname"]))
///     .with_limit(15);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    /// Resource name, e.g. `"user"`.
    pub resource: String,

    /// Unique identifier of an item, appended to the URL path.
    pub id: Option<RequestId>,

    /// Response format. Only `"json"` (case-insensitive) is supported.
    pub format: Option<String>,

    /// API action. `"retrieve"` is the implicit default and is never
    /// transmitted.
    pub action: Option<String>,

    /// Attributes to retrieve.
    pub select: Option<Select>,

    /// Filter items by the given criteria.
    pub filter: Option<String>,

    /// Order items by the given criteria.
    pub order: Option<String>,

    /// Full-text search term.
    pub search: Option<String>,

    /// Limit the result set.
    pub limit: Option<u32>,

    /// Paginate through the result set.
    pub page: Option<u32>,

    /// Payload sent as a JSON request body.
    pub data: Option<Value>,

    /// Use HTTP caching. When `false`, a cache-breaker parameter is added.
    pub cache: bool,

    /// Explicit HTTP method, skipping method inference entirely.
    pub http_method: Option<Method>,

    /// Additional HTTP headers for this request.
    pub http_headers: HeaderMap,

    /// Run the client's authentication handler before dispatch.
    pub authenticate: bool,

    /// Additional API parameters not covered by the typed fields.
    pub params: BTreeMap<String, ParamValue>,
}

impl Request {
    /// Creates a request for the given resource.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: None,
            format: None,
            action: None,
            select: None,
            filter: None,
            order: None,
            search: None,
            limit: None,
            page: None,
            data: None,
            cache: true,
            http_method: None,
            http_headers: HeaderMap::new(),
            authenticate: false,
            params: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<RequestId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_select(mut self, select: impl Into<Select>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the JSON payload. The request is sent as POST with
    /// `Content-Type: application/json`.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Disables HTTP caching for this request via a cache-breaker parameter.
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Overrides the inferred HTTP method.
    pub fn with_http_method(mut self, method: Method) -> Self {
        self.http_method = Some(method);
        self
    }

    /// Adds an HTTP header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self, Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {e}")))?;
        self.http_headers.insert(name, value);
        Ok(self)
    }

    /// Adds a free-form API parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Marks the request for the client's authentication handler.
    pub fn authenticated(mut self) -> Self {
        self.authenticate = true;
        self
    }
}
