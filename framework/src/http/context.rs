//! Shared per-request context
//!
//! A [`Context`] is what every middleware, extractor and route handler
//! receives. Cloning it is cheap and every clone refers to the same request:
//! a body written by a handler is visible to the middleware that called it.

use super::request::{RequestData, UploadedFile};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Response sink written by handlers and response overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseState {
    /// Explicit status, if any handler set one
    pub status: Option<u16>,
    /// Response body, `None` until something assigns it
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

struct Inner {
    request: RequestData,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
    response: RwLock<ResponseState>,
    state: RwLock<HashMap<String, Value>>,
}

/// Request context handle
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Start building a context
    ///
    /// # Example
    ///
    /// ```rust
    /// use trellis::Context;
    ///
    /// let ctx = Context::builder()
    ///     .method("GET")
    ///     .path("/users/7")
    ///     .param("id", "7")
    ///     .query("verbose", "1")
    ///     .build();
    ///
    /// assert_eq!(ctx.param("id"), Some("7"));
    /// ```
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    pub fn request(&self) -> &RequestData {
        &self.inner.request
    }

    pub fn method(&self) -> &str {
        &self.inner.request.method
    }

    pub fn path(&self) -> &str {
        &self.inner.request.path
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.request.header(name)
    }

    /// Parsed query string
    pub fn query(&self) -> &HashMap<String, String> {
        &self.inner.query
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.inner.query.get(key).map(|s| s.as_str())
    }

    /// Path parameters captured by the router
    pub fn params(&self) -> &HashMap<String, String> {
        &self.inner.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.inner.params.get(key).map(|s| s.as_str())
    }

    /// Current response body
    pub fn body(&self) -> Option<Value> {
        self.read_response().body.clone()
    }

    /// Assign the response body
    pub fn set_body(&self, body: Value) {
        self.write_response().body = Some(body);
    }

    pub fn status(&self) -> Option<u16> {
        self.read_response().status
    }

    pub fn set_status(&self, status: u16) {
        self.write_response().status = Some(status);
    }

    /// Add a response header
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.write_response()
            .headers
            .push((name.into(), value.into()));
    }

    /// Snapshot of everything written to the response so far
    pub fn response(&self) -> ResponseState {
        self.read_response().clone()
    }

    /// Per-request scratch value shared between middleware and handlers
    pub fn state(&self, key: &str) -> Option<Value> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set_state(&self, key: impl Into<String>, value: Value) {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    // A handler that panicked mid-write leaves the sink poisoned; later
    // writes still land.
    fn read_response(&self) -> RwLockReadGuard<'_, ResponseState> {
        self.inner
            .response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_response(&self) -> RwLockWriteGuard<'_, ResponseState> {
        self.inner
            .response
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same request
    pub fn same_request(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.same_request(other)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.request.method)
            .field("path", &self.inner.request.path)
            .field("query", &self.inner.query)
            .field("params", &self.inner.params)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Context`]
#[derive(Default)]
pub struct ContextBuilder {
    request: RequestData,
    query: HashMap<String, String>,
    params: HashMap<String, String>,
}

impl ContextBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.request.method = method.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = path.into();
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        for (name, value) in headers {
            self.request.headers.insert(name.to_ascii_lowercase(), value);
        }
        self
    }

    /// Set the parsed request body
    pub fn body(mut self, body: Value) -> Self {
        self.request.body = body;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.request.fields.insert(name.into(), value);
        self
    }

    pub fn fields(mut self, fields: Map<String, Value>) -> Self {
        self.request.fields = fields;
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.request.files.push(file);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Keep the raw query string, see [`RequestData::query_all`]
    pub fn query_string(mut self, raw: Option<&str>) -> Self {
        self.request.query_string = raw.map(str::to_string);
        self
    }

    pub fn query_map(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn build(self) -> Context {
        Context {
            inner: Arc::new(Inner {
                request: self.request,
                query: self.query,
                params: self.params,
                response: RwLock::new(ResponseState::default()),
                state: RwLock::new(HashMap::new()),
            }),
        }
    }
}
