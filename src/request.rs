//! Incoming HTTP request type.

use std::str::FromStr;

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method};

use crate::route::MatchedRoute;

/// An incoming HTTP request.
///
/// The router reads the method and path, writes the route parameters it
/// extracted, and leaves everything else alone. Middleware hands values to
/// downstream code through [`extensions`](Request::extensions_mut) — a
/// detected API version, an authenticated user id — so the handler never
/// depends on the middleware directly.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: Vec<(String, String)>,
    extensions: Extensions,
}

impl Request {
    /// Builds a request from a method and a request target.
    ///
    /// Anything after `?` is kept as the query string and is never part of
    /// route matching.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params: Vec::new(),
            extensions: parts.extensions,
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header lookup; names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parses a path parameter into `T`. `None` if it is absent or does not parse.
    pub fn param_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.param(key)?.parse().ok()
    }

    /// All path parameters, in the order their placeholders appear in the
    /// route's uri template.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// The route this request was dispatched to, if any.
    pub fn route(&self) -> Option<&MatchedRoute> {
        self.extensions.get::<MatchedRoute>()
    }

    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    pub(crate) fn bind(&mut self, params: Vec<(String, String)>, route: MatchedRoute) {
        self.params = params;
        self.extensions.insert(route);
    }
}
