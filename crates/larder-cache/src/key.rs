//! # Cache Keys
//!
//! A cached response is identified by its request: method, path and query.
//!
//! ## Key Format
//! ```text
//! GET /api/locations/1/inventory              → api:GET:/api/locations/1/inventory
//! GET /api/locations/1/movements?type=waste   → api:GET:/api/locations/1/movements?type=waste
//!
//! PrefixedKeyStrategy("reports", default)     → reports:api:GET:/api/...
//! ```
//!
//! Query parameters are kept in a `BTreeMap`, so `?a=1&b=2` and `?b=2&a=1`
//! produce the same key.

use std::collections::BTreeMap;

/// The parts of a request that identify a cached response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        RequestKey {
            method: method.into(),
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Shorthand for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Adds a query parameter. A repeated name keeps the last value.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(name.into(), value.to_string());
        self
    }

    /// Only GET responses are cached.
    pub fn is_cacheable(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

// =============================================================================
// Key Strategies
// =============================================================================

/// Turns a request into a cache key.
///
/// Closures work too:
/// ```rust
/// use larder_cache::{KeyStrategy, RequestKey};
///
/// let by_path = |req: &RequestKey| req.path.clone();
/// assert_eq!(by_path.key(&RequestKey::get("/api/menu")), "/api/menu");
/// ```
pub trait KeyStrategy: Send + Sync {
    fn key(&self, req: &RequestKey) -> String;
}

impl<F> KeyStrategy for F
where
    F: Fn(&RequestKey) -> String + Send + Sync,
{
    fn key(&self, req: &RequestKey) -> String {
        self(req)
    }
}

/// `api:{METHOD}:{path}` followed by the sorted query string, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyStrategy;

impl KeyStrategy for DefaultKeyStrategy {
    fn key(&self, req: &RequestKey) -> String {
        let mut key = format!("api:{}:{}", req.method.to_ascii_uppercase(), req.path);

        if !req.query.is_empty() {
            let query: Vec<String> = req
                .query
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            key.push('?');
            key.push_str(&query.join("&"));
        }

        key
    }
}

/// Namespaces another strategy's keys as `{prefix}:{inner key}`.
#[derive(Debug, Clone)]
pub struct PrefixedKeyStrategy<S> {
    prefix: String,
    inner: S,
}

impl<S: KeyStrategy> PrefixedKeyStrategy<S> {
    pub fn new(prefix: impl Into<String>, inner: S) -> Self {
        PrefixedKeyStrategy {
            prefix: prefix.into(),
            inner,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<S: KeyStrategy> KeyStrategy for PrefixedKeyStrategy<S> {
    fn key(&self, req: &RequestKey) -> String {
        if self.prefix.is_empty() {
            return self.inner.key(req);
        }
        format!("{}:{}", self.prefix, self.inner.key(req))
    }
}
