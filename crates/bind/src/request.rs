//! Request context handed to the binding engine, resolvers, providers and formatters.
//!
//! This module contains:
//! - `RequestContext`: a cheaply clonable view of one request, its collected body and the
//!   path parameters matched by the router
//! - `PathParams`: named path segments extracted from the request path

use bytes::Bytes;
use http::request::Parts;
use http::{Extensions, HeaderMap, Method, Request, Uri, Version};
use matchit::Params;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// The live context of one request.
///
/// Cloning only bumps a reference count, so a handler may take `RequestContext` as a plain
/// parameter.
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    parts: Parts,
    body: Bytes,
    path_params: PathParams,
    query: Vec<(String, String)>,
}

impl RequestContext {
    /// Creates a context from the request head, the already collected body and the matched
    /// path parameters
    pub fn new(parts: Parts, body: Bytes, path_params: PathParams) -> Self {
        let query = parse_query(parts.uri.query());
        Self { inner: Arc::new(Inner { parts, body, path_params, query }) }
    }

    /// Creates a context without path parameters
    pub fn from_request(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, PathParams::empty())
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        &self.inner.parts.method
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        &self.inner.parts.uri
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.inner.parts.version
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.inner.parts.extensions
    }

    /// Returns the collected request body
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Returns the path parameters extracted from the request URL
    pub fn path_params(&self) -> &PathParams {
        &self.inner.path_params
    }

    /// Returns the first query value named `name`
    pub fn query(&self, name: &str) -> Option<&str> {
        self.inner.query.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Returns the header value named `name` when it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
    }

    /// Returns the parsed `Content-Type` header
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.header(http::header::CONTENT_TYPE.as_str()).and_then(|value| value.parse().ok())
    }
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };

    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => pairs,
        Err(e) => {
            debug!(cause = %e, query, "ignore malformed query string");
            Vec::new()
        }
    }
}

/// Represents path parameters extracted from the URL path of an HTTP request.
///
/// Path parameters are named segments in the URL path that can be accessed by name.
/// For example, in the path "/users/{id}", "id" is a path parameter.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// Returns true if there are no path parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the number of path parameters
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Values are percent-decoded; a value that does not decode to UTF-8 is kept as matched.
impl From<Params<'_, '_>> for PathParams {
    fn from(params: Params<'_, '_>) -> Self {
        params.iter().map(|(key, value)| (key, decode_segment(value))).collect()
    }
}

fn decode_segment(value: &str) -> String {
    percent_decode_str(value).decode_utf8().map_or_else(|_| value.to_owned(), Cow::into_owned)
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { params: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::{PathParams, RequestContext};
    use bytes::Bytes;
    use http::{HeaderValue, Method, Request};

    fn context(uri: &str) -> RequestContext {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("X-Token", "secret")
            .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
            .body(Bytes::from_static(b"{}"))
            .unwrap();
        RequestContext::from_request(request)
    }

    #[test]
    fn test_query() {
        let ctx = context("/world?arg=huang&arg=second&empty=");
        assert_eq!(ctx.query("arg"), Some("huang"));
        assert_eq!(ctx.query("empty"), Some(""));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn test_header_and_content_type() {
        let ctx = context("/");
        assert_eq!(ctx.header("x-token"), Some("secret"));
        assert_eq!(ctx.content_type().map(|m| m.essence_str().to_owned()), Some("application/json".into()));
        assert_eq!(ctx.body().as_ref(), b"{}");
        assert_eq!(ctx.method(), &Method::POST);
    }

    #[test]
    fn test_path_params() {
        let params: PathParams = [("name", "bingoo"), ("age", "100")].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("name"), Some("bingoo"));
        assert_eq!(params.get("age"), Some("100"));
        assert_eq!(params.get("none"), None);
        assert!(PathParams::empty().is_empty());
    }

    #[test]
    fn test_path_params_from_matchit() {
        let mut router = matchit::Router::new();
        router.insert("/Get/{name}/{age}", ()).unwrap();
        let matched = router.at("/Get/bingoo/100").unwrap();

        let params = PathParams::from(matched.params);
        assert_eq!(params.iter().collect::<Vec<_>>(), [("name", "bingoo"), ("age", "100")]);
    }

    #[test]
    fn test_path_params_are_decoded() {
        let mut router = matchit::Router::new();
        router.insert("/GetAge/{name}", ()).unwrap();
        router.insert("/raw/{bytes}", ()).unwrap();

        let params = PathParams::from(router.at("/GetAge/bin%20goo").unwrap().params);
        assert_eq!(params.get("name"), Some("bin goo"));

        let params = PathParams::from(router.at("/raw/%FF").unwrap().params);
        assert_eq!(params.get("bytes"), Some("%FF"));
    }

    #[test]
    fn test_utf8_header() {
        let request = Request::get("/")
            .header("x-user", HeaderValue::from_bytes("bingöo".as_bytes()).unwrap())
            .header("x-raw", HeaderValue::from_bytes(b"\xFF").unwrap())
            .body(Bytes::new())
            .unwrap();
        let ctx = RequestContext::from_request(request);

        assert_eq!(ctx.header("x-user"), Some("bingöo"));
        assert_eq!(ctx.header("x-raw"), None);
    }
}
