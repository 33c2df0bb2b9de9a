//! A minimal hosting router.
//!
//! Paths are matched with `matchit`; the items registered for a path are tried in registration
//! order and the first whose [`Filter`] accepts the request handles it. Registering the same
//! method and path twice keeps both items, so the first one wins.

pub mod filter;

use crate::body::ResponseBody;
use crate::error::BoxError;
use crate::{PathParams, RequestContext};
use async_trait::async_trait;
use filter::{Filter, MethodFilter};
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::error;

type InnerRouter<T> = matchit::Router<T>;

pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// The callback a router invokes for a matched request.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody>;
}

/// A router that endpoints are installed into.
pub trait Host {
    fn add_route(&mut self, filter: MethodFilter, path: &str, handler: Box<dyn RequestHandler>);
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid route `{path}`: {source}")]
    Insert { path: String, source: matchit::InsertError },
}

/// Main router structure that handles HTTP request routing
pub struct Router {
    inner_router: InnerRouter<Vec<RouterItem>>,
    default_handler: Box<dyn RequestHandler>,
    max_body_size: usize,
}

/// A router item containing a filter and handler
pub struct RouterItem {
    filter: MethodFilter,
    handler: Box<dyn RequestHandler>,
}

/// Result of matching a route, containing matched items and path parameters
#[derive(Debug)]
pub struct RouteResult<'router> {
    router_items: &'router [RouterItem],
    params: PathParams,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Matches a path against the router's routes
    pub fn at(&self, path: &str) -> RouteResult<'_> {
        self.inner_router
            .at(path)
            .map(|matched| RouteResult { router_items: matched.value.as_slice(), params: matched.params.into() })
            .map_err(|e| error!("match '{}' error: {}", path, e))
            .unwrap_or(RouteResult::empty())
    }

    /// Collects the body, matches the route and awaits its handler.
    ///
    /// Replies `413` when the body exceeds the size limit, falls back to the default handler
    /// when no path matches, and replies `405` when the path matches but no item accepts the
    /// method.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = request.into_parts();

        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.is::<LengthLimitError>() => return status_response(StatusCode::PAYLOAD_TOO_LARGE),
            Err(e) => {
                error!(cause = %e, "collect request body error");
                return status_response(StatusCode::BAD_REQUEST);
            }
        };

        let path = parts.uri.path().to_owned();
        let route = self.at(&path);

        if route.is_empty() {
            let ctx = RequestContext::new(parts, body, PathParams::empty());
            return self.default_handler.invoke(ctx).await;
        }

        let ctx = RequestContext::new(parts, body, route.params);
        match route.router_items.iter().find(|item| item.filter.matches(&ctx)) {
            Some(item) => item.handler.invoke(ctx).await,
            None => status_response(StatusCode::METHOD_NOT_ALLOWED),
        }
    }
}

impl RouterItem {
    pub fn filter(&self) -> &MethodFilter {
        &self.filter
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }
}

impl RouteResult<'_> {
    fn empty() -> Self {
        Self { router_items: &[], params: PathParams::empty() }
    }

    /// Returns true if no routes were matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.router_items.is_empty()
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn router_items(&self) -> &[RouterItem] {
        self.router_items
    }
}

pub struct RouterBuilder {
    data: HashMap<String, Vec<RouterItem>>,
    default_handler: Option<Box<dyn RequestHandler>>,
    max_body_size: usize,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { data: HashMap::new(), default_handler: None, max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    pub fn route<H: RequestHandler + 'static>(mut self, route: impl Into<String>, filter: MethodFilter, handler: H) -> Self {
        self.data.entry(route.into()).or_default().push(RouterItem { filter, handler: Box::new(handler) });
        self
    }

    /// The handler of requests whose path matches no route, `404` by default
    pub fn default_handler<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.default_handler = Some(Box::new(handler));
        self
    }

    /// Largest accepted request body in bytes
    pub fn max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Builds the router from the accumulated routes
    ///
    /// # Errors
    /// [`RouterError::Insert`] when a path is malformed or conflicts with another one.
    pub fn build(self) -> Result<Router, RouterError> {
        let mut inner_router = InnerRouter::new();

        for (path, items) in self.data {
            if let Err(source) = inner_router.insert(path.clone(), items) {
                return Err(RouterError::Insert { path, source });
            }
        }

        Ok(Router {
            inner_router,
            default_handler: self.default_handler.unwrap_or_else(|| Box::new(NotFound)),
            max_body_size: self.max_body_size,
        })
    }
}

impl Host for RouterBuilder {
    fn add_route(&mut self, filter: MethodFilter, path: &str, handler: Box<dyn RequestHandler>) {
        self.data.entry(path.to_owned()).or_default().push(RouterItem { filter, handler });
    }
}

#[derive(Debug)]
struct NotFound;

#[async_trait]
impl RequestHandler for NotFound {
    async fn invoke(&self, _req: RequestContext) -> Response<ResponseBody> {
        status_response(StatusCode::NOT_FOUND)
    }
}

fn status_response(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::empty());
    *response.status_mut() = status;
    response
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router").field("max_body_size", &self.max_body_size).finish_non_exhaustive()
    }
}

impl fmt::Debug for RouterItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterItem").field("filter", &self.filter).finish_non_exhaustive()
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("routes", &self.data.keys().collect::<Vec<_>>())
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::filter::{any_method, get_method, post_method};
    use super::{RequestHandler, Router};
    use crate::{RequestContext, ResponseBody};
    use async_trait::async_trait;
    use bytes::Bytes;
    use http::{Method, Request, Response, StatusCode};
    use http_body_util::Full;

    struct Echo(&'static str);

    #[async_trait]
    impl RequestHandler for Echo {
        async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
            let name = req.path_params().get("name").unwrap_or_default();
            Response::new(ResponseBody::from(format!("{}{name}", self.0)))
        }
    }

    fn router() -> Router {
        Router::builder()
            .route("/", get_method(), Echo("get"))
            .route("/", post_method(), Echo("post"))
            .route("/", post_method(), Echo("shadowed"))
            .route("/hello/{name}", any_method(), Echo("hello "))
            .max_body_size(8)
            .build()
            .unwrap()
    }

    fn request(method: Method, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder().method(method).uri(uri).body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()
    }

    #[test]
    fn test_at() {
        let router = router();

        let route = router.at("/");
        assert_eq!(route.router_items().len(), 3);
        assert!(route.params().is_empty());

        let route = router.at("/hello/bingoo");
        assert_eq!(route.params().get("name"), Some("bingoo"));

        assert!(router.at("/missing").is_empty());
    }

    #[tokio::test]
    async fn test_handle() {
        let router = router();

        let response = router.handle(request(Method::GET, "/", "")).await;
        assert_eq!(response.body().as_bytes(), b"get");

        let response = router.handle(request(Method::POST, "/", "")).await;
        assert_eq!(response.body().as_bytes(), b"post");

        let response = router.handle(request(Method::DELETE, "/hello/bingoo", "")).await;
        assert_eq!(response.body().as_bytes(), b"hello bingoo");
    }

    #[tokio::test]
    async fn test_status() {
        let router = router();

        let response = router.handle(request(Method::GET, "/missing", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router.handle(request(Method::PUT, "/", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let response = router.handle(request(Method::POST, "/", "more than 8 bytes")).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_default_handler() {
        let router = Router::builder().default_handler(Echo("fallback")).build().unwrap();
        let response = router.handle(request(Method::GET, "/anything", "")).await;
        assert_eq!(response.body().as_bytes(), b"fallback");
    }

    #[test]
    fn test_conflicting_routes() {
        let err = Router::builder()
            .route("/{name}", get_method(), Echo(""))
            .route("/{other}", get_method(), Echo(""))
            .build()
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid route"), "{err}");
    }
}
