//! The route adapter: installs plain handler functions into a [`Host`] router.
//!
//! # Example
//! ```
//! use micro_bind::directive::{params, url_param};
//! use micro_bind::{Adaptor, Router, bind};
//!
//! fn get_age(name: String, age: u32) -> String {
//!     format!("{name}:{age}")
//! }
//!
//! let adaptor = Adaptor::new();
//! let mut builder = Router::builder();
//!
//! adaptor
//!     .route(&mut builder)
//!     .get("/Get/{name}/{age}", bind(get_age).params(params([url_param("name"), url_param("age")])))
//!     .unwrap()
//!     .get("/ping", || "pong")
//!     .unwrap();
//!
//! let router = builder.build().unwrap();
//! ```

use crate::directive::Params;
use crate::extract::ParamList;
use crate::fn_trait::FnTrait;
use crate::handler::{Endpoint, ErasedHandler, IntoProvider, Provider, Provision, handler_fn};
use crate::registry::Registry;
use crate::responder::{Outputs, Returns};
use crate::router::Host;
use crate::router::filter::MethodFilter;
use crate::{BindError, ConfigError, RequestContext, ResponseBody};
use http::{Method, Response};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Entry point of route registration, sharing one [`Registry`] between all its routes.
#[derive(Debug, Clone)]
pub struct Adaptor {
    registry: Arc<Registry>,
    strict_directives: bool,
}

#[derive(Debug, Default)]
pub struct AdaptorBuilder {
    registry: Option<Arc<Registry>>,
    strict_directives: bool,
}

impl AdaptorBuilder {
    /// Shares an existing registry instead of creating a new one
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Fails registration when a route declares directives its handler never consumes
    pub fn strict_directives(mut self, strict: bool) -> Self {
        self.strict_directives = strict;
        self
    }

    /// # Panics
    /// When the value handle layout is not supported, see [`micro_reflect::ensure_layout`].
    pub fn build(self) -> Adaptor {
        micro_reflect::ensure_layout();
        Adaptor { registry: self.registry.unwrap_or_default(), strict_directives: self.strict_directives }
    }
}

impl Default for Adaptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Adaptor {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AdaptorBuilder {
        AdaptorBuilder::default()
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// See [`Registry::register_type_resolver`]
    pub fn register_type_resolver<F, R>(&self, f: F)
    where
        F: Fn(&RequestContext, &crate::Values) -> R + Send + Sync + 'static,
        R: Provision,
    {
        self.registry.register_type_resolver(f);
    }

    pub fn register_success_formatter<F>(&self, f: F)
    where
        F: Fn(&RequestContext, Outputs) -> Response<ResponseBody> + Send + Sync + 'static,
    {
        self.registry.register_success_formatter(f);
    }

    pub fn register_error_formatter<F>(&self, f: F)
    where
        F: Fn(&RequestContext, &BindError) -> Response<ResponseBody> + Send + Sync + 'static,
    {
        self.registry.register_error_formatter(f);
    }

    /// Starts registering routes into `host`
    pub fn route<'h, H: Host + ?Sized>(&self, host: &'h mut H) -> Routes<'h, H> {
        Routes {
            registry: Arc::clone(&self.registry),
            strict_directives: self.strict_directives,
            host,
            providers: Vec::new(),
        }
    }
}

/// A group of routes registered into one host, sharing the group providers.
pub struct Routes<'h, H: ?Sized> {
    registry: Arc<Registry>,
    strict_directives: bool,
    host: &'h mut H,
    providers: Vec<Provider>,
}

macro_rules! method_route {
    ($method:ident, $filter:expr) => {
        #[doc = concat!("Registers `route` for `", stringify!($method), "` requests on `path`")]
        ///
        /// # Errors
        /// [`ConfigError`] when a handler or provider parameter has no source.
        pub fn $method<M>(&mut self, path: &str, route: impl IntoRoute<M>) -> Result<&mut Self, ConfigError> {
            self.add($filter, path, route.into_route())
        }
    };
}

impl<H: Host + ?Sized> Routes<'_, H> {
    /// Adds a provider run before the route providers of every route registered afterwards
    pub fn provide<M>(&mut self, provider: impl IntoProvider<M>) -> &mut Self {
        self.providers.push(provider.into_provider());
        self
    }

    method_route!(get, MethodFilter::One(Method::GET));
    method_route!(post, MethodFilter::One(Method::POST));
    method_route!(put, MethodFilter::One(Method::PUT));
    method_route!(delete, MethodFilter::One(Method::DELETE));
    method_route!(patch, MethodFilter::One(Method::PATCH));
    method_route!(head, MethodFilter::One(Method::HEAD));
    method_route!(options, MethodFilter::One(Method::OPTIONS));
    method_route!(any, MethodFilter::Any);

    fn add(&mut self, filter: MethodFilter, path: &str, route: Route) -> Result<&mut Self, ConfigError> {
        let label = format!("{filter} {path}");
        let providers = self.providers.iter().cloned().chain(route.providers).collect::<Vec<_>>();

        let endpoint = Endpoint::build(
            label,
            route.handler,
            route.directives,
            providers,
            Arc::clone(&self.registry),
            self.strict_directives,
        )?;

        debug!(route = endpoint.label(), "add route");
        self.host.add_route(filter, path, Box::new(endpoint));
        Ok(self)
    }
}

impl<H: ?Sized> fmt::Debug for Routes<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes").field("providers", &self.providers).finish_non_exhaustive()
    }
}

/// A handler with its directives and route providers.
pub struct Route {
    handler: Box<dyn ErasedHandler>,
    directives: Params,
    providers: Vec<Provider>,
}

/// Wraps a handler function into a [`Route`]
pub fn bind<F, Args>(f: F) -> Route
where
    F: FnTrait<Args>,
    F::Output: Returns,
    Args: ParamList,
{
    Route { handler: Box::new(handler_fn(f)), directives: Params::new(), providers: Vec::new() }
}

impl Route {
    /// Sets the directives consumed by the primitive parameters, in order
    pub fn params(mut self, directives: impl Into<Params>) -> Self {
        self.directives = directives.into();
        self
    }

    /// Adds a provider run after the group providers and the providers added before it
    pub fn provide<M>(mut self, provider: impl IntoProvider<M>) -> Self {
        self.providers.push(provider.into_provider());
        self
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("params", &self.handler.param_names())
            .field("directives", &self.directives)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Anything accepted where a route is expected: a [`Route`] or a plain handler function.
pub trait IntoRoute<M> {
    fn into_route(self) -> Route;
}

impl IntoRoute<()> for Route {
    fn into_route(self) -> Route {
        self
    }
}

impl<F, Args> IntoRoute<(Args,)> for F
where
    F: FnTrait<Args>,
    F::Output: Returns,
    Args: ParamList,
{
    fn into_route(self) -> Route {
        bind(self)
    }
}
