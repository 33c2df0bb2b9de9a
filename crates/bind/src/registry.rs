//! The resolver registry: type resolvers and the success and error formatters.
//!
//! The tables live behind an [`ArcSwap`]. Reads are lock free and every request works on the one
//! snapshot it loaded, so a registration racing with traffic is seen by a request entirely or
//! not at all. Registrations are expected to finish during startup, before the routes that rely
//! on them are added.

use crate::body::ResponseBody;
use crate::error::BoxError;
use crate::formatter;
use crate::handler::Provision;
use crate::responder::Outputs;
use crate::values::Values;
use crate::{BindError, RequestContext};
use arc_swap::ArcSwap;
use http::Response;
use micro_reflect::{TypeKey, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type ResolverFn = Arc<dyn Fn(&RequestContext, &Values) -> Result<Option<Value>, BoxError> + Send + Sync>;
type SuccessFormatter = Arc<dyn Fn(&RequestContext, Outputs) -> Response<ResponseBody> + Send + Sync>;
type ErrorFormatter = Arc<dyn Fn(&RequestContext, &BindError) -> Response<ResponseBody> + Send + Sync>;

/// One immutable snapshot of the registry.
#[derive(Clone)]
pub struct Tables {
    resolvers: HashMap<TypeKey, ResolverFn>,
    success: SuccessFormatter,
    error: ErrorFormatter,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
            success: Arc::new(formatter::default_success),
            error: Arc::new(formatter::default_error),
        }
    }
}

impl Tables {
    #[inline]
    pub fn has_resolver(&self, key: TypeKey) -> bool {
        self.resolvers.contains_key(&key)
    }

    /// Runs the resolver of `key`
    ///
    /// # Errors
    /// [`BindError::Resolver`] when the resolver fails, [`BindError::Unavailable`] when there is
    /// no resolver or it produced nothing.
    pub fn resolve(&self, key: TypeKey, req: &RequestContext, values: &Values) -> Result<Value, BindError> {
        let resolver = self.resolvers.get(&key).ok_or_else(|| BindError::unavailable(key.name()))?;

        match resolver(req, values) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(BindError::unavailable(key.name())),
            Err(source) => Err(BindError::Resolver { type_name: key.name(), source }),
        }
    }

    pub fn format_success(&self, req: &RequestContext, outputs: Outputs) -> Response<ResponseBody> {
        (self.success)(req, outputs)
    }

    pub fn format_error(&self, req: &RequestContext, error: &BindError) -> Response<ResponseBody> {
        (self.error)(req, error)
    }
}

impl fmt::Debug for Tables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tables").field("resolvers", &self.resolvers.keys().collect::<Vec<_>>()).finish_non_exhaustive()
    }
}

/// Maps parameter types to their resolvers, and holds the active formatters.
///
/// Every slot holds at most one function; registering again replaces it.
pub struct Registry {
    tables: ArcSwap<Tables>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self { tables: ArcSwap::from_pointee(Tables::default()) }
    }

    /// Registers `f` as the resolver of its output type.
    ///
    /// `f` returns the value, or a `Result` whose `Err` aborts the request.
    ///
    /// # Example
    /// ```
    /// use micro_bind::extract::Param;
    /// use micro_bind::{Registry, RequestContext, Values};
    ///
    /// #[derive(Clone)]
    /// struct Token(String);
    ///
    /// impl Param for Token {}
    ///
    /// let registry = Registry::new();
    /// registry.register_type_resolver(|req: &RequestContext, _: &Values| {
    ///     req.header("token").map(|t| Token(t.to_owned())).ok_or("no token")
    /// });
    /// ```
    pub fn register_type_resolver<F, R>(&self, f: F)
    where
        F: Fn(&RequestContext, &Values) -> R + Send + Sync + 'static,
        R: Provision,
    {
        let key = R::output_key();
        let resolver: ResolverFn = Arc::new(move |req: &RequestContext, values: &Values| f(req, values).into_value());

        self.tables.rcu(|tables| {
            let mut tables = Tables::clone(tables);
            if tables.resolvers.insert(key, Arc::clone(&resolver)).is_some() {
                debug!(type_name = key.name(), "replacing type resolver");
            }
            tables
        });
    }

    pub fn register_success_formatter<F>(&self, f: F)
    where
        F: Fn(&RequestContext, Outputs) -> Response<ResponseBody> + Send + Sync + 'static,
    {
        let formatter: SuccessFormatter = Arc::new(f);
        self.tables.rcu(|tables| Tables { success: Arc::clone(&formatter), ..Tables::clone(tables) });
    }

    pub fn register_error_formatter<F>(&self, f: F)
    where
        F: Fn(&RequestContext, &BindError) -> Response<ResponseBody> + Send + Sync + 'static,
    {
        let formatter: ErrorFormatter = Arc::new(f);
        self.tables.rcu(|tables| Tables { error: Arc::clone(&formatter), ..Tables::clone(tables) });
    }

    /// The current tables; a request keeps using the snapshot it loaded
    pub fn snapshot(&self) -> Arc<Tables> {
        self.tables.load_full()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("tables", &*self.tables.load()).finish()
    }
}
