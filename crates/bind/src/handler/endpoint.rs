use crate::body::ResponseBody;
use crate::directive::Params;
use crate::extract::ParamList;
use crate::fn_trait::FnTrait;
use crate::formatter::default_error;
use crate::handler::{BindCx, Provider, Scope, Source};
use crate::registry::{Registry, Tables};
use crate::responder::{Outcome, Returns};
use crate::router::RequestHandler;
use crate::values::Values;
use crate::{BindError, ConfigError, RequestContext};
use async_trait::async_trait;
use http::Response;
use micro_reflect::TypeKey;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) trait ErasedHandler: Send + Sync {
    fn param_names(&self) -> Vec<&'static str>;

    fn return_names(&self) -> Vec<&'static str>;

    fn plan(&self, scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError>;

    fn call(&self, plan: &[Source], cx: &BindCx<'_>) -> Result<Outcome, BindError>;
}

/// a `FnTrait` holder which represents any handler function
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

impl<F, Args> fmt::Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

impl<F, Args> ErasedHandler for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Returns,
    Args: ParamList,
{
    fn param_names(&self) -> Vec<&'static str> {
        Args::type_names()
    }

    fn return_names(&self) -> Vec<&'static str> {
        <F::Output as Returns>::type_names()
    }

    fn plan(&self, scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError> {
        Args::plan(scope)
    }

    fn call(&self, plan: &[Source], cx: &BindCx<'_>) -> Result<Outcome, BindError> {
        let args = Args::bind(plan, cx)?;
        Ok(self.f.call(args).into_outcome())
    }
}

/// The planned form of one route: its handler, directives and providers, with the source of
/// every parameter decided.
///
/// Built once at registration and never mutated; every request runs against it.
pub struct Endpoint {
    label: String,
    handler: Box<dyn ErasedHandler>,
    plan: Vec<Source>,
    directives: Params,
    providers: Vec<(Provider, Vec<Source>)>,
    registry: Arc<Registry>,
}

impl Endpoint {
    /// Plans the providers, then the handler, against the current registry tables.
    ///
    /// # Errors
    /// The first parameter without a source, a provider parameter only produced by a later
    /// provider, or with `strict` set, directives left unused by the handler.
    pub(crate) fn build(
        label: String,
        handler: Box<dyn ErasedHandler>,
        directives: Params,
        providers: Vec<Provider>,
        registry: Arc<Registry>,
        strict: bool,
    ) -> Result<Self, ConfigError> {
        let tables = registry.snapshot();
        let outputs = providers.iter().map(Provider::output_key).collect::<Vec<TypeKey>>();

        let mut planned = Vec::with_capacity(providers.len());
        for (index, provider) in providers.into_iter().enumerate() {
            let mut scope = Scope::for_provider(&label, index, &outputs, &tables);
            let plan = provider.plan(&mut scope)?;
            planned.push((provider, plan));
        }

        let mut scope = Scope::for_handler(&label, &outputs, &tables, &directives);
        let plan = handler.plan(&mut scope)?;

        let unused = directives.len() - scope.consumed();
        if unused > 0 {
            if strict {
                return Err(ConfigError::UnusedDirectives { route: label, count: unused });
            }
            warn!(route = %label, unused, "directives left unused by the handler");
        }

        debug!(route = %label, params = ?handler.param_names(), returns = ?handler.return_names(), ?plan, "planned endpoint");

        Ok(Self { label, handler, plan, directives, providers: planned, registry })
    }

    /// `METHOD /path` of the route
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Source of every handler parameter, in declaration order
    #[inline]
    pub fn plan(&self) -> &[Source] {
        &self.plan
    }

    pub fn param_names(&self) -> Vec<&'static str> {
        self.handler.param_names()
    }

    pub fn return_names(&self) -> Vec<&'static str> {
        self.handler.return_names()
    }

    /// Runs providers, binds the arguments and calls the handler.
    ///
    /// Never fails: every failure, a panic included, becomes [`Outcome::Error`].
    pub fn run(&self, req: &RequestContext, tables: &Tables) -> Outcome {
        match catch_unwind(AssertUnwindSafe(|| self.try_run(req, tables))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Outcome::Error(e),
            Err(payload) => {
                let e = BindError::panic(payload.as_ref());
                warn!(route = %self.label, cause = %e, "handler panicked");
                Outcome::Error(e)
            }
        }
    }

    fn try_run(&self, req: &RequestContext, tables: &Tables) -> Result<Outcome, BindError> {
        let mut values = Values::new();

        for (provider, plan) in &self.providers {
            let cx = BindCx::new(req, &values, tables, &self.directives);
            let produced = catch_unwind(AssertUnwindSafe(|| provider.provide(plan, &cx)))
                .unwrap_or_else(|payload| {
                    let source = BindError::panic(payload.as_ref()).into();
                    Err(BindError::Provider { type_name: provider.output_key().name(), source })
                })
                .inspect_err(|e| {
                    warn!(route = %self.label, cause = %e, "provider failed");
                })?;

            if let Some(value) = produced {
                let key = provider.output_key();
                values
                    .store(key, value)
                    .map_err(|e| BindError::Provider { type_name: key.name(), source: e.into() })?;
            }
        }

        let cx = BindCx::new(req, &values, tables, &self.directives);
        self.handler.call(&self.plan, &cx)
    }

    /// Runs the endpoint and hands the outcome to the success or error formatter.
    ///
    /// Exactly one formatter runs per call, on one registry snapshot. A panicking formatter is
    /// replaced by [`default_error`] carrying the panic message.
    pub fn dispatch(&self, req: &RequestContext) -> Response<ResponseBody> {
        let tables = self.registry.snapshot();
        let outcome = self.run(req, &tables);

        catch_unwind(AssertUnwindSafe(|| match outcome {
            Outcome::Success(outputs) => {
                debug!(route = %self.label, outputs = outputs.len(), "dispatch success");
                tables.format_success(req, outputs)
            }
            Outcome::Error(e) => {
                debug!(route = %self.label, cause = %e, "dispatch error");
                tables.format_error(req, &e)
            }
        }))
        .unwrap_or_else(|payload| {
            let e = BindError::panic(payload.as_ref());
            warn!(route = %self.label, cause = %e, "formatter panicked");
            default_error(req, &e)
        })
    }
}

#[async_trait]
impl RequestHandler for Endpoint {
    async fn invoke(&self, req: RequestContext) -> Response<ResponseBody> {
        self.dispatch(&req)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("label", &self.label)
            .field("plan", &self.plan)
            .field("directives", &self.directives)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
