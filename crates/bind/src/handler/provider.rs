use crate::error::BoxError;
use crate::extract::{Param, ParamList};
use crate::fn_trait::FnTrait;
use crate::handler::{BindCx, Scope, Source};
use crate::{BindError, ConfigError};
use micro_reflect::{TypeKey, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The return type of a provider or a type resolver.
///
/// Plain parameter types are stored as they are; `Result<T, E>` aborts the request on `Err`.
pub trait Provision: Send + 'static {
    /// The key the produced value is stored and matched under
    fn output_key() -> TypeKey;

    /// Erases the produced value, `None` when there is nothing to store
    ///
    /// # Errors
    /// The provider's own failure.
    fn into_value(self) -> Result<Option<Value>, BoxError>;
}

impl<T: Param> Provision for T {
    fn output_key() -> TypeKey {
        T::key()
    }

    fn into_value(self) -> Result<Option<Value>, BoxError> {
        Ok(Param::into_value(self))
    }
}

impl<T, E> Provision for Result<T, E>
where
    T: Param,
    E: Into<BoxError> + Send + 'static,
{
    fn output_key() -> TypeKey {
        T::key()
    }

    fn into_value(self) -> Result<Option<Value>, BoxError> {
        self.map(Param::into_value).map_err(Into::into)
    }
}

pub(crate) trait ErasedProvider: Send + Sync {
    fn output_key(&self) -> TypeKey;

    fn plan(&self, scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError>;

    fn provide(&self, plan: &[Source], cx: &BindCx<'_>) -> Result<Option<Value>, BindError>;
}

struct FnProvider<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> ErasedProvider for FnProvider<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Provision,
    Args: ParamList,
{
    fn output_key(&self) -> TypeKey {
        <F::Output as Provision>::output_key()
    }

    fn plan(&self, scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError> {
        Args::plan(scope)
    }

    fn provide(&self, plan: &[Source], cx: &BindCx<'_>) -> Result<Option<Value>, BindError> {
        let args = Args::bind(plan, cx)?;
        Provision::into_value(self.f.call(args))
            .map_err(|source| BindError::Provider { type_name: self.output_key().name(), source })
    }
}

/// A function run before the handler, whose output becomes available to later providers,
/// type resolvers and the handler.
#[derive(Clone)]
pub struct Provider {
    inner: Arc<dyn ErasedProvider>,
}

impl Provider {
    #[inline]
    pub fn output_key(&self) -> TypeKey {
        self.inner.output_key()
    }

    pub(crate) fn plan(&self, scope: &mut Scope<'_>) -> Result<Vec<Source>, ConfigError> {
        self.inner.plan(scope)
    }

    pub(crate) fn provide(&self, plan: &[Source], cx: &BindCx<'_>) -> Result<Option<Value>, BindError> {
        self.inner.provide(plan, cx)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").field("output", &self.output_key()).finish()
    }
}

/// Wraps a function into a [`Provider`]; its parameters bind like handler parameters but never
/// read directives.
pub fn provider<F, Args>(f: F) -> Provider
where
    F: FnTrait<Args>,
    F::Output: Provision,
    Args: ParamList,
{
    Provider { inner: Arc::new(FnProvider { f, _phantom: PhantomData }) }
}

/// Anything accepted where a provider is expected: a [`Provider`] or a plain function.
pub trait IntoProvider<M> {
    fn into_provider(self) -> Provider;
}

impl IntoProvider<()> for Provider {
    fn into_provider(self) -> Provider {
        self
    }
}

impl<F, Args> IntoProvider<(Args,)> for F
where
    F: FnTrait<Args>,
    F::Output: Provision,
    Args: ParamList,
{
    fn into_provider(self) -> Provider {
        provider(self)
    }
}
