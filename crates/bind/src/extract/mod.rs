//! Handler parameter binding.
//!
//! Every handler parameter type implements [`Param`]. The trait exposes the type key used to
//! match provider outputs and type resolvers, and the [`Shape`] that decides the fallback
//! source when nothing claims the type:
//!
//! | shape       | fallback                                  | implemented by                      |
//! |-------------|-------------------------------------------|-------------------------------------|
//! | `Context`   | the live [`RequestContext`]               | [`RequestContext`]                  |
//! | `Primitive` | the next [`Directive`](crate::directive::Directive) | integers, floats, `bool`, `char`, `String` |
//! | `Record`    | the decoded request body                  | types marked with [`Record`]        |
//! | `Injected`  | none, a provider or resolver must exist   | `impl Param for MyType {}`          |
//!
//! `Option<T>` and `Arc<T>` wrap any of them.
//!
//! # Example
//! ```
//! use micro_bind::extract::{Param, Record};
//! use serde::Deserialize;
//!
//! #[derive(Clone)]
//! struct AuthUser {
//!     name: String,
//! }
//!
//! // only ever produced by a provider or a type resolver
//! impl Param for AuthUser {}
//!
//! #[derive(Clone, Deserialize)]
//! struct SetAgeReq {
//!     name: String,
//!     age: u32,
//! }
//!
//! // decoded from the request body
//! impl Record for SetAgeReq {}
//! ```

mod extract_body;
mod extract_context;
mod extract_primitive;
mod extract_tuple;

pub use extract_tuple::ParamList;

use crate::handler::{BindCx, Scope, Source};
use crate::{BindError, ConfigError, RequestContext};
use micro_reflect::{TypeKey, Value};
use serde::de::DeserializeOwned;
use std::any::type_name;
use std::sync::Arc;

/// The static category of a parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Context,
    Primitive,
    Record,
    Injected,
}

/// Marker for struct types decoded from the request body and replied as JSON.
pub trait Record {}

/// A type that can appear as a handler or provider parameter.
pub trait Param: Clone + Send + Sync + 'static {
    /// The key provider outputs and type resolvers are matched against
    fn key() -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn shape() -> Shape {
        Shape::Injected
    }

    fn from_context(_ctx: &RequestContext) -> Option<Self> {
        None
    }

    /// Converts the raw text of a directive
    ///
    /// # Errors
    /// The conversion failure reason.
    fn from_directive(_raw: &str) -> Result<Self, String> {
        Err(format!("{} can not be read from a directive", type_name::<Self>()))
    }

    /// Decodes the request body
    ///
    /// # Errors
    /// [`BindError::Body`] when the body does not decode.
    fn from_body(_ctx: &RequestContext) -> Result<Self, BindError> {
        Err(BindError::body(type_name::<Self>(), "not a record type"))
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.downcast_ref::<Self>().cloned()
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::new(self))
    }

    /// Picks the source of this parameter at registration time
    ///
    /// # Errors
    /// [`ConfigError`] when no source applies.
    fn plan(scope: &mut Scope<'_>) -> Result<Source, ConfigError> {
        scope.plan(Self::key(), Self::shape())
    }

    /// Builds the parameter from its planned source
    ///
    /// # Errors
    /// Any [`BindError`] raised by the source.
    fn bind(source: &Source, cx: &BindCx<'_>) -> Result<Self, BindError> {
        bind_source(source, cx)
    }
}

fn bind_source<P: Param>(source: &Source, cx: &BindCx<'_>) -> Result<P, BindError> {
    let unavailable = || BindError::unavailable(type_name::<P>());

    match source {
        Source::Context => P::from_context(cx.request()).ok_or_else(unavailable),
        Source::Provided(key) => cx.values().get(*key).and_then(P::from_value).ok_or_else(unavailable),
        Source::Resolved(key) => {
            let value = cx.resolve(*key)?;
            P::from_value(&value).ok_or_else(unavailable)
        }
        Source::Directive(index) => {
            let directive = cx.directive(*index).ok_or_else(unavailable)?;
            let raw = directive
                .lookup(cx.request())
                .ok_or_else(|| BindError::missing(directive.location(), directive.name()))?;
            P::from_directive(raw).map_err(|reason| BindError::convert(directive.location(), directive.name(), raw, reason))
        }
        Source::Body => P::from_body(cx.request()),
        Source::Absent => Err(unavailable()),
    }
}

impl<T> Param for T
where
    T: Record + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn shape() -> Shape {
        Shape::Record
    }

    fn from_body(ctx: &RequestContext) -> Result<Self, BindError> {
        extract_body::decode_body(ctx)
    }
}

/// Binds `None` where `T` has no source, the provider or type resolver produced nothing, the
/// directive value is absent or the body is empty.
impl<T: Param> Param for Option<T> {
    fn key() -> TypeKey {
        T::key()
    }

    fn shape() -> Shape {
        T::shape()
    }

    fn from_context(ctx: &RequestContext) -> Option<Self> {
        T::from_context(ctx).map(Some)
    }

    fn from_directive(raw: &str) -> Result<Self, String> {
        T::from_directive(raw).map(Some)
    }

    fn from_body(ctx: &RequestContext) -> Result<Self, BindError> {
        if ctx.body().is_empty() { Ok(None) } else { T::from_body(ctx).map(Some) }
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(Some)
    }

    fn into_value(self) -> Option<Value> {
        self.and_then(T::into_value)
    }

    fn plan(scope: &mut Scope<'_>) -> Result<Source, ConfigError> {
        match T::plan(scope) {
            Err(ConfigError::Unresolvable { .. }) => Ok(Source::Absent),
            planned => planned,
        }
    }

    fn bind(source: &Source, cx: &BindCx<'_>) -> Result<Self, BindError> {
        match source {
            Source::Absent => Ok(None),
            Source::Provided(key) if cx.values().get(*key).is_none() => Ok(None),
            Source::Directive(index) if cx.directive(*index).and_then(|d| d.lookup(cx.request())).is_none() => Ok(None),
            Source::Body if cx.request().body().is_empty() => Ok(None),
            Source::Resolved(_) => match T::bind(source, cx) {
                Err(BindError::Unavailable { .. }) => Ok(None),
                bound => bound.map(Some),
            },
            _ => T::bind(source, cx).map(Some),
        }
    }
}

/// Shares the stored value of a provider or resolver instead of cloning it.
impl<T: Param> Param for Arc<T> {
    fn key() -> TypeKey {
        T::key()
    }

    fn shape() -> Shape {
        T::shape()
    }

    fn from_context(ctx: &RequestContext) -> Option<Self> {
        T::from_context(ctx).map(Arc::new)
    }

    fn from_directive(raw: &str) -> Result<Self, String> {
        T::from_directive(raw).map(Arc::new)
    }

    fn from_body(ctx: &RequestContext) -> Result<Self, BindError> {
        T::from_body(ctx).map(Arc::new)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.downcast_arc::<T>()
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::from_arc(self))
    }
}
