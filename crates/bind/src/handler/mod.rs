//! The binding and invocation engine.
//!
//! A route is planned once, when it is registered: every provider parameter and handler
//! parameter gets a [`Source`]. Each request then runs the [`Endpoint`]:
//!
//! 1. the providers run in declaration order, each output stored in the request's
//!    [`Values`](crate::Values)
//! 2. the handler arguments are bound from their planned sources
//! 3. the handler is called, a panic turns into an error
//! 4. the return value is classified and handed to the success or error formatter

mod endpoint;
mod plan;
mod provider;

pub use endpoint::{Endpoint, FnHandler, handler_fn};
pub use plan::{BindCx, Scope, Source};
pub use provider::{IntoProvider, Provider, Provision, provider};

pub(crate) use endpoint::ErasedHandler;
