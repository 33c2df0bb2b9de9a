//! Bind plain functions with typed parameters and return values to http routes.
//!
//! A handler is any function whose parameters implement [`extract::Param`] and whose return
//! type implements [`Returns`]. Every parameter is bound from the request context, a provider
//! output, a registered type resolver, a path, query or header [`directive`], or the decoded
//! request body. The return values are handed to the success or error formatter of the
//! [`Registry`].
//!
//! # Example
//! ```
//! use micro_bind::directive::{params, query_param};
//! use micro_bind::extract::Param;
//! use micro_bind::{Adaptor, RequestContext, Router, Values, bind};
//!
//! #[derive(Clone)]
//! struct AuthUser {
//!     name: String,
//! }
//!
//! impl Param for AuthUser {}
//!
//! fn get_age(user: AuthUser, name: String) -> Result<String, &'static str> {
//!     if name.is_empty() { Err("no name") } else { Ok(format!("{}/{name}", user.name)) }
//! }
//!
//! let adaptor = Adaptor::new();
//! adaptor.register_type_resolver(|req: &RequestContext, _: &Values| AuthUser {
//!     name: req.header("x-user").unwrap_or("T").to_owned(),
//! });
//!
//! let mut builder = Router::builder();
//! adaptor.route(&mut builder).get("/GetAge", bind(get_age).params(params([query_param("name")]))).unwrap();
//! let router = builder.build().unwrap();
//! ```

mod adaptor;
mod body;
mod error;
mod fn_trait;
mod registry;
mod request;
mod responder;
mod values;

pub mod directive;
pub mod extract;
pub mod formatter;
pub mod handler;
pub mod router;

pub use adaptor::{Adaptor, AdaptorBuilder, IntoRoute, Route, Routes, bind};
pub use body::ResponseBody;
pub use error::{BindError, BoxError, ConfigError};
pub use fn_trait::FnTrait;
pub use handler::{Endpoint, FnHandler, Provider, handler_fn, provider};
pub use registry::{Registry, Tables};
pub use request::{PathParams, RequestContext};
pub use responder::{Outcome, Output, Outputs, Reply, Returns};
pub use router::{Host, RequestHandler, Router, RouterBuilder};
pub use values::Values;
