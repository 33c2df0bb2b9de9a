//! Request filters deciding which route item of a matched path handles a request.
//!
//! # Examples
//!
//! ```
//! use micro_bind::router::filter::{MethodFilter, any_method, get_method};
//!
//! assert_eq!(get_method(), MethodFilter::One(http::Method::GET));
//! assert_eq!(any_method().to_string(), "ANY");
//! ```

use crate::RequestContext;
use http::Method;
use std::fmt;

/// Core trait for request filtering.
///
/// The `Filter` trait requires `Send + Sync`, ensuring that filters
/// can be safely used in a multi-threaded environment.
pub trait Filter: Send + Sync {
    /// Returns `true` if the request should be allowed, `false` otherwise.
    fn matches(&self, req: &RequestContext) -> bool;
}

/// A filter that matches HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Every method
    Any,
    One(Method),
}

impl Filter for MethodFilter {
    #[inline]
    fn matches(&self, req: &RequestContext) -> bool {
        match self {
            Self::Any => true,
            Self::One(method) => method == req.method(),
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::One(method) => f.write_str(method.as_str()),
        }
    }
}

/// Creates a filter that matches every request method.
#[inline]
pub fn any_method() -> MethodFilter {
    MethodFilter::Any
}

macro_rules! method_filter {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Creates a filter that matches HTTP ", stringify!($upper_case_method), " requests.")]
        #[inline]
        pub fn $method() -> MethodFilter {
            MethodFilter::One(Method::$upper_case_method)
        }
    };
}

method_filter!(get_method, GET);
method_filter!(post_method, POST);
method_filter!(put_method, PUT);
method_filter!(delete_method, DELETE);
method_filter!(head_method, HEAD);
method_filter!(options_method, OPTIONS);
method_filter!(patch_method, PATCH);
