//! Parameter directives: where a primitive handler parameter reads its raw value from.
//!
//! Directives are consumed in order by the primitive parameters of a handler that no
//! provider or type resolver claims.
//!
//! # Example
//! ```
//! use micro_bind::directive::{params, query_param, url_param};
//!
//! // fn(name: String, age: u32, verbose: bool)
//! let directives = params([url_param("name"), url_param("age"), query_param("verbose")]);
//! assert_eq!(directives.len(), 3);
//! ```

use crate::RequestContext;
use std::fmt;

/// The part of the request a directive reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Path,
    Query,
    Header,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    location: Location,
    name: String,
}

impl Directive {
    pub fn new(location: Location, name: impl Into<String>) -> Self {
        Self { location, name: name.into() }
    }

    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the raw value from the request, `None` when it is absent
    pub fn lookup<'r>(&self, ctx: &'r RequestContext) -> Option<&'r str> {
        match self.location {
            Location::Path => ctx.path_params().get(&self.name),
            Location::Query => ctx.query(&self.name),
            Location::Header => ctx.header(&self.name),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.location, self.name)
    }
}

/// Reads a named path segment, e.g. `name` of `/users/{name}`
pub fn url_param(name: impl Into<String>) -> Directive {
    Directive::new(Location::Path, name)
}

/// Reads the first query value with the given name
pub fn query_param(name: impl Into<String>) -> Directive {
    Directive::new(Location::Query, name)
}

/// Reads a header by its case-insensitive name
pub fn header_param(name: impl Into<String>) -> Directive {
    Directive::new(Location::Header, name)
}

/// The ordered directive list of one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    directives: Vec<Directive>,
}

pub fn params<I: IntoIterator<Item = Directive>>(directives: I) -> Params {
    directives.into_iter().collect()
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Directive> {
        self.directives.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter()
    }
}

impl FromIterator<Directive> for Params {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self { directives: iter.into_iter().collect() }
    }
}

impl From<Directive> for Params {
    fn from(directive: Directive) -> Self {
        Self { directives: vec![directive] }
    }
}
