use crate::directive::{Directive, Params};
use crate::error::ConfigError;
use crate::extract::Shape;
use crate::registry::Tables;
use crate::values::Values;
use crate::{BindError, RequestContext};
use micro_reflect::{TypeKey, Value};

/// Where one parameter is read from, decided once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The live request context
    Context,
    /// The output of a provider of this type
    Provided(TypeKey),
    /// The registered type resolver of this type
    Resolved(TypeKey),
    /// The directive at this index of the route's directive list
    Directive(usize),
    /// The decoded request body
    Body,
    /// Nothing, only planned for optional parameters
    Absent,
}

/// Registration time view used to plan the parameters of one handler or provider.
#[derive(Debug)]
pub struct Scope<'a> {
    route: &'a str,
    subject: String,
    provided: &'a [TypeKey],
    later: &'a [TypeKey],
    tables: &'a Tables,
    directives: Option<&'a Params>,
    consumed: usize,
    position: usize,
}

impl<'a> Scope<'a> {
    pub(crate) fn for_handler(route: &'a str, provided: &'a [TypeKey], tables: &'a Tables, directives: &'a Params) -> Self {
        Self {
            route,
            subject: "handler".to_owned(),
            provided,
            later: &[],
            tables,
            directives: Some(directives),
            consumed: 0,
            position: 0,
        }
    }

    /// Scope of the provider at `index`; it sees only the outputs of earlier providers
    pub(crate) fn for_provider(route: &'a str, index: usize, outputs: &'a [TypeKey], tables: &'a Tables) -> Self {
        let (provided, rest) = outputs.split_at(index.min(outputs.len()));
        let later = rest.get(1..).unwrap_or_default();
        Self {
            route,
            subject: format!("provider #{index}"),
            provided,
            later,
            tables,
            directives: None,
            consumed: 0,
            position: 0,
        }
    }

    /// Moves to the next parameter; positions are counted from 1
    pub(crate) fn next_position(&mut self) {
        self.position += 1;
    }

    /// Number of directives claimed so far
    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    /// Picks the source for a parameter of type `key`, in priority order: request context,
    /// earlier provider output, type resolver, next directive, request body.
    ///
    /// # Errors
    /// [`ConfigError::ForwardReference`] when only a later provider produces the type,
    /// [`ConfigError::Unresolvable`] when no source applies.
    pub fn plan(&mut self, key: TypeKey, shape: Shape) -> Result<Source, ConfigError> {
        if shape == Shape::Context {
            return Ok(Source::Context);
        }

        if self.provided.contains(&key) {
            return Ok(Source::Provided(key));
        }

        if self.later.contains(&key) {
            return Err(ConfigError::ForwardReference {
                route: self.route.to_owned(),
                subject: self.subject.clone(),
                position: self.position,
                type_name: key.name(),
            });
        }

        if self.tables.has_resolver(key) {
            return Ok(Source::Resolved(key));
        }

        if shape == Shape::Primitive {
            if let Some(directives) = self.directives {
                if self.consumed < directives.len() {
                    let index = self.consumed;
                    self.consumed += 1;
                    return Ok(Source::Directive(index));
                }
            }
        }

        if shape == Shape::Record {
            return Ok(Source::Body);
        }

        Err(ConfigError::Unresolvable {
            route: self.route.to_owned(),
            subject: self.subject.clone(),
            position: self.position,
            type_name: key.name(),
        })
    }
}

/// Request time view used to bind the parameters of one handler or provider.
#[derive(Debug)]
pub struct BindCx<'a> {
    request: &'a RequestContext,
    values: &'a Values,
    tables: &'a Tables,
    directives: &'a Params,
}

impl<'a> BindCx<'a> {
    pub(crate) fn new(request: &'a RequestContext, values: &'a Values, tables: &'a Tables, directives: &'a Params) -> Self {
        Self { request, values, tables, directives }
    }

    pub fn request(&self) -> &'a RequestContext {
        self.request
    }

    /// Outputs of the providers that already ran for this request
    pub fn values(&self) -> &'a Values {
        self.values
    }

    pub fn directive(&self, index: usize) -> Option<&'a Directive> {
        self.directives.get(index)
    }

    /// Runs the type resolver registered for `key`
    ///
    /// # Errors
    /// [`BindError::Resolver`] when the resolver fails, [`BindError::Unavailable`] when none is
    /// registered.
    pub fn resolve(&self, key: TypeKey) -> Result<Value, BindError> {
        self.tables.resolve(key, self.request, self.values)
    }
}
