use crate::directive::Location;
use std::any::Any;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A per request failure. Every variant ends up in the error formatter.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing {location} parameter `{name}`")]
    Missing { location: Location, name: String },

    #[error("invalid {location} parameter `{name}`: {value:?} {reason}")]
    Convert { location: Location, name: String, value: String, reason: String },

    #[error("invalid body for {type_name}: {reason}")]
    Body { type_name: &'static str, reason: String },

    #[error("resolver of {type_name} failed: {source}")]
    Resolver { type_name: &'static str, source: BoxError },

    #[error("provider of {type_name} failed: {source}")]
    Provider { type_name: &'static str, source: BoxError },

    #[error("{source}")]
    Handler { source: BoxError },

    #[error("{message}")]
    Panic { message: String },

    #[error("no value of type {type_name} available")]
    Unavailable { type_name: &'static str },
}

impl BindError {
    pub fn missing<S: ToString>(location: Location, name: S) -> Self {
        Self::Missing { location, name: name.to_string() }
    }

    pub fn convert<S: ToString, R: ToString>(location: Location, name: S, value: &str, reason: R) -> Self {
        Self::Convert { location, name: name.to_string(), value: value.to_owned(), reason: reason.to_string() }
    }

    pub fn body<S: ToString>(type_name: &'static str, reason: S) -> Self {
        Self::Body { type_name, reason: reason.to_string() }
    }

    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn unavailable(type_name: &'static str) -> Self {
        Self::Unavailable { type_name }
    }

    /// Converts a caught panic payload, keeping its message when it is a string
    pub fn panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_owned());
        Self::Panic { message }
    }
}

/// A registration failure, raised before any request is served.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{route}: {subject} parameter #{position} of type {type_name} can not be resolved")]
    Unresolvable { route: String, subject: String, position: usize, type_name: &'static str },

    #[error("{route}: {subject} parameter #{position} of type {type_name} is only produced by a later provider")]
    ForwardReference { route: String, subject: String, position: usize, type_name: &'static str },

    #[error("{route}: {count} directive(s) left unused")]
    UnusedDirectives { route: String, count: usize },
}

#[cfg(test)]
mod tests {
    use super::BindError;
    use crate::directive::Location;

    #[test]
    fn test_display() {
        let e = BindError::convert(Location::Path, "age", "abc", "invalid digit found in string");
        assert_eq!(e.to_string(), r#"invalid path parameter `age`: "abc" invalid digit found in string"#);

        let e = BindError::handler("boom");
        assert_eq!(e.to_string(), "boom");

        let e = BindError::missing(Location::Query, "arg");
        assert_eq!(e.to_string(), "missing query parameter `arg`");
    }

    #[test]
    fn test_panic_payload() {
        let payload = std::panic::catch_unwind(|| panic!("bad {}", 1)).unwrap_err();
        assert_eq!(BindError::panic(payload.as_ref()).to_string(), "bad 1");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(BindError::panic(payload.as_ref()).to_string(), "handler panicked");
    }
}
