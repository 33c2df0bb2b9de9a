//! Classification of handler return values.
//!
//! A handler may return nothing, one value, a tuple of values, or a `Result` of any of those.
//! [`Returns`] turns the return value into an [`Outcome`]: an `Err` becomes the error outcome,
//! everything else becomes the ordered [`Outputs`] handed to the success formatter.
//!
//! Single values implement [`Reply`], which renders them as JSON, or as plain text for strings.

use crate::error::BoxError;
use crate::extract::Record;
use crate::BindError;
use serde::Serialize;
use std::any::{Any, type_name};
use std::fmt;

/// A single handler output value.
pub trait Reply: Send + 'static {
    /// Renders the value as JSON
    ///
    /// # Errors
    /// When the value fails to serialize.
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// The value as text, for the types that are replied as `text/plain`
    fn as_text(&self) -> Option<&str> {
        None
    }
}

macro_rules! impl_reply_for_serialize {
    ($($ty:ty)*) => {
        $(
        impl Reply for $ty {
            fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
                serde_json::to_value(self)
            }
        }
        )*
    };
}

impl_reply_for_serialize! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize f32 f64 bool char }

impl Reply for String {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(serde_json::Value::String(self.clone()))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Reply for &'static str {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(serde_json::Value::String((*self).to_owned()))
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Reply for serde_json::Value {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(self.clone())
    }
}

/// `None` renders as JSON `null`.
impl<T: Reply> Reply for Option<T> {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Some(t) => t.to_json(),
            None => Ok(serde_json::Value::Null),
        }
    }

    fn as_text(&self) -> Option<&str> {
        self.as_ref().and_then(Reply::as_text)
    }
}

impl<T: Serialize + Send + 'static> Reply for Vec<T> {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl<T> Reply for T
where
    T: Record + Serialize + Send + 'static,
{
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

trait ErasedReply: Send {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;

    fn as_text(&self) -> Option<&str>;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Reply> ErasedReply for T {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Reply::to_json(self)
    }

    fn as_text(&self) -> Option<&str> {
        Reply::as_text(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type erased handler output.
pub struct Output {
    type_name: &'static str,
    reply: Box<dyn ErasedReply>,
}

impl Output {
    pub fn new<T: Reply>(reply: T) -> Self {
        Self { type_name: type_name::<T>(), reply: Box::new(reply) }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Renders the output as JSON
    ///
    /// # Errors
    /// When the value fails to serialize.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        self.reply.to_json()
    }

    pub fn as_text(&self) -> Option<&str> {
        self.reply.as_text()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.reply.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("type", &self.type_name).finish_non_exhaustive()
    }
}

/// The ordered non-error outputs of one handler call.
#[derive(Debug, Default)]
pub struct Outputs {
    outputs: Vec<Output>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: Reply>(mut self, reply: T) -> Self {
        self.outputs.push(Output::new(reply));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Output> {
        self.outputs.get(index)
    }

    #[inline]
    pub fn first(&self) -> Option<&Output> {
        self.outputs.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }
}

impl IntoIterator for Outputs {
    type Item = Output;
    type IntoIter = std::vec::IntoIter<Output>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.into_iter()
    }
}

impl FromIterator<Output> for Outputs {
    fn from_iter<I: IntoIterator<Item = Output>>(iter: I) -> Self {
        Self { outputs: iter.into_iter().collect() }
    }
}

/// The classified result of one request.
#[derive(Debug)]
pub enum Outcome {
    Success(Outputs),
    Error(BindError),
}

impl Outcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A handler return type.
pub trait Returns: Send + 'static {
    /// Names of the declared output types, in order
    fn type_names() -> Vec<&'static str>;

    fn into_outcome(self) -> Outcome;
}

impl Returns for () {
    fn type_names() -> Vec<&'static str> {
        vec![]
    }

    fn into_outcome(self) -> Outcome {
        Outcome::Success(Outputs::new())
    }
}

impl<T: Reply> Returns for T {
    fn type_names() -> Vec<&'static str> {
        vec![type_name::<T>()]
    }

    fn into_outcome(self) -> Outcome {
        Outcome::Success(Outputs::new().with(self))
    }
}

macro_rules! impl_returns_for_tuple {
    ($($ty:ident)*) => {
        impl<$($ty,)*> Returns for ($($ty,)*)
        where
            $($ty: Reply,)*
        {
            fn type_names() -> Vec<&'static str> {
                vec![$(type_name::<$ty>(),)*]
            }

            #[allow(non_snake_case)]
            fn into_outcome(self) -> Outcome {
                let ($($ty,)*) = self;
                Outcome::Success(Outputs::new()$(.with($ty))*)
            }
        }
    };
}

impl_returns_for_tuple! { A }
impl_returns_for_tuple! { A B }
impl_returns_for_tuple! { A B C }
impl_returns_for_tuple! { A B C D }
impl_returns_for_tuple! { A B C D E }
impl_returns_for_tuple! { A B C D E F }

/// `Err` is routed to the error formatter, `Ok` is classified as `T`.
impl<T, E> Returns for Result<T, E>
where
    T: Returns,
    E: Into<BoxError> + Send + 'static,
{
    fn type_names() -> Vec<&'static str> {
        let mut names = T::type_names();
        names.push(type_name::<E>());
        names
    }

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Outcome::Error(BindError::handler(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Returns};
    use crate::extract::Record;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Serialize)]
    struct User {
        name: String,
        age: u32,
    }

    impl Record for User {}

    fn outputs(outcome: Outcome) -> super::Outputs {
        match outcome {
            Outcome::Success(outputs) => outputs,
            Outcome::Error(e) => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_unit() {
        assert!(outputs(().into_outcome()).is_empty());
        assert!(<() as Returns>::type_names().is_empty());
    }

    #[test]
    fn test_single() {
        let outputs = outputs("hello bingoo".to_owned().into_outcome());
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs.first().unwrap().as_text(), Some("hello bingoo"));
    }

    #[test]
    fn test_record() {
        let outputs = outputs(User { name: "bingoo".into(), age: 100 }.into_outcome());
        let output = outputs.first().unwrap();
        assert_eq!(output.to_json().unwrap(), json!({"name": "bingoo", "age": 100}));
        assert!(output.as_text().is_none());
        assert_eq!(output.downcast_ref::<User>().map(|u| u.age), Some(100));
    }

    #[test]
    fn test_tuple_keeps_order() {
        let outputs = outputs(("T/bingoo", 100_u32, None::<String>).into_outcome());
        let json = outputs.iter().map(|o| o.to_json().unwrap()).collect::<Vec<_>>();
        assert_eq!(json, [json!("T/bingoo"), json!(100), json!(null)]);
    }

    #[test]
    fn test_result() {
        let ok: Result<String, &'static str> = Ok("T/bingoo".into());
        assert_eq!(outputs(ok.into_outcome()).first().unwrap().as_text(), Some("T/bingoo"));

        let err: Result<String, &'static str> = Err("boom");
        match err.into_outcome() {
            Outcome::Error(e) => assert_eq!(e.to_string(), "boom"),
            Outcome::Success(_) => panic!("expected an error outcome"),
        }

        let unit: Result<(), std::io::Error> = Ok(());
        assert!(outputs(unit.into_outcome()).is_empty());

        assert_eq!(
            <Result<u32, String> as Returns>::type_names(),
            ["u32", "alloc::string::String"]
        );
    }
}
