use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectError {
    #[error("value of type {type_name} is read-only")]
    ReadOnly { type_name: &'static str },

    #[error("type mismatch: expected {expected}, actual {actual}")]
    TypeMismatch { expected: &'static str, actual: &'static str },

    #[error("unable to find the `{name}` field of Value")]
    MissingField { name: &'static str },

    #[error("field `{name}` of Value has size {actual}, expected {expected}")]
    FieldLayout { name: &'static str, expected: usize, actual: usize },
}

impl ReflectError {
    pub fn read_only(type_name: &'static str) -> Self {
        Self::ReadOnly { type_name }
    }

    pub fn type_mismatch(expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch { expected, actual }
    }
}
