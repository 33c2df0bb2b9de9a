//! Primitive parameters read from path, query or header directives.

use crate::extract::{Param, Shape};

macro_rules! impl_param_for_primitive {
    ($($ty:ty)*) => {
        $(
        impl Param for $ty {
            fn shape() -> Shape {
                Shape::Primitive
            }

            fn from_directive(raw: &str) -> Result<Self, String> {
                raw.parse::<$ty>().map_err(|e| e.to_string())
            }
        }
        )*
    };
}

impl_param_for_primitive! { i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize f32 f64 char String }

impl Param for bool {
    fn shape() -> Shape {
        Shape::Primitive
    }

    fn from_directive(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("invalid boolean".to_owned()),
    }
}
