use crate::RequestContext;
use crate::extract::{Param, Shape};

impl Param for RequestContext {
    fn shape() -> Shape {
        Shape::Context
    }

    fn from_context(ctx: &RequestContext) -> Option<Self> {
        Some(ctx.clone())
    }
}
