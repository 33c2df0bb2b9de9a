//! Record parameters decoded from the request body.
//!
//! `application/x-www-form-urlencoded` bodies are decoded as forms, anything else as JSON.

use crate::{BindError, RequestContext};
use serde::de::DeserializeOwned;
use std::any::type_name;

pub(crate) fn decode_body<T: DeserializeOwned>(ctx: &RequestContext) -> Result<T, BindError> {
    let type_name = type_name::<T>();

    if is_form(ctx) {
        serde_urlencoded::from_bytes::<T>(ctx.body()).map_err(|e| BindError::body(type_name, e))
    } else {
        serde_json::from_slice::<T>(ctx.body()).map_err(|e| BindError::body(type_name, e))
    }
}

fn is_form(ctx: &RequestContext) -> bool {
    ctx.content_type()
        .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}
