//! Success and error formatters.
//!
//! [`default_success`] and [`default_error`] are active until others are registered.
//! [`envelope_success`] and [`envelope_error`] wrap every reply in an [`Envelope`].

use crate::body::ResponseBody;
use crate::extract::Record;
use crate::responder::{Output, Outputs};
use crate::{BindError, RequestContext};
use http::{HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

/// No output replies `200` with an empty body, a single text output replies `text/plain`, a
/// single other output replies its JSON, several outputs reply a JSON array.
pub fn default_success(_req: &RequestContext, outputs: Outputs) -> Response<ResponseBody> {
    if outputs.is_empty() {
        return Response::new(ResponseBody::empty());
    }

    if outputs.len() == 1 {
        if let Some(text) = outputs.first().and_then(Output::as_text) {
            return text_response(StatusCode::OK, text.to_owned());
        }
    }

    let json = if outputs.len() == 1 {
        outputs.first().map(Output::to_json).unwrap_or(Ok(serde_json::Value::Null))
    } else {
        outputs.iter().map(Output::to_json).collect::<Result<Vec<_>, _>>().map(serde_json::Value::Array)
    };

    match json {
        Ok(json) => json_response(StatusCode::OK, &json),
        Err(e) => {
            error!(cause = %e, "serialize handler output error");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Replies `500` with the error message as plain text.
pub fn default_error(_req: &RequestContext, error: &BindError) -> Response<ResponseBody> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

pub fn text_response(status: StatusCode, text: String) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from(text));
    *response.status_mut() = status;
    response.headers_mut().insert(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(ResponseBody::from(bytes));
            *response.status_mut() = status;
            response.headers_mut().insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(e) => {
            error!(cause = %e, "serialize response error");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// The `{"State": .., "Data": ..}` reply shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    pub state: u16,
    pub data: serde_json::Value,
}

impl Record for Envelope {}

impl Envelope {
    pub fn ok<T: Into<serde_json::Value>>(data: T) -> Self {
        Self { state: StatusCode::OK.as_u16(), data: data.into() }
    }
}

/// Replies `{"State": 200, "Data": "ok"}` for no output, an [`Envelope`] output as it is, and
/// otherwise the first output as `Data`. Always HTTP `200`.
pub fn envelope_success(_req: &RequestContext, outputs: Outputs) -> Response<ResponseBody> {
    let Some(first) = outputs.first() else {
        return json_response(StatusCode::OK, &Envelope::ok("ok"));
    };

    if let Some(envelope) = first.downcast_ref::<Envelope>() {
        return json_response(StatusCode::OK, envelope);
    }

    match first.to_json() {
        Ok(data) => json_response(StatusCode::OK, &Envelope::ok(data)),
        Err(e) => {
            error!(cause = %e, type_name = first.type_name(), "serialize handler output error");
            json_response(StatusCode::OK, &failure(e.to_string()))
        }
    }
}

/// Replies `{"State": 500, "Data": <message>}` with HTTP `200`.
pub fn envelope_error(_req: &RequestContext, error: &BindError) -> Response<ResponseBody> {
    json_response(StatusCode::OK, &failure(error.to_string()))
}

fn failure(message: String) -> Envelope {
    Envelope { state: StatusCode::INTERNAL_SERVER_ERROR.as_u16(), data: serde_json::Value::String(message) }
}
