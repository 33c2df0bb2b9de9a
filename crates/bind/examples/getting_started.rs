use bytes::Bytes;
use http::{Method, Request};
use http_body_util::Full;
use micro_bind::directive::{params, query_param, url_param};
use micro_bind::extract::{Param, Record};
use micro_bind::formatter::{envelope_error, envelope_success};
use micro_bind::{Adaptor, RequestContext, Router, Values, bind};
use serde::{Deserialize, Serialize};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, Debug)]
struct AuthUser {
    name: String,
}

impl Param for AuthUser {}

#[derive(Clone, Debug, Deserialize)]
struct SetAgeReq {
    name: String,
    age: u32,
}

impl Record for SetAgeReq {}

#[derive(Debug, Serialize)]
struct SetAgeRsp {
    name: String,
}

impl Record for SetAgeRsp {}

fn get_age(user: AuthUser, name: String) -> String {
    format!("{}/{}", user.name, name)
}

fn set_age(req: SetAgeReq) -> SetAgeRsp {
    SetAgeRsp { name: format!("{}:{}", req.name, req.age) }
}

fn hello(arg: Option<String>) -> Result<String, &'static str> {
    match arg {
        Some(arg) if !arg.is_empty() => Ok(format!("hello {arg}")),
        _ => Err("arg is required"),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let adaptor = Adaptor::new();
    adaptor.register_success_formatter(envelope_success);
    adaptor.register_error_formatter(envelope_error);
    adaptor.register_type_resolver(|req: &RequestContext, _: &Values| AuthUser {
        name: req.header("x-user").unwrap_or("anonymous").to_owned(),
    });

    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get("/GetAge/{name}", bind(get_age).params(url_param("name")))
        .unwrap()
        .post("/SetAge", set_age)
        .unwrap()
        .get("/hello", bind(hello).params(params([query_param("arg")])))
        .unwrap();
    let router = builder.build().unwrap();

    let requests = [
        Request::builder().uri("/GetAge/bingoo").header("x-user", "T").body(Full::new(Bytes::new())),
        Request::builder()
            .method(Method::POST)
            .uri("/SetAge")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(br#"{"name":"bingoo","age":100}"#))),
        Request::builder().uri("/hello?arg=huang").body(Full::new(Bytes::new())),
        Request::builder().uri("/hello").body(Full::new(Bytes::new())),
    ];

    for request in requests {
        let request = request.unwrap();
        let uri = request.uri().clone();
        let response = router.handle(request).await;
        info!(%uri, status = %response.status(), body = %String::from_utf8_lossy(response.body().as_bytes()), "handled");
    }
}
