use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use micro_bind::directive::{header_param, params, query_param, url_param};
use micro_bind::extract::Param;
use micro_bind::{Adaptor, BindError, ConfigError, Outputs, RequestContext, ResponseBody, Router, Values, bind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
struct AuthUser {
    name: String,
}

impl Param for AuthUser {}

#[derive(Clone, Debug)]
struct Trace(Vec<&'static str>);

impl Param for Trace {}

async fn get(router: &Router, uri: &str) -> Response<ResponseBody> {
    router.handle(Request::get(uri).body(Full::new(Bytes::new())).unwrap()).await
}

fn text(response: &Response<ResponseBody>) -> &str {
    std::str::from_utf8(response.body().as_bytes()).unwrap()
}

#[tokio::test]
async fn test_path_directives() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get(
            "/Get/{name}/{age}",
            bind(|name: String, age: i32| format!("{name}:{age}")).params(params([url_param("name"), url_param("age")])),
        )
        .unwrap();
    let router = builder.build().unwrap();

    let response = get(&router, "/Get/bingoo/100").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(&response), "bingoo:100");
}

#[tokio::test]
async fn test_provider_scenario() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get(
            "/GetAge/{name}",
            bind(|user: AuthUser, name: String| format!("{}/{name}", user.name))
                .params(url_param("name"))
                .provide(|| AuthUser { name: "T".into() }),
        )
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/GetAge/bingoo").await), "T/bingoo");
}

#[tokio::test]
async fn test_formatters_are_exclusive() {
    let successes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(Vec::<String>::new()));

    let adaptor = Adaptor::new();
    {
        let successes = Arc::clone(&successes);
        adaptor.register_success_formatter(move |_: &RequestContext, outputs: Outputs| {
            successes.fetch_add(1, Ordering::SeqCst);
            Response::new(ResponseBody::from(format!("{} values", outputs.len())))
        });
    }
    {
        let errors = Arc::clone(&errors);
        adaptor.register_error_formatter(move |_: &RequestContext, e: &BindError| {
            errors.lock().unwrap().push(e.to_string());
            Response::new(ResponseBody::from("error"))
        });
    }

    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get("/boom", || -> Result<String, &'static str> { Err("boom") })
        .unwrap()
        .get("/nothing", || {})
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/boom").await), "error");
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    assert_eq!(*errors.lock().unwrap(), ["boom"]);

    assert_eq!(text(&get(&router, "/nothing").await), "0 values");
    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_default_error_formatter() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor.route(&mut builder).get("/boom", || -> Result<(), &'static str> { Err("boom") }).unwrap();
    let router = builder.build().unwrap();

    let response = get(&router, "/boom").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&response), "boom");
}

#[tokio::test]
async fn test_resolver_reregistration() {
    let adaptor = Adaptor::new();
    adaptor.register_type_resolver(|_: &RequestContext, _: &Values| AuthUser { name: "old".into() });

    let mut builder = Router::builder();
    adaptor.route(&mut builder).get("/who", |user: AuthUser| user.name).unwrap();
    let router = builder.build().unwrap();
    assert_eq!(text(&get(&router, "/who").await), "old");

    adaptor.register_type_resolver(|_: &RequestContext, _: &Values| AuthUser { name: "new".into() });
    assert_eq!(text(&get(&router, "/who").await), "new");
}

#[tokio::test]
async fn test_providers_run_in_declared_order() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .provide(|| Trace(vec!["group"]))
        .get(
            "/trace",
            bind(|trace: Trace| trace.0.join(","))
                .provide(|trace: Trace| Trace([trace.0, vec!["first"]].concat()))
                .provide(|trace: Trace| Trace([trace.0, vec!["second"]].concat())),
        )
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/trace").await), "group,first,second");
}

#[tokio::test]
async fn test_provider_output_beats_directive() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get(
            "/name",
            bind(|name: String, age: u32| format!("{name}:{age}"))
                .params(query_param("age"))
                .provide(|| "provided".to_owned()),
        )
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/name?age=7&name=ignored").await), "provided:7");
}

#[test]
fn test_forward_reference_fails_registration() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    let err = adaptor
        .route(&mut builder)
        .get(
            "/late",
            bind(|greeting: String| greeting)
                .provide(|user: AuthUser| format!("hello {}", user.name))
                .provide(|| AuthUser { name: "late".into() }),
        )
        .unwrap_err();

    assert!(matches!(err, ConfigError::ForwardReference { .. }), "{err}");
    assert_eq!(
        err.to_string(),
        "GET /late: provider #0 parameter #1 of type adaptor::AuthUser is only produced by a later provider"
    );
}

#[tokio::test]
async fn test_optional_parameters() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get(
            "/hello",
            bind(|arg: Option<String>, token: Option<String>, user: Option<AuthUser>| {
                format!("{arg:?} {token:?} {:?}", user.map(|u| u.name))
            })
            .params(params([query_param("arg"), header_param("x-token")])),
        )
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/hello?arg=huang").await), r#"Some("huang") None None"#);

    let request = Request::get("/hello").header("x-token", "secret").body(Full::new(Bytes::new())).unwrap();
    assert_eq!(text(&router.handle(request).await), r#"None Some("secret") None"#);
}

#[tokio::test]
async fn test_optional_resolved_parameter() {
    let adaptor = Adaptor::new();
    adaptor.register_type_resolver(|req: &RequestContext, _: &Values| {
        req.header("x-user").map(|name| AuthUser { name: name.to_owned() })
    });

    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get("/who", |user: Option<AuthUser>| user.map_or_else(|| "anonymous".to_owned(), |u| u.name))
        .unwrap()
        .get("/must", |user: AuthUser| user.name)
        .unwrap();
    let router = builder.build().unwrap();

    assert_eq!(text(&get(&router, "/who").await), "anonymous");
    assert_eq!(get(&router, "/must").await.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let request = Request::get("/who").header("x-user", "bingoo").body(Full::new(Bytes::new())).unwrap();
    assert_eq!(text(&router.handle(request).await), "bingoo");
}

#[tokio::test]
async fn test_decoded_path_and_utf8_header() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get(
            "/GetAge/{name}",
            bind(|name: String, user: String| format!("{user}/{name}"))
                .params(params([url_param("name"), header_param("x-user")])),
        )
        .unwrap();
    let router = builder.build().unwrap();

    let request = Request::get("/GetAge/bin%20goo")
        .header("x-user", http::HeaderValue::from_bytes("bingöo".as_bytes()).unwrap())
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = router.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(&response), "bingöo/bin goo");
}

#[tokio::test]
async fn test_formatter_panic_still_replies() {
    let adaptor = Adaptor::new();
    adaptor.register_success_formatter(|_: &RequestContext, _: Outputs| -> Response<ResponseBody> { panic!("fmt boom") });

    let mut builder = Router::builder();
    adaptor.route(&mut builder).get("/f", || "ok").unwrap();
    let router = Arc::new(builder.build().unwrap());

    let handle = tokio::spawn(async move { get(&router, "/f").await });
    let response = handle.await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&response), "fmt boom");
}

#[tokio::test]
async fn test_missing_directive_value() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor
        .route(&mut builder)
        .get("/hello", bind(|arg: String| arg).params(query_param("arg")))
        .unwrap();
    let router = builder.build().unwrap();

    let response = get(&router, "/hello").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&response), "missing query parameter `arg`");
}

#[tokio::test]
async fn test_handler_panic() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder();
    adaptor.route(&mut builder).get("/panic", || -> String { panic!("handler exploded") }).unwrap();
    let router = builder.build().unwrap();

    let response = get(&router, "/panic").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(&response), "handler exploded");
}

#[test]
fn test_strict_directives() {
    let adaptor = Adaptor::builder().strict_directives(true).build();
    let mut builder = Router::builder();
    let err = adaptor
        .route(&mut builder)
        .get("/hello", bind(|name: String| name).params(params([query_param("name"), query_param("extra")])))
        .unwrap_err();

    assert_eq!(err, ConfigError::UnusedDirectives { route: "GET /hello".into(), count: 1 });
}

#[tokio::test]
async fn test_host_status_codes() {
    let adaptor = Adaptor::new();
    let mut builder = Router::builder().max_body_size(4);
    adaptor.route(&mut builder).post("/echo", |req: RequestContext| req.body().len()).unwrap();
    let router = builder.build().unwrap();

    assert_eq!(get(&router, "/missing").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&router, "/echo").await.status(), StatusCode::METHOD_NOT_ALLOWED);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/echo")
        .body(Full::new(Bytes::from_static(b"too large")))
        .unwrap();
    assert_eq!(router.handle(request).await.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let request = Request::builder().method(Method::POST).uri("/echo").body(Full::new(Bytes::from_static(b"ok"))).unwrap();
    let response = router.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(&response), "2");
}
