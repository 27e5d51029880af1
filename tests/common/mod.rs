//! Live upstream used by the forwarding tests.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use actix_web::dev::Service;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use origin_gateway::gateway_config::{GatewayConfig, ResponseMode};

/// Builds the gateway as an actix test service for `$config`.
macro_rules! gateway {
  ($config:expr) => {
    actix_web::test::init_service(actix_web::App::new().default_service(
      origin_gateway::proxy_service::proxy_factory::ProxyRouteServiceFactory::create(
        origin_gateway::http_client::HttpClientConfig::default().to_client().unwrap(),
        std::sync::Arc::new(origin_gateway::proxy_service::proxy_config::ProxyConfig::from($config)),
      ),
    ))
    .await
  };
}

pub struct Upstream {
  pub addr: SocketAddr,
  pub hits: Arc<AtomicUsize>,
}

impl Upstream {
  pub fn origin(&self) -> String {
    format!("http://{}", self.addr)
  }

  pub fn hits(&self) -> usize {
    self.hits.load(Ordering::SeqCst)
  }

  pub fn config(&self, origin: String, response_mode: ResponseMode) -> GatewayConfig {
    GatewayConfig {
      origin,
      timeout_ms: 5_000,
      cors_allow_origin: None,
      response_mode,
    }
  }
}

/// Starts an upstream on an ephemeral localhost port.
///
/// Routes:
/// - `/json` answers `{"a":1}`, `/null` answers `null`
/// - `/status/{code}` answers `hello` with that status
/// - `/slow` answers after five seconds
/// - everything else echoes the request body and reports what it saw in `x-seen-*` headers
pub fn start_upstream() -> Upstream {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  let hits = Arc::new(AtomicUsize::new(0));
  let server_hits = hits.clone();

  let server = HttpServer::new(move || {
    let counter = server_hits.clone();

    App::new()
      .wrap_fn(move |req, srv| {
        counter.fetch_add(1, Ordering::SeqCst);
        srv.call(req)
      })
      .route("/json", web::to(json_reply))
      .route("/null", web::to(null_reply))
      .route("/status/{code}", web::to(status_reply))
      .route("/slow", web::to(slow_reply))
      .default_service(web::to(echo))
  })
  .workers(1)
  .listen(listener)
  .unwrap()
  .run();

  actix_web::rt::spawn(server);

  Upstream { addr, hits }
}

async fn json_reply() -> HttpResponse {
  HttpResponse::Ok()
    .insert_header((CONTENT_TYPE, "application/json"))
    .body(r#"{"a":1}"#)
}

async fn null_reply() -> HttpResponse {
  HttpResponse::Ok()
    .insert_header((CONTENT_TYPE, "application/json"))
    .body("null")
}

async fn status_reply(code: web::Path<u16>) -> HttpResponse {
  let status = actix_web::http::StatusCode::from_u16(code.into_inner()).unwrap();
  HttpResponse::build(status)
    .insert_header((CONTENT_TYPE, "text/plain"))
    .body("hello")
}

async fn slow_reply() -> HttpResponse {
  actix_web::rt::time::sleep(Duration::from_secs(5)).await;
  HttpResponse::Ok().body("late")
}

async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
  let mut seen: Vec<&str> = req.headers().keys().map(|name| name.as_str()).collect();
  seen.sort_unstable();
  seen.dedup();

  let mut response = HttpResponse::Ok();
  response
    .insert_header(("x-seen-method", req.method().as_str()))
    .insert_header(("x-seen-uri", req.uri().to_string()))
    .insert_header(("x-seen-headers", seen.join(",")))
    .insert_header(("keep-alive", "timeout=5"))
    .insert_header(("proxy-authenticate", "Basic realm=\"upstream\""))
    .insert_header(("x-upstream", "echo"));

  for (seen_name, name) in [
    ("x-seen-content-type", "content-type"),
    ("x-seen-content-length", "content-length"),
    ("x-seen-forwarded-for", "x-forwarded-for"),
    ("x-seen-host", "host"),
  ] {
    if let Some(value) = req.headers().get(name) {
      response.insert_header((seen_name, value.clone()));
    }
  }

  response.body(body)
}
