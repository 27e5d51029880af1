use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use actix_web::{dev, Error, HttpRequest, HttpResponse, ResponseError};
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;
use log::{debug, error, info, warn};
use reqwest::Method;
use crate::error::GatewayError;
use crate::proxy_service::body_source::{method_carries_body, BodySource, CapturedBody, HostBody, StreamSource};
use crate::proxy_service::cors;
use crate::proxy_service::headers::sanitize_request_headers;
use crate::proxy_service::invoker::{OutboundRequest, UpstreamInvoker};
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::reconstructor::reconstruct;
use crate::proxy_service::target::resolve_target;

/// Forwards every request it receives to the configured origin.
pub struct ProxyRouteService {
  pub(super) config: Arc<ProxyConfig>,
  pub(super) invoker: Rc<UpstreamInvoker>,
}

impl Service<ServiceRequest> for ProxyRouteService {
  type Response = ServiceResponse;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();
    let config = self.config.clone();
    let invoker = self.invoker.clone();

    Box::pin(ProxyRouteService::exec(config, invoker, http_request, payload))
  }
}

impl ProxyRouteService {
  async fn exec(
    config: Arc<ProxyConfig>,
    invoker: Rc<UpstreamInvoker>,
    http: HttpRequest,
    payload: Payload,
  ) -> Result<ServiceResponse, Error> {
    let response = match ProxyRouteService::forward(&config, &invoker, &http, payload).await {
      Ok(response) => response,
      Err(err) => {
        let mut response = err.error_response();
        cors::decorate(&mut response, config.cors_allow_origin.as_ref());
        response
      }
    };

    Ok(ServiceResponse::new(http, response))
  }

  async fn forward(
    config: &ProxyConfig,
    invoker: &UpstreamInvoker,
    http: &HttpRequest,
    payload: Payload,
  ) -> Result<HttpResponse, GatewayError> {
    let method = http.method().clone();

    if method == Method::OPTIONS {
      debug!("Preflight answered for {}", http.path());
      return Ok(cors::preflight(http, config.cors_allow_origin.as_ref()));
    }

    let path_and_query = http.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = resolve_target(&config.origin, path_and_query).map_err(|err| {
      error!("{} {} rejected: {}", method, path_and_query, err);
      err
    })?;

    let captured = match HostBody::streamed(StreamSource::new(payload)).capture().await {
      Ok(captured) => captured,
      Err(err) => {
        warn!("{} {} forwarded without body: {}", method, path_and_query, err);
        CapturedBody::default()
      }
    };

    let headers = sanitize_request_headers(
      http.headers(),
      http.peer_addr().map(|addr| addr.ip()),
      captured.content_type.as_ref(),
    );
    let body = method_carries_body(&method).then_some(captured.bytes);

    let started = Instant::now();
    let outbound = OutboundRequest {
      url: url.clone(),
      method: method.clone(),
      headers,
      body,
    };

    let upstream = invoker.invoke(outbound).await.map_err(|err| {
      error!("{} {} -> {} failed after {} ms: {}", method, path_and_query, url, started.elapsed().as_millis(), err);
      err
    })?;

    info!(
      "{} {} -> {} {} ({} ms)",
      method,
      path_and_query,
      url,
      upstream.status.as_u16(),
      started.elapsed().as_millis()
    );

    Ok(reconstruct(config.response_mode, &method, upstream, config.cors_allow_origin.as_ref()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::http::StatusCode;
  use actix_web::test::{self, TestRequest};
  use actix_web::App;
  use crate::gateway_config::GatewayConfig;
  use crate::http_client::HttpClientConfig;
  use crate::proxy_service::proxy_factory::ProxyRouteServiceFactory;

  fn factory(config: GatewayConfig) -> ProxyRouteServiceFactory {
    let http_client = HttpClientConfig::default().to_client().unwrap();
    ProxyRouteServiceFactory::create(http_client, Arc::new(config.into()))
  }

  #[actix_web::test]
  async fn preflight_skips_target_resolution() {
    let app = test::init_service(App::new().default_service(factory(GatewayConfig::default()))).await;

    let request = TestRequest::default().method(Method::OPTIONS).uri("/any").to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(test::read_body(response).await.is_empty());
  }

  #[actix_web::test]
  async fn empty_origin_is_misconfigured() {
    let config = GatewayConfig {
      cors_allow_origin: Some("*".into()),
      ..Default::default()
    };
    let app = test::init_service(App::new().default_service(factory(config))).await;

    let response = test::call_service(&app, TestRequest::get().uri("/").to_request()).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers().get("x-gateway-error").unwrap(), "MISCONFIGURED");
    assert_eq!(response.headers().get("access-control-allow-origin").unwrap(), "*");
  }
}
