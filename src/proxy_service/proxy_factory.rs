use std::rc::Rc;
use std::sync::Arc;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::Error;
use futures_core::future::LocalBoxFuture;
use reqwest::Client;
use crate::proxy_service::invoker::UpstreamInvoker;
use crate::proxy_service::proxy_config::ProxyConfig;
use crate::proxy_service::proxy_route_service::ProxyRouteService;

pub struct ProxyRouteServiceFactory {
  pub config: Arc<ProxyConfig>,
  pub http_client: Client,
}

impl ServiceFactory<ServiceRequest> for ProxyRouteServiceFactory {
  type Response = ServiceResponse;
  type Error = Error;
  type Config = ();
  type Service = ProxyRouteService;
  type InitError = ();
  type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    let invoker = UpstreamInvoker::new(self.http_client.clone(), self.config.timeout);
    let service = ProxyRouteService {
      config: self.config.clone(),
      invoker: Rc::new(invoker),
    };

    Box::pin(async move { Ok(service) })
  }
}

impl ProxyRouteServiceFactory {
  pub fn create(http_client: Client, proxy_config: Arc<ProxyConfig>) -> Self {
    Self {
      config: proxy_config,
      http_client,
    }
  }
}
