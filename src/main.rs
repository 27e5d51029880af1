use std::io::{ErrorKind, Result};
use std::sync::Arc;
use actix_web::{App, HttpServer};
use clap::Parser;
use log::{info, warn};
use origin_gateway::gateway_config::{GatewayArgs, GatewayConfig};
use origin_gateway::http_client::HttpClientConfig;
use origin_gateway::proxy_service::proxy_config::ProxyConfig;
use origin_gateway::proxy_service::proxy_factory::ProxyRouteServiceFactory;
use origin_gateway::std_logger;

#[actix_web::main]
async fn main() -> Result<()> {
  let args = GatewayArgs::parse();

  std_logger::init(args.log_level).map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  let config = GatewayConfig::load(&args)?;
  if config.is_misconfigured() {
    warn!("No origin configured (GATEWAY_ORIGIN). Every request will be answered with MISCONFIGURED.");
  }

  let http_client = HttpClientConfig {
    http_proxy: args.http_proxy.clone(),
    user: args.proxy_user.clone(),
    pass: args.proxy_pass.clone(),
  }
  .to_client()
  .map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

  info!(
    "Forwarding to '{}' in {} mode with a {} ms upstream timeout.",
    &config.origin, config.response_mode, config.timeout_ms
  );

  let proxy_config: Arc<ProxyConfig> = Arc::new(config.into());

  HttpServer::new(move || {
    App::new().default_service(ProxyRouteServiceFactory::create(
      http_client.clone(),
      proxy_config.clone(),
    ))
  })
  .workers(args.workers)
  .bind((args.bind.as_str(), args.port))?
  .run()
  .await
}
