use std::time::Duration;
use log::warn;
use reqwest::header::HeaderValue;
use crate::gateway_config::GatewayConfig;
use crate::proxy_service::proxy_config::ProxyConfig;

pub mod body_source;
pub mod cors;
pub mod headers;
pub mod invoker;
pub mod proxy_config;
pub mod proxy_factory;
pub mod proxy_route_service;
pub mod reconstructor;
pub mod target;

impl From<GatewayConfig> for ProxyConfig {
  fn from(config: GatewayConfig) -> Self {
    let cors_allow_origin = extract_cors_origin(&config);

    ProxyConfig {
      origin: Box::from(config.origin.as_str()),
      timeout: Duration::from_millis(config.timeout_ms),
      cors_allow_origin,
      response_mode: config.response_mode,
    }
  }
}

#[inline]
fn extract_cors_origin(config: &GatewayConfig) -> Option<HeaderValue> {
  let origin = config.cors_allow_origin.as_deref()?;

  match HeaderValue::from_str(origin) {
    Ok(value) => Some(value),
    Err(err) => {
      warn!("CORS disabled, '{}' is not a valid header value: {}", origin, err);
      None
    }
  }
}
