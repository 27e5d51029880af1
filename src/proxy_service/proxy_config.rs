use crate::gateway_config::ResponseMode;
use reqwest::header::HeaderValue;
use std::time::Duration;

/// Runtime form of the gateway settings, shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
  pub origin: Box<str>,
  pub timeout: Duration,
  pub cors_allow_origin: Option<HeaderValue>,
  pub response_mode: ResponseMode,
}
