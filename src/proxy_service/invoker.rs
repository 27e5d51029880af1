use std::time::Duration;
use actix_web::rt::time::timeout;
use bytes::Bytes;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use crate::error::GatewayError;

pub struct OutboundRequest {
  pub url: String,
  pub method: Method,
  pub headers: HeaderMap,
  /// `None` for verbs that never carry a body.
  pub body: Option<Bytes>,
}

/// Fully drained upstream reply.
#[derive(Debug)]
pub struct UpstreamResponse {
  pub status: StatusCode,
  pub headers: HeaderMap,
  pub body: Bytes,
}

pub struct UpstreamInvoker {
  http_client: Client,
  deadline: Duration,
}

impl UpstreamInvoker {
  pub fn new(http_client: Client, deadline: Duration) -> Self {
    Self {
      http_client,
      deadline,
    }
  }

  /// Sends `request` once. The deadline covers connecting, the response head and
  /// draining the body; when it elapses the in-flight call is dropped.
  pub async fn invoke(&self, request: OutboundRequest) -> Result<UpstreamResponse, GatewayError> {
    let OutboundRequest {
      url,
      method,
      headers,
      body,
    } = request;

    let mut builder = self.http_client.request(method, url).headers(headers);
    if let Some(body) = body {
      builder = builder.body(body);
    }

    let call = async move {
      let response = builder.send().await?;
      let status = response.status();
      let headers = response.headers().clone();
      let body = response.bytes().await?;

      Ok::<_, reqwest::Error>(UpstreamResponse {
        status,
        headers,
        body,
      })
    };

    match timeout(self.deadline, call).await {
      Ok(Ok(response)) => {
        debug!("Upstream answered {} with {} bytes", response.status, response.body.len());
        Ok(response)
      }
      Ok(Err(err)) if err.is_timeout() => Err(self.timed_out()),
      Ok(Err(err)) => Err(GatewayError::from(err)),
      Err(_elapsed) => Err(self.timed_out()),
    }
  }

  fn timed_out(&self) -> GatewayError {
    GatewayError::Timeout {
      timeout_ms: self.deadline.as_millis() as u64,
    }
  }
}
